//! Input masking: zeroes pose, shape and style components a garment ignores.

use burn::prelude::Backend;
use burn::tensor::{Bool, Tensor, TensorData};
use garment_types::{GarmentCategory, MaskTable, POSE_DIM, SHAPE_DIM, STYLE_DIM};

use crate::error::{ModelError, Result};

/// Masked copies of whichever inputs were supplied.
#[derive(Debug, Clone)]
pub struct MaskedInputs<B: Backend> {
    /// Masked pose, `[batch, 72]`.
    pub thetas: Option<Tensor<B, 2>>,
    /// Masked shape, `[batch, 10]`.
    pub betas: Option<Tensor<B, 2>>,
    /// Masked style (plus any category offset), `[batch, 4]`.
    pub gammas: Option<Tensor<B, 2>>,
}

/// Applies one category's relevance masks to input batches.
///
/// Built once from a [`MaskTable`]; masking never mutates its inputs and
/// absent inputs pass through as `None`.
///
/// # Example
///
/// ```
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
/// use garment_models::InputMasker;
/// use garment_types::{GarmentCategory, MaskTable};
///
/// let device = Default::default();
/// let masker =
///     InputMasker::<NdArray<f32>>::new(&MaskTable::standard(), GarmentCategory::Skirt, &device)
///         .unwrap();
///
/// let betas = Tensor::ones([1, 10], &device);
/// let masked = masker.mask(None, Some(betas), None).unwrap();
/// let values = masked.betas.unwrap().into_data().to_vec::<f32>().unwrap();
/// assert_eq!(values, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct InputMasker<B: Backend> {
    category: GarmentCategory,
    pose: Tensor<B, 1, Bool>,
    shape: Tensor<B, 1, Bool>,
    style: Tensor<B, 1, Bool>,
    style_offset: Option<Tensor<B, 1>>,
}

impl<B: Backend> InputMasker<B> {
    /// Builds the masks for `category`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownCategory`] if the table has no entry for
    /// the category, or [`ModelError::ShapeMismatch`] if the entry names an
    /// out-of-range index.
    pub fn new(table: &MaskTable, category: GarmentCategory, device: &B::Device) -> Result<Self> {
        let relevance = table.relevance(category)?;
        relevance.validate()?;

        Ok(Self {
            category,
            pose: dropped(&relevance.pose_mask(), device),
            shape: dropped(&relevance.shape_mask(), device),
            style: dropped(&relevance.style_mask(), device),
            style_offset: relevance.style_offset.map(|offset| vector(&offset, device)),
        })
    }

    /// Category whose masks this applies.
    #[must_use]
    pub const fn category(&self) -> GarmentCategory {
        self.category
    }

    /// Masks every supplied input.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] if a supplied input does not have
    /// its declared feature width.
    pub fn mask(
        &self,
        thetas: Option<Tensor<B, 2>>,
        betas: Option<Tensor<B, 2>>,
        gammas: Option<Tensor<B, 2>>,
    ) -> Result<MaskedInputs<B>> {
        Ok(MaskedInputs {
            thetas: thetas.map(|t| self.mask_pose(t)).transpose()?,
            betas: betas.map(|b| self.mask_shape(b)).transpose()?,
            gammas: gammas.map(|g| self.mask_style(g)).transpose()?,
        })
    }

    /// Masks a pose batch `[batch, 72]`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] on a width other than 72.
    pub fn mask_pose(&self, thetas: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_width("thetas", &thetas, POSE_DIM)?;
        Ok(zero_dropped(thetas, &self.pose))
    }

    /// Masks a shape batch `[batch, 10]`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] on a width other than 10.
    pub fn mask_shape(&self, betas: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_width("betas", &betas, SHAPE_DIM)?;
        Ok(zero_dropped(betas, &self.shape))
    }

    /// Masks a style batch `[batch, 4]` and adds the category offset, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] on a width other than 4.
    pub fn mask_style(&self, gammas: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_width("gammas", &gammas, STYLE_DIM)?;
        let masked = zero_dropped(gammas, &self.style);
        Ok(match &self.style_offset {
            Some(offset) => masked.add(offset.clone().unsqueeze()),
            None => masked,
        })
    }
}

fn vector<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 1> {
    Tensor::from_data(TensorData::new(values.to_vec(), [values.len()]), device)
}

/// Columns whose relevance is zero.
fn dropped<B: Backend>(relevance: &[f32], device: &B::Device) -> Tensor<B, 1, Bool> {
    vector::<B>(relevance, device).equal_elem(0.0)
}

/// Writes exact zeros into dropped columns, whatever they held.
fn zero_dropped<B: Backend>(values: Tensor<B, 2>, dropped: &Tensor<B, 1, Bool>) -> Tensor<B, 2> {
    let mask = dropped.clone().unsqueeze::<2>().expand(values.shape());
    values.mask_fill(mask, 0.0)
}

/// Checks the feature width of a `[batch, features]` input.
pub(crate) fn check_width<B: Backend>(name: &str, input: &Tensor<B, 2>, width: usize) -> Result<()> {
    let actual = input.dims()[1];
    if actual == width {
        Ok(())
    } else {
        Err(ModelError::invalid_input(name, width, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burn_ndarray::NdArray;
    use garment_types::{CategoryRelevance, LEGACY_STYLE_OFFSET};

    type TestBackend = NdArray<f32>;

    fn masker(category: GarmentCategory) -> InputMasker<TestBackend> {
        InputMasker::new(&MaskTable::standard(), category, &Default::default()).unwrap()
    }

    fn ramp(batch: usize, width: usize) -> Tensor<TestBackend, 2> {
        #[allow(clippy::cast_precision_loss)]
        let values: Vec<f32> = (0..batch * width).map(|i| i as f32 * 0.1 + 1.0).collect();
        Tensor::from_data(TensorData::new(values, [batch, width]), &Default::default())
    }

    fn values(tensor: Tensor<TestBackend, 2>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn unknown_category_is_rejected() {
        let table = MaskTable::empty()
            .with_entry(GarmentCategory::Skirt, CategoryRelevance::new(vec![0, 1, 2]));
        let result =
            InputMasker::<TestBackend>::new(&table, GarmentCategory::Pant, &Default::default());
        assert!(matches!(result, Err(ModelError::UnknownCategory(ref c)) if c == "pant"));
    }

    #[test]
    fn masking_is_idempotent() {
        for category in GarmentCategory::ALL {
            let masker = masker(category);
            let once = masker
                .mask(Some(ramp(2, 72)), Some(ramp(2, 10)), Some(ramp(2, 4)))
                .unwrap();
            let twice = masker
                .mask(once.thetas.clone(), once.betas.clone(), once.gammas.clone())
                .unwrap();

            for (a, b) in [
                (once.thetas, twice.thetas),
                (once.betas, twice.betas),
                (once.gammas, twice.gammas),
            ] {
                assert_eq!(values(a.unwrap()), values(b.unwrap()), "{category}");
            }
        }
    }

    #[test]
    fn pose_masking_is_complete() {
        let table = MaskTable::standard();
        for category in GarmentCategory::ALL {
            let mask = table.relevance(category).unwrap().pose_mask();
            let input = values(ramp(2, 72));
            let masked = values(masker(category).mask_pose(ramp(2, 72)).unwrap());

            for (i, (&out, &orig)) in masked.iter().zip(&input).enumerate() {
                if mask[i % POSE_DIM] == 1.0 {
                    assert_relative_eq!(out, orig);
                } else {
                    assert_eq!(out, 0.0, "{category} index {i}");
                }
            }
        }
    }

    #[test]
    fn shape_keeps_first_two_components() {
        let masked = values(masker(GarmentCategory::Shirt).mask_shape(ramp(1, 10)).unwrap());
        assert_relative_eq!(masked[0], 1.0);
        assert_relative_eq!(masked[1], 1.1);
        assert!(masked[2..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn style_keeps_first_two_components() {
        let masked = values(masker(GarmentCategory::TShirt).mask_style(ramp(1, 4)).unwrap());
        assert_relative_eq!(masked[0], 1.0);
        assert_relative_eq!(masked[1], 1.1);
        assert_eq!(masked[2..], [0.0, 0.0]);
    }

    #[test]
    fn legacy_tshirt_adds_offset_after_masking() {
        let masked = values(
            masker(GarmentCategory::OldTShirt)
                .mask_style(ramp(2, 4))
                .unwrap(),
        );
        for row in masked.chunks_exact(4) {
            assert_relative_eq!(row[2], LEGACY_STYLE_OFFSET[2]);
            assert_eq!(row[3], 0.0);
        }
        assert_relative_eq!(masked[0], 1.0);
        assert_relative_eq!(masked[5], 1.5);
    }

    #[test]
    fn absent_inputs_pass_through() {
        let masked = masker(GarmentCategory::Pant)
            .mask(Some(ramp(1, 72)), None, None)
            .unwrap();
        assert!(masked.thetas.is_some());
        assert!(masked.betas.is_none());
        assert!(masked.gammas.is_none());
    }

    #[test]
    fn wrong_width_is_rejected() {
        let masker = masker(GarmentCategory::Pant);
        assert!(matches!(
            masker.mask_pose(ramp(1, 69)),
            Err(ModelError::InvalidInput { expected: 72, actual: 69, .. })
        ));
        assert!(matches!(
            masker.mask_shape(ramp(1, 11)),
            Err(ModelError::InvalidInput { expected: 10, .. })
        ));
        assert!(matches!(
            masker.mask(None, None, Some(ramp(1, 3))),
            Err(ModelError::InvalidInput { expected: 4, .. })
        ));
    }

    #[test]
    fn dropped_columns_are_zero_even_when_non_finite() {
        let mut raw = vec![0.5_f32; 10];
        raw[5] = f32::INFINITY;
        raw[7] = f32::NAN;
        raw[1] = f32::INFINITY;
        let betas = Tensor::from_data(TensorData::new(raw, [1, 10]), &Default::default());

        let masked = values(masker(GarmentCategory::Skirt).mask_shape(betas).unwrap());
        assert!(masked[2..].iter().all(|&v| v == 0.0));
        assert_eq!(masked[0], 0.5);
        assert!(masked[1].is_infinite());
    }

    #[test]
    fn input_is_not_mutated() {
        let input = ramp(1, 72);
        let before = values(input.clone());
        let _ = masker(GarmentCategory::Skirt).mask_pose(input.clone()).unwrap();
        assert_eq!(values(input), before);
    }
}
