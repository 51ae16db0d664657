//! Low-frequency, high-frequency and shape-style-to-geometry sub-models.
//!
//! Every sub-model is an [`Mlp`] behind an [`InputMasker`]: the masker sees
//! the raw inputs, the network sees only the components its category cares
//! about, and the flat output is reshaped to `[batch, V, 3]`.

use burn::prelude::Backend;
use burn::tensor::Tensor;
use garment_types::{GarmentCategory, POSE_DIM, Pivot, SHAPE_DIM, STYLE_DIM, VERTEX_DIM};

use crate::error::{ModelError, Result};
use crate::mask::{InputMasker, check_width};
use crate::mlp::Mlp;

/// Input width of the low-frequency network (pose + shape + style).
pub const LF_INPUT_DIM: usize = POSE_DIM + SHAPE_DIM + STYLE_DIM;

/// Input width of a high-frequency network (pose only).
pub const HF_INPUT_DIM: usize = POSE_DIM;

/// Input width of the shape-style-to-geometry network (shape + style).
pub const SS2G_INPUT_DIM: usize = SHAPE_DIM + STYLE_DIM;

/// A batch of `(betas, thetas, gammas)` with agreeing batch sizes and
/// declared feature widths.
///
/// # Example
///
/// ```
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
/// use garment_models::GarmentInputs;
///
/// let device = Default::default();
/// let inputs = GarmentInputs::<NdArray<f32>>::new(
///     Tensor::zeros([2, 10], &device),
///     Tensor::zeros([2, 72], &device),
///     Tensor::zeros([2, 4], &device),
/// )
/// .unwrap();
/// assert_eq!(inputs.batch_size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GarmentInputs<B: Backend> {
    /// Shape parameters, `[batch, 10]`.
    pub betas: Tensor<B, 2>,
    /// Pose parameters, `[batch, 72]`.
    pub thetas: Tensor<B, 2>,
    /// Style parameters, `[batch, 4]`.
    pub gammas: Tensor<B, 2>,
}

impl<B: Backend> GarmentInputs<B> {
    /// Validates and bundles an input batch.
    ///
    /// # Errors
    ///
    /// - [`ModelError::BatchSizeMismatch`] if the batch sizes disagree
    /// - [`ModelError::InvalidInput`] if a feature width is wrong
    pub fn new(betas: Tensor<B, 2>, thetas: Tensor<B, 2>, gammas: Tensor<B, 2>) -> Result<Self> {
        let [nb, nt, ng] = [betas.dims()[0], thetas.dims()[0], gammas.dims()[0]];
        if nb != nt || nb != ng {
            return Err(ModelError::batch_size_mismatch(format!(
                "betas {nb}, thetas {nt}, gammas {ng}"
            )));
        }
        check_width("betas", &betas, SHAPE_DIM)?;
        check_width("thetas", &thetas, POSE_DIM)?;
        check_width("gammas", &gammas, STYLE_DIM)?;

        Ok(Self {
            betas,
            thetas,
            gammas,
        })
    }

    /// Number of samples.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.thetas.dims()[0]
    }
}

/// A sub-model producing a `[batch, V, 3]` vertex field.
pub trait DisplacementNetwork<B: Backend> {
    /// Runs the sub-model on a validated batch.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] if an input the network reads has
    /// the wrong width.
    fn forward(&self, inputs: &GarmentInputs<B>) -> Result<Tensor<B, 3>>;

    /// Vertices per output field.
    fn vertex_count(&self) -> usize;
}

/// A per-pivot predictor driven by pose alone.
pub trait PivotPredictor<B: Backend> {
    /// Predicts this pivot's high-frequency field from a pose batch.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] on a pose width other than 72.
    fn forward_pose(&self, thetas: Tensor<B, 2>) -> Result<Tensor<B, 3>>;

    /// The pivot this predictor was trained for.
    fn pivot(&self) -> Pivot;

    /// Vertices per output field.
    fn vertex_count(&self) -> usize;
}

/// Checks a network's widths and returns its vertex count.
fn vertex_count_of<B: Backend>(stage: &str, mlp: &Mlp<B>, input_dim: usize) -> Result<usize> {
    if mlp.input_dim() != input_dim {
        return Err(ModelError::shape_mismatch(
            format!("{stage} input width {input_dim}"),
            mlp.input_dim().to_string(),
        ));
    }
    let output = mlp.output_dim();
    if output % VERTEX_DIM != 0 {
        return Err(ModelError::shape_mismatch(
            format!("{stage} output width divisible by 3"),
            output.to_string(),
        ));
    }
    Ok(output / VERTEX_DIM)
}

fn to_field<B: Backend>(flat: Tensor<B, 2>, vertex_count: usize) -> Tensor<B, 3> {
    let batch = flat.dims()[0];
    flat.reshape([batch, vertex_count, VERTEX_DIM])
}

/// Coarse displacement from pose, shape and style.
#[derive(Debug, Clone)]
pub struct LowFrequencyPredictor<B: Backend> {
    mlp: Mlp<B>,
    masker: InputMasker<B>,
    vertex_count: usize,
}

impl<B: Backend> LowFrequencyPredictor<B> {
    /// Wraps a network of input width 86.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the network's input width is
    /// not 86 or its output width is not a multiple of 3.
    pub fn new(mlp: Mlp<B>, masker: InputMasker<B>) -> Result<Self> {
        let vertex_count = vertex_count_of("low-frequency", &mlp, LF_INPUT_DIM)?;
        Ok(Self {
            mlp,
            masker,
            vertex_count,
        })
    }

    /// The wrapped network.
    #[must_use]
    pub const fn network(&self) -> &Mlp<B> {
        &self.mlp
    }

    /// Category whose masks are applied to the inputs.
    #[must_use]
    pub const fn category(&self) -> GarmentCategory {
        self.masker.category()
    }
}

impl<B: Backend> DisplacementNetwork<B> for LowFrequencyPredictor<B> {
    fn forward(&self, inputs: &GarmentInputs<B>) -> Result<Tensor<B, 3>> {
        let thetas = self.masker.mask_pose(inputs.thetas.clone())?;
        let betas = self.masker.mask_shape(inputs.betas.clone())?;
        let gammas = self.masker.mask_style(inputs.gammas.clone())?;

        let flat = self.mlp.forward(Tensor::cat(vec![thetas, betas, gammas], 1));
        Ok(to_field(flat, self.vertex_count))
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Fine-detail displacement for one pivot, from pose alone.
#[derive(Debug, Clone)]
pub struct HighFrequencyPredictor<B: Backend> {
    pivot: Pivot,
    mlp: Mlp<B>,
    masker: InputMasker<B>,
    vertex_count: usize,
}

impl<B: Backend> HighFrequencyPredictor<B> {
    /// Wraps a network of input width 72 for `pivot`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the network's input width is
    /// not 72 or its output width is not a multiple of 3.
    pub fn new(pivot: Pivot, mlp: Mlp<B>, masker: InputMasker<B>) -> Result<Self> {
        let vertex_count = vertex_count_of("high-frequency", &mlp, HF_INPUT_DIM)?;
        Ok(Self {
            pivot,
            mlp,
            masker,
            vertex_count,
        })
    }

    /// The wrapped network.
    #[must_use]
    pub const fn network(&self) -> &Mlp<B> {
        &self.mlp
    }

    /// Category whose masks are applied to the inputs.
    #[must_use]
    pub const fn category(&self) -> GarmentCategory {
        self.masker.category()
    }
}

impl<B: Backend> PivotPredictor<B> for HighFrequencyPredictor<B> {
    fn forward_pose(&self, thetas: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
        let thetas = self.masker.mask_pose(thetas)?;
        Ok(to_field(self.mlp.forward(thetas), self.vertex_count))
    }

    fn pivot(&self) -> Pivot {
        self.pivot
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

impl<B: Backend> DisplacementNetwork<B> for HighFrequencyPredictor<B> {
    /// Reads only `thetas`; shape and style are ignored.
    fn forward(&self, inputs: &GarmentInputs<B>) -> Result<Tensor<B, 3>> {
        self.forward_pose(inputs.thetas.clone())
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Canonical-pose rest vertices from shape and style.
#[derive(Debug, Clone)]
pub struct Ss2gPredictor<B: Backend> {
    mlp: Mlp<B>,
    masker: InputMasker<B>,
    vertex_count: usize,
}

impl<B: Backend> Ss2gPredictor<B> {
    /// Wraps a network of input width 14.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the network's input width is
    /// not 14 or its output width is not a multiple of 3.
    pub fn new(mlp: Mlp<B>, masker: InputMasker<B>) -> Result<Self> {
        let vertex_count = vertex_count_of("ss2g", &mlp, SS2G_INPUT_DIM)?;
        Ok(Self {
            mlp,
            masker,
            vertex_count,
        })
    }

    /// The wrapped network.
    #[must_use]
    pub const fn network(&self) -> &Mlp<B> {
        &self.mlp
    }

    /// Category whose masks are applied to the inputs.
    #[must_use]
    pub const fn category(&self) -> GarmentCategory {
        self.masker.category()
    }

    /// Predicts rest vertices from `[batch, 10]` shape and `[batch, 4]` style.
    ///
    /// # Errors
    ///
    /// - [`ModelError::BatchSizeMismatch`] if the batch sizes disagree
    /// - [`ModelError::InvalidInput`] if a feature width is wrong
    pub fn forward_shape_style(
        &self,
        betas: Tensor<B, 2>,
        gammas: Tensor<B, 2>,
    ) -> Result<Tensor<B, 3>> {
        let [nb, ng] = [betas.dims()[0], gammas.dims()[0]];
        if nb != ng {
            return Err(ModelError::batch_size_mismatch(format!(
                "betas {nb}, gammas {ng}"
            )));
        }
        let betas = self.masker.mask_shape(betas)?;
        let gammas = self.masker.mask_style(gammas)?;

        let flat = self.mlp.forward(Tensor::cat(vec![betas, gammas], 1));
        Ok(to_field(flat, self.vertex_count))
    }
}

impl<B: Backend> DisplacementNetwork<B> for Ss2gPredictor<B> {
    /// Reads only `betas` and `gammas`; pose is ignored.
    fn forward(&self, inputs: &GarmentInputs<B>) -> Result<Tensor<B, 3>> {
        self.forward_shape_style(inputs.betas.clone(), inputs.gammas.clone())
    }

    fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::MlpConfig;
    use approx::assert_relative_eq;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;
    use garment_types::MaskTable;

    type TestBackend = NdArray<f32>;

    const V: usize = 5;

    fn masker(category: GarmentCategory) -> InputMasker<TestBackend> {
        InputMasker::new(&MaskTable::standard(), category, &Default::default()).unwrap()
    }

    fn mlp(input_dim: usize) -> Mlp<TestBackend> {
        Mlp::new(
            &MlpConfig::new(input_dim, V * 3).with_hidden(8),
            &Default::default(),
        )
    }

    fn inputs(batch: usize) -> GarmentInputs<TestBackend> {
        let device = Default::default();
        GarmentInputs::new(
            Tensor::ones([batch, SHAPE_DIM], &device),
            Tensor::ones([batch, POSE_DIM], &device),
            Tensor::ones([batch, STYLE_DIM], &device),
        )
        .unwrap()
    }

    fn values(tensor: Tensor<TestBackend, 3>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn input_widths() {
        assert_eq!(LF_INPUT_DIM, 86);
        assert_eq!(HF_INPUT_DIM, 72);
        assert_eq!(SS2G_INPUT_DIM, 14);
    }

    #[test]
    fn inputs_reject_batch_mismatch() {
        let device = Default::default();
        let result = GarmentInputs::<TestBackend>::new(
            Tensor::zeros([2, SHAPE_DIM], &device),
            Tensor::zeros([3, POSE_DIM], &device),
            Tensor::zeros([2, STYLE_DIM], &device),
        );
        assert!(matches!(result, Err(ModelError::BatchSizeMismatch(_))));
    }

    #[test]
    fn inputs_reject_wrong_width() {
        let device = Default::default();
        let result = GarmentInputs::<TestBackend>::new(
            Tensor::zeros([1, SHAPE_DIM], &device),
            Tensor::zeros([1, 69], &device),
            Tensor::zeros([1, STYLE_DIM], &device),
        );
        assert!(matches!(
            result,
            Err(ModelError::InvalidInput { expected: 72, actual: 69, .. })
        ));
    }

    #[test]
    fn low_frequency_shape() {
        let lf = LowFrequencyPredictor::new(mlp(LF_INPUT_DIM), masker(GarmentCategory::Pant))
            .unwrap();
        assert_eq!(DisplacementNetwork::vertex_count(&lf), V);
        let out = lf.forward(&inputs(3)).unwrap();
        assert_eq!(out.dims(), [3, V, 3]);
    }

    #[test]
    fn predictors_reject_wrong_network_width() {
        let masker = masker(GarmentCategory::Pant);
        assert!(matches!(
            LowFrequencyPredictor::new(mlp(HF_INPUT_DIM), masker.clone()),
            Err(ModelError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            HighFrequencyPredictor::new(Pivot::new(0, 0), mlp(LF_INPUT_DIM), masker.clone()),
            Err(ModelError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            Ss2gPredictor::new(mlp(HF_INPUT_DIM), masker),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn output_width_must_be_vertex_field() {
        let odd = Mlp::<TestBackend>::new(
            &MlpConfig::new(HF_INPUT_DIM, 7).with_hidden(4),
            &Default::default(),
        );
        let result =
            HighFrequencyPredictor::new(Pivot::new(0, 0), odd, masker(GarmentCategory::Skirt));
        assert!(matches!(result, Err(ModelError::ShapeMismatch { .. })));
    }

    #[test]
    fn high_frequency_ignores_shape_and_style() {
        let hf = HighFrequencyPredictor::new(
            Pivot::new(1, 2),
            mlp(HF_INPUT_DIM),
            masker(GarmentCategory::TShirt),
        )
        .unwrap();
        assert_eq!(hf.pivot(), Pivot::new(1, 2));

        let device = Default::default();
        let a = inputs(2);
        let b = GarmentInputs::new(
            Tensor::zeros([2, SHAPE_DIM], &device),
            a.thetas.clone(),
            Tensor::zeros([2, STYLE_DIM], &device),
        )
        .unwrap();

        let out_a = values(hf.forward(&a).unwrap());
        let out_b = values(hf.forward(&b).unwrap());
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn high_frequency_ignores_masked_joints() {
        let hf = HighFrequencyPredictor::new(
            Pivot::new(0, 0),
            mlp(HF_INPUT_DIM),
            masker(GarmentCategory::Skirt),
        )
        .unwrap();
        let device = Default::default();

        let mut noisy = vec![0.0_f32; POSE_DIM];
        noisy[9..].fill(0.7);
        let quiet = Tensor::<TestBackend, 2>::zeros([1, POSE_DIM], &device);
        let noisy = Tensor::from_data(TensorData::new(noisy, [1, POSE_DIM]), &device);

        let a = values(hf.forward_pose(quiet).unwrap());
        let b = values(hf.forward_pose(noisy).unwrap());
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x, y);
        }
    }

    #[test]
    fn ss2g_ignores_pose() {
        let ss2g = Ss2gPredictor::new(mlp(SS2G_INPUT_DIM), masker(GarmentCategory::Shirt))
            .unwrap();
        let device = Default::default();
        let a = inputs(1);
        let b = GarmentInputs::new(
            a.betas.clone(),
            Tensor::zeros([1, POSE_DIM], &device),
            a.gammas.clone(),
        )
        .unwrap();

        let out = ss2g.forward(&a).unwrap();
        assert_eq!(out.dims(), [1, V, 3]);
        assert_eq!(values(out), values(ss2g.forward(&b).unwrap()));
    }

    #[test]
    fn ss2g_rejects_batch_mismatch() {
        let ss2g = Ss2gPredictor::new(mlp(SS2G_INPUT_DIM), masker(GarmentCategory::Shirt))
            .unwrap();
        let device = Default::default();
        let result = ss2g.forward_shape_style(
            Tensor::zeros([2, SHAPE_DIM], &device),
            Tensor::zeros([1, STYLE_DIM], &device),
        );
        assert!(matches!(result, Err(ModelError::BatchSizeMismatch(_))));
    }
}
