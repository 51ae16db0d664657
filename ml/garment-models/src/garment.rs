//! The garment deformation predictor: low-frequency plus kernel-blended
//! high-frequency displacement.

use burn::prelude::Backend;
use burn::tensor::Tensor;
use garment_dataset::GarmentDataset;
use garment_types::{
    CanonicalBasis, DisplacementField, GarmentCategory, MaskTable, Pivot, PivotSet,
};
use tracing::{info, warn};

use crate::checkpoint::load_checkpoint;
use crate::config::{ModelParams, PredictorConfig};
use crate::error::{ModelError, Result};
use crate::kernel::{KernelBlender, KernelConfig, host_values, stack_pivot_fields};
use crate::layout::{CheckpointLayout, Stage};
use crate::mask::InputMasker;
use crate::mlp::Mlp;
use crate::predictor::{
    DisplacementNetwork, GarmentInputs, HighFrequencyPredictor, LowFrequencyPredictor,
    PivotPredictor, Ss2gPredictor,
};

/// Predicts per-vertex garment displacement from pose, shape and style.
///
/// All state is immutable after construction; [`GarmentPredictor::predict`]
/// takes `&self` and a failed call leaves the predictor usable.
///
/// # Example
///
/// ```no_run
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
/// use garment_models::{GarmentPredictor, PredictorConfig};
/// use garment_types::{GarmentCategory, Gender};
///
/// let device = Default::default();
/// let config = PredictorConfig::new("data", "ckpt", GarmentCategory::TShirt, Gender::Female);
/// let predictor = GarmentPredictor::<NdArray<f32>>::load(&config, &device)?;
///
/// let displacement = predictor.predict(
///     Tensor::zeros([1, 10], &device),
///     Tensor::zeros([1, 72], &device),
///     Tensor::zeros([1, 4], &device),
/// )?;
/// assert_eq!(displacement.dims(), [1, predictor.vertex_count(), 3]);
/// # Ok::<(), garment_models::ModelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GarmentPredictor<B: Backend> {
    category: GarmentCategory,
    pivots: PivotSet,
    low_frequency: LowFrequencyPredictor<B>,
    high_frequency: Vec<HighFrequencyPredictor<B>>,
    ss2g: Ss2gPredictor<B>,
    blender: KernelBlender<B>,
}

impl<B: Backend> GarmentPredictor<B> {
    /// Assembles a predictor from constructed sub-models.
    ///
    /// The i-th high-frequency predictor must belong to the i-th basis entry.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ShapeMismatch`] if the pivot counts or any vertex
    ///   count disagree with the basis
    /// - [`ModelError::InvalidConfig`] if the pivots repeat or the kernel
    ///   configuration is invalid
    pub fn from_parts(
        low_frequency: LowFrequencyPredictor<B>,
        high_frequency: Vec<HighFrequencyPredictor<B>>,
        ss2g: Ss2gPredictor<B>,
        basis: &CanonicalBasis,
        kernel: KernelConfig,
        device: &B::Device,
    ) -> Result<Self> {
        if high_frequency.len() != basis.pivot_count() {
            return Err(ModelError::shape_mismatch(
                format!("{} high-frequency predictors", basis.pivot_count()),
                high_frequency.len().to_string(),
            ));
        }
        let pivots = PivotSet::new(high_frequency.iter().map(PivotPredictor::pivot).collect())?;

        let expected = basis.vertex_count();
        let counts = std::iter::once(("low-frequency".to_string(), low_frequency.vertex_count()))
            .chain(std::iter::once(("ss2g".to_string(), ss2g.vertex_count())))
            .chain(high_frequency.iter().map(|hf| {
                (
                    format!("high-frequency {}", hf.pivot()),
                    PivotPredictor::vertex_count(hf),
                )
            }));
        for (name, actual) in counts {
            if actual != expected {
                return Err(ModelError::shape_mismatch(
                    format!("{expected} vertices"),
                    format!("{actual} from {name}"),
                ));
            }
        }

        let blender = KernelBlender::new(basis, kernel, device)?;
        let category = low_frequency.category();
        info!(
            category = %category,
            pivots = pivots.len(),
            vertices = expected,
            sigma = kernel.sigma,
            "Built garment predictor"
        );

        Ok(Self {
            category,
            pivots,
            low_frequency,
            high_frequency,
            ss2g,
            blender,
        })
    }

    /// Loads the dataset and every network named by `config`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::UnknownCategory`] if the category has no masks
    /// - [`ModelError::Dataset`] if the pivots or basis cannot be read
    /// - [`ModelError::MissingWeights`] if a network's params or weights are
    ///   absent for both the instance and the baseline
    /// - [`ModelError::ShapeMismatch`] if a loaded network does not fit the
    ///   basis
    pub fn load(config: &PredictorConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;
        let masker = InputMasker::new(&MaskTable::standard(), config.category, device)?;
        let dataset = GarmentDataset::open(&config.dataset_dir, config.category, config.gender)?;
        let loader = StageLoader {
            layout: config.layout(),
            category: config.category,
            output_dim: dataset.vertex_count() * 3,
            device,
        };

        let low_frequency =
            LowFrequencyPredictor::new(loader.load(Stage::LowFrequency, None)?, masker.clone())?;
        let high_frequency = dataset
            .pivots()
            .iter()
            .map(|&pivot| {
                let mlp = loader.load(Stage::HighFrequency, Some(pivot))?;
                HighFrequencyPredictor::new(pivot, mlp, masker.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        let ss2g = Ss2gPredictor::new(loader.load(Stage::Ss2g, None)?, masker)?;

        Self::from_parts(
            low_frequency,
            high_frequency,
            ss2g,
            dataset.basis(),
            config.kernel,
            device,
        )
    }

    /// Predicts displacement `[batch, V, 3]` from shape `[batch, 10]`,
    /// pose `[batch, 72]` and style `[batch, 4]`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::BatchSizeMismatch`] before any network runs
    /// - [`ModelError::InvalidInput`] on a wrong feature width
    /// - [`ModelError::DegenerateKernelWeights`] under the failing policy
    pub fn predict(
        &self,
        betas: Tensor<B, 2>,
        thetas: Tensor<B, 2>,
        gammas: Tensor<B, 2>,
    ) -> Result<Tensor<B, 3>> {
        let inputs = GarmentInputs::new(betas, thetas, gammas)?;

        let pivot_fields = stack_pivot_fields(&self.high_frequency, &inputs.thetas)?;
        let rest = self.ss2g.forward(&inputs)?;
        let high = self.blender.blend_for(pivot_fields, rest)?;
        let low = self.low_frequency.forward(&inputs)?;

        Ok(low + high)
    }

    /// Like [`GarmentPredictor::predict`], copied to a host-side field.
    ///
    /// # Errors
    ///
    /// See [`GarmentPredictor::predict`].
    pub fn predict_field(
        &self,
        betas: Tensor<B, 2>,
        thetas: Tensor<B, 2>,
        gammas: Tensor<B, 2>,
    ) -> Result<DisplacementField> {
        let output = self.predict(betas, thetas, gammas)?;
        let [batch, vertices, _] = output.dims();
        Ok(DisplacementField::new(batch, vertices, host_values(output)?)?)
    }

    /// Normalized kernel weights `[batch, P]` for a shape/style batch.
    ///
    /// # Errors
    ///
    /// - [`ModelError::BatchSizeMismatch`] if the batches disagree
    /// - [`ModelError::InvalidInput`] on a wrong feature width
    pub fn kernel_weights(
        &self,
        betas: Tensor<B, 2>,
        gammas: Tensor<B, 2>,
    ) -> Result<Tensor<B, 2>> {
        let rest = self.ss2g.forward_shape_style(betas, gammas)?;
        self.blender.weights(rest)
    }

    /// Garment category.
    #[must_use]
    pub const fn category(&self) -> GarmentCategory {
        self.category
    }

    /// Pivots in blend order.
    #[must_use]
    pub const fn pivots(&self) -> &PivotSet {
        &self.pivots
    }

    /// Vertices per garment.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.blender.vertex_count()
    }

    /// Kernel configuration.
    #[must_use]
    pub const fn kernel_config(&self) -> &KernelConfig {
        self.blender.config()
    }

    /// The low-frequency sub-model.
    #[must_use]
    pub const fn low_frequency(&self) -> &LowFrequencyPredictor<B> {
        &self.low_frequency
    }

    /// The high-frequency sub-models, in pivot order.
    #[must_use]
    pub fn high_frequency(&self) -> &[HighFrequencyPredictor<B>] {
        &self.high_frequency
    }

    /// The high-frequency sub-model for one pivot.
    #[must_use]
    pub fn high_frequency_for(&self, pivot: Pivot) -> Option<&HighFrequencyPredictor<B>> {
        self.high_frequency.iter().find(|hf| hf.pivot() == pivot)
    }

    /// The shape-style-to-geometry sub-model.
    #[must_use]
    pub const fn ss2g(&self) -> &Ss2gPredictor<B> {
        &self.ss2g
    }
}

/// Resolves params and weights for each network of one instance.
struct StageLoader<'a, B: Backend> {
    layout: CheckpointLayout,
    category: GarmentCategory,
    output_dim: usize,
    device: &'a B::Device,
}

impl<B: Backend> StageLoader<'_, B> {
    fn load(&self, stage: Stage, pivot: Option<Pivot>) -> Result<Mlp<B>> {
        let params = self
            .layout
            .params_chain(stage, pivot)
            .resolve(|path| ModelParams::from_file(path))?
            .value;
        if let Some(class) = params.garment_class.as_deref() {
            if class != self.category.name() {
                warn!(
                    stage = %stage,
                    trained_for = class,
                    category = %self.category,
                    "Params were written for another category"
                );
            }
        }

        let config = params.mlp_config(stage.input_dim(), self.output_dim);
        if !config.is_valid() {
            return Err(ModelError::invalid_config(format!(
                "{stage}: hidden {} / layers {}",
                config.hidden, config.depth
            )));
        }

        let template = Mlp::<B>::new(&config, self.device);
        let resolved = self
            .layout
            .weights_chain(stage, pivot)
            .resolve(|path| load_checkpoint::<B, _>(template.clone(), path, self.device))?;
        Ok(resolved.value)
    }
}
