//! Burn garment deformation networks, kernel blending and checkpoint
//! persistence for GarmentForge.
//!
//! A [`GarmentPredictor`] composes three kinds of fully-connected network:
//!
//! - [`LowFrequencyPredictor`] - coarse displacement from pose, shape and style
//! - [`HighFrequencyPredictor`] - fine displacement per pivot, from pose alone
//! - [`Ss2gPredictor`] - canonical rest vertices from shape and style
//!
//! The high-frequency fields are blended with RBF weights ([`KernelBlender`])
//! measured between the predicted rest vertices and each pivot's canonical
//! basis, then added to the low-frequency field.
//!
//! # Input Masking
//!
//! Every network masks its own inputs through an [`InputMasker`] built from
//! the shared [`garment_types::MaskTable`]; the orchestrator does no masking.
//!
//! # Checkpoint Persistence
//!
//! Weights use Burn's recorder system:
//! - Binary format (compact, fast)
//! - JSON format (human-readable, debuggable)
//!
//! [`CheckpointLayout`] derives every candidate path and [`ResourceChain`]
//! resolves the first one that loads, falling back to a baseline directory.
//!
//! # Backend Support
//!
//! Everything is generic over Burn backends. Common choices:
//! - `burn-ndarray` - CPU inference (used by the tests)
//! - `burn-wgpu` - GPU inference
//!
//! # Example
//!
//! ```no_run
//! use burn::tensor::Tensor;
//! use burn_ndarray::NdArray;
//! use garment_models::prelude::*;
//! use garment_types::{GarmentCategory, Gender};
//!
//! let device = Default::default();
//! let config = PredictorConfig::new("data", "ckpt", GarmentCategory::Pant, Gender::Male)
//!     .with_sigma(0.01);
//! let predictor = GarmentPredictor::<NdArray<f32>>::load(&config, &device)?;
//!
//! let field = predictor.predict_field(
//!     Tensor::zeros([4, 10], &device),
//!     Tensor::zeros([4, 72], &device),
//!     Tensor::zeros([4, 4], &device),
//! )?;
//! println!("max displacement {}", field.max_magnitude());
//! # Ok::<(), ModelError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod checkpoint;
mod config;
mod error;
mod garment;
mod kernel;
mod layout;
mod mask;
mod mlp;
mod predictor;

// Re-export the orchestrator
pub use garment::GarmentPredictor;

// Re-export sub-models
pub use mask::{InputMasker, MaskedInputs};
pub use mlp::{Mlp, MlpConfig};
pub use predictor::{
    DisplacementNetwork, GarmentInputs, HF_INPUT_DIM, HighFrequencyPredictor, LF_INPUT_DIM,
    LowFrequencyPredictor, PivotPredictor, SS2G_INPUT_DIM, Ss2gPredictor,
};

// Re-export kernel blending
pub use kernel::{DegeneratePolicy, KernelBlender, KernelConfig, stack_pivot_fields};

// Re-export configuration
pub use config::{ModelParams, PredictorConfig};

// Re-export checkpoint utilities
pub use checkpoint::{CheckpointFormat, load_checkpoint, save_checkpoint};
pub use layout::{
    CheckpointLayout, DEFAULT_BASELINE_DIR, PARAMS_FILE, Resolved, ResourceChain, Stage,
    WEIGHTS_STEM,
};

// Re-export error types
pub use error::{ModelError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CheckpointFormat, CheckpointLayout, DegeneratePolicy, DisplacementNetwork,
        GarmentInputs, GarmentPredictor, KernelConfig, ModelError, ModelParams,
        PivotPredictor, PredictorConfig, Stage, load_checkpoint, save_checkpoint,
    };
}
