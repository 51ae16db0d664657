//! Predictor and per-network configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use garment_types::{GarmentCategory, Gender};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::kernel::KernelConfig;
use crate::layout::{CheckpointLayout, DEFAULT_BASELINE_DIR};
use crate::mlp::MlpConfig;

/// Hyperparameters stored next to each network's weights (`params.json`).
///
/// Unknown keys are ignored, so files written by training tools with extra
/// bookkeeping load unchanged.
///
/// # Example
///
/// ```
/// use garment_models::ModelParams;
///
/// let params: ModelParams =
///     serde_json::from_str(r#"{"garment_class": "pant", "batch_size": 32}"#).unwrap();
/// assert_eq!(params.hidden_size, 1024);
/// assert_eq!(params.num_layers, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Category the network was trained for.
    pub garment_class: Option<String>,

    /// Hidden layer width.
    pub hidden_size: usize,

    /// Number of linear layers.
    pub num_layers: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            garment_class: None,
            hidden_size: 1024,
            num_layers: 3,
        }
    }
}

impl ModelParams {
    /// Reads a `params.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] or [`ModelError::Serialization`] on failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Writes a `params.json` file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] or [`ModelError::Serialization`] on failure.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Sets the hidden width.
    #[must_use]
    pub const fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    /// Sets the number of linear layers.
    #[must_use]
    pub const fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Records the training category.
    #[must_use]
    pub fn with_garment_class(mut self, category: GarmentCategory) -> Self {
        self.garment_class = Some(category.name().to_string());
        self
    }

    /// Network configuration for the given widths.
    #[must_use]
    pub const fn mlp_config(&self, input_dim: usize, output_dim: usize) -> MlpConfig {
        MlpConfig::new(input_dim, output_dim)
            .with_hidden(self.hidden_size)
            .with_depth(self.num_layers)
    }
}

fn default_baseline_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BASELINE_DIR)
}

/// Everything needed to construct a predictor from disk.
///
/// # Example
///
/// ```
/// use garment_models::PredictorConfig;
/// use garment_types::{GarmentCategory, Gender};
///
/// let config: PredictorConfig = serde_json::from_str(
///     r#"{
///         "dataset_dir": "data",
///         "checkpoint_dir": "ckpt",
///         "category": "old-t-shirt",
///         "gender": "female",
///         "kernel": { "sigma": 0.02 }
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(config.category, GarmentCategory::OldTShirt);
/// assert_eq!(config.gender, Gender::Female);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Dataset root containing `{category}_{gender}/pivots.txt`.
    pub dataset_dir: PathBuf,

    /// Checkpoint root.
    pub checkpoint_dir: PathBuf,

    /// Garment category.
    pub category: GarmentCategory,

    /// Body gender.
    pub gender: Gender,

    /// Kernel blending parameters.
    #[serde(default)]
    pub kernel: KernelConfig,

    /// Baseline directory relative to `checkpoint_dir`.
    #[serde(default = "default_baseline_dir")]
    pub baseline_dir: PathBuf,
}

impl PredictorConfig {
    /// Creates a configuration with default kernel and baseline.
    #[must_use]
    pub fn new(
        dataset_dir: impl Into<PathBuf>,
        checkpoint_dir: impl Into<PathBuf>,
        category: GarmentCategory,
        gender: Gender,
    ) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            checkpoint_dir: checkpoint_dir.into(),
            category,
            gender,
            kernel: KernelConfig::default(),
            baseline_dir: default_baseline_dir(),
        }
    }

    /// Sets the kernel configuration.
    #[must_use]
    pub const fn with_kernel(mut self, kernel: KernelConfig) -> Self {
        self.kernel = kernel;
        self
    }

    /// Sets the kernel bandwidth.
    #[must_use]
    pub const fn with_sigma(mut self, sigma: f64) -> Self {
        self.kernel.sigma = sigma;
        self
    }

    /// Sets the baseline directory.
    #[must_use]
    pub fn with_baseline_dir(mut self, baseline_dir: impl Into<PathBuf>) -> Self {
        self.baseline_dir = baseline_dir.into();
        self
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] or [`ModelError::Serialization`] on failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Checks the kernel parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] naming the bad field.
    pub fn validate(&self) -> Result<()> {
        if self.kernel.is_valid() {
            Ok(())
        } else {
            Err(ModelError::invalid_config(format!(
                "kernel sigma {} / scale {} / floor {}",
                self.kernel.sigma, self.kernel.distance_scale, self.kernel.weight_floor
            )))
        }
    }

    /// Checkpoint layout for this instance.
    #[must_use]
    pub fn layout(&self) -> CheckpointLayout {
        CheckpointLayout::new(&self.checkpoint_dir, self.category, self.gender)
            .with_baseline_dir(&self.baseline_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Stage;

    #[test]
    fn params_defaults_and_unknown_keys() {
        let params: ModelParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, ModelParams::default());

        let params: ModelParams =
            serde_json::from_str(r#"{"hidden_size": 64, "lr": 1e-4, "shape_style": "000_000"}"#)
                .unwrap();
        assert_eq!(params.hidden_size, 64);
        assert_eq!(params.num_layers, 3);
        assert_eq!(params.garment_class, None);
    }

    #[test]
    fn params_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("params.json");
        let params = ModelParams::default()
            .with_hidden_size(16)
            .with_num_layers(4)
            .with_garment_class(GarmentCategory::Skirt);
        params.to_file(&path).unwrap();

        let loaded = ModelParams::from_file(&path).unwrap();
        assert_eq!(loaded, params);
        assert_eq!(loaded.garment_class.as_deref(), Some("skirt"));
    }

    #[test]
    fn params_mlp_config() {
        let config = ModelParams::default()
            .with_hidden_size(32)
            .mlp_config(86, 30);
        assert_eq!(config.input_dim, 86);
        assert_eq!(config.output_dim, 30);
        assert_eq!(config.hidden, 32);
        assert_eq!(config.depth, 3);
    }

    #[test]
    fn params_missing_file() {
        let result = ModelParams::from_file("/definitely/not/here/params.json");
        assert!(matches!(result, Err(ModelError::Io(_))));
    }

    #[test]
    fn predictor_config_defaults() {
        let config = PredictorConfig::new("data", "ckpt", GarmentCategory::Shirt, Gender::Male);
        assert_eq!(config.baseline_dir, Path::new(DEFAULT_BASELINE_DIR));
        assert_eq!(config.kernel, KernelConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn predictor_config_rejects_bad_sigma() {
        let config = PredictorConfig::new("data", "ckpt", GarmentCategory::Shirt, Gender::Male)
            .with_sigma(0.0);
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn predictor_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictor.json");
        let config = PredictorConfig::new("data", "ckpt", GarmentCategory::Pant, Gender::Female)
            .with_sigma(0.05)
            .with_baseline_dir("base/pant_female");
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(PredictorConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn predictor_config_unknown_category() {
        let result: std::result::Result<PredictorConfig, _> = serde_json::from_str(
            r#"{"dataset_dir": "d", "checkpoint_dir": "c", "category": "cape", "gender": "male"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn predictor_config_layout() {
        let config = PredictorConfig::new("data", "ckpt", GarmentCategory::Skirt, Gender::Female)
            .with_baseline_dir("base");
        let chain = config.layout().params_chain(Stage::LowFrequency, None);
        let last = chain.candidates().last().unwrap().to_path_buf();
        assert_eq!(last, Path::new("ckpt/base/params.json"));
    }
}
