//! Checkpoint persistence for network weights.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinFileRecorder, FullPrecisionSettings, PrettyJsonFileRecorder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};

/// Supported checkpoint file formats.
///
/// # Example
///
/// ```
/// use garment_models::CheckpointFormat;
///
/// let format = CheckpointFormat::from_extension("bin");
/// assert_eq!(format, Some(CheckpointFormat::Binary));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckpointFormat {
    /// Binary format - compact and fast.
    ///
    /// Uses Burn's `BinFileRecorder` with full precision.
    #[default]
    Binary,

    /// JSON format - human-readable.
    ///
    /// Uses Burn's `PrettyJsonFileRecorder`. Larger, but diffable.
    Json,
}

impl CheckpointFormat {
    /// Every format, in lookup preference order.
    pub const ALL: [Self; 2] = [Self::Binary, Self::Json];

    /// Determines format from file extension.
    ///
    /// - `.bin` -> Binary
    /// - `.json` -> Json
    /// - Other -> None
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bin" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Determines format from file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }

    /// Returns the format name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Saves a module's weights.
///
/// `path` is given without extension; the format's extension is appended and
/// missing parent directories are created.
///
/// # Returns
///
/// The full path of the written file.
///
/// # Errors
///
/// Returns [`ModelError::SaveCheckpoint`] if writing fails.
///
/// # Example
///
/// ```no_run
/// use burn_ndarray::NdArray;
/// use garment_models::{CheckpointFormat, Mlp, MlpConfig, save_checkpoint};
///
/// let model = Mlp::<NdArray<f32>>::new(&MlpConfig::new(72, 30), &Default::default());
/// let path = save_checkpoint::<NdArray<f32>, _>(&model, "weights/lin", CheckpointFormat::Json)?;
/// assert!(path.ends_with("lin.json"));
/// # Ok::<(), garment_models::ModelError>(())
/// ```
pub fn save_checkpoint<B, M>(
    model: &M,
    path: impl AsRef<Path>,
    format: CheckpointFormat,
) -> Result<PathBuf>
where
    B: Backend,
    M: Module<B>,
{
    let full_path = path.as_ref().with_extension(format.extension());
    let shown = full_path.display().to_string();

    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ModelError::save_checkpoint(&shown, e.to_string()))?;
    }

    let saved = match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model.clone().save_file(full_path.clone(), &recorder)
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model.clone().save_file(full_path.clone(), &recorder)
        }
    };
    saved.map_err(|e| ModelError::save_checkpoint(&shown, e.to_string()))?;

    debug!(path = %shown, format = %format, "Saved checkpoint");
    Ok(full_path)
}

/// Loads weights into `model` from a `.bin` or `.json` checkpoint.
///
/// # Errors
///
/// - [`ModelError::UnsupportedFormat`] if the extension is not recognized
/// - [`ModelError::LoadCheckpoint`] if the file is missing or unreadable
pub fn load_checkpoint<B, M>(model: M, path: impl AsRef<Path>, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    let path = path.as_ref();
    let shown = path.display().to_string();

    let format =
        CheckpointFormat::from_path(path).ok_or_else(|| ModelError::unsupported_format(&shown))?;
    if !path.exists() {
        return Err(ModelError::load_checkpoint(&shown, "file not found"));
    }

    let loaded = match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model.load_file(path, &recorder, device)
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model.load_file(path, &recorder, device)
        }
    };

    loaded.map_err(|e| ModelError::load_checkpoint(&shown, e.to_string()))
}
