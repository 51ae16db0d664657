//! Error types for garment-models crate.

use garment_dataset::DatasetError;
use garment_types::TypesError;
use thiserror::Error;

/// Errors that can occur in garment-models operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Garment category has no entry in the masking table.
    #[error("unknown garment category: {0}")]
    UnknownCategory(String),

    /// Pose, shape and style batches disagree in size.
    #[error("batch size mismatch: {0}")]
    BatchSizeMismatch(String),

    /// No candidate in a fallback chain could be loaded.
    #[error("missing weights for {resource}; tried {}", .tried.join(", "))]
    MissingWeights {
        /// What was being resolved.
        resource: String,
        /// Every candidate path, in resolution order.
        tried: Vec<String>,
    },

    /// Kernel weights could not be normalized.
    #[error("degenerate kernel weights in row {row}: {reason}")]
    DegenerateKernelWeights {
        /// Batch row that failed.
        row: usize,
        /// Reason for failure.
        reason: String,
    },

    /// Shape mismatch between sub-models, basis or tensors.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// Invalid model configuration.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// Input tensor has the wrong feature width.
    #[error("invalid input {name}: expected {expected} features, got {actual}")]
    InvalidInput {
        /// Input name (`thetas`, `betas`, `gammas`).
        name: String,
        /// Declared feature width.
        expected: usize,
        /// Actual feature width.
        actual: usize,
    },

    /// Failed to load checkpoint.
    #[error("failed to load checkpoint from {path}: {reason}")]
    LoadCheckpoint {
        /// Path to the checkpoint file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to save checkpoint.
    #[error("failed to save checkpoint to {path}: {reason}")]
    SaveCheckpoint {
        /// Path to the checkpoint file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Unsupported checkpoint format.
    #[error("unsupported checkpoint format: {0}")]
    UnsupportedFormat(String),

    /// Dataset could not be read.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ModelError {
    /// Creates an unknown category error.
    #[must_use]
    pub fn unknown_category(name: impl Into<String>) -> Self {
        Self::UnknownCategory(name.into())
    }

    /// Creates a batch size mismatch error.
    #[must_use]
    pub fn batch_size_mismatch(detail: impl Into<String>) -> Self {
        Self::BatchSizeMismatch(detail.into())
    }

    /// Creates a missing weights error.
    #[must_use]
    pub fn missing_weights(resource: impl Into<String>, tried: Vec<String>) -> Self {
        Self::MissingWeights {
            resource: resource.into(),
            tried,
        }
    }

    /// Creates a degenerate kernel weights error.
    #[must_use]
    pub fn degenerate_kernel_weights(row: usize, reason: impl Into<String>) -> Self {
        Self::DegenerateKernelWeights {
            row,
            reason: reason.into(),
        }
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::InvalidInput {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Creates a load checkpoint error.
    #[must_use]
    pub fn load_checkpoint(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadCheckpoint {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a save checkpoint error.
    #[must_use]
    pub fn save_checkpoint(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SaveCheckpoint {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported format error.
    #[must_use]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization(reason.into())
    }
}

impl From<TypesError> for ModelError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::UnknownCategory(name) => Self::UnknownCategory(name),
            TypesError::ShapeMismatch { expected, actual } => {
                Self::ShapeMismatch { expected, actual }
            }
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for garment-models operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_unknown_category() {
        let err = ModelError::unknown_category("cape");
        assert!(err.to_string().contains("cape"));
    }

    #[test]
    fn error_batch_size_mismatch() {
        let err = ModelError::batch_size_mismatch("betas 2, thetas 3, gammas 2");
        assert!(err.to_string().contains("thetas 3"));
    }

    #[test]
    fn error_missing_weights_lists_candidates() {
        let err = ModelError::missing_weights(
            "tn_orig_lf weights",
            vec!["a/lin.bin".to_string(), "b/lin.bin".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("tn_orig_lf weights"));
        assert!(msg.contains("a/lin.bin, b/lin.bin"));
    }

    #[test]
    fn error_degenerate_kernel_weights() {
        let err = ModelError::degenerate_kernel_weights(3, "non-finite distance");
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("non-finite distance"));
    }

    #[test]
    fn error_shape_mismatch() {
        let err = ModelError::shape_mismatch("[2, 100, 3]", "[2, 99, 3]");
        assert!(err.to_string().contains("[2, 100, 3]"));
        assert!(err.to_string().contains("[2, 99, 3]"));
    }

    #[test]
    fn error_invalid_input() {
        let err = ModelError::invalid_input("thetas", 72, 69);
        let msg = err.to_string();
        assert!(msg.contains("thetas"));
        assert!(msg.contains("72"));
        assert!(msg.contains("69"));
    }

    #[test]
    fn error_load_checkpoint() {
        let err = ModelError::load_checkpoint("lin.bin", "file corrupted");
        assert!(err.to_string().contains("lin.bin"));
        assert!(err.to_string().contains("file corrupted"));
    }

    #[test]
    fn error_save_checkpoint() {
        let err = ModelError::save_checkpoint("lin.bin", "disk full");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn error_unsupported_format() {
        let err = ModelError::unsupported_format("lin.pth.tar");
        assert!(err.to_string().contains("lin.pth.tar"));
    }

    #[test]
    fn error_from_types_error_keeps_category() {
        let err: ModelError = TypesError::unknown_category("cape").into();
        assert!(matches!(err, ModelError::UnknownCategory(ref c) if c == "cape"));

        let err: ModelError = TypesError::shape_mismatch("3", "4").into();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));

        let err: ModelError = TypesError::invalid_pivot("bad").into();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }

    #[test]
    fn error_from_dataset_error() {
        let err: ModelError = DatasetError::pivots_not_found("pivots.txt").into();
        assert!(matches!(err, ModelError::Dataset(_)));
        assert!(err.to_string().contains("pivots.txt"));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: ModelError = io_err.into();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn error_from_serde_error() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: ModelError = json_err.into();
        assert!(matches!(err, ModelError::Serialization(_)));
    }
}
