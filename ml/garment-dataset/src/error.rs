//! Error types for garment-dataset crate.

use garment_types::TypesError;
use thiserror::Error;

/// Errors that can occur while reading a garment dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Pivot metadata file does not exist.
    #[error("pivot list not found: {0}")]
    PivotsNotFound(String),

    /// Pivot metadata could not be parsed.
    #[error("invalid pivot list {path}: {reason}")]
    InvalidPivots {
        /// Path to the pivot list.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Pivot list has no entries.
    #[error("pivot list is empty: {0}")]
    EmptyPivotSet(String),

    /// Canonical rest vertices for a pivot are missing.
    #[error("canonical basis not found for pivot {pivot}: {path}")]
    BasisNotFound {
        /// Pivot directory name.
        pivot: String,
        /// Expected file path.
        path: String,
    },

    /// Pivots disagree on vertex count.
    #[error("inconsistent vertex count: pivot {pivot} has {actual}, expected {expected}")]
    InconsistentVertexCount {
        /// Pivot directory name.
        pivot: String,
        /// Vertex count of the first pivot.
        expected: usize,
        /// Vertex count of this pivot.
        actual: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error from shared garment types.
    #[error(transparent)]
    Types(#[from] TypesError),
}

impl DatasetError {
    /// Creates a pivots-not-found error.
    #[must_use]
    pub fn pivots_not_found(path: impl Into<String>) -> Self {
        Self::PivotsNotFound(path.into())
    }

    /// Creates an invalid pivots error.
    #[must_use]
    pub fn invalid_pivots(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPivots {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a basis-not-found error.
    #[must_use]
    pub fn basis_not_found(pivot: impl Into<String>, path: impl Into<String>) -> Self {
        Self::BasisNotFound {
            pivot: pivot.into(),
            path: path.into(),
        }
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

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for garment-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
