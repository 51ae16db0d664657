//! Error types for garment-types crate.

use thiserror::Error;

/// Errors that can occur when building or parsing garment types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// Garment category is not part of the enumeration or relevance table.
    #[error("unknown garment category: {0}")]
    UnknownCategory(String),

    /// Gender string is not recognized.
    #[error("unknown gender: {0}")]
    UnknownGender(String),

    /// Pivot description could not be parsed.
    #[error("invalid pivot: {0}")]
    InvalidPivot(String),

    /// Array dimensions disagree with the declared shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },
}

impl TypesError {
    /// Creates an unknown category error.
    #[must_use]
    pub fn unknown_category(name: impl Into<String>) -> Self {
        Self::UnknownCategory(name.into())
    }

    /// Creates an unknown gender error.
    #[must_use]
    pub fn unknown_gender(name: impl Into<String>) -> Self {
        Self::UnknownGender(name.into())
    }

    /// Creates an invalid pivot error.
    #[must_use]
    pub fn invalid_pivot(reason: impl Into<String>) -> Self {
        Self::InvalidPivot(reason.into())
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type for garment-types operations.
pub type Result<T> = std::result::Result<T, TypesError>;
