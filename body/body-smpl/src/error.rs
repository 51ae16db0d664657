//! Error types for the body model.

use thiserror::Error;

/// Errors that can occur while loading or evaluating the body model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SmplError {
    /// A model array has the wrong size.
    #[error("invalid model data {field}: expected {expected}, got {actual}")]
    InvalidData {
        /// Field name.
        field: String,
        /// Expected size.
        expected: String,
        /// Actual size.
        actual: String,
    },

    /// The kinematic tree is malformed.
    #[error("invalid kinematic tree: joint {joint} has parent {parent}")]
    InvalidParent {
        /// Joint index.
        joint: usize,
        /// Declared parent.
        parent: i32,
    },

    /// A forward-pass input has the wrong width or is not finite.
    #[error("invalid input {name}: expected {expected} values, got {actual}")]
    InvalidInput {
        /// Input name.
        name: &'static str,
        /// Expected width.
        expected: usize,
        /// Actual width.
        actual: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SmplError {
    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid_data(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidData {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub const fn invalid_input(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidInput {
            name,
            expected,
            actual,
        }
    }
}

impl From<std::io::Error> for SmplError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SmplError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for body model operations.
pub type Result<T> = std::result::Result<T, SmplError>;
