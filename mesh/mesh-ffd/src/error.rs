//! Error types for lattice deformation.

use thiserror::Error;

/// Errors that can occur while configuring or applying a lattice deformation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FfdError {
    /// Lattice dimensions are invalid.
    #[error("invalid lattice dimensions: {0}")]
    InvalidLatticeDimensions(String),

    /// Displacement arrays do not match the lattice size.
    #[error("displacement array {axis} has {actual} entries, lattice has {expected}")]
    DisplacementLength {
        /// Axis name (`mu_x`, `mu_y` or `mu_z`).
        axis: &'static str,
        /// Number of control points.
        expected: usize,
        /// Number of entries found.
        actual: usize,
    },

    /// Control point index is outside the lattice.
    #[error("control point ({i}, {j}, {k}) outside lattice {dims:?}")]
    ControlPointOutOfRange {
        /// Index along x.
        i: usize,
        /// Index along y.
        j: usize,
        /// Index along z.
        k: usize,
        /// Lattice dimensions.
        dims: [usize; 3],
    },

    /// Bounding box is degenerate or not finite.
    #[error("invalid lattice box: {0}")]
    InvalidBox(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl FfdError {
    /// Creates an invalid lattice dimensions error.
    #[must_use]
    pub fn invalid_lattice(reason: impl Into<String>) -> Self {
        Self::InvalidLatticeDimensions(reason.into())
    }

    /// Creates an invalid box error.
    #[must_use]
    pub fn invalid_box(reason: impl Into<String>) -> Self {
        Self::InvalidBox(reason.into())
    }

    /// Creates a control point out-of-range error.
    #[must_use]
    pub const fn out_of_range(i: usize, j: usize, k: usize, dims: [usize; 3]) -> Self {
        Self::ControlPointOutOfRange { i, j, k, dims }
    }
}

impl From<std::io::Error> for FfdError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FfdError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for lattice deformation.
pub type Result<T> = std::result::Result<T, FfdError>;
