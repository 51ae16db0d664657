//! Garment types for GarmentForge.
//!
//! This crate provides the plain data types shared by the garment
//! deformation pipeline:
//!
//! # Identity Types
//!
//! - [`GarmentCategory`] - Closed set of garment kinds (`t-shirt`, `pant`, ...)
//! - [`Gender`] - Body gender a model was trained for
//! - [`Pivot`] / [`PivotSet`] - Ordered (shape, style) reference configurations
//!
//! # Input Masking
//!
//! - [`MaskTable`] - Immutable category → relevant-input map
//! - [`CategoryRelevance`] - Relevant joints, shape and style indices
//!
//! # Geometry Containers
//!
//! - [`CanonicalBasis`] - Per-pivot rest vertices `[P, V, 3]`
//! - [`DisplacementField`] - Host-side displacement `[N, V, 3]`
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no tensor or I/O dependencies**. It can be
//! used by dataset tools, inference services and geometry collaborators alike.
//!
//! # Example
//!
//! ```
//! use garment_types::{GarmentCategory, MaskTable, POSE_DIM};
//!
//! let table = MaskTable::standard();
//! let shirt = table.relevance(GarmentCategory::Shirt).unwrap();
//! let mask = shirt.pose_mask();
//!
//! assert_eq!(mask.len(), POSE_DIM);
//! // Joint 20 (left wrist) matters for long sleeves
//! assert_eq!(mask[60], 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod basis;
mod category;
mod dims;
mod error;
mod field;
mod pivot;
mod relevance;

// Re-export identity types
pub use category::{GarmentCategory, Gender, instance_name};
pub use pivot::{Pivot, PivotSet};

// Re-export masking types
pub use relevance::{CategoryRelevance, LEGACY_STYLE_OFFSET, MaskTable};

// Re-export geometry containers
pub use basis::CanonicalBasis;
pub use field::DisplacementField;

// Re-export dimensions
pub use dims::{JOINT_COUNT, JOINT_DOF, POSE_DIM, SHAPE_DIM, STYLE_DIM, VERTEX_DIM};

// Re-export error types
pub use error::{Result, TypesError};
