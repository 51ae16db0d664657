//! Garment dataset access for GarmentForge.
//!
//! This crate reads the per-instance metadata a garment predictor needs at
//! construction time:
//!
//! - [`GarmentDataset`] - Pivot list plus canonical-pose basis
//! - [`DatasetLayout`] - Path conventions under the dataset root
//!
//! # Layout
//!
//! ```text
//! {root}/{category}_{gender}/pivots.txt                  one "shape style" pair per line
//! {root}/{category}_{gender}/unposed/{shape}_{style}.json  [[x, y, z], ...]
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no tensor dependencies**. Loading happens
//! once at predictor construction; nothing here is on the inference path.
//!
//! # Example
//!
//! ```no_run
//! use garment_dataset::GarmentDataset;
//! use garment_types::{GarmentCategory, Gender};
//!
//! let dataset = GarmentDataset::open("dataset", GarmentCategory::TShirt, Gender::Female)?;
//! println!("{} pivots, {} vertices", dataset.pivots().len(), dataset.vertex_count());
//! # Ok::<(), garment_dataset::DatasetError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod dataset;
mod error;
mod layout;

// Re-export dataset types
pub use dataset::GarmentDataset;
pub use layout::{DatasetLayout, PIVOTS_FILE, UNPOSED_DIR};

// Re-export error types
pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{DatasetError, DatasetLayout, GarmentDataset};
}
