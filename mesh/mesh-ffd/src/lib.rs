//! Lattice deformation for GarmentForge meshes.
//!
//! This crate provides the deformation-lattice collaborator that post-processes
//! predicted garment vertices: a Bernstein free-form deformation (FFD) over a
//! regular grid of control points.
//!
//! # Free-Form Deformation
//!
//! A box-shaped lattice is placed around the geometry (explicitly, from a
//! JSON parameter file, or fitted to the points' bounding box). Displacing
//! its control points smoothly deforms every point inside the box; points
//! outside are left where they are.
//!
//! - [`FfdParams`] - Lattice resolution, box placement, control displacements
//! - [`FreeFormDeformation`] - Applies the lattice to point sets
//! - [`LatticeDeformer`] - Trait seam for deformers
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no tensor dependencies**. It operates on
//! plain `nalgebra` points and processes them in parallel with `rayon`.
//!
//! # Example
//!
//! ```
//! use mesh_ffd::{FfdParams, FreeFormDeformation, LatticeDeformer};
//! use nalgebra::{Point3, Vector3};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 1.0),
//! ];
//!
//! let mut params = FfdParams::default();
//! params.fit_to_points(&vertices)?;
//! // Lift the top corner of the lattice
//! params.displace(1, 1, 1, Vector3::new(0.0, 0.0, 0.5))?;
//!
//! let ffd = FreeFormDeformation::new(params)?;
//! let deformed = ffd.deform(&vertices)?;
//!
//! assert_eq!(deformed.len(), vertices.len());
//! assert!(deformed[2].z > vertices[2].z);
//! # Ok::<(), mesh_ffd::FfdError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod ffd;
mod params;

// Re-export deformation types
pub use ffd::{FreeFormDeformation, LatticeDeformer, bernstein_basis, binomial};
pub use params::{FfdParams, MAX_CONTROL_POINTS};

// Re-export error types
pub use error::{FfdError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{FfdError, FfdParams, FreeFormDeformation, LatticeDeformer};
}
