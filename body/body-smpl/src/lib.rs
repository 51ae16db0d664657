//! SMPL body model for GarmentForge.
//!
//! Garment predictors are driven by the same shape (β) and pose (θ)
//! parameters that define an SMPL body. This crate evaluates the body itself
//! so garments can be rendered or checked against it.
//!
//! # Forward Pass
//!
//! 1. Shape blend: `v_template + shapedirs · β`
//! 2. Joint regression from the shaped vertices
//! 3. Per-joint Rodrigues rotation from θ
//! 4. Pose blend on `R_j − I` (skipped when `simplify` is set)
//! 5. Kinematic chain composition and rest-joint removal
//! 6. Linear blend skinning, then translation
//!
//! - [`SmplData`] - Serialized model arrays
//! - [`SmplModel`] - Validated model with [`SmplModel::forward`]
//! - [`SmplOutput`] - Posed vertices, joints and faces
//! - [`rodrigues`] - Axis-angle to rotation matrix
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no tensor dependencies**. Per-vertex work
//! runs in parallel with `rayon`.
//!
//! # Example
//!
//! ```no_run
//! use body_smpl::{POSE_DIM, SHAPE_DIM, SmplModel};
//! use nalgebra::Vector3;
//!
//! let model = SmplModel::from_file("smpl/male.json")?;
//! let mut thetas = [0.0; POSE_DIM];
//! thetas[55] = 0.6; // left elbow, y axis
//! let body = model.forward(&[0.0; SHAPE_DIM], &thetas, Some(Vector3::new(0.0, 0.2, 0.0)), false)?;
//! assert_eq!(body.vertices.len(), model.vertex_count());
//! # Ok::<(), body_smpl::SmplError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod data;
mod error;
mod model;
mod rodrigues;

// Re-export model types
pub use data::{JOINT_COUNT, POSE_BLEND_DIM, POSE_DIM, SHAPE_DIM, SMPL_PARENTS, SmplData};
pub use model::{SmplModel, SmplOutput};
pub use rodrigues::{SMALL_ANGLE, rodrigues};

// Re-export error types
pub use error::{Result, SmplError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{SmplData, SmplError, SmplModel, SmplOutput};
}
