//! Fixed feature widths of the body and garment parameter vectors.

/// Number of body joints in the pose vector.
pub const JOINT_COUNT: usize = 24;

/// Rotation components per joint (axis-angle).
pub const JOINT_DOF: usize = 3;

/// Width of the pose vector θ.
pub const POSE_DIM: usize = JOINT_COUNT * JOINT_DOF;

/// Width of the shape vector β.
pub const SHAPE_DIM: usize = 10;

/// Width of the style vector γ.
pub const STYLE_DIM: usize = 4;

/// Coordinates per vertex.
pub const VERTEX_DIM: usize = 3;
