//! Axis-angle to rotation matrix conversion.

use nalgebra::{Matrix3, Vector3};

/// Angles below this are treated as no rotation.
pub const SMALL_ANGLE: f64 = 1e-8;

/// Converts an axis-angle vector (axis scaled by angle, radians) into a
/// rotation matrix with Rodrigues' formula.
///
/// Near-zero angles return the identity instead of dividing by the angle.
///
/// # Example
///
/// ```
/// use body_smpl::rodrigues;
/// use nalgebra::Vector3;
///
/// let r = rodrigues(&Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
/// let x = r * Vector3::x();
/// assert!((x - Vector3::y()).norm() < 1e-12);
/// ```
#[must_use]
pub fn rodrigues(axis_angle: &Vector3<f64>) -> Matrix3<f64> {
    let theta = axis_angle.norm();
    if theta < SMALL_ANGLE || !theta.is_finite() {
        return Matrix3::identity();
    }

    let axis = axis_angle / theta;
    let (sin, cos) = theta.sin_cos();
    let cross = axis.cross_matrix();

    Matrix3::identity() * cos + axis * axis.transpose() * (1.0 - cos) + cross * sin
}
