//! Free-Form Deformation (FFD) over a Bernstein control lattice.
//!
//! FFD deforms a point set by displacing the control points of a regular
//! lattice placed around it. Each point inside the lattice box moves by the
//! Bernstein-weighted sum of the control-point displacements, which keeps
//! the deformation smooth and topology-preserving.
//!
//! # Overview
//!
//! 1. Map each point into the unit lattice cube (translate, unrotate, scale)
//! 2. Points outside `[0, 1]^3` are left untouched
//! 3. Inside, add `Σ B_i(u) B_j(v) B_k(w) μ_ijk` and map back to world space

use nalgebra::{Point3, Rotation3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::params::FfdParams;

/// Anything that deforms a point set while preserving its length and order.
pub trait LatticeDeformer {
    /// Deforms `points`; the output has the same length and order.
    ///
    /// # Errors
    ///
    /// Returns an error if the deformer cannot be applied to the points.
    fn deform(&self, points: &[Point3<f64>]) -> Result<Vec<Point3<f64>>>;

    /// Deforms single-precision vertex arrays, such as a garment mesh
    /// after its displacement field was applied.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`LatticeDeformer::deform`].
    #[allow(clippy::cast_possible_truncation)]
    fn deform_vertices(&self, vertices: &[[f32; 3]]) -> Result<Vec<[f32; 3]>> {
        let points: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
            .collect();
        Ok(self
            .deform(&points)?
            .into_iter()
            .map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect())
    }
}

/// Bernstein free-form deformation.
///
/// # Example
///
/// ```
/// use mesh_ffd::{FfdParams, FreeFormDeformation, LatticeDeformer};
/// use nalgebra::{Point3, Vector3};
///
/// let mut params = FfdParams::default();
/// params.displace(1, 1, 1, Vector3::new(0.0, 0.0, 0.5)).unwrap();
///
/// let ffd = FreeFormDeformation::new(params).unwrap();
/// let out = ffd.deform(&[Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 0.0, 0.0)]).unwrap();
///
/// assert!((out[0].z - 1.5).abs() < 1e-12);
/// assert_eq!(out[1], Point3::new(2.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct FreeFormDeformation {
    params: FfdParams,
    rotation: Rotation3<f64>,
    origin: Vector3<f64>,
    length: Vector3<f64>,
}

impl FreeFormDeformation {
    /// Creates a deformation from validated parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if [`FfdParams::validate`] fails.
    pub fn new(params: FfdParams) -> Result<Self> {
        params.validate()?;
        let [rx, ry, rz] = params.rotation;
        let rotation = Rotation3::from_euler_angles(rx, ry, rz);
        let origin = Vector3::from(params.box_origin);
        let length = Vector3::from(params.box_length);

        debug!(
            control_points = ?params.control_points,
            origin = ?params.box_origin,
            length = ?params.box_length,
            "Created free-form deformation"
        );

        Ok(Self {
            params,
            rotation,
            origin,
            length,
        })
    }

    /// Creates an undisplaced lattice fitted to the bounding box of `points`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lattice dimensions are invalid or the points
    /// are empty.
    pub fn fitted(control_points: [usize; 3], points: &[Point3<f64>]) -> Result<Self> {
        let mut params = FfdParams::new(control_points)?;
        params.fit_to_points(points)?;
        Self::new(params)
    }

    /// Returns the lattice parameters.
    #[must_use]
    pub const fn params(&self) -> &FfdParams {
        &self.params
    }

    /// Maps a world point into lattice coordinates (unit cube for the box).
    #[must_use]
    pub fn to_lattice(&self, point: &Point3<f64>) -> Vector3<f64> {
        let local = self.rotation.inverse_transform_vector(&(point.coords - self.origin));
        local.component_div(&self.length)
    }

    /// Maps lattice coordinates back to world space.
    #[must_use]
    pub fn to_world(&self, lattice: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * lattice.component_mul(&self.length) + self.origin)
    }

    /// World positions of the displaced control points, x varying fastest.
    #[must_use]
    pub fn control_point_positions(&self) -> Vec<Point3<f64>> {
        let [nx, ny, nz] = self.params.control_points;
        let mut positions = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let rest = Vector3::new(grid_param(i, nx), grid_param(j, ny), grid_param(k, nz));
                    let mu = self.params.displacement(i, j, k).unwrap_or_default();
                    positions.push(self.to_world(&(rest + mu)));
                }
            }
        }
        positions
    }

    /// Deforms one point; returns it unchanged if it lies outside the box.
    #[must_use]
    pub fn deform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let uvw = self.to_lattice(point);
        if !inside_unit_cube(&uvw) {
            return *point;
        }
        self.to_world(&(uvw + self.lattice_shift(&uvw)))
    }

    /// Bernstein-weighted displacement at lattice coordinates `uvw`.
    fn lattice_shift(&self, uvw: &Vector3<f64>) -> Vector3<f64> {
        let [nx, ny, nz] = self.params.control_points;
        let bu = bernstein_row(nx - 1, uvw.x);
        let bv = bernstein_row(ny - 1, uvw.y);
        let bw = bernstein_row(nz - 1, uvw.z);

        let mut shift = Vector3::zeros();
        for (k, wk) in bw.iter().enumerate() {
            for (j, wj) in bv.iter().enumerate() {
                let row = j * nx + k * nx * ny;
                for (i, wi) in bu.iter().enumerate() {
                    let weight = wi * wj * wk;
                    let idx = row + i;
                    shift += Vector3::new(
                        self.params.mu_x[idx],
                        self.params.mu_y[idx],
                        self.params.mu_z[idx],
                    ) * weight;
                }
            }
        }
        shift
    }
}

impl LatticeDeformer for FreeFormDeformation {
    fn deform(&self, points: &[Point3<f64>]) -> Result<Vec<Point3<f64>>> {
        let deformed: Vec<Point3<f64>> = points
            .par_iter()
            .map(|p| self.deform_point(p))
            .collect();

        debug!(points = points.len(), "Applied free-form deformation");
        Ok(deformed)
    }
}

fn inside_unit_cube(uvw: &Vector3<f64>) -> bool {
    uvw.iter().all(|c| (0.0..=1.0).contains(c))
}

#[allow(clippy::cast_precision_loss)]
fn grid_param(index: usize, count: usize) -> f64 {
    index as f64 / (count - 1) as f64
}

fn bernstein_row(degree: usize, t: f64) -> Vec<f64> {
    (0..=degree).map(|i| bernstein_basis(degree, i, t)).collect()
}

/// Computes the Bernstein basis polynomial `B_{i,n}(t)`.
///
/// # Arguments
///
/// * `n` - The degree of the polynomial
/// * `i` - The index (0 to n)
/// * `t` - The parameter (0 to 1)
#[must_use]
pub fn bernstein_basis(n: usize, i: usize, t: f64) -> f64 {
    if i > n {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let coeff = binomial(n, i) as f64;
    let ti = t.powi(exponent(i));
    let one_minus_t = (1.0 - t).powi(exponent(n - i));
    coeff * ti * one_minus_t
}

fn exponent(power: usize) -> i32 {
    i32::try_from(power).unwrap_or(i32::MAX)
}

/// Computes the binomial coefficient `C(n, k)`, saturating at `usize::MAX`.
#[must_use]
pub const fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    if k == 0 || k == n {
        return 1;
    }

    // Use the smaller k
    let k = if k < n - k { k } else { n - k };

    let mut result: usize = 1;
    let mut idx = 0;
    while idx < k {
        result = match result.checked_mul(n - idx) {
            Some(product) => product / (idx + 1),
            None => return usize::MAX,
        };
        idx += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.25, 0.75, 0.1),
            Point3::new(0.9, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_binomial_coefficients() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(4, 1), 4);
        assert_eq!(binomial(4, 2), 6);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(10, 5), 252);
        assert_eq!(binomial(3, 5), 0);
        assert_eq!(binomial(31, 15), 300_540_195);
        assert_eq!(binomial(200, 100), usize::MAX);
    }

    #[test]
    fn test_bernstein_at_endpoints() {
        assert_relative_eq!(bernstein_basis(3, 0, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bernstein_basis(3, 3, 0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bernstein_basis(3, 0, 1.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bernstein_basis(3, 3, 1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bernstein_basis(3, 4, 0.5), 0.0);
    }

    #[test]
    fn test_bernstein_partition_of_unity() {
        for n in 1..=5 {
            for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let sum: f64 = bernstein_row(n, t).iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_undisplaced_lattice_is_identity() {
        let params = FfdParams::new([4, 3, 2])
            .unwrap()
            .with_box([-1.0, -1.0, -1.0], [3.0, 3.0, 3.0])
            .with_rotation([0.2, -0.4, 0.7]);
        let ffd = FreeFormDeformation::new(params).unwrap();

        let points = sample_points();
        let out = ffd.deform(&points).unwrap();
        assert_eq!(out.len(), points.len());
        for (a, b) in points.iter().zip(&out) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_outside_points_unchanged() {
        let mut params = FfdParams::default();
        for (i, j, k) in [(0, 0, 0), (1, 1, 1), (1, 0, 1)] {
            params.displace(i, j, k, Vector3::new(0.3, 0.3, 0.3)).unwrap();
        }
        let ffd = FreeFormDeformation::new(params).unwrap();

        let outside = [Point3::new(-0.1, 0.5, 0.5), Point3::new(0.5, 1.01, 0.5)];
        let out = ffd.deform(&outside).unwrap();
        assert_eq!(out, outside);
    }

    #[test]
    fn test_corner_follows_its_control_point() {
        let mut params = FfdParams::default().with_box([1.0, 2.0, 3.0], [2.0, 4.0, 1.0]);
        params.displace(1, 1, 1, Vector3::new(0.5, 0.0, -0.25)).unwrap();
        let ffd = FreeFormDeformation::new(params).unwrap();

        let corner = Point3::new(3.0, 6.0, 4.0);
        let moved = ffd.deform_point(&corner);
        // Lattice units scale by the box edge lengths
        assert_relative_eq!(moved, Point3::new(4.0, 6.0, 3.75), epsilon = 1e-12);

        let opposite = Point3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(ffd.deform_point(&opposite), opposite, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_displacement_translates() {
        let mut params = FfdParams::new([3, 3, 3]).unwrap();
        for k in 0..3 {
            for j in 0..3 {
                for i in 0..3 {
                    params.displace(i, j, k, Vector3::new(0.1, 0.0, 0.0)).unwrap();
                }
            }
        }
        let ffd = FreeFormDeformation::new(params).unwrap();
        for p in sample_points() {
            let moved = ffd.deform_point(&p);
            assert_relative_eq!(moved, p + Vector3::new(0.1, 0.0, 0.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotated_box_round_trip() {
        let params = FfdParams::default()
            .with_box([0.5, 0.0, 0.0], [1.0, 2.0, 0.5])
            .with_rotation([0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        let ffd = FreeFormDeformation::new(params).unwrap();

        let p = Point3::new(0.2, 0.3, 0.1);
        let uvw = ffd.to_lattice(&p);
        assert_relative_eq!(ffd.to_world(&uvw), p, epsilon = 1e-12);
    }

    #[test]
    fn test_control_point_positions() {
        let mut params = FfdParams::default().with_box([0.0; 3], [2.0, 2.0, 2.0]);
        params.displace(1, 0, 0, Vector3::new(0.5, 0.0, 0.0)).unwrap();
        let ffd = FreeFormDeformation::new(params).unwrap();

        let positions = ffd.control_point_positions();
        assert_eq!(positions.len(), 8);
        assert_relative_eq!(positions[0], Point3::origin());
        assert_relative_eq!(positions[1], Point3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(positions[7], Point3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_fitted_lattice_covers_points() {
        let points = vec![Point3::new(-1.0, 0.0, 2.0), Point3::new(1.0, 3.0, 4.0)];
        let ffd = FreeFormDeformation::fitted([2, 2, 2], &points).unwrap();
        for p in &points {
            let uvw = ffd.to_lattice(p);
            assert!(inside_unit_cube(&uvw));
        }
    }

    #[test]
    fn test_deform_vertices_f32() {
        let mut params = FfdParams::default();
        params.displace(0, 0, 0, Vector3::new(0.0, 0.0, 0.5)).unwrap();
        let ffd = FreeFormDeformation::new(params).unwrap();

        let out = ffd.deform_vertices(&[[0.0, 0.0, 0.0], [5.0, 5.0, 5.0]]).unwrap();
        assert_relative_eq!(out[0][2], 0.5, epsilon = 1e-6);
        assert_eq!(out[1], [5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = FfdParams::default().with_box([0.0; 3], [1.0, -1.0, 1.0]);
        assert!(FreeFormDeformation::new(params).is_err());
    }
}
