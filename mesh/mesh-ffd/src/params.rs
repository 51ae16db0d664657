//! Lattice parameters: box placement and control-point displacements.

use std::path::Path;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FfdError, Result};

/// Smallest box extent accepted along any axis.
const MIN_EXTENT: f64 = 1e-10;

/// Most control points accepted along one axis.
pub const MAX_CONTROL_POINTS: usize = 32;

/// Free-form deformation parameters.
///
/// The lattice is a box placed at `box_origin` with edge lengths
/// `box_length`, rotated by `rotation` (Euler XYZ, radians) about its origin.
/// Each control point carries a displacement in lattice-normalized units,
/// stored per axis and flattened with `i` (x) varying fastest.
///
/// # Example
///
/// ```
/// use mesh_ffd::FfdParams;
/// use nalgebra::Vector3;
///
/// let mut params = FfdParams::new([3, 2, 2]).unwrap();
/// params.displace(2, 1, 1, Vector3::new(0.0, 0.0, 0.25)).unwrap();
/// assert_eq!(params.displacement(2, 1, 1), Some(Vector3::new(0.0, 0.0, 0.25)));
/// assert!(params.displace(3, 0, 0, Vector3::zeros()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FfdParams {
    /// Control points along x, y and z (each in `2..=MAX_CONTROL_POINTS`).
    pub control_points: [usize; 3],

    /// Lattice box origin in world coordinates.
    #[serde(default)]
    pub box_origin: [f64; 3],

    /// Lattice box edge lengths.
    #[serde(default = "unit_box")]
    pub box_length: [f64; 3],

    /// Box rotation about its origin, Euler XYZ in radians.
    #[serde(default)]
    pub rotation: [f64; 3],

    /// Control-point displacements along x.
    #[serde(default)]
    pub mu_x: Vec<f64>,

    /// Control-point displacements along y.
    #[serde(default)]
    pub mu_y: Vec<f64>,

    /// Control-point displacements along z.
    #[serde(default)]
    pub mu_z: Vec<f64>,
}

const fn unit_box() -> [f64; 3] {
    [1.0; 3]
}

impl Default for FfdParams {
    fn default() -> Self {
        Self::zeroed([2, 2, 2])
    }
}

impl FfdParams {
    /// Creates an undisplaced unit lattice with the given resolution.
    ///
    /// # Errors
    ///
    /// Returns [`FfdError::InvalidLatticeDimensions`] if any dimension is
    /// outside `2..=MAX_CONTROL_POINTS`.
    pub fn new(control_points: [usize; 3]) -> Result<Self> {
        check_dims(control_points)?;
        Ok(Self::zeroed(control_points))
    }

    fn zeroed(control_points: [usize; 3]) -> Self {
        let count = control_points.iter().product();
        Self {
            control_points,
            box_origin: [0.0; 3],
            box_length: unit_box(),
            rotation: [0.0; 3],
            mu_x: vec![0.0; count],
            mu_y: vec![0.0; count],
            mu_z: vec![0.0; count],
        }
    }

    /// Sets the box origin and edge lengths.
    #[must_use]
    pub const fn with_box(mut self, origin: [f64; 3], length: [f64; 3]) -> Self {
        self.box_origin = origin;
        self.box_length = length;
        self
    }

    /// Sets the box rotation (Euler XYZ, radians).
    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f64; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Loads parameters from a JSON file.
    ///
    /// Missing displacement arrays are filled with zeros.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails [`FfdParams::validate`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut params: Self = serde_json::from_str(&contents)?;
        check_dims(params.control_points)?;

        let count = params.control_point_count();
        for mu in [&mut params.mu_x, &mut params.mu_y, &mut params.mu_z] {
            if mu.is_empty() {
                mu.resize(count, 0.0);
            }
        }
        params.validate()?;

        debug!(
            path = %path.display(),
            control_points = ?params.control_points,
            "Loaded lattice parameters"
        );
        Ok(params)
    }

    /// Saves parameters to a pretty-printed JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Checks dimensions, box extents and displacement array lengths.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        check_dims(self.control_points)?;

        let finite = self
            .box_origin
            .iter()
            .chain(&self.box_length)
            .chain(&self.rotation)
            .all(|v| v.is_finite());
        if !finite {
            return Err(FfdError::invalid_box("non-finite box parameter"));
        }
        if let Some(len) = self.box_length.iter().find(|&&len| len <= MIN_EXTENT) {
            return Err(FfdError::invalid_box(format!("edge length {len} must be positive")));
        }

        let expected = self.control_point_count();
        for (axis, mu) in [("mu_x", &self.mu_x), ("mu_y", &self.mu_y), ("mu_z", &self.mu_z)] {
            if mu.len() != expected {
                return Err(FfdError::DisplacementLength {
                    axis,
                    expected,
                    actual: mu.len(),
                });
            }
        }
        Ok(())
    }

    /// Total number of control points.
    #[must_use]
    pub fn control_point_count(&self) -> usize {
        self.control_points.iter().product()
    }

    /// Flat index of control point `(i, j, k)`, x varying fastest.
    #[must_use]
    pub const fn index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [nx, ny, nz] = self.control_points;
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        Some(i + j * nx + k * nx * ny)
    }

    /// Displacement of control point `(i, j, k)` in lattice units.
    #[must_use]
    pub fn displacement(&self, i: usize, j: usize, k: usize) -> Option<Vector3<f64>> {
        let idx = self.index(i, j, k)?;
        Some(Vector3::new(
            *self.mu_x.get(idx)?,
            *self.mu_y.get(idx)?,
            *self.mu_z.get(idx)?,
        ))
    }

    /// Adds `delta` (lattice units) to the displacement of control point
    /// `(i, j, k)`.
    ///
    /// # Errors
    ///
    /// Returns [`FfdError::ControlPointOutOfRange`] if the index is outside
    /// the lattice.
    pub fn displace(&mut self, i: usize, j: usize, k: usize, delta: Vector3<f64>) -> Result<()> {
        let idx = self
            .index(i, j, k)
            .filter(|&idx| idx < self.mu_x.len() && idx < self.mu_y.len() && idx < self.mu_z.len())
            .ok_or_else(|| FfdError::out_of_range(i, j, k, self.control_points))?;

        self.mu_x[idx] += delta.x;
        self.mu_y[idx] += delta.y;
        self.mu_z[idx] += delta.z;
        Ok(())
    }

    /// Clears every control-point displacement.
    pub fn reset(&mut self) {
        for mu in [&mut self.mu_x, &mut self.mu_y, &mut self.mu_z] {
            mu.fill(0.0);
        }
    }

    /// Places an unrotated box on the bounding box of `points`.
    ///
    /// Flat extents (all points on a plane) get a unit edge so the lattice
    /// stays invertible.
    ///
    /// # Errors
    ///
    /// Returns [`FfdError::InvalidBox`] if `points` is empty or contains a
    /// non-finite coordinate.
    pub fn fit_to_points(&mut self, points: &[Point3<f64>]) -> Result<()> {
        let first = points
            .first()
            .ok_or_else(|| FfdError::invalid_box("cannot fit an empty point set"))?;

        let (min, max) = points.iter().fold((*first, *first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        if !(min.coords.iter().chain(max.coords.iter()).all(|v| v.is_finite())) {
            return Err(FfdError::invalid_box("non-finite point coordinate"));
        }

        let extent = max - min;
        self.box_origin = [min.x, min.y, min.z];
        self.box_length = [extent.x, extent.y, extent.z].map(|len| {
            if len > MIN_EXTENT { len } else { 1.0 }
        });
        self.rotation = [0.0; 3];

        debug!(
            origin = ?self.box_origin,
            length = ?self.box_length,
            points = points.len(),
            "Fitted lattice box"
        );
        Ok(())
    }
}

fn check_dims(dims: [usize; 3]) -> Result<()> {
    if dims.iter().any(|&n| !(2..=MAX_CONTROL_POINTS).contains(&n)) {
        return Err(FfdError::invalid_lattice(format!(
            "each dimension must be in 2..={MAX_CONTROL_POINTS}, got {dims:?}"
        )));
    }
    Ok(())
}
