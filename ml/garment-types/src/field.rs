//! Host-side per-vertex displacement fields.

use crate::dims::VERTEX_DIM;
use crate::error::{Result, TypesError};

/// Per-sample, per-vertex 3D displacement, shape `[batch, vertices, 3]`.
///
/// This is the plain-array form handed to collaborators (lattice deformers,
/// renderers) that do not speak tensors.
///
/// # Example
///
/// ```
/// use garment_types::DisplacementField;
///
/// let field = DisplacementField::new(1, 2, vec![0.25, 0.0, 0.0, 0.0, 0.5, 0.0]).unwrap();
/// assert_eq!(field.vertex(0, 1), Some([0.0, 0.5, 0.0]));
///
/// let moved = field.apply_to(0, &[[0.0; 3], [1.0, 1.0, 1.0]]).unwrap();
/// assert_eq!(moved[1], [1.0, 1.5, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    batch: usize,
    vertex_count: usize,
    data: Vec<f32>,
}

impl DisplacementField {
    /// Creates a field from flat row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ShapeMismatch`] if `data.len()` is not
    /// `batch * vertex_count * 3`.
    pub fn new(batch: usize, vertex_count: usize, data: Vec<f32>) -> Result<Self> {
        let expected = batch * vertex_count * VERTEX_DIM;
        if data.len() != expected {
            return Err(TypesError::shape_mismatch(
                format!("[{batch}, {vertex_count}, 3] = {expected} values"),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self {
            batch,
            vertex_count,
            data,
        })
    }

    /// Creates an all-zero field.
    #[must_use]
    pub fn zeros(batch: usize, vertex_count: usize) -> Self {
        Self {
            batch,
            vertex_count,
            data: vec![0.0; batch * vertex_count * VERTEX_DIM],
        }
    }

    /// Batch size.
    #[must_use]
    pub const fn batch(&self) -> usize {
        self.batch
    }

    /// Vertices per sample.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Shape as `[batch, vertices, 3]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [self.batch, self.vertex_count, VERTEX_DIM]
    }

    /// Flat data of one sample.
    #[must_use]
    pub fn sample(&self, index: usize) -> Option<&[f32]> {
        let stride = self.vertex_count * VERTEX_DIM;
        self.data.get(index * stride..(index + 1) * stride)
    }

    /// Displacement of one vertex of one sample.
    #[must_use]
    pub fn vertex(&self, sample: usize, vertex: usize) -> Option<[f32; 3]> {
        if vertex >= self.vertex_count {
            return None;
        }
        let chunk = self.sample(sample)?.chunks_exact(VERTEX_DIM).nth(vertex)?;
        Some([chunk[0], chunk[1], chunk[2]])
    }

    /// Largest displacement magnitude over the whole field.
    #[must_use]
    pub fn max_magnitude(&self) -> f32 {
        self.data
            .chunks_exact(VERTEX_DIM)
            .map(|d| d[2].mul_add(d[2], d[0].mul_add(d[0], d[1] * d[1])).sqrt())
            .fold(0.0, f32::max)
    }

    /// Adds one sample's displacement to a rest-vertex array.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ShapeMismatch`] if the sample does not exist or
    /// `rest` has the wrong vertex count.
    pub fn apply_to(&self, sample: usize, rest: &[[f32; 3]]) -> Result<Vec<[f32; 3]>> {
        if rest.len() != self.vertex_count {
            return Err(TypesError::shape_mismatch(
                format!("{} rest vertices", self.vertex_count),
                rest.len().to_string(),
            ));
        }
        let disp = self.sample(sample).ok_or_else(|| {
            TypesError::shape_mismatch(
                format!("sample < {}", self.batch),
                sample.to_string(),
            )
        })?;

        Ok(rest
            .iter()
            .zip(disp.chunks_exact(VERTEX_DIM))
            .map(|(r, d)| [r[0] + d[0], r[1] + d[1], r[2] + d[2]])
            .collect())
    }

    /// All data, row-major.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
