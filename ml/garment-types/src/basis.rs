//! Canonical-pose basis: one rest-vertex field per pivot.

use crate::dims::VERTEX_DIM;
use crate::error::{Result, TypesError};

/// Per-pivot canonical-pose rest vertices, shape `[pivots, vertices, 3]`.
///
/// Loaded once and read-only for the predictor's lifetime. Only used to
/// measure how close a query shape/style is to each pivot.
///
/// # Example
///
/// ```
/// use garment_types::CanonicalBasis;
///
/// let basis = CanonicalBasis::from_pivot_vertices(vec![
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
///     vec![[0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
/// ])
/// .unwrap();
/// assert_eq!(basis.shape(), [2, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalBasis {
    pivot_count: usize,
    vertex_count: usize,
    data: Vec<f32>,
}

impl CanonicalBasis {
    /// Creates a basis from flat row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ShapeMismatch`] if `data.len()` is not
    /// `pivot_count * vertex_count * 3`, or if either count is zero.
    pub fn new(pivot_count: usize, vertex_count: usize, data: Vec<f32>) -> Result<Self> {
        let expected = pivot_count * vertex_count * VERTEX_DIM;
        if pivot_count == 0 || vertex_count == 0 || data.len() != expected {
            return Err(TypesError::shape_mismatch(
                format!("[{pivot_count}, {vertex_count}, 3] (non-empty)"),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self {
            pivot_count,
            vertex_count,
            data,
        })
    }

    /// Creates a basis from per-pivot vertex lists.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ShapeMismatch`] if the pivots disagree on vertex
    /// count or the list is empty.
    pub fn from_pivot_vertices(pivots: Vec<Vec<[f32; 3]>>) -> Result<Self> {
        let vertex_count = pivots.first().map_or(0, Vec::len);
        if let Some((idx, bad)) = pivots
            .iter()
            .enumerate()
            .find(|(_, verts)| verts.len() != vertex_count)
        {
            return Err(TypesError::shape_mismatch(
                format!("{vertex_count} vertices"),
                format!("{} vertices for pivot {idx}", bad.len()),
            ));
        }

        let pivot_count = pivots.len();
        let data = pivots.into_iter().flatten().flatten().collect();
        Self::new(pivot_count, vertex_count, data)
    }

    /// Number of pivots.
    #[must_use]
    pub const fn pivot_count(&self) -> usize {
        self.pivot_count
    }

    /// Number of vertices per pivot.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Shape as `[pivots, vertices, 3]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [self.pivot_count, self.vertex_count, VERTEX_DIM]
    }

    /// Flat vertex data for one pivot.
    #[must_use]
    pub fn pivot(&self, index: usize) -> Option<&[f32]> {
        let stride = self.vertex_count * VERTEX_DIM;
        self.data.get(index * stride..(index + 1) * stride)
    }

    /// All data, row-major.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the basis and returns its flat data.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_length() {
        assert!(CanonicalBasis::new(2, 3, vec![0.0; 18]).is_ok());
        assert!(CanonicalBasis::new(2, 3, vec![0.0; 17]).is_err());
        assert!(CanonicalBasis::new(0, 3, vec![]).is_err());
    }

    #[test]
    fn from_pivot_vertices_rejects_ragged() {
        let err = CanonicalBasis::from_pivot_vertices(vec![
            vec![[0.0; 3], [0.0; 3]],
            vec![[0.0; 3]],
        ])
        .unwrap_err();
        assert!(err.to_string().contains("pivot 1"));
    }

    #[test]
    fn pivot_slices_are_contiguous() {
        let basis = CanonicalBasis::from_pivot_vertices(vec![
            vec![[1.0, 2.0, 3.0]],
            vec![[4.0, 5.0, 6.0]],
        ])
        .unwrap();
        assert_eq!(basis.pivot(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(basis.pivot(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(basis.pivot(2), None);
        assert_eq!(basis.as_slice().len(), 6);
    }
}
