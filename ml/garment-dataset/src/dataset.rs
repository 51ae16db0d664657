//! Loading pivots and canonical basis for one garment instance.

use std::fs;
use std::path::Path;

use garment_types::{CanonicalBasis, GarmentCategory, Gender, PivotSet};
use tracing::{debug, info};

use crate::error::{DatasetError, Result};
use crate::layout::DatasetLayout;

/// Pivot list and canonical basis of one `{category}_{gender}` instance.
///
/// # Example
///
/// ```
/// use garment_dataset::GarmentDataset;
/// use garment_types::{CanonicalBasis, GarmentCategory, Gender, Pivot, PivotSet};
///
/// let pivots = PivotSet::new(vec![Pivot::new(0, 0)]).unwrap();
/// let basis = CanonicalBasis::new(1, 2, vec![0.0; 6]).unwrap();
/// let dataset = GarmentDataset::from_parts(
///     GarmentCategory::Skirt,
///     Gender::Female,
///     pivots,
///     basis,
/// )
/// .unwrap();
///
/// assert_eq!(dataset.vertex_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GarmentDataset {
    category: GarmentCategory,
    gender: Gender,
    pivots: PivotSet,
    basis: CanonicalBasis,
}

impl GarmentDataset {
    /// Assembles a dataset from in-memory parts.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Types`] if the basis pivot count differs from
    /// the pivot set length.
    pub fn from_parts(
        category: GarmentCategory,
        gender: Gender,
        pivots: PivotSet,
        basis: CanonicalBasis,
    ) -> Result<Self> {
        if basis.pivot_count() != pivots.len() {
            return Err(garment_types::TypesError::shape_mismatch(
                format!("{} basis entries", pivots.len()),
                basis.pivot_count().to_string(),
            )
            .into());
        }
        Ok(Self {
            category,
            gender,
            pivots,
            basis,
        })
    }

    /// Reads the pivot list and every pivot's canonical vertices.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::PivotsNotFound`] / [`DatasetError::InvalidPivots`]
    ///   for a missing or malformed `pivots.txt`
    /// - [`DatasetError::EmptyPivotSet`] if the list has no entries
    /// - [`DatasetError::BasisNotFound`] if a pivot has no vertex file
    /// - [`DatasetError::InconsistentVertexCount`] if pivots disagree on `V`
    pub fn open(root: impl AsRef<Path>, category: GarmentCategory, gender: Gender) -> Result<Self> {
        let layout = DatasetLayout::new(root.as_ref(), category, gender);
        let pivots = read_pivots(&layout)?;

        let mut vertex_count = None;
        let mut data = Vec::new();
        for pivot in &pivots {
            let path = layout.basis_path(pivot);
            if !path.exists() {
                return Err(DatasetError::basis_not_found(
                    pivot.dir_name(),
                    path.display().to_string(),
                ));
            }
            let verts: Vec<[f32; 3]> = serde_json::from_str(&fs::read_to_string(&path)?)?;
            debug!(pivot = %pivot, vertices = verts.len(), "Read canonical vertices");

            let expected = *vertex_count.get_or_insert(verts.len());
            if verts.len() != expected {
                return Err(DatasetError::InconsistentVertexCount {
                    pivot: pivot.dir_name(),
                    expected,
                    actual: verts.len(),
                });
            }
            data.extend(verts.into_iter().flatten());
        }

        let basis = CanonicalBasis::new(pivots.len(), vertex_count.unwrap_or(0), data)?;
        info!(
            category = %category,
            gender = %gender,
            pivots = pivots.len(),
            vertices = basis.vertex_count(),
            "Loaded garment dataset"
        );

        Self::from_parts(category, gender, pivots, basis)
    }

    /// Writes the pivot list and canonical vertices under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] or [`DatasetError::Serialization`] on
    /// write failure.
    pub fn save(&self, root: impl AsRef<Path>) -> Result<()> {
        let layout = DatasetLayout::new(root.as_ref(), self.category, self.gender);
        fs::create_dir_all(layout.unposed_dir())?;

        let listing: String = self
            .pivots
            .iter()
            .map(|p| format!("{:03} {:03}\n", p.shape, p.style))
            .collect();
        fs::write(layout.pivots_path(), listing)?;

        for (idx, pivot) in self.pivots.iter().enumerate() {
            let verts: Vec<[f32; 3]> = self
                .basis
                .pivot(idx)
                .unwrap_or_default()
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect();
            fs::write(layout.basis_path(pivot), serde_json::to_string(&verts)?)?;
        }
        Ok(())
    }

    /// Garment category.
    #[must_use]
    pub const fn category(&self) -> GarmentCategory {
        self.category
    }

    /// Body gender.
    #[must_use]
    pub const fn gender(&self) -> Gender {
        self.gender
    }

    /// Ordered pivots.
    #[must_use]
    pub const fn pivots(&self) -> &PivotSet {
        &self.pivots
    }

    /// Canonical basis `[P, V, 3]`.
    #[must_use]
    pub const fn basis(&self) -> &CanonicalBasis {
        &self.basis
    }

    /// Vertices per garment.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.basis.vertex_count()
    }

    /// Splits into pivot set and basis.
    #[must_use]
    pub fn into_parts(self) -> (PivotSet, CanonicalBasis) {
        (self.pivots, self.basis)
    }
}

fn read_pivots(layout: &DatasetLayout) -> Result<PivotSet> {
    let path = layout.pivots_path();
    if !path.exists() {
        return Err(DatasetError::pivots_not_found(path.display().to_string()));
    }
    let text = fs::read_to_string(&path)?;
    let has_entries = text
        .lines()
        .any(|line| !line.split('#').next().unwrap_or_default().trim().is_empty());
    if !has_entries {
        return Err(DatasetError::EmptyPivotSet(path.display().to_string()));
    }
    PivotSet::parse(&text)
        .map_err(|e| DatasetError::invalid_pivots(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use garment_types::Pivot;

    fn two_pivot_dataset() -> GarmentDataset {
        let pivots = PivotSet::new(vec![Pivot::new(0, 0), Pivot::new(3, 1)]).unwrap();
        let basis = CanonicalBasis::from_pivot_vertices(vec![
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0.5, 0.0, 0.0], [1.5, 0.0, 0.0], [0.5, 1.0, 0.0]],
        ])
        .unwrap();
        GarmentDataset::from_parts(GarmentCategory::Pant, Gender::Male, pivots, basis).unwrap()
    }

    #[test]
    fn save_then_open_preserves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = two_pivot_dataset();
        dataset.save(dir.path()).unwrap();

        let loaded = GarmentDataset::open(dir.path(), GarmentCategory::Pant, Gender::Male).unwrap();
        assert_eq!(loaded, dataset);
        assert_eq!(loaded.vertex_count(), 3);
        assert_eq!(loaded.pivots().get(1), Some(&Pivot::new(3, 1)));
    }

    #[test]
    fn open_missing_pivots() {
        let dir = tempfile::tempdir().unwrap();
        let err = GarmentDataset::open(dir.path(), GarmentCategory::Skirt, Gender::Female)
            .unwrap_err();
        assert!(matches!(err, DatasetError::PivotsNotFound(_)));
    }

    #[test]
    fn open_malformed_pivots() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path(), GarmentCategory::Skirt, Gender::Female);
        fs::create_dir_all(layout.instance_dir()).unwrap();
        fs::write(layout.pivots_path(), "000 000\nnot a pivot\n").unwrap();

        let err = GarmentDataset::open(dir.path(), GarmentCategory::Skirt, Gender::Female)
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidPivots { .. }));
    }

    #[test]
    fn open_empty_pivots() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path(), GarmentCategory::Skirt, Gender::Female);
        fs::create_dir_all(layout.instance_dir()).unwrap();
        fs::write(layout.pivots_path(), "# no pivots yet\n\n").unwrap();

        let err = GarmentDataset::open(dir.path(), GarmentCategory::Skirt, Gender::Female)
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyPivotSet(_)));
    }

    #[test]
    fn open_missing_basis_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path(), GarmentCategory::Skirt, Gender::Female);
        fs::create_dir_all(layout.instance_dir()).unwrap();
        fs::write(layout.pivots_path(), "000 000\n").unwrap();

        let err = GarmentDataset::open(dir.path(), GarmentCategory::Skirt, Gender::Female)
            .unwrap_err();
        assert!(matches!(err, DatasetError::BasisNotFound { .. }));
    }

    #[test]
    fn open_inconsistent_vertex_count() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path(), GarmentCategory::Skirt, Gender::Female);
        fs::create_dir_all(layout.unposed_dir()).unwrap();
        fs::write(layout.pivots_path(), "000 000\n001 000\n").unwrap();
        fs::write(layout.basis_path(&Pivot::new(0, 0)), "[[0,0,0],[1,1,1]]").unwrap();
        fs::write(layout.basis_path(&Pivot::new(1, 0)), "[[0,0,0]]").unwrap();

        let err = GarmentDataset::open(dir.path(), GarmentCategory::Skirt, Gender::Female)
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InconsistentVertexCount {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn from_parts_rejects_pivot_count_mismatch() {
        let pivots = PivotSet::new(vec![Pivot::new(0, 0)]).unwrap();
        let basis = CanonicalBasis::new(2, 1, vec![0.0; 6]).unwrap();
        let result = GarmentDataset::from_parts(GarmentCategory::Skirt, Gender::Female, pivots, basis);
        assert!(matches!(result, Err(DatasetError::Types(_))));
    }
}
