//! Per-category input relevance (masking) table.
//!
//! Each garment is only influenced by a subset of body joints and by the
//! first two shape and style components. The [`MaskTable`] records those
//! subsets once; networks receive it explicitly and turn it into
//! multiplicative masks.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::category::GarmentCategory;
use crate::dims::{JOINT_COUNT, JOINT_DOF, POSE_DIM, SHAPE_DIM, STYLE_DIM};
use crate::error::{Result, TypesError};

/// Style offset added to the legacy t-shirt after masking.
pub const LEGACY_STYLE_OFFSET: [f32; STYLE_DIM] = [0.0, 0.0, 1.5, 0.0];

/// Shape indices that survive masking for every category.
const VALID_SHAPE: [usize; 2] = [0, 1];

/// Style indices that survive masking for every category.
const VALID_STYLE: [usize; 2] = [0, 1];

/// Relevant inputs for one garment category.
///
/// # Example
///
/// ```
/// use garment_types::{CategoryRelevance, POSE_DIM};
///
/// let relevance = CategoryRelevance::new(vec![0, 1, 2]);
/// let mask = relevance.pose_mask();
/// assert_eq!(mask.len(), POSE_DIM);
/// assert_eq!(mask[0], 1.0);
/// assert_eq!(mask[9], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRelevance {
    /// Joints whose rotations affect the garment.
    pub joints: Vec<usize>,

    /// Shape components that affect the garment.
    pub shape_indices: Vec<usize>,

    /// Style components that affect the garment.
    pub style_indices: Vec<usize>,

    /// Constant added to the style vector after masking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_offset: Option<[f32; STYLE_DIM]>,
}

impl CategoryRelevance {
    /// Creates a relevance entry for the given joints, with the standard
    /// shape and style subsets and no style offset.
    #[must_use]
    pub fn new(joints: Vec<usize>) -> Self {
        Self {
            joints,
            shape_indices: VALID_SHAPE.to_vec(),
            style_indices: VALID_STYLE.to_vec(),
            style_offset: None,
        }
    }

    /// Sets the post-mask style offset.
    #[must_use]
    pub const fn with_style_offset(mut self, offset: [f32; STYLE_DIM]) -> Self {
        self.style_offset = Some(offset);
        self
    }

    /// Validates that every index fits its vector.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ShapeMismatch`] naming the first out-of-range index.
    pub fn validate(&self) -> Result<()> {
        check_indices("joint", &self.joints, JOINT_COUNT)?;
        check_indices("shape", &self.shape_indices, SHAPE_DIM)?;
        check_indices("style", &self.style_indices, STYLE_DIM)
    }

    /// Returns the 0/1 mask over the flattened pose vector.
    #[must_use]
    pub fn pose_mask(&self) -> [f32; POSE_DIM] {
        let mut mask = [0.0; POSE_DIM];
        for &joint in self.joints.iter().filter(|&&j| j < JOINT_COUNT) {
            let start = joint * JOINT_DOF;
            mask[start..start + JOINT_DOF].fill(1.0);
        }
        mask
    }

    /// Returns the 0/1 mask over the shape vector.
    #[must_use]
    pub fn shape_mask(&self) -> [f32; SHAPE_DIM] {
        index_mask(&self.shape_indices)
    }

    /// Returns the 0/1 mask over the style vector.
    #[must_use]
    pub fn style_mask(&self) -> [f32; STYLE_DIM] {
        index_mask(&self.style_indices)
    }
}

fn index_mask<const N: usize>(indices: &[usize]) -> [f32; N] {
    let mut mask = [0.0; N];
    for &idx in indices.iter().filter(|&&i| i < N) {
        mask[idx] = 1.0;
    }
    mask
}

fn check_indices(kind: &str, indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&idx| idx >= len) {
        Some(idx) => Err(TypesError::shape_mismatch(
            format!("{kind} index < {len}"),
            idx.to_string(),
        )),
        None => Ok(()),
    }
}

/// Immutable map from garment category to its relevant inputs.
///
/// Built once (usually via [`MaskTable::standard`]) and handed to every
/// network that masks its inputs.
///
/// # Example
///
/// ```
/// use garment_types::{GarmentCategory, MaskTable};
///
/// let table = MaskTable::standard();
/// let pant = table.relevance(GarmentCategory::Pant).unwrap();
/// assert_eq!(pant.joints, vec![0, 1, 2, 4, 5, 7, 8]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaskTable {
    entries: HashMap<GarmentCategory, CategoryRelevance>,
}

impl MaskTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The relevance table every shipped garment model was trained with.
    #[must_use]
    pub fn standard() -> Self {
        let upper_body = vec![0, 1, 2, 3, 6, 9, 12, 13, 14, 16, 17, 18, 19];
        let shirt = vec![0, 1, 2, 3, 6, 9, 12, 13, 14, 16, 17, 18, 19, 20, 21];

        Self::empty()
            .with_entry(
                GarmentCategory::TShirt,
                CategoryRelevance::new(upper_body.clone()),
            )
            .with_entry(
                GarmentCategory::OldTShirt,
                CategoryRelevance::new(upper_body).with_style_offset(LEGACY_STYLE_OFFSET),
            )
            .with_entry(GarmentCategory::Shirt, CategoryRelevance::new(shirt))
            .with_entry(
                GarmentCategory::Pant,
                CategoryRelevance::new(vec![0, 1, 2, 4, 5, 7, 8]),
            )
            .with_entry(GarmentCategory::Skirt, CategoryRelevance::new(vec![0, 1, 2]))
    }

    /// Adds or replaces the entry for a category.
    #[must_use]
    pub fn with_entry(mut self, category: GarmentCategory, relevance: CategoryRelevance) -> Self {
        self.entries.insert(category, relevance);
        self
    }

    /// Looks up the relevance entry for a category.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::UnknownCategory`] if the table has no entry.
    pub fn relevance(&self, category: GarmentCategory) -> Result<&CategoryRelevance> {
        self.entries
            .get(&category)
            .ok_or_else(|| TypesError::unknown_category(category.name()))
    }

    /// Returns `true` if the table covers the category.
    #[must_use]
    pub fn contains(&self, category: GarmentCategory) -> bool {
        self.entries.contains_key(&category)
    }

    /// Number of categories in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_every_category() {
        let table = MaskTable::standard();
        assert_eq!(table.len(), GarmentCategory::ALL.len());
        for category in GarmentCategory::ALL {
            let relevance = table.relevance(category).unwrap();
            assert!(relevance.validate().is_ok());
            assert_eq!(relevance.shape_indices, vec![0, 1]);
            assert_eq!(relevance.style_indices, vec![0, 1]);
        }
    }

    #[test]
    fn only_legacy_tshirt_has_offset() {
        let table = MaskTable::standard();
        for category in GarmentCategory::ALL {
            let offset = table.relevance(category).unwrap().style_offset;
            if category.is_legacy() {
                assert_eq!(offset, Some(LEGACY_STYLE_OFFSET));
            } else {
                assert_eq!(offset, None);
            }
        }
    }

    #[test]
    fn missing_entry_is_unknown_category() {
        let table = MaskTable::empty()
            .with_entry(GarmentCategory::Skirt, CategoryRelevance::new(vec![0]));
        let err = table.relevance(GarmentCategory::Shirt).unwrap_err();
        assert_eq!(err, TypesError::UnknownCategory("shirt".to_string()));
        assert!(table.contains(GarmentCategory::Skirt));
    }

    #[test]
    fn pose_mask_expands_joints_to_three_components() {
        let relevance = CategoryRelevance::new(vec![0, 23]);
        let mask = relevance.pose_mask();
        assert_eq!(mask[..3], [1.0, 1.0, 1.0]);
        assert_eq!(mask[69..], [1.0, 1.0, 1.0]);
        let ones = mask.iter().filter(|&&m| m == 1.0).count();
        assert_eq!(ones, 6);
    }

    #[test]
    fn skirt_pose_mask_keeps_first_three_joints() {
        let table = MaskTable::standard();
        let mask = table.relevance(GarmentCategory::Skirt).unwrap().pose_mask();
        assert!(mask[..9].iter().all(|&m| m == 1.0));
        assert!(mask[9..].iter().all(|&m| m == 0.0));
    }

    #[test]
    fn shape_and_style_masks() {
        let relevance = CategoryRelevance::new(vec![]);
        assert_eq!(
            relevance.shape_mask(),
            [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(relevance.style_mask(), [1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn validate_rejects_out_of_range_joint() {
        let relevance = CategoryRelevance::new(vec![0, 24]);
        assert!(relevance.validate().is_err());
    }
}
