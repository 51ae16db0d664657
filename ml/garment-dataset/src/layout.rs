//! On-disk layout of a garment dataset.

use std::path::{Path, PathBuf};

use garment_types::{GarmentCategory, Gender, Pivot, instance_name};

/// File name of the pivot list inside an instance directory.
pub const PIVOTS_FILE: &str = "pivots.txt";

/// Directory holding per-pivot canonical rest vertices.
pub const UNPOSED_DIR: &str = "unposed";

/// Resolves dataset paths for one garment instance.
///
/// ```text
/// {root}/{category}_{gender}/pivots.txt
/// {root}/{category}_{gender}/unposed/{shape:03}_{style:03}.json
/// ```
///
/// # Example
///
/// ```
/// use garment_dataset::DatasetLayout;
/// use garment_types::{GarmentCategory, Gender, Pivot};
/// use std::path::Path;
///
/// let layout = DatasetLayout::new("/data", GarmentCategory::Skirt, Gender::Female);
/// assert_eq!(layout.pivots_path(), Path::new("/data/skirt_female/pivots.txt"));
/// assert_eq!(
///     layout.basis_path(&Pivot::new(0, 2)),
///     Path::new("/data/skirt_female/unposed/000_002.json"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
    category: GarmentCategory,
    gender: Gender,
}

impl DatasetLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, category: GarmentCategory, gender: Gender) -> Self {
        Self {
            root: root.into(),
            category,
            gender,
        }
    }

    /// Dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
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

    /// `{root}/{category}_{gender}`.
    #[must_use]
    pub fn instance_dir(&self) -> PathBuf {
        self.root.join(instance_name(self.category, self.gender))
    }

    /// Path of the pivot list.
    #[must_use]
    pub fn pivots_path(&self) -> PathBuf {
        self.instance_dir().join(PIVOTS_FILE)
    }

    /// Directory of per-pivot canonical vertices.
    #[must_use]
    pub fn unposed_dir(&self) -> PathBuf {
        self.instance_dir().join(UNPOSED_DIR)
    }

    /// Path of one pivot's canonical vertices.
    #[must_use]
    pub fn basis_path(&self, pivot: &Pivot) -> PathBuf {
        self.unposed_dir().join(format!("{}.json", pivot.dir_name()))
    }
}
