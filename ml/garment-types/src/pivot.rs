//! Pivot (shape, style) reference configurations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// A fixed (shape-index, style-index) reference configuration.
///
/// Each pivot owns one high-frequency network and one canonical basis entry.
///
/// # Example
///
/// ```
/// use garment_types::Pivot;
///
/// let pivot = Pivot::new(0, 12);
/// assert_eq!(pivot.dir_name(), "000_012");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pivot {
    /// Index of the reference shape.
    pub shape: u32,
    /// Index of the reference style.
    pub style: u32,
}

impl Pivot {
    /// Creates a new pivot.
    #[must_use]
    pub const fn new(shape: u32, style: u32) -> Self {
        Self { shape, style }
    }

    /// Directory / file stem used for this pivot: `{shape:03}_{style:03}`.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{:03}_{:03}", self.shape, self.style)
    }

    /// Parses a pivot from `"shape style"` or `"shape_style"`.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidPivot`] if the text is not exactly two
    /// unsigned integers.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|part| !part.is_empty());

        let shape = parts.next().map(parse_index).transpose()?;
        let style = parts.next().map(parse_index).transpose()?;

        match (shape, style, parts.next()) {
            (Some(shape), Some(style), None) => Ok(Self::new(shape, style)),
            _ => Err(TypesError::invalid_pivot(format!(
                "expected two indices, got {text:?}"
            ))),
        }
    }
}

fn parse_index(part: &str) -> Result<u32> {
    part.parse::<u32>()
        .map_err(|e| TypesError::invalid_pivot(format!("{part:?}: {e}")))
}

impl fmt::Display for Pivot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Ordered, immutable set of pivots for one garment instance.
///
/// The order is significant: the i-th pivot owns the i-th high-frequency
/// network and the i-th canonical basis slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSet {
    pivots: Vec<Pivot>,
}

impl PivotSet {
    /// Creates a pivot set.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidPivot`] if the list is empty or has a
    /// duplicate entry.
    pub fn new(pivots: Vec<Pivot>) -> Result<Self> {
        if pivots.is_empty() {
            return Err(TypesError::invalid_pivot("pivot set is empty"));
        }
        for (i, pivot) in pivots.iter().enumerate() {
            if pivots[..i].contains(pivot) {
                return Err(TypesError::invalid_pivot(format!("duplicate pivot {pivot}")));
            }
        }
        Ok(Self { pivots })
    }

    /// Parses one pivot per non-empty line; `#` starts a comment.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidPivot`] naming the offending line.
    ///
    /// # Example
    ///
    /// ```
    /// use garment_types::{Pivot, PivotSet};
    ///
    /// let set = PivotSet::parse("000 000\n# comment\n001_003\n").unwrap();
    /// assert_eq!(set.len(), 2);
    /// assert_eq!(set.get(1), Some(&Pivot::new(1, 3)));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut pivots = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let content = line.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let pivot = Pivot::parse(content).map_err(|e| {
                TypesError::invalid_pivot(format!("line {}: {e}", line_no + 1))
            })?;
            pivots.push(pivot);
        }
        Self::new(pivots)
    }

    /// Number of pivots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    /// Always `false`; construction rejects empty sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    /// Returns the pivot at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Pivot> {
        self.pivots.get(index)
    }

    /// Iterates over pivots in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Pivot> {
        self.pivots.iter()
    }

    /// Returns the pivots as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Pivot] {
        &self.pivots
    }
}

impl<'a> IntoIterator for &'a PivotSet {
    type Item = &'a Pivot;
    type IntoIter = std::slice::Iter<'a, Pivot>;

    fn into_iter(self) -> Self::IntoIter {
        self.pivots.iter()
    }
}
