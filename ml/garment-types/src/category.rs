//! Garment categories and body genders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Closed enumeration of supported garment types.
///
/// The string form (`"t-shirt"`, `"old-t-shirt"`, ...) is the one used in
/// dataset and checkpoint directory names.
///
/// # Example
///
/// ```
/// use garment_types::GarmentCategory;
///
/// let category: GarmentCategory = "pant".parse().unwrap();
/// assert_eq!(category, GarmentCategory::Pant);
/// assert_eq!(category.name(), "pant");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GarmentCategory {
    /// Short-sleeved t-shirt.
    TShirt,
    /// Legacy t-shirt variant whose style vector carries a fixed offset.
    OldTShirt,
    /// Long-sleeved shirt.
    Shirt,
    /// Trousers.
    Pant,
    /// Skirt.
    Skirt,
}

impl GarmentCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::TShirt,
        Self::OldTShirt,
        Self::Shirt,
        Self::Pant,
        Self::Skirt,
    ];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TShirt => "t-shirt",
            Self::OldTShirt => "old-t-shirt",
            Self::Shirt => "shirt",
            Self::Pant => "pant",
            Self::Skirt => "skirt",
        }
    }

    /// Returns `true` for the legacy t-shirt variant.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::OldTShirt)
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GarmentCategory {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| TypesError::unknown_category(s))
    }
}

/// Body gender a garment model was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Female body.
    #[default]
    Female,
    /// Male body.
    Male,
    /// Gender-neutral body.
    Neutral,
}

impl Gender {
    /// Returns the lowercase name used in directory names.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Gender {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            "neutral" => Ok(Self::Neutral),
            other => Err(TypesError::unknown_gender(other)),
        }
    }
}

/// Prefix shared by dataset and checkpoint directories: `{category}_{gender}`.
#[must_use]
pub fn instance_name(category: GarmentCategory, gender: Gender) -> String {
    format!("{category}_{gender}")
}
