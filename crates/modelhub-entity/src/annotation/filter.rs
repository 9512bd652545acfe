//! Annotation catalog filters.

use std::str::FromStr;

use modelhub_core::AppError;
use serde::{Deserialize, Serialize};

/// Filter on one completeness flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagFilter {
    /// No constraint.
    #[default]
    Any,
    /// Flag must be set.
    Yes,
    /// Flag must be clear.
    No,
}

impl FlagFilter {
    /// The required flag value, if constrained.
    pub fn required(&self) -> Option<bool> {
        match self {
            Self::Any => None,
            Self::Yes => Some(true),
            Self::No => Some(false),
        }
    }

    /// Returns `true` if `value` passes the filter.
    pub fn matches(&self, value: bool) -> bool {
        self.required().is_none_or(|r| r == value)
    }
}

impl FromStr for FlagFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "all" => Ok(Self::Any),
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(AppError::validation(format!(
                "Invalid flag filter '{other}', expected yes or no"
            ))),
        }
    }
}

/// Filter on the category column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// No constraint.
    #[default]
    All,
    /// Only records without a category.
    Uncategorized,
    /// Only records in the named category.
    Named(String),
}

impl CategoryFilter {
    /// Parse the catalog query value: `all`, `none`, or a category name.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("all") => Self::All,
            Some("none") => Self::Uncategorized,
            Some(name) => Self::Named(name.to_string()),
        }
    }

    /// Returns `true` if `category` passes the filter.
    pub fn matches(&self, category: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Uncategorized => category.is_none(),
            Self::Named(name) => category == Some(name.as_str()),
        }
    }
}

/// Combined filter for annotation listings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationFilter {
    /// Category constraint.
    pub category: CategoryFilter,
    /// Shape flag constraint.
    pub shape_annotated: FlagFilter,
    /// Part flag constraint.
    pub part_annotated: FlagFilter,
    /// Mobility flag constraint.
    pub mobility_annotated: FlagFilter,
}

impl AnnotationFilter {
    /// Returns `true` if a record with these values passes every constraint.
    pub fn matches(
        &self,
        category: Option<&str>,
        shape_annotated: bool,
        part_annotated: bool,
        mobility_annotated: bool,
    ) -> bool {
        self.category.matches(category)
            && self.shape_annotated.matches(shape_annotated)
            && self.part_annotated.matches(part_annotated)
            && self.mobility_annotated.matches(mobility_annotated)
    }
}
