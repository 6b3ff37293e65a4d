//! Seed variety catalog entries.
//!
//! Varieties are linked to plantings only through the free-text `plant_id`
//! and `name`; nothing enforces that a planting's variety exists here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seed availability for one year.
///
/// `None` is never stored: a year without an entry in `seeds_by_year` is
/// implicitly `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedStatus {
    None,
    Ordered,
    Have,
}

impl SeedStatus {
    /// none → ordered → have → none.
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Ordered,
            Self::Ordered => Self::Have,
            Self::Have => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVariety {
    pub id: String,
    pub plant_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub years_used: Vec<i32>,
    #[serde(default)]
    pub planned_years: Vec<i32>,
    #[serde(default)]
    pub seeds_by_year: BTreeMap<i32, SeedStatus>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl StoredVariety {
    pub fn seed_status(&self, year: i32) -> SeedStatus {
        self.seeds_by_year
            .get(&year)
            .copied()
            .unwrap_or(SeedStatus::None)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewVariety {
    pub plant_id: String,
    pub name: String,
    pub supplier: Option<String>,
    pub price: Option<f64>,
    pub notes: Option<String>,
}

impl NewVariety {
    pub fn new(plant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plant_id: plant_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarietyUpdate {
    pub plant_id: Option<String>,
    pub name: Option<String>,
    pub supplier: Option<String>,
    pub price: Option<f64>,
    pub notes: Option<String>,
    pub years_used: Option<Vec<i32>>,
}
