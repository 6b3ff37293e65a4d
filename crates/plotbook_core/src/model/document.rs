//! Root document model.
//!
//! # Responsibility
//! - Define the single persisted document and its top-level collections.
//!
//! # Invariants
//! - One document per installation.
//! - `version` never regresses and equals the schema the value conforms to.
//! - `meta.migration_state` is only present while a migration chain is
//!   running or was interrupted.

use crate::model::area::Area;
use crate::model::season::SeasonRecord;
use crate::model::variety::StoredVariety;
use serde::{Deserialize, Serialize};

/// Schema version produced by the final migration step.
pub const CURRENT_SCHEMA_VERSION: u32 = 11;

/// Default display name for documents created without one.
pub const DEFAULT_DOCUMENT_NAME: &str = "My Allotment";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    pub meta: Meta,
    pub layout: Layout,
    pub seasons: Vec<SeasonRecord>,
    pub current_year: i32,
    #[serde(default)]
    pub maintenance_tasks: Vec<MaintenanceTask>,
    #[serde(default)]
    pub garden_events: Vec<GardenEvent>,
    #[serde(default)]
    pub varieties: Vec<StoredVariety>,
}

impl Document {
    /// Creates an empty current-schema document.
    ///
    /// Used by first-run initialization and tests; carries no seasons.
    pub fn new(name: impl Into<String>, current_year: i32, timestamp: &str) -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            meta: Meta {
                name: name.into(),
                location: None,
                created_at: timestamp.to_string(),
                updated_at: timestamp.to_string(),
                migration_state: None,
            },
            layout: Layout::default(),
            seasons: Vec::new(),
            current_year,
            maintenance_tasks: Vec::new(),
            garden_events: Vec::new(),
            varieties: Vec::new(),
        }
    }

    pub fn area(&self, area_id: &str) -> Option<&Area> {
        self.layout.areas.iter().find(|area| area.id == area_id)
    }

    pub fn season(&self, year: i32) -> Option<&SeasonRecord> {
        self.seasons.iter().find(|season| season.year == year)
    }

    pub fn season_mut(&mut self, year: i32) -> Option<&mut SeasonRecord> {
        self.seasons.iter_mut().find(|season| season.year == year)
    }

    pub fn variety(&self, variety_id: &str) -> Option<&StoredVariety> {
        self.varieties.iter().find(|variety| variety.id == variety_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_state: Option<MigrationState>,
}

/// In-progress migration marker stored in `meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationState {
    pub target_version: u32,
    pub started_at: String,
    /// Stored version the chain started from.
    pub step: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceKind {
    Prune,
    Feed,
    Mulch,
    Spray,
    Weed,
    #[serde(other)]
    Other,
}

/// Recurring upkeep, optionally tied to one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTask {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MaintenanceKind,
    /// 1-12 when the task recurs in a given month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaintenanceTask {
    pub area_id: Option<String>,
    pub kind: MaintenanceKind,
    pub month: Option<u32>,
    pub description: String,
}

/// Free-form dated event (first frost, open day, delivery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
}
