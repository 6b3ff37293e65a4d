//! Season records and the per-(area, year) data attached to them.

use crate::model::area::RotationGroup;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonStatus {
    Historical,
    Current,
    Planned,
}

impl SeasonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Current => "current",
            Self::Planned => "planned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "historical" => Some(Self::Historical),
            "current" => Some(Self::Current),
            "planned" => Some(Self::Planned),
            _ => None,
        }
    }

    /// Status implied by where `year` sits relative to `current_year`.
    pub fn for_year(year: i32, current_year: i32) -> Self {
        match year.cmp(&current_year) {
            std::cmp::Ordering::Less => Self::Historical,
            std::cmp::Ordering::Equal => Self::Current,
            std::cmp::Ordering::Greater => Self::Planned,
        }
    }
}

/// One growing year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    /// Unique within the document.
    pub year: i32,
    pub status: SeasonStatus,
    /// At most one entry per area id.
    #[serde(default)]
    pub areas: Vec<AreaSeason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SeasonRecord {
    pub fn area(&self, area_id: &str) -> Option<&AreaSeason> {
        self.areas.iter().find(|entry| entry.area_id == area_id)
    }

    pub fn area_mut(&mut self, area_id: &str) -> Option<&mut AreaSeason> {
        self.areas.iter_mut().find(|entry| entry.area_id == area_id)
    }
}

/// What happened in one area during one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSeason {
    pub area_id: String,
    /// Snapshot of the area's group for this year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_group: Option<RotationGroup>,
    #[serde(default)]
    pub plantings: Vec<Planting>,
    #[serde(default)]
    pub notes: Vec<AreaNote>,
    #[serde(default)]
    pub care_logs: Vec<CareLogEntry>,
    /// Sum of harvest-typed care log quantities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_unit: Option<String>,
}

impl AreaSeason {
    pub fn new(area_id: impl Into<String>) -> Self {
        Self {
            area_id: area_id.into(),
            rotation_group: None,
            plantings: Vec::new(),
            notes: Vec::new(),
            care_logs: Vec::new(),
            harvest_total: None,
            harvest_unit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantingSuccess {
    Excellent,
    Good,
    Fair,
    Poor,
    Failed,
}

/// One sown or grown instance of a plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planting {
    pub id: String,
    /// Free-text plant identifier (see `canonical_plant_id`).
    pub plant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sow_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transplant_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_date: Option<String>,
    /// Unrecognized ratings decode as `None`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_success"
    )]
    pub success: Option<PlantingSuccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn lenient_success<'de, D>(deserializer: D) -> Result<Option<PlantingSuccess>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPlanting {
    pub plant_id: String,
    pub variety_name: Option<String>,
    pub sow_date: Option<String>,
    pub transplant_date: Option<String>,
    pub harvest_date: Option<String>,
    pub notes: Option<String>,
}

impl NewPlanting {
    pub fn new(plant_id: impl Into<String>) -> Self {
        Self {
            plant_id: plant_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantingUpdate {
    pub plant_id: Option<String>,
    pub variety_name: Option<String>,
    pub sow_date: Option<String>,
    pub transplant_date: Option<String>,
    pub harvest_date: Option<String>,
    pub success: Option<PlantingSuccess>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareLogType {
    Water,
    Feed,
    Prune,
    Harvest,
    Mulch,
    Spray,
    /// Also absorbs log types this build does not know.
    #[serde(other)]
    Other,
}

/// A dated maintenance or harvest event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareLogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CareLogType,
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCareLogEntry {
    pub kind: CareLogType,
    pub date: String,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl NewCareLogEntry {
    pub fn new(kind: CareLogType, date: impl Into<String>) -> Self {
        Self {
            kind,
            date: date.into(),
            description: None,
            quantity: None,
            unit: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CareLogUpdate {
    pub kind: Option<CareLogType>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Warning,
    Success,
    Error,
    #[serde(other)]
    Info,
}

/// Free-text note pinned to an area for one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaNote {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Aggregated harvest for one (year, area).
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestTotal {
    pub quantity: f64,
    /// Unit of the first harvest entry that declared one.
    pub unit: Option<String>,
}
