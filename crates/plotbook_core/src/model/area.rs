//! Area domain model.
//!
//! # Responsibility
//! - Define the single polymorphic record for beds, trees, structures etc.
//! - Describe which kind-specific fields are meaningful for each kind.
//!
//! # Invariants
//! - `id` is unique within `layout.areas`.
//! - `rotation_group` is only meaningful for `AreaKind::RotationBed`.
//! - `primary_plant` is only meaningful for kinds where
//!   `AreaKind::has_primary_plant()` is true.
//! - `infrastructure_subtype` is only meaningful for `AreaKind::Infrastructure`.
//!
//! The type does not enforce these combinations; `change_area_kind` does.

use serde::{Deserialize, Serialize};

/// Discriminator for the unified area collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaKind {
    RotationBed,
    PerennialBed,
    Tree,
    Berry,
    Herb,
    Infrastructure,
    Other,
}

impl AreaKind {
    pub const ALL: [AreaKind; 7] = [
        AreaKind::RotationBed,
        AreaKind::PerennialBed,
        AreaKind::Tree,
        AreaKind::Berry,
        AreaKind::Herb,
        AreaKind::Infrastructure,
        AreaKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RotationBed => "rotation-bed",
            Self::PerennialBed => "perennial-bed",
            Self::Tree => "tree",
            Self::Berry => "berry",
            Self::Herb => "herb",
            Self::Infrastructure => "infrastructure",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Whether a freshly created area of this kind accepts plantings.
    pub fn default_can_have_plantings(self) -> bool {
        matches!(self, Self::RotationBed | Self::PerennialBed | Self::Herb)
    }

    /// Kinds that carry a `primary_plant` reference.
    pub fn has_primary_plant(self) -> bool {
        matches!(
            self,
            Self::Tree | Self::Berry | Self::Herb | Self::PerennialBed
        )
    }
}

/// Crop-family classification used for bed rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationGroup {
    Legumes,
    Brassicas,
    Roots,
    Solanaceae,
    Alliums,
    Cucurbits,
    Permanent,
}

impl RotationGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legumes => "legumes",
            Self::Brassicas => "brassicas",
            Self::Roots => "roots",
            Self::Solanaceae => "solanaceae",
            Self::Alliums => "alliums",
            Self::Cucurbits => "cucurbits",
            Self::Permanent => "permanent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "legumes" => Some(Self::Legumes),
            "brassicas" => Some(Self::Brassicas),
            "roots" => Some(Self::Roots),
            "solanaceae" => Some(Self::Solanaceae),
            "alliums" => Some(Self::Alliums),
            "cucurbits" => Some(Self::Cucurbits),
            "permanent" => Some(Self::Permanent),
            _ => None,
        }
    }

    /// Group a bed moves to in the following year.
    ///
    /// Cycle: legumes → brassicas → roots → solanaceae → alliums →
    /// cucurbits → legumes. `Permanent` never rotates.
    pub fn next_in_rotation(self) -> Self {
        match self {
            Self::Legumes => Self::Brassicas,
            Self::Brassicas => Self::Roots,
            Self::Roots => Self::Solanaceae,
            Self::Solanaceae => Self::Alliums,
            Self::Alliums => Self::Cucurbits,
            Self::Cucurbits => Self::Legumes,
            Self::Permanent => Self::Permanent,
        }
    }
}

/// Structure type for `AreaKind::Infrastructure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InfrastructureSubtype {
    Shed,
    Compost,
    WaterButt,
    Path,
    Greenhouse,
    Pond,
    Wildlife,
    Other,
}

impl InfrastructureSubtype {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shed" => Some(Self::Shed),
            "compost" => Some(Self::Compost),
            "water-butt" => Some(Self::WaterButt),
            "path" => Some(Self::Path),
            "greenhouse" => Some(Self::Greenhouse),
            "pond" => Some(Self::Pond),
            "wildlife" => Some(Self::Wildlife),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// The plant an area is dedicated to (a tree, a berry row, a herb patch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryPlant {
    /// Free-text plant identifier; not checked against any catalog.
    pub plant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planted_year: Option<i32>,
}

impl PrimaryPlant {
    pub fn new(plant_id: impl Into<String>) -> Self {
        Self {
            plant_id: plant_id.into(),
            variety: None,
            planted_year: None,
        }
    }
}

/// One unit of managed land or structure in the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    pub kind: AreaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_group: Option<RotationGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_plant: Option<PrimaryPlant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_subtype: Option<InfrastructureSubtype>,
    #[serde(default)]
    pub can_have_plantings: bool,
    /// Soft-delete flag. Archived areas keep all of their season data.
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// First season year the area exists in (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_year: Option<i32>,
    /// First season year the area no longer exists in (exclusive bound).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired_year: Option<i32>,
    /// Explicit override; when non-empty it alone decides visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_years: Option<Vec<i32>>,
}

impl Area {
    /// Whether any temporal-lifecycle field is set.
    pub fn has_temporal_metadata(&self) -> bool {
        self.created_year.is_some() || self.retired_year.is_some() || self.active_years.is_some()
    }
}

/// Caller input for `add_area`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArea {
    pub name: String,
    pub kind: AreaKind,
    pub description: Option<String>,
    pub rotation_group: Option<RotationGroup>,
    pub primary_plant: Option<PrimaryPlant>,
    pub infrastructure_subtype: Option<InfrastructureSubtype>,
    /// Overrides the kind's default when set.
    pub can_have_plantings: Option<bool>,
    pub created_year: Option<i32>,
    pub retired_year: Option<i32>,
    pub active_years: Option<Vec<i32>>,
}

impl NewArea {
    pub fn new(name: impl Into<String>, kind: AreaKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            rotation_group: None,
            primary_plant: None,
            infrastructure_subtype: None,
            can_have_plantings: None,
            created_year: None,
            retired_year: None,
            active_years: None,
        }
    }
}

/// Partial update merged into an existing area.
///
/// `None` leaves a field untouched. Temporal fields use a nested option so
/// callers can clear them with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rotation_group: Option<RotationGroup>,
    pub primary_plant: Option<PrimaryPlant>,
    pub infrastructure_subtype: Option<InfrastructureSubtype>,
    pub can_have_plantings: Option<bool>,
    pub created_year: Option<Option<i32>>,
    pub retired_year: Option<Option<i32>>,
    pub active_years: Option<Option<Vec<i32>>>,
}

/// Options for `change_area_kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindChangeOptions {
    /// Group to assign when converting into a rotation bed.
    pub rotation_group: Option<RotationGroup>,
    /// Plant to assign when converting into a planted kind.
    pub primary_plant: Option<PrimaryPlant>,
    /// Subtype to assign when converting into infrastructure.
    pub infrastructure_subtype: Option<InfrastructureSubtype>,
    /// Overrides the new kind's default planting capability.
    pub can_have_plantings: Option<bool>,
}
