//! Structural schema checks over decoded JSON.
//!
//! Below `UNIFIED_SCHEMA_VERSION` the legacy bed shapes are accepted so the
//! migration chain can run. From that version on a document must have the
//! unified shape the typed model decodes.

use crate::model::area::AreaKind;
use crate::model::season::SeasonStatus;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Discriminators used by pre-unification permanent plantings.
pub const LEGACY_PERMANENT_TYPES: &[&str] = &[
    "fruit-tree",
    "berry",
    "herb",
    "perennial-veg",
    "perennial-flower",
    "climber",
];

/// Discriminators used by pre-unification infrastructure records.
pub const LEGACY_INFRASTRUCTURE_TYPES: &[&str] = &[
    "shed",
    "compost",
    "water-butt",
    "path",
    "greenhouse",
    "pond",
    "wildlife",
    "other",
];

/// First version whose layout and seasons use the unified `areas` shape.
pub const UNIFIED_SCHEMA_VERSION: u64 = 10;

const LEGACY_LAYOUT_FIELDS: [&str; 3] = ["beds", "permanentPlantings", "infrastructure"];
const LEGACY_SEASON_FIELDS: [&str; 2] = ["beds", "permanentSeasons"];

/// Outcome of `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// How an area entry declares what it is.
#[derive(Debug, Clone, Copy)]
enum Discriminator {
    /// A recognized `kind`.
    Kind,
    /// `kind`, or a legacy `type` for partially migrated records.
    KindOrLegacyType,
    /// Legacy `type` drawn from the given vocabulary.
    LegacyType(&'static [&'static str]),
    /// Implied by the containing collection (legacy beds).
    Collection,
}

/// Checks `value` against the document shape. Never panics.
pub fn validate(value: &Value) -> ValidationReport {
    let Some(root) = value.as_object() else {
        return ValidationReport::from_errors(vec!["document must be a JSON object".to_string()]);
    };

    let mut errors = Vec::new();

    if !root.get("version").is_some_and(Value::is_number) {
        errors.push("`version` must be a number".to_string());
    }
    if !root.get("currentYear").is_some_and(Value::is_number) {
        errors.push("`currentYear` must be a number".to_string());
    }

    match root.get("meta") {
        Some(Value::Object(meta)) => {
            if !meta.get("name").is_some_and(Value::is_string) {
                errors.push("`meta.name` must be a string".to_string());
            }
        }
        _ => errors.push("`meta` must be an object".to_string()),
    }

    let unified = root
        .get("version")
        .and_then(Value::as_u64)
        .is_some_and(|version| version >= UNIFIED_SCHEMA_VERSION);

    validate_layout(root.get("layout"), unified, &mut errors);
    validate_seasons(root.get("seasons"), unified, &mut errors);

    ValidationReport::from_errors(errors)
}

fn validate_layout(layout: Option<&Value>, unified: bool, errors: &mut Vec<String>) {
    let Some(layout) = layout.and_then(Value::as_object) else {
        errors.push("`layout` must be an object".to_string());
        return;
    };

    let mut seen_ids = HashSet::new();

    if unified {
        for field in LEGACY_LAYOUT_FIELDS {
            if layout.contains_key(field) {
                errors.push(format!(
                    "`layout.{field}` is a legacy field and not allowed from version {UNIFIED_SCHEMA_VERSION}"
                ));
            }
        }
        match layout.get("areas") {
            Some(areas) => check_collection(
                areas,
                "layout.areas",
                Discriminator::Kind,
                &mut seen_ids,
                errors,
            ),
            None => errors.push("`layout` must contain an `areas` array".to_string()),
        }
        return;
    }

    if let Some(areas) = layout.get("areas") {
        check_collection(
            areas,
            "layout.areas",
            Discriminator::KindOrLegacyType,
            &mut seen_ids,
            errors,
        );
        return;
    }

    if let Some(beds) = layout.get("beds") {
        check_collection(
            beds,
            "layout.beds",
            Discriminator::Collection,
            &mut seen_ids,
            errors,
        );
        for (field, vocabulary) in [
            ("permanentPlantings", LEGACY_PERMANENT_TYPES),
            ("infrastructure", LEGACY_INFRASTRUCTURE_TYPES),
        ] {
            if let Some(collection) = layout.get(field) {
                check_collection(
                    collection,
                    &format!("layout.{field}"),
                    Discriminator::LegacyType(vocabulary),
                    &mut seen_ids,
                    errors,
                );
            }
        }
        return;
    }

    errors.push("`layout` must contain an `areas` array or a legacy `beds` array".to_string());
}

fn check_collection(
    value: &Value,
    path: &str,
    discriminator: Discriminator,
    seen_ids: &mut HashSet<String>,
    errors: &mut Vec<String>,
) {
    let Some(items) = value.as_array() else {
        errors.push(format!("`{path}` must be an array"));
        return;
    };

    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        let Some(area) = item.as_object() else {
            errors.push(format!("`{item_path}` must be an object"));
            continue;
        };
        check_area(area, &item_path, discriminator, seen_ids, errors);
    }
}

fn check_area(
    area: &Map<String, Value>,
    path: &str,
    discriminator: Discriminator,
    seen_ids: &mut HashSet<String>,
    errors: &mut Vec<String>,
) {
    match area.get("id").and_then(Value::as_str) {
        Some(id) => {
            if !seen_ids.insert(id.to_string()) {
                errors.push(format!("`{path}.id` duplicates area id `{id}`"));
            }
        }
        None => errors.push(format!("`{path}.id` must be a string")),
    }

    if !area.get("name").is_some_and(Value::is_string) {
        errors.push(format!("`{path}.name` must be a string"));
    }

    match discriminator {
        Discriminator::Collection => {}
        Discriminator::Kind => {
            let recognized = area
                .get("kind")
                .and_then(Value::as_str)
                .is_some_and(|kind| AreaKind::parse(kind).is_some());
            if !recognized {
                errors.push(format!("`{path}` must have a recognized `kind`"));
            }
        }
        Discriminator::KindOrLegacyType => {
            let kind = area.get("kind").and_then(Value::as_str);
            let legacy_type = area.get("type").and_then(Value::as_str);
            let recognized = kind.is_some_and(|kind| AreaKind::parse(kind).is_some())
                || legacy_type.is_some_and(is_legacy_area_type);
            if !recognized {
                errors.push(format!(
                    "`{path}` must have a recognized `kind` (or legacy `type`)"
                ));
            }
        }
        Discriminator::LegacyType(vocabulary) => {
            let recognized = area
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|value| vocabulary.contains(&value));
            if !recognized {
                errors.push(format!("`{path}.type` must be one of {vocabulary:?}"));
            }
        }
    }
}

fn is_legacy_area_type(value: &str) -> bool {
    LEGACY_PERMANENT_TYPES.contains(&value) || LEGACY_INFRASTRUCTURE_TYPES.contains(&value)
}

fn validate_seasons(seasons: Option<&Value>, unified: bool, errors: &mut Vec<String>) {
    let Some(seasons) = seasons.and_then(Value::as_array) else {
        errors.push("`seasons` must be an array".to_string());
        return;
    };

    for (index, season) in seasons.iter().enumerate() {
        let path = format!("seasons[{index}]");
        let Some(season) = season.as_object() else {
            errors.push(format!("`{path}` must be an object"));
            continue;
        };

        if !season.get("year").is_some_and(Value::is_number) {
            errors.push(format!("`{path}.year` must be a number"));
        }

        let has_areas = season.get("areas").is_some_and(Value::is_array);
        if unified {
            if !has_areas {
                errors.push(format!("`{path}` must contain an `areas` array"));
            }
            for field in LEGACY_SEASON_FIELDS {
                if season.contains_key(field) {
                    errors.push(format!(
                        "`{path}.{field}` is a legacy field and not allowed from version {UNIFIED_SCHEMA_VERSION}"
                    ));
                }
            }
            if let Some(entries) = season.get("areas").and_then(Value::as_array) {
                for (entry_index, entry) in entries.iter().enumerate() {
                    check_area_season(entry, &format!("{path}.areas[{entry_index}]"), errors);
                }
            }
            let status = season.get("status").and_then(Value::as_str);
            if !status.is_some_and(|status| SeasonStatus::parse(status).is_some()) {
                errors.push(format!(
                    "`{path}.status` must be one of historical, current, planned"
                ));
            }
            continue;
        }

        let has_beds = season.get("beds").is_some_and(Value::is_array);
        if !has_areas && !has_beds {
            errors.push(format!(
                "`{path}` must contain an `areas` array or a legacy `beds` array"
            ));
        }
    }
}

/// Required string fields of each record list inside an area season.
const AREA_SEASON_RECORDS: [(&str, &[&str]); 3] = [
    ("plantings", &["id", "plantId"]),
    ("careLogs", &["id", "type", "date"]),
    ("notes", &["id", "content", "type"]),
];

fn check_area_season(entry: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(entry) = entry.as_object() else {
        errors.push(format!("`{path}` must be an object"));
        return;
    };
    if !entry.get("areaId").is_some_and(Value::is_string) {
        errors.push(format!("`{path}.areaId` must be a string"));
    }

    for (collection, required) in AREA_SEASON_RECORDS {
        let Some(value) = entry.get(collection) else {
            continue;
        };
        let Some(records) = value.as_array() else {
            errors.push(format!("`{path}.{collection}` must be an array"));
            continue;
        };
        for (index, record) in records.iter().enumerate() {
            for field in required {
                if !record.get(*field).is_some_and(Value::is_string) {
                    errors.push(format!("`{path}.{collection}[{index}].{field}` must be a string"));
                }
            }
        }
    }
}
