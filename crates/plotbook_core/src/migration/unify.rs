//! v9 → v10: collapse the legacy layout triplet into one area collection.
//!
//! Layout: `beds`, `permanentPlantings` and `infrastructure` become
//! `layout.areas` entries discriminated by `kind`.
//!
//! Seasons: `beds` and the `permanentSeasons` side-table become
//! `season.areas`, one entry per area id. Underplantings of permanent
//! plantings turn into ordinary plantings. Seasons without a recognized
//! `status` get one derived from `currentYear`.

use super::{ensure_array, objects_mut, root_mut, MigrationContext, MigrationResult};
use crate::model::area::{AreaKind, InfrastructureSubtype, RotationGroup};
use crate::model::season::SeasonStatus;
use crate::schema::validate::LEGACY_INFRASTRUCTURE_TYPES;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

const LEGACY_LAYOUT_FIELDS: [&str; 3] = ["beds", "permanentPlantings", "infrastructure"];
const LIFECYCLE_FIELDS: [&str; 6] = [
    "isArchived",
    "createdAt",
    "createdYear",
    "retiredYear",
    "activeYears",
    "description",
];

pub(super) fn unify_areas(
    mut document: Value,
    ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;
    let underplanted = underplanted_area_ids(root);
    let current_year = root
        .get("currentYear")
        .and_then(Value::as_i64)
        .and_then(|year| i32::try_from(year).ok())
        .unwrap_or_else(|| ctx.engine.current_year());

    if let Some(layout) = root.get_mut("layout").and_then(Value::as_object_mut) {
        unify_layout(layout, &underplanted);
    }

    for season in objects_mut(root, "seasons") {
        unify_season(season, ctx);
        fill_season_status(season, current_year);
    }

    Ok(document)
}

fn fill_season_status(season: &mut Map<String, Value>, current_year: i32) {
    let recognized = season
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| SeasonStatus::parse(status).is_some());
    if recognized {
        return;
    }
    let Some(year) = season
        .get("year")
        .and_then(Value::as_i64)
        .and_then(|year| i32::try_from(year).ok())
    else {
        return;
    };
    let status = SeasonStatus::for_year(year, current_year);
    season.insert("status".to_string(), Value::from(status.as_str()));
}

fn underplanted_area_ids(root: &Map<String, Value>) -> HashSet<String> {
    root.get("seasons")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|season| season.get("permanentSeasons").and_then(Value::as_array))
        .flatten()
        .filter(|entry| {
            entry
                .get("underplantings")
                .and_then(Value::as_array)
                .is_some_and(|items| !items.is_empty())
        })
        .filter_map(|entry| entry.get("plantingId").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn unify_layout(layout: &mut Map<String, Value>, underplanted: &HashSet<String>) {
    let mut areas: Vec<Value> = take_array(layout, "areas")
        .into_iter()
        .map(upgrade_typed_area)
        .collect();
    let mut seen: HashSet<String> = areas
        .iter()
        .filter_map(|area| area.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let converted = take_array(layout, "beds")
        .into_iter()
        .filter_map(bed_to_area)
        .chain(
            take_array(layout, "permanentPlantings")
                .into_iter()
                .filter_map(|item| permanent_to_area(item, underplanted)),
        )
        .chain(
            take_array(layout, "infrastructure")
                .into_iter()
                .filter_map(infrastructure_to_area),
        );

    for area in converted {
        let Some(id) = area.get("id").and_then(Value::as_str) else {
            continue;
        };
        if seen.insert(id.to_string()) {
            areas.push(area);
        }
    }

    for field in LEGACY_LAYOUT_FIELDS {
        layout.remove(field);
    }
    layout.insert("areas".to_string(), Value::Array(areas));
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match map.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn carry(from: &Map<String, Value>, to: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if let Some(value) = from.get(*field) {
            to.insert((*field).to_string(), value.clone());
        }
    }
}

fn new_area(from: &Map<String, Value>, kind: AreaKind) -> Map<String, Value> {
    let mut area = Map::new();
    carry(from, &mut area, &["id", "name"]);
    area.insert("kind".to_string(), Value::from(kind.as_str()));
    carry(from, &mut area, &LIFECYCLE_FIELDS);
    area.insert(
        "canHavePlantings".to_string(),
        Value::Bool(kind.default_can_have_plantings()),
    );
    area.entry("isArchived").or_insert(Value::Bool(false));
    area
}

fn valid_rotation_group(value: Option<&Value>) -> Option<Value> {
    value
        .and_then(Value::as_str)
        .filter(|group| RotationGroup::parse(group).is_some())
        .map(Value::from)
}

fn bed_to_area(bed: Value) -> Option<Value> {
    let Value::Object(bed) = bed else {
        return None;
    };
    let kind = match bed.get("status").and_then(Value::as_str) {
        Some("perennial") => AreaKind::PerennialBed,
        _ => AreaKind::RotationBed,
    };

    let mut area = new_area(&bed, kind);
    if kind == AreaKind::RotationBed {
        if let Some(group) = valid_rotation_group(bed.get("rotationGroup")) {
            area.insert("rotationGroup".to_string(), group);
        }
    }
    Some(Value::Object(area))
}

fn permanent_kind(legacy_type: &str) -> AreaKind {
    match legacy_type {
        "fruit-tree" => AreaKind::Tree,
        "berry" => AreaKind::Berry,
        "herb" => AreaKind::Herb,
        "perennial-veg" | "perennial-flower" | "climber" => AreaKind::PerennialBed,
        _ => AreaKind::Other,
    }
}

fn permanent_to_area(item: Value, underplanted: &HashSet<String>) -> Option<Value> {
    let Value::Object(item) = item else {
        return None;
    };
    let kind = permanent_kind(item.get("type").and_then(Value::as_str).unwrap_or("other"));
    let mut area = new_area(&item, kind);

    if !area.contains_key("description") {
        if let Some(notes) = item.get("notes").filter(|notes| notes.is_string()) {
            area.insert("description".to_string(), notes.clone());
        }
    }

    if kind.has_primary_plant() {
        if let Some(plant_id) = item.get("plantId").and_then(Value::as_str) {
            let mut primary = Map::new();
            primary.insert("plantId".to_string(), Value::from(plant_id));
            if let Some(variety) = item.get("variety").filter(|value| value.is_string()) {
                primary.insert("variety".to_string(), variety.clone());
            }
            if let Some(year) = item.get("plantedYear").filter(|value| value.is_i64()) {
                primary.insert("plantedYear".to_string(), year.clone());
            }
            area.insert("primaryPlant".to_string(), Value::Object(primary));
        }
    }

    let has_underplantings = item
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| underplanted.contains(id));
    if has_underplantings {
        area.insert("canHavePlantings".to_string(), Value::Bool(true));
    }

    Some(Value::Object(area))
}

fn infrastructure_to_area(item: Value) -> Option<Value> {
    let Value::Object(item) = item else {
        return None;
    };
    let mut area = new_area(&item, AreaKind::Infrastructure);
    let subtype = item
        .get("type")
        .and_then(Value::as_str)
        .filter(|value| InfrastructureSubtype::parse(value).is_some())
        .unwrap_or("other");
    area.insert("infrastructureSubtype".to_string(), Value::from(subtype));
    Some(Value::Object(area))
}

/// Areas already in the unified collection that still carry only a legacy
/// `type` get a `kind`.
fn upgrade_typed_area(area: Value) -> Value {
    let mut area = match area {
        Value::Object(area) => area,
        other => return other,
    };
    if area.contains_key("kind") {
        return Value::Object(area);
    }

    let legacy_type = area
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("other")
        .to_string();
    if LEGACY_INFRASTRUCTURE_TYPES.contains(&legacy_type.as_str()) {
        area.insert("kind".to_string(), Value::from(AreaKind::Infrastructure.as_str()));
        area.entry("infrastructureSubtype")
            .or_insert_with(|| Value::from(legacy_type.clone()));
        area.entry("canHavePlantings").or_insert(Value::Bool(false));
    } else {
        let kind = permanent_kind(&legacy_type);
        area.insert("kind".to_string(), Value::from(kind.as_str()));
        area.entry("canHavePlantings")
            .or_insert(Value::Bool(kind.default_can_have_plantings()));
    }
    area.remove("type");
    Value::Object(area)
}

fn unify_season(season: &mut Map<String, Value>, ctx: &mut MigrationContext<'_>) {
    if !season.contains_key("beds") && !season.contains_key("permanentSeasons") {
        ensure_array(season, "areas");
        return;
    }

    let mut entries: Vec<Map<String, Value>> = take_array(season, "areas")
        .into_iter()
        .filter_map(into_object)
        .collect();

    for bed in take_array(season, "beds").into_iter().filter_map(into_object) {
        if let Some(entry) = bed_season_to_area_season(&bed) {
            merge_entry(&mut entries, entry);
        }
    }

    for permanent in take_array(season, "permanentSeasons")
        .into_iter()
        .filter_map(into_object)
    {
        if let Some(entry) = permanent_season_to_area_season(&permanent, ctx) {
            merge_entry(&mut entries, entry);
        }
    }

    season.insert(
        "areas".to_string(),
        Value::Array(entries.into_iter().map(Value::Object).collect()),
    );
}

fn into_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn array_field(from: &Map<String, Value>, field: &str) -> Vec<Value> {
    from.get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn area_season(area_id: &str, source: &Map<String, Value>) -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert("areaId".to_string(), Value::from(area_id));
    if let Some(group) = valid_rotation_group(source.get("rotationGroup")) {
        entry.insert("rotationGroup".to_string(), group);
    }
    entry.insert("plantings".to_string(), Value::Array(array_field(source, "plantings")));
    entry.insert("notes".to_string(), Value::Array(array_field(source, "notes")));
    entry.insert("careLogs".to_string(), Value::Array(array_field(source, "careLogs")));
    carry(source, &mut entry, &["harvestTotal", "harvestUnit"]);
    entry
}

fn bed_season_to_area_season(bed: &Map<String, Value>) -> Option<Map<String, Value>> {
    let area_id = bed
        .get("bedId")
        .or_else(|| bed.get("areaId"))
        .and_then(Value::as_str)?;
    Some(area_season(area_id, bed))
}

fn permanent_season_to_area_season(
    permanent: &Map<String, Value>,
    ctx: &mut MigrationContext<'_>,
) -> Option<Map<String, Value>> {
    let area_id = permanent
        .get("plantingId")
        .or_else(|| permanent.get("areaId"))
        .and_then(Value::as_str)?;
    let mut entry = area_season(area_id, permanent);

    let converted: Vec<Value> = array_field(permanent, "underplantings")
        .into_iter()
        .filter_map(|item| underplanting_to_planting(item, ctx))
        .collect();
    if let Some(Value::Array(plantings)) = entry.get_mut("plantings") {
        plantings.extend(converted);
    }

    Some(entry)
}

fn underplanting_to_planting(item: Value, ctx: &mut MigrationContext<'_>) -> Option<Value> {
    let item = into_object(item)?;
    let plant_id = item.get("plantId").and_then(Value::as_str)?;

    let id = item
        .get("id")
        .and_then(Value::as_str)
        .map_or_else(|| ctx.engine.next_id("planting"), str::to_string);
    let mut planting = json!({ "id": id, "plantId": plant_id });
    let Some(fields) = planting.as_object_mut() else {
        return None;
    };

    if let Some(variety) = item.get("varietyName").or_else(|| item.get("variety")) {
        fields.insert("varietyName".to_string(), variety.clone());
    }
    if let Some(date) = item.get("sowDate").or_else(|| item.get("plantedDate")) {
        fields.insert("sowDate".to_string(), date.clone());
    }
    carry(&item, fields, &["harvestDate", "notes"]);
    Some(planting)
}

fn merge_entry(entries: &mut Vec<Map<String, Value>>, incoming: Map<String, Value>) {
    let area_id = incoming.get("areaId").cloned();
    let Some(index) = entries
        .iter()
        .position(|entry| entry.get("areaId") == area_id.as_ref())
    else {
        entries.push(incoming);
        return;
    };

    let existing = &mut entries[index];
    for (field, value) in incoming {
        match existing.get_mut(&field) {
            Some(Value::Array(current)) => {
                if let Value::Array(extra) = value {
                    current.extend(extra);
                }
            }
            Some(_) => {}
            None => {
                existing.insert(field, value);
            }
        }
    }
}
