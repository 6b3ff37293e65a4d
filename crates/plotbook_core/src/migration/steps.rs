//! Additive and field-reshaping steps (v0 → v9).
//!
//! Every step checks for its own output before adding it, so re-applying a
//! step to an already-migrated document leaves it unchanged.

use super::{ensure_array, objects_mut, root_mut, MigrationContext, MigrationResult};
use crate::model::document::DEFAULT_DOCUMENT_NAME;
use serde_json::{json, Map, Value};

/// v0 → v1: make sure `meta` exists with a name and timestamps, and that
/// the document knows its current year.
pub(super) fn stamp_version(
    mut document: Value,
    ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let timestamp = ctx.engine.timestamp();
    let current_year = ctx.engine.current_year();
    let root = root_mut(&mut document)?;
    if !root.get("currentYear").is_some_and(Value::is_i64) {
        root.insert("currentYear".to_string(), Value::from(current_year));
    }

    let meta = root.entry("meta").or_insert_with(|| json!({}));
    if !meta.is_object() {
        *meta = json!({});
    }
    if let Some(meta) = meta.as_object_mut() {
        meta.entry("name")
            .or_insert_with(|| Value::from(DEFAULT_DOCUMENT_NAME));
        meta.entry("createdAt")
            .or_insert_with(|| Value::from(timestamp.clone()));
        meta.entry("updatedAt")
            .or_insert_with(|| Value::from(timestamp));
    }

    Ok(document)
}

/// v1 → v2
pub(super) fn add_maintenance_tasks(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    ensure_array(root_mut(&mut document)?, "maintenanceTasks");
    Ok(document)
}

/// v2 → v3: split layout into the beds/permanent/infrastructure triplet.
///
/// A document with no beds and no season data gets the default layout.
pub(super) fn add_layout_collections(
    mut document: Value,
    ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;
    let genuinely_empty = is_empty_legacy_document(root);

    let layout = root.entry("layout").or_insert_with(|| json!({}));
    if layout.get("areas").is_some() {
        return Ok(document);
    }

    if genuinely_empty {
        *layout = ctx.default_layout.to_legacy_layout();
    } else if let Some(layout) = layout.as_object_mut() {
        ensure_array(layout, "beds");
        ensure_array(layout, "permanentPlantings");
        ensure_array(layout, "infrastructure");
    }

    Ok(document)
}

fn is_empty_legacy_document(root: &Map<String, Value>) -> bool {
    let layout = root.get("layout");
    if layout.and_then(|layout| layout.get("areas")).is_some() {
        return false;
    }

    let no_beds = layout
        .and_then(|layout| layout.get("beds"))
        .and_then(Value::as_array)
        .map_or(true, Vec::is_empty);

    let no_season_data = root
        .get("seasons")
        .and_then(Value::as_array)
        .map_or(true, |seasons| {
            seasons.iter().all(|season| {
                ["beds", "areas"].iter().all(|field| {
                    season
                        .get(*field)
                        .and_then(Value::as_array)
                        .map_or(true, Vec::is_empty)
                })
            })
        });

    no_beds && no_season_data
}

/// v3 → v4: each legacy bed season carries a `notes` list.
pub(super) fn add_bed_season_notes(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;
    for season in objects_mut(root, "seasons") {
        for bed in objects_mut(season, "beds") {
            let notes = match bed.remove("notes") {
                Some(Value::Array(notes)) => notes,
                Some(Value::String(note)) if !note.trim().is_empty() => {
                    vec![Value::String(note)]
                }
                _ => Vec::new(),
            };
            bed.insert("notes".to_string(), Value::Array(notes));
        }
    }
    Ok(document)
}

/// v4 → v5: per-season side-table for permanent plantings.
pub(super) fn add_permanent_seasons(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;
    for season in objects_mut(root, "seasons") {
        if season.contains_key("beds") {
            ensure_array(season, "permanentSeasons");
        }
    }
    Ok(document)
}

/// v5 → v6
pub(super) fn add_garden_events(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    ensure_array(root_mut(&mut document)?, "gardenEvents");
    Ok(document)
}

/// v6 → v7: variety catalog moves into the document.
///
/// An embedded separate store (`{version, varieties: [...]}`) is flattened.
pub(super) fn add_variety_catalog(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;
    let embedded = root
        .get_mut("varieties")
        .and_then(Value::as_object_mut)
        .and_then(|store| store.remove("varieties"))
        .filter(Value::is_array);

    match embedded {
        Some(varieties) => {
            root.insert("varieties".to_string(), varieties);
        }
        None => ensure_array(root, "varieties"),
    }
    Ok(document)
}

/// v7 → v8: per-year planning and seed status on each variety.
///
/// Legacy `haveSeeds`/`arrived` flags become a `seedsByYear` entry for the
/// document's current year.
pub(super) fn add_variety_seed_tracking(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;
    let current_year = root.get("currentYear").and_then(Value::as_i64);

    for variety in objects_mut(root, "varieties") {
        ensure_array(variety, "yearsUsed");
        ensure_array(variety, "plannedYears");
        if !variety.get("seedsByYear").is_some_and(Value::is_object) {
            variety.insert("seedsByYear".to_string(), json!({}));
        }

        let have_seeds = variety.remove("haveSeeds").and_then(|flag| flag.as_bool());
        let arrived = variety.remove("arrived").and_then(|flag| flag.as_bool());
        let legacy_status = match (have_seeds, arrived) {
            (Some(true), _) | (_, Some(true)) => Some("have"),
            (_, Some(false)) => Some("ordered"),
            _ => None,
        };

        if let (Some(status), Some(year)) = (legacy_status, current_year) {
            if let Some(seeds) = variety
                .get_mut("seedsByYear")
                .and_then(Value::as_object_mut)
            {
                seeds
                    .entry(year.to_string())
                    .or_insert_with(|| Value::from(status));
            }
        }
    }
    Ok(document)
}

/// v8 → v9: string notes become structured note records.
pub(super) fn structure_notes(
    mut document: Value,
    ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let fallback = ctx.engine.timestamp();
    let root = root_mut(&mut document)?;

    for season in objects_mut(root, "seasons") {
        let stamped_at = season
            .get("updatedAt")
            .and_then(Value::as_str)
            .map_or_else(|| fallback.clone(), str::to_string);

        for collection in ["beds", "permanentSeasons", "areas"] {
            for entry in objects_mut(season, collection) {
                let notes = match entry.remove("notes") {
                    Some(Value::Array(notes)) => notes,
                    Some(Value::String(note)) => vec![Value::String(note)],
                    _ => Vec::new(),
                };
                let structured = notes
                    .into_iter()
                    .filter_map(|note| structure_note(note, &stamped_at, ctx))
                    .collect();
                entry.insert("notes".to_string(), Value::Array(structured));
            }
        }
    }
    Ok(document)
}

fn structure_note(note: Value, stamped_at: &str, ctx: &mut MigrationContext<'_>) -> Option<Value> {
    match note {
        Value::Object(_) => Some(note),
        Value::String(content) if !content.trim().is_empty() => Some(json!({
            "id": ctx.engine.next_id("note"),
            "content": content,
            "type": "info",
            "createdAt": stamped_at,
            "updatedAt": stamped_at,
        })),
        _ => None,
    }
}
