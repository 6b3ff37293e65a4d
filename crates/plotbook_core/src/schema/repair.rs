//! Best-effort reconstruction of documents that failed validation.

use crate::context::EngineContext;
use crate::model::document::{CURRENT_SCHEMA_VERSION, DEFAULT_DOCUMENT_NAME};
use crate::schema::validate::validate;
use serde_json::{json, Map, Value};

/// Rebuilds `value` on top of defaults for every missing top-level field.
///
/// Present fields are kept as-is (shallow merge), so a present-but-malformed
/// field still fails the re-validation. A missing `version` defaults to the
/// current schema, or to 0 when the layout still has the legacy bed shape so
/// the migration chain runs. Returns `None` when the merged document does
/// not validate or when `value` is not an object at all.
pub fn repair(value: &Value, ctx: &mut EngineContext) -> Option<Value> {
    let partial = value.as_object()?;

    let mut repaired = default_fields(ctx);
    if !partial.contains_key("version") && has_legacy_layout(partial) {
        repaired.insert("version".to_string(), Value::from(0));
    }
    for (key, field) in partial {
        repaired.insert(key.clone(), field.clone());
    }

    let repaired = Value::Object(repaired);
    if validate(&repaired).valid {
        Some(repaired)
    } else {
        None
    }
}

fn has_legacy_layout(partial: &Map<String, Value>) -> bool {
    partial
        .get("layout")
        .and_then(Value::as_object)
        .is_some_and(|layout| !layout.contains_key("areas") && layout.contains_key("beds"))
}

fn default_fields(ctx: &mut EngineContext) -> Map<String, Value> {
    let timestamp = ctx.timestamp();
    let defaults = json!({
        "version": CURRENT_SCHEMA_VERSION,
        "meta": {
            "name": DEFAULT_DOCUMENT_NAME,
            "createdAt": timestamp,
            "updatedAt": timestamp,
        },
        "layout": { "areas": [] },
        "seasons": [],
        "currentYear": ctx.current_year(),
        "maintenanceTasks": [],
        "gardenEvents": [],
        "varieties": [],
    });

    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
