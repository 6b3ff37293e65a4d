//! v10 → v11: rewrite drifted plant identifiers to their canonical form.
//!
//! Two naming schemes grew apart over time (plural vs singular slugs). The
//! table below maps every known non-canonical id to the canonical one;
//! anything not in the table passes through unchanged.

use super::{objects_mut, root_mut, MigrationContext, MigrationResult};
use serde_json::{Map, Value};

/// Old → canonical plant id. No canonical id appears on the left side.
const PLANT_ID_RENAMES: &[(&str, &str)] = &[
    ("apples", "apple"),
    ("beetroots", "beetroot"),
    ("blackcurrants", "blackcurrant"),
    ("broad-bean", "broad-beans"),
    ("brussels-sprout", "brussels-sprouts"),
    ("carrots", "carrot"),
    ("courgettes", "courgette"),
    ("french-bean", "french-beans"),
    ("gooseberries", "gooseberry"),
    ("leeks", "leek"),
    ("onions", "onion"),
    ("parsnips", "parsnip"),
    ("pea", "peas"),
    ("potatoes", "potato"),
    ("raspberries", "raspberry"),
    ("runner-bean", "runner-beans"),
    ("spring-onion", "spring-onions"),
    ("strawberries", "strawberry"),
    ("sweet-peas", "sweet-pea"),
    ("tomatoes", "tomato"),
];

/// Maps a plant id to its canonical spelling.
pub fn canonical_plant_id(plant_id: &str) -> &str {
    PLANT_ID_RENAMES
        .iter()
        .find(|(old, _)| *old == plant_id)
        .map_or(plant_id, |(_, canonical)| *canonical)
}

pub(super) fn canonicalize_plant_ids(
    mut document: Value,
    _ctx: &mut MigrationContext<'_>,
) -> MigrationResult<Value> {
    let root = root_mut(&mut document)?;

    if let Some(layout) = root.get_mut("layout").and_then(Value::as_object_mut) {
        for area in objects_mut(layout, "areas") {
            if let Some(primary) = area.get_mut("primaryPlant").and_then(Value::as_object_mut) {
                rewrite_plant_id(primary);
            }
        }
    }

    for season in objects_mut(root, "seasons") {
        for entry in objects_mut(season, "areas") {
            for planting in objects_mut(entry, "plantings") {
                rewrite_plant_id(planting);
            }
        }
    }

    for variety in objects_mut(root, "varieties") {
        rewrite_plant_id(variety);
    }

    Ok(document)
}

fn rewrite_plant_id(record: &mut Map<String, Value>) {
    let Some(current) = record.get("plantId").and_then(Value::as_str) else {
        return;
    };
    let canonical = canonical_plant_id(current);
    if canonical != current {
        let canonical = canonical.to_string();
        record.insert("plantId".to_string(), Value::String(canonical));
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_plant_id, PLANT_ID_RENAMES};

    #[test]
    fn rename_table_has_no_chains() {
        for (_, canonical) in PLANT_ID_RENAMES {
            assert!(
                PLANT_ID_RENAMES.iter().all(|(old, _)| old != canonical),
                "`{canonical}` is both a target and a source"
            );
        }
    }

    #[test]
    fn unmapped_ids_pass_through() {
        assert_eq!(canonical_plant_id("potatoes"), "potato");
        assert_eq!(canonical_plant_id("pea"), "peas");
        assert_eq!(canonical_plant_id("kohlrabi"), "kohlrabi");
    }
}
