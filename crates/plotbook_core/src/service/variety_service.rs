//! Variety catalog operations.
//!
//! # Invariants
//! - `seeds_by_year` is sparse: cycling back to `SeedStatus::None` removes
//!   the year's entry.
//! - `planned_years` stays sorted and free of duplicates once toggled, even
//!   when imported data stored it out of order.
//! - Duplicate cleanup archives, it never deletes.

use crate::context::EngineContext;
use crate::model::document::Document;
use crate::model::variety::{NewVariety, SeedStatus, StoredVariety, VarietyUpdate};
use crate::service::Created;
use std::collections::BTreeMap;

pub fn add_variety(document: &Document, input: NewVariety, ctx: &mut EngineContext) -> Created {
    let variety = StoredVariety {
        id: ctx.next_id("variety"),
        plant_id: input.plant_id,
        name: input.name,
        supplier: input.supplier,
        price: input.price,
        notes: input.notes,
        years_used: Vec::new(),
        planned_years: Vec::new(),
        seeds_by_year: BTreeMap::new(),
        is_archived: false,
        created_at: Some(ctx.timestamp()),
    };

    let id = variety.id.clone();
    let mut next = document.clone();
    next.varieties.push(variety);
    Created { document: next, id }
}

pub fn update_variety(document: &Document, variety_id: &str, update: VarietyUpdate) -> Document {
    with_variety(document, variety_id, |variety| {
        if let Some(plant_id) = update.plant_id {
            variety.plant_id = plant_id;
        }
        if let Some(name) = update.name {
            variety.name = name;
        }
        if let Some(supplier) = update.supplier {
            variety.supplier = Some(supplier);
        }
        if let Some(price) = update.price {
            variety.price = Some(price);
        }
        if let Some(notes) = update.notes {
            variety.notes = Some(notes);
        }
        if let Some(mut years_used) = update.years_used {
            years_used.sort_unstable();
            years_used.dedup();
            variety.years_used = years_used;
        }
    })
}

pub fn remove_variety(document: &Document, variety_id: &str) -> Document {
    let mut next = document.clone();
    next.varieties.retain(|variety| variety.id != variety_id);
    next
}

pub fn toggle_planned_year(document: &Document, variety_id: &str, year: i32) -> Document {
    with_variety(document, variety_id, |variety| {
        let planned = &mut variety.planned_years;
        if planned.contains(&year) {
            planned.retain(|planned_year| *planned_year != year);
        } else {
            planned.push(year);
        }
        planned.sort_unstable();
        planned.dedup();
    })
}

/// Cycles the year's seed status none → ordered → have → none.
pub fn toggle_have_seeds_for_year(document: &Document, variety_id: &str, year: i32) -> Document {
    with_variety(document, variety_id, |variety| {
        match variety.seed_status(year).next() {
            SeedStatus::None => {
                variety.seeds_by_year.remove(&year);
            }
            status => {
                variety.seeds_by_year.insert(year, status);
            }
        }
    })
}

/// Active varieties sharing a plant id and a normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub plant_id: String,
    /// Trimmed, lowercased name.
    pub normalized_name: String,
    pub keeper_id: String,
    /// Ids to archive, in keeper order.
    pub duplicate_ids: Vec<String>,
}

/// Groups non-archived varieties by `(plant_id, trim+lowercase name)`.
///
/// The keeper is the earliest `created_at` (missing sorts last), ties going
/// to the smallest id. Groups come back ordered by plant id, then name.
pub fn find_duplicate_varieties(document: &Document) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<(String, String), Vec<&StoredVariety>> = BTreeMap::new();
    for variety in document.varieties.iter().filter(|variety| !variety.is_archived) {
        let key = (variety.plant_id.clone(), normalize_name(&variety.name));
        groups.entry(key).or_default().push(variety);
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|((plant_id, normalized_name), mut members)| {
            members.sort_by(|left, right| {
                (left.created_at.is_none(), &left.created_at, &left.id).cmp(&(
                    right.created_at.is_none(),
                    &right.created_at,
                    &right.id,
                ))
            });
            let (keeper, rest) = members.split_first()?;
            Some(DuplicateGroup {
                plant_id,
                normalized_name,
                keeper_id: keeper.id.clone(),
                duplicate_ids: rest.iter().map(|variety| variety.id.clone()).collect(),
            })
        })
        .collect()
}

/// Archives every non-keeper of every duplicate group.
pub fn archive_duplicate_varieties(document: &Document) -> Created<Vec<String>> {
    let archived: Vec<String> = find_duplicate_varieties(document)
        .into_iter()
        .flat_map(|group| group.duplicate_ids)
        .collect();

    let mut next = document.clone();
    for variety in &mut next.varieties {
        if archived.contains(&variety.id) {
            variety.is_archived = true;
        }
    }
    Created {
        document: next,
        id: archived,
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn with_variety(
    document: &Document,
    variety_id: &str,
    apply: impl FnOnce(&mut StoredVariety),
) -> Document {
    let mut next = document.clone();
    if let Some(variety) = next
        .varieties
        .iter_mut()
        .find(|variety| variety.id == variety_id)
    {
        apply(variety);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::{archive_duplicate_varieties, find_duplicate_varieties, toggle_planned_year};
    use crate::model::document::Document;
    use crate::model::variety::StoredVariety;
    use std::collections::BTreeMap;

    fn variety(id: &str, name: &str, created_at: Option<&str>) -> StoredVariety {
        StoredVariety {
            id: id.to_string(),
            plant_id: "peas".to_string(),
            name: name.to_string(),
            supplier: None,
            price: None,
            notes: None,
            years_used: Vec::new(),
            planned_years: Vec::new(),
            seeds_by_year: BTreeMap::new(),
            is_archived: false,
            created_at: created_at.map(str::to_string),
        }
    }

    #[test]
    fn keeper_is_earliest_then_smallest_id() {
        let mut document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        document.varieties = vec![
            variety("v3", "Kelvedon Wonder", None),
            variety("v2", " kelvedon wonder ", Some("2024-03-01T00:00:00.000Z")),
            variety("v1", "KELVEDON WONDER", Some("2024-03-01T00:00:00.000Z")),
            variety("v4", "Hurst Green Shaft", None),
        ];

        let groups = find_duplicate_varieties(&document);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keeper_id, "v1");
        assert_eq!(groups[0].duplicate_ids, vec!["v2".to_string(), "v3".to_string()]);

        let archived = archive_duplicate_varieties(&document);
        assert_eq!(archived.document.varieties.len(), 4);
        let flags: Vec<bool> = archived
            .document
            .varieties
            .iter()
            .map(|variety| variety.is_archived)
            .collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn planned_years_toggle_sorted() {
        let mut document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        document.varieties = vec![variety("v1", "Onward", None)];

        let document = toggle_planned_year(&document, "v1", 2026);
        let document = toggle_planned_year(&document, "v1", 2024);
        assert_eq!(document.varieties[0].planned_years, vec![2024, 2026]);

        let document = toggle_planned_year(&document, "v1", 2026);
        assert_eq!(document.varieties[0].planned_years, vec![2024]);
    }

    #[test]
    fn planned_years_toggle_handles_unsorted_storage() {
        let mut document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        let mut stored = variety("v1", "Onward", None);
        stored.planned_years = vec![2026, 2024, 2026];
        document.varieties = vec![stored];

        let removed = toggle_planned_year(&document, "v1", 2026);
        assert_eq!(removed.varieties[0].planned_years, vec![2024]);

        let added = toggle_planned_year(&document, "v1", 2025);
        assert_eq!(added.varieties[0].planned_years, vec![2024, 2025, 2026]);
    }
}
