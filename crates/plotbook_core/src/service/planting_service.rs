//! Plantings and area notes within one (year, area) season entry.
//!
//! Adds targeting a missing entry are no-ops that return `id: None`; call
//! `season_service::ensure_area_season` first to create the slot.

use crate::context::EngineContext;
use crate::model::document::Document;
use crate::model::season::{AreaNote, NewPlanting, NoteType, Planting, PlantingUpdate};
use crate::service::{with_area_season, Created};

pub fn add_planting(
    document: &Document,
    year: i32,
    area_id: &str,
    input: NewPlanting,
    ctx: &mut EngineContext,
) -> Created<Option<String>> {
    let applied = with_area_season(document, year, area_id, |entry| {
        let planting = Planting {
            id: ctx.next_id("planting"),
            plant_id: input.plant_id,
            variety_name: input.variety_name,
            sow_date: input.sow_date,
            transplant_date: input.transplant_date,
            harvest_date: input.harvest_date,
            success: None,
            notes: input.notes,
        };
        let id = planting.id.clone();
        entry.plantings.push(planting);
        id
    });
    created_or_unchanged(document, applied)
}

pub fn update_planting(
    document: &Document,
    year: i32,
    area_id: &str,
    planting_id: &str,
    update: PlantingUpdate,
) -> Document {
    with_area_season(document, year, area_id, |entry| {
        let Some(planting) = entry
            .plantings
            .iter_mut()
            .find(|planting| planting.id == planting_id)
        else {
            return;
        };
        if let Some(plant_id) = update.plant_id {
            planting.plant_id = plant_id;
        }
        if let Some(variety_name) = update.variety_name {
            planting.variety_name = Some(variety_name);
        }
        if let Some(sow_date) = update.sow_date {
            planting.sow_date = Some(sow_date);
        }
        if let Some(transplant_date) = update.transplant_date {
            planting.transplant_date = Some(transplant_date);
        }
        if let Some(harvest_date) = update.harvest_date {
            planting.harvest_date = Some(harvest_date);
        }
        if let Some(success) = update.success {
            planting.success = Some(success);
        }
        if let Some(notes) = update.notes {
            planting.notes = Some(notes);
        }
    })
    .map_or_else(|| document.clone(), |(next, ())| next)
}

pub fn remove_planting(
    document: &Document,
    year: i32,
    area_id: &str,
    planting_id: &str,
) -> Document {
    with_area_season(document, year, area_id, |entry| {
        entry.plantings.retain(|planting| planting.id != planting_id);
    })
    .map_or_else(|| document.clone(), |(next, ())| next)
}

pub fn add_area_note(
    document: &Document,
    year: i32,
    area_id: &str,
    content: impl Into<String>,
    kind: NoteType,
    ctx: &mut EngineContext,
) -> Created<Option<String>> {
    let content = content.into();
    let applied = with_area_season(document, year, area_id, |entry| {
        let timestamp = ctx.timestamp();
        let note = AreaNote {
            id: ctx.next_id("note"),
            content,
            kind,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };
        let id = note.id.clone();
        entry.notes.push(note);
        id
    });
    created_or_unchanged(document, applied)
}

/// Replaces content and/or type of a note and refreshes `updated_at`.
pub fn update_area_note(
    document: &Document,
    year: i32,
    area_id: &str,
    note_id: &str,
    content: Option<String>,
    kind: Option<NoteType>,
    ctx: &mut EngineContext,
) -> Document {
    with_area_season(document, year, area_id, |entry| {
        let Some(note) = entry.notes.iter_mut().find(|note| note.id == note_id) else {
            return;
        };
        if let Some(content) = content {
            note.content = content;
        }
        if let Some(kind) = kind {
            note.kind = kind;
        }
        note.updated_at = ctx.timestamp();
    })
    .map_or_else(|| document.clone(), |(next, ())| next)
}

pub fn remove_area_note(document: &Document, year: i32, area_id: &str, note_id: &str) -> Document {
    with_area_season(document, year, area_id, |entry| {
        entry.notes.retain(|note| note.id != note_id);
    })
    .map_or_else(|| document.clone(), |(next, ())| next)
}

pub(crate) fn created_or_unchanged(
    document: &Document,
    applied: Option<(Document, String)>,
) -> Created<Option<String>> {
    match applied {
        Some((next, id)) => Created {
            document: next,
            id: Some(id),
        },
        None => Created {
            document: document.clone(),
            id: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{add_area_note, add_planting, remove_planting, update_area_note};
    use crate::context::EngineContext;
    use crate::model::area::{AreaKind, NewArea};
    use crate::model::document::Document;
    use crate::model::season::{NewPlanting, NoteType, SeasonStatus};
    use crate::service::area_service::add_area;
    use crate::service::season_service::add_season;

    fn fixture(ctx: &mut EngineContext) -> (Document, String) {
        let document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        let document = add_season(&document, 2025, SeasonStatus::Current, false, ctx).unwrap();
        let created = add_area(&document, NewArea::new("Bed A", AreaKind::RotationBed), ctx);
        (created.document, created.id)
    }

    #[test]
    fn planting_lifecycle_within_one_entry() {
        let mut ctx = EngineContext::deterministic("2025-03-01T00:00:00Z".parse().unwrap());
        let (document, area_id) = fixture(&mut ctx);

        let added = add_planting(&document, 2025, &area_id, NewPlanting::new("peas"), &mut ctx);
        let planting_id = added.id.unwrap();
        assert_eq!(
            added.document.season(2025).unwrap().area(&area_id).unwrap().plantings.len(),
            1
        );
        assert!(document.season(2025).unwrap().area(&area_id).unwrap().plantings.is_empty());

        let removed = remove_planting(&added.document, 2025, &area_id, &planting_id);
        assert!(removed.season(2025).unwrap().area(&area_id).unwrap().plantings.is_empty());
    }

    #[test]
    fn add_to_missing_entry_is_a_noop() {
        let mut ctx = EngineContext::deterministic("2025-03-01T00:00:00Z".parse().unwrap());
        let (document, area_id) = fixture(&mut ctx);

        let added = add_planting(&document, 2031, &area_id, NewPlanting::new("peas"), &mut ctx);
        assert_eq!(added.id, None);
        assert_eq!(added.document, document);
    }

    #[test]
    fn note_update_refreshes_timestamp() {
        let mut ctx = EngineContext::deterministic("2025-03-01T00:00:00Z".parse().unwrap());
        let (document, area_id) = fixture(&mut ctx);
        let added = add_area_note(&document, 2025, &area_id, "slugs", NoteType::Warning, &mut ctx);
        let note_id = added.id.unwrap();

        let mut later = EngineContext::deterministic("2025-04-01T00:00:00Z".parse().unwrap());
        let updated = update_area_note(
            &added.document,
            2025,
            &area_id,
            &note_id,
            Some("slugs gone".to_string()),
            Some(NoteType::Success),
            &mut later,
        );
        let note = &updated.season(2025).unwrap().area(&area_id).unwrap().notes[0];

        assert_eq!(note.content, "slugs gone");
        assert_eq!(note.kind, NoteType::Success);
        assert_eq!(note.created_at, "2025-03-01T00:00:00.000Z");
        assert_eq!(note.updated_at, "2025-04-01T00:00:00.000Z");
    }
}
