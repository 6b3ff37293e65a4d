//! Area operations.
//!
//! # Invariants
//! - `add_area` backfills an empty season entry only into seasons where the
//!   new area is temporally active.
//! - Archiving never touches season data; hard removal cascades.
//! - After `change_area_kind` only the fields meaningful for the new kind
//!   remain set.

use crate::context::EngineContext;
use crate::model::area::{
    Area, AreaKind, AreaUpdate, InfrastructureSubtype, KindChangeOptions, NewArea,
};
use crate::model::document::Document;
use crate::model::season::AreaSeason;
use crate::service::{Created, DocumentError, DocumentResult};
use crate::temporal::was_area_active_in_year;

/// Adds an area and backfills it into every season it is active in.
pub fn add_area(document: &Document, input: NewArea, ctx: &mut EngineContext) -> Created {
    let kind = input.kind;
    let area = Area {
        id: ctx.next_id("area"),
        name: input.name,
        kind,
        description: input.description,
        rotation_group: input
            .rotation_group
            .filter(|_| kind == AreaKind::RotationBed),
        primary_plant: input.primary_plant.filter(|_| kind.has_primary_plant()),
        infrastructure_subtype: infrastructure_subtype_for(kind, input.infrastructure_subtype),
        can_have_plantings: input
            .can_have_plantings
            .unwrap_or(kind.default_can_have_plantings()),
        is_archived: false,
        created_at: Some(ctx.timestamp()),
        created_year: input.created_year,
        retired_year: input.retired_year,
        active_years: input.active_years,
    };

    let mut next = document.clone();
    for season in &mut next.seasons {
        if !was_area_active_in_year(&area, season.year) || season.area(&area.id).is_some() {
            continue;
        }
        let mut entry = AreaSeason::new(area.id.clone());
        entry.rotation_group = area.rotation_group;
        season.areas.push(entry);
    }

    let id = area.id.clone();
    next.layout.areas.push(area);
    Created { document: next, id }
}

/// Shallow-merges `update` into the area with `area_id`.
pub fn update_area(document: &Document, area_id: &str, update: AreaUpdate) -> Document {
    with_area(document, area_id, |area| {
        if let Some(name) = update.name {
            area.name = name;
        }
        if let Some(description) = update.description {
            area.description = Some(description);
        }
        if let Some(group) = update.rotation_group {
            area.rotation_group = Some(group);
        }
        if let Some(plant) = update.primary_plant {
            area.primary_plant = Some(plant);
        }
        if let Some(subtype) = update.infrastructure_subtype {
            area.infrastructure_subtype = Some(subtype);
        }
        if let Some(flag) = update.can_have_plantings {
            area.can_have_plantings = flag;
        }
        if let Some(created_year) = update.created_year {
            area.created_year = created_year;
        }
        if let Some(retired_year) = update.retired_year {
            area.retired_year = retired_year;
        }
        if let Some(active_years) = update.active_years {
            area.active_years = active_years;
        }
    })
}

pub fn archive_area(document: &Document, area_id: &str) -> Document {
    with_area(document, area_id, |area| area.is_archived = true)
}

pub fn restore_area(document: &Document, area_id: &str) -> Document {
    with_area(document, area_id, |area| area.is_archived = false)
}

/// Hard delete: drops the area, its season entries and its maintenance
/// tasks. Garden events keep their record but lose the area reference.
pub fn remove_area(document: &Document, area_id: &str) -> Document {
    let mut next = document.clone();
    next.layout.areas.retain(|area| area.id != area_id);
    for season in &mut next.seasons {
        season.areas.retain(|entry| entry.area_id != area_id);
    }
    next.maintenance_tasks
        .retain(|task| task.area_id.as_deref() != Some(area_id));
    for event in &mut next.garden_events {
        if event.area_id.as_deref() == Some(area_id) {
            event.area_id = None;
        }
    }
    next
}

/// Switches an area to `new_kind` and resets fields the kind cannot carry.
///
/// Existing season data is kept as-is; nothing is synthesized for past
/// years.
pub fn change_area_kind(
    document: &Document,
    area_id: &str,
    new_kind: AreaKind,
    options: KindChangeOptions,
) -> DocumentResult<Document> {
    if document.area(area_id).is_none() {
        return Err(DocumentError::AreaNotFound(area_id.to_string()));
    }

    Ok(with_area(document, area_id, |area| {
        area.kind = new_kind;
        area.rotation_group = if new_kind == AreaKind::RotationBed {
            options.rotation_group.or(area.rotation_group)
        } else {
            None
        };
        area.primary_plant = if new_kind.has_primary_plant() {
            options.primary_plant.or_else(|| area.primary_plant.take())
        } else {
            None
        };
        area.infrastructure_subtype = infrastructure_subtype_for(
            new_kind,
            options.infrastructure_subtype.or(area.infrastructure_subtype),
        );
        area.can_have_plantings = options
            .can_have_plantings
            .unwrap_or(new_kind.default_can_have_plantings());
    }))
}

pub fn get_area<'a>(document: &'a Document, area_id: &str) -> Option<&'a Area> {
    document.area(area_id)
}

/// Non-archived areas that existed during `year`, in layout order.
pub fn areas_for_year(document: &Document, year: i32) -> Vec<&Area> {
    document
        .layout
        .areas
        .iter()
        .filter(|area| !area.is_archived && was_area_active_in_year(area, year))
        .collect()
}

fn infrastructure_subtype_for(
    kind: AreaKind,
    requested: Option<InfrastructureSubtype>,
) -> Option<InfrastructureSubtype> {
    (kind == AreaKind::Infrastructure).then(|| requested.unwrap_or(InfrastructureSubtype::Other))
}

fn with_area(document: &Document, area_id: &str, apply: impl FnOnce(&mut Area)) -> Document {
    let mut next = document.clone();
    if let Some(area) = next.layout.areas.iter_mut().find(|area| area.id == area_id) {
        apply(area);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::{add_area, change_area_kind};
    use crate::context::EngineContext;
    use crate::model::area::{
        AreaKind, InfrastructureSubtype, KindChangeOptions, NewArea, PrimaryPlant, RotationGroup,
    };
    use crate::model::document::Document;
    use crate::service::DocumentError;

    fn ctx() -> EngineContext {
        EngineContext::deterministic("2025-05-10T12:00:00Z".parse().unwrap())
    }

    #[test]
    fn add_area_drops_fields_the_kind_cannot_carry() {
        let document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        let mut input = NewArea::new("Shed", AreaKind::Infrastructure);
        input.rotation_group = Some(RotationGroup::Roots);

        let created = add_area(&document, input, &mut ctx());
        let area = created.document.area(&created.id).unwrap();

        assert_eq!(area.rotation_group, None);
        assert_eq!(area.infrastructure_subtype, Some(InfrastructureSubtype::Other));
        assert!(!area.can_have_plantings);
        assert_eq!(area.created_at.as_deref(), Some("2025-05-10T12:00:00.000Z"));
    }

    #[test]
    fn kind_change_resets_kind_specific_fields() {
        let mut ctx = ctx();
        let document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        let mut input = NewArea::new("Old apple", AreaKind::Tree);
        input.primary_plant = Some(PrimaryPlant::new("apple"));
        let created = add_area(&document, input, &mut ctx);

        let bed = change_area_kind(
            &created.document,
            &created.id,
            AreaKind::RotationBed,
            KindChangeOptions {
                rotation_group: Some(RotationGroup::Legumes),
                ..KindChangeOptions::default()
            },
        )
        .unwrap();
        let area = bed.area(&created.id).unwrap();

        assert_eq!(area.kind, AreaKind::RotationBed);
        assert_eq!(area.primary_plant, None);
        assert_eq!(area.rotation_group, Some(RotationGroup::Legumes));
        assert!(area.can_have_plantings);
    }

    #[test]
    fn kind_change_on_unknown_area_fails() {
        let document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        assert_eq!(
            change_area_kind(&document, "nope", AreaKind::Tree, KindChangeOptions::default()),
            Err(DocumentError::AreaNotFound("nope".to_string()))
        );
    }
}
