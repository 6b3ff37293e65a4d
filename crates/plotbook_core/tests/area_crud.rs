use plotbook_core::model::document::{MaintenanceKind, NewMaintenanceTask};
use plotbook_core::model::season::NewPlanting;
use plotbook_core::service::area_service::{
    add_area, archive_area, areas_for_year, change_area_kind, remove_area, restore_area,
    update_area,
};
use plotbook_core::service::maintenance_service::add_maintenance_task;
use plotbook_core::service::planting_service::add_planting;
use plotbook_core::service::season_service::add_season;
use plotbook_core::{
    was_area_active_in_year, AreaKind, AreaUpdate, Document, DocumentError, EngineContext,
    InfrastructureSubtype, KindChangeOptions, NewArea, PrimaryPlant, RotationGroup, SeasonStatus,
};

fn ctx() -> EngineContext {
    EngineContext::deterministic("2025-05-10T12:00:00Z".parse().unwrap())
}

fn document_with_seasons(years: &[i32], ctx: &mut EngineContext) -> Document {
    let mut document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
    for year in years {
        document = add_season(&document, *year, SeasonStatus::Historical, false, ctx).unwrap();
    }
    document
}

fn years_with_entry(document: &Document, area_id: &str) -> Vec<i32> {
    document
        .seasons
        .iter()
        .filter(|season| season.area(area_id).is_some())
        .map(|season| season.year)
        .collect()
}

#[test]
fn new_area_is_backfilled_only_into_active_years() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[2023, 2024, 2025, 2026], &mut ctx);

    let mut input = NewArea::new("New Bed", AreaKind::RotationBed);
    input.created_year = Some(2025);
    input.rotation_group = Some(RotationGroup::Roots);
    let created = add_area(&document, input, &mut ctx);

    assert_eq!(years_with_entry(&created.document, &created.id), vec![2025, 2026]);
    let entry = created.document.season(2026).unwrap().area(&created.id).unwrap();
    assert_eq!(entry.rotation_group, Some(RotationGroup::Roots));
    assert!(entry.plantings.is_empty());

    assert!(document.layout.areas.is_empty());
    assert!(document.seasons.iter().all(|season| season.areas.is_empty()));
}

#[test]
fn new_area_drops_fields_its_kind_cannot_carry() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[2025], &mut ctx);

    let mut input = NewArea::new("Water Butt", AreaKind::Infrastructure);
    input.rotation_group = Some(RotationGroup::Legumes);
    input.primary_plant = Some(PrimaryPlant::new("apple"));
    let created = add_area(&document, input, &mut ctx);

    let area = created.document.area(&created.id).unwrap();
    assert_eq!(area.rotation_group, None);
    assert_eq!(area.primary_plant, None);
    assert_eq!(area.infrastructure_subtype, Some(InfrastructureSubtype::Other));
    assert!(!area.can_have_plantings);
    assert_eq!(area.created_at.as_deref(), Some("2025-05-10T12:00:00.000Z"));
}

#[test]
fn update_merges_fields_and_can_clear_lifecycle() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[2025], &mut ctx);
    let mut input = NewArea::new("Bed A", AreaKind::RotationBed);
    input.retired_year = Some(2026);
    let created = add_area(&document, input, &mut ctx);

    let updated = update_area(
        &created.document,
        &created.id,
        AreaUpdate {
            name: Some("Bed A (north)".to_string()),
            retired_year: Some(None),
            ..AreaUpdate::default()
        },
    );
    let area = updated.area(&created.id).unwrap();
    assert_eq!(area.name, "Bed A (north)");
    assert_eq!(area.retired_year, None);
    assert_eq!(area.kind, AreaKind::RotationBed);

    let untouched = update_area(&updated, "missing", AreaUpdate::default());
    assert_eq!(untouched, updated);
}

#[test]
fn archive_hides_area_but_keeps_season_data() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[2025], &mut ctx);
    let created = add_area(&document, NewArea::new("Bed A", AreaKind::RotationBed), &mut ctx);
    let planted = add_planting(
        &created.document,
        2025,
        &created.id,
        NewPlanting::new("peas"),
        &mut ctx,
    );

    let archived = archive_area(&planted.document, &created.id);
    assert!(archived.area(&created.id).unwrap().is_archived);
    assert!(areas_for_year(&archived, 2025).is_empty());
    assert_eq!(
        archived.season(2025).unwrap().area(&created.id).unwrap().plantings.len(),
        1
    );

    let next_year = add_season(&archived, 2026, SeasonStatus::Planned, false, &mut ctx).unwrap();
    assert!(next_year.season(2026).unwrap().area(&created.id).is_none());

    let restored = restore_area(&archived, &created.id);
    assert_eq!(areas_for_year(&restored, 2025).len(), 1);
}

#[test]
fn remove_cascades_to_seasons_and_tasks() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[2024, 2025], &mut ctx);
    let keep = add_area(&document, NewArea::new("Bed B", AreaKind::RotationBed), &mut ctx);
    let doomed = add_area(&keep.document, NewArea::new("Bed A", AreaKind::RotationBed), &mut ctx);
    let task = add_maintenance_task(
        &doomed.document,
        NewMaintenanceTask {
            area_id: Some(doomed.id.clone()),
            kind: MaintenanceKind::Weed,
            month: Some(4),
            description: "Clear bindweed".to_string(),
        },
        &mut ctx,
    );

    let removed = remove_area(&task.document, &doomed.id);
    assert!(removed.area(&doomed.id).is_none());
    assert!(years_with_entry(&removed, &doomed.id).is_empty());
    assert!(removed.maintenance_tasks.is_empty());
    assert_eq!(years_with_entry(&removed, &keep.id), vec![2024, 2025]);
}

#[test]
fn kind_change_resets_incompatible_fields() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[2025], &mut ctx);
    let mut input = NewArea::new("Bed A", AreaKind::RotationBed);
    input.rotation_group = Some(RotationGroup::Brassicas);
    let created = add_area(&document, input, &mut ctx);

    let changed = change_area_kind(
        &created.document,
        &created.id,
        AreaKind::Tree,
        KindChangeOptions {
            primary_plant: Some(PrimaryPlant::new("plum")),
            ..KindChangeOptions::default()
        },
    )
    .unwrap();

    let area = changed.area(&created.id).unwrap();
    assert_eq!(area.kind, AreaKind::Tree);
    assert_eq!(area.rotation_group, None);
    assert_eq!(area.primary_plant.as_ref().unwrap().plant_id, "plum");
    assert!(!area.can_have_plantings);
    assert!(changed.season(2025).unwrap().area(&created.id).is_some());

    assert_eq!(
        change_area_kind(&changed, "missing", AreaKind::Herb, KindChangeOptions::default()),
        Err(DocumentError::AreaNotFound("missing".to_string()))
    );
}

#[test]
fn lifecycle_window_is_inclusive_start_exclusive_end() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[], &mut ctx);
    let mut input = NewArea::new("Old Bed", AreaKind::RotationBed);
    input.created_year = Some(2024);
    input.retired_year = Some(2026);
    let created = add_area(&document, input, &mut ctx);
    let area = created.document.area(&created.id).unwrap();

    assert!(!was_area_active_in_year(area, 2023));
    assert!(was_area_active_in_year(area, 2024));
    assert!(was_area_active_in_year(area, 2025));
    assert!(!was_area_active_in_year(area, 2026));
}

#[test]
fn explicit_active_years_override_lifecycle() {
    let mut ctx = ctx();
    let document = document_with_seasons(&[], &mut ctx);
    let mut input = NewArea::new("Pop-up Bed", AreaKind::RotationBed);
    input.created_year = Some(2020);
    input.active_years = Some(vec![2022, 2025]);
    let created = add_area(&document, input, &mut ctx);

    let mut area = created.document.area(&created.id).unwrap().clone();
    assert!(was_area_active_in_year(&area, 2022));
    assert!(!was_area_active_in_year(&area, 2023));
    assert!(was_area_active_in_year(&area, 2025));

    area.active_years = Some(Vec::new());
    assert!(was_area_active_in_year(&area, 2023));
    assert!(!was_area_active_in_year(&area, 2019));

    area.created_year = None;
    area.active_years = None;
    assert!(was_area_active_in_year(&area, 1990));
}
