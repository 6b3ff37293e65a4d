use plotbook_core::migration::{
    latest_version, mark_started, migration_marker, needs_migration, DEFAULT_LAYOUT,
};
use plotbook_core::{
    migrate, validate, AreaKind, Document, EngineContext, MigrationError, RotationGroup,
    SeasonStatus, SeedStatus, CURRENT_SCHEMA_VERSION,
};
use serde_json::{json, Value};

fn ctx() -> EngineContext {
    EngineContext::deterministic("2025-03-15T08:00:00Z".parse().unwrap())
}

fn v8_document() -> Value {
    json!({
        "version": 8,
        "currentYear": 2024,
        "meta": {
            "name": "Scenario Plot",
            "createdAt": "2023-01-10T00:00:00.000Z",
            "updatedAt": "2024-10-01T00:00:00.000Z"
        },
        "layout": {
            "beds": [
                { "id": "bed-a", "name": "Bed A", "status": "rotation", "rotationGroup": "legumes" }
            ],
            "permanentPlantings": [
                { "id": "apple-tree", "name": "Apple Tree", "type": "fruit-tree", "plantId": "apples" }
            ],
            "infrastructure": []
        },
        "seasons": [{
            "year": 2024,
            "status": "historical",
            "beds": [{
                "bedId": "bed-a",
                "rotationGroup": "legumes",
                "plantings": [{ "id": "p1", "plantId": "pea", "sowDate": "2024-04-01" }],
                "notes": ["Netted against pigeons"]
            }],
            "permanentSeasons": [{
                "plantingId": "apple-tree",
                "careLogs": [{ "id": "c1", "type": "prune", "date": "2024-02-10" }],
                "notes": []
            }],
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-10-01T00:00:00.000Z"
        }],
        "maintenanceTasks": [],
        "gardenEvents": [],
        "varieties": []
    })
}

#[test]
fn v8_document_is_valid_before_migration() {
    let report = validate(&v8_document());
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn v8_document_migrates_to_unified_areas() {
    let outcome = migrate(v8_document(), &mut ctx()).unwrap();

    assert_eq!(outcome.from_version, 8);
    assert_eq!(outcome.to_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(
        outcome.applied,
        vec!["structured_notes", "unify_areas", "canonical_plant_ids"]
    );
    assert!(!outcome.resumed);
    assert!(validate(&outcome.document).valid);

    let document: Document = serde_json::from_value(outcome.document).unwrap();
    assert_eq!(document.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(document.layout.areas.len(), 2);

    let bed = document.area("bed-a").unwrap();
    assert_eq!(bed.kind, AreaKind::RotationBed);
    assert_eq!(bed.rotation_group, Some(RotationGroup::Legumes));
    assert!(bed.can_have_plantings);

    let tree = document.area("apple-tree").unwrap();
    assert_eq!(tree.kind, AreaKind::Tree);
    assert_eq!(tree.primary_plant.as_ref().unwrap().plant_id, "apple");

    let season = document.season(2024).unwrap();
    let bed_season = season.area("bed-a").unwrap();
    assert_eq!(bed_season.rotation_group, Some(RotationGroup::Legumes));
    assert_eq!(bed_season.plantings[0].plant_id, "peas");
    assert_eq!(bed_season.notes.len(), 1);
    assert_eq!(bed_season.notes[0].content, "Netted against pigeons");
    assert_eq!(bed_season.notes[0].created_at, "2024-10-01T00:00:00.000Z");

    let tree_season = season.area("apple-tree").unwrap();
    assert_eq!(tree_season.care_logs.len(), 1);
    assert_eq!(tree_season.care_logs[0].id, "c1");
}

#[test]
fn legacy_fields_are_gone_after_migration() {
    let outcome = migrate(v8_document(), &mut ctx()).unwrap();
    let layout = outcome.document["layout"].as_object().unwrap();
    assert!(!layout.contains_key("beds"));
    assert!(!layout.contains_key("permanentPlantings"));
    assert!(!layout.contains_key("infrastructure"));

    let season = outcome.document["seasons"][0].as_object().unwrap();
    assert!(!season.contains_key("beds"));
    assert!(!season.contains_key("permanentSeasons"));
}

#[test]
fn migrating_a_current_document_is_a_noop() {
    let migrated = migrate(v8_document(), &mut ctx()).unwrap().document;
    let again = migrate(migrated.clone(), &mut ctx()).unwrap();

    assert!(again.is_noop());
    assert_eq!(again.document, migrated);
}

/// The same small plot as it was stored at `version`.
fn fixture_at(version: u32) -> Value {
    if version >= 10 {
        return unified_fixture(version);
    }

    let bed_notes = match version {
        0..=3 => json!("Earthed up"),
        4..=8 => json!(["Earthed up"]),
        _ => json!([structured_note()]),
    };
    let mut season = json!({
        "year": 2023,
        "beds": [{
            "bedId": "north",
            "rotationGroup": "solanaceae",
            "plantings": [{ "id": "p1", "plantId": "potatoes", "sowDate": "2023-04-10" }],
            "notes": bed_notes
        }]
    });
    if version >= 3 {
        season["status"] = json!("historical");
    }
    if version >= 5 {
        season["permanentSeasons"] = json!([{
            "plantingId": "apple-tree",
            "careLogs": [{ "id": "c1", "type": "prune", "date": "2023-02-01" }],
            "notes": []
        }]);
    }

    let mut layout = json!({ "beds": [{ "id": "north", "name": "North", "status": "rotation" }] });
    if version >= 3 {
        layout["permanentPlantings"] = json!([
            { "id": "apple-tree", "name": "Apple Tree", "type": "fruit-tree", "plantId": "apples" }
        ]);
        layout["infrastructure"] = json!([{ "id": "shed", "name": "Shed", "type": "shed" }]);
    }

    let mut document = json!({ "layout": layout, "seasons": [season] });
    if version >= 1 {
        document["version"] = json!(version);
        document["currentYear"] = json!(2024);
        document["meta"] = json!({ "name": "Fixture Plot" });
    }
    if version >= 2 {
        document["maintenanceTasks"] = json!([]);
    }
    if version >= 6 {
        document["gardenEvents"] = json!([]);
    }
    match version {
        7 => document["varieties"] = json!([legacy_variety()]),
        8.. => document["varieties"] = json!([tracked_variety("pea")]),
        _ => {}
    }
    document
}

fn unified_fixture(version: u32) -> Value {
    let (potato, apple, pea) = if version >= 11 {
        ("potato", "apple", "peas")
    } else {
        ("potatoes", "apples", "pea")
    };
    json!({
        "version": version,
        "currentYear": 2024,
        "meta": { "name": "Fixture Plot" },
        "layout": {
            "areas": [
                { "id": "north", "name": "North", "kind": "rotation-bed", "canHavePlantings": true, "isArchived": false },
                { "id": "apple-tree", "name": "Apple Tree", "kind": "tree", "canHavePlantings": false,
                  "isArchived": false, "primaryPlant": { "plantId": apple } },
                { "id": "shed", "name": "Shed", "kind": "infrastructure", "infrastructureSubtype": "shed",
                  "canHavePlantings": false, "isArchived": false }
            ]
        },
        "seasons": [{
            "year": 2023,
            "status": "historical",
            "areas": [
                { "areaId": "north", "rotationGroup": "solanaceae",
                  "plantings": [{ "id": "p1", "plantId": potato, "sowDate": "2023-04-10" }],
                  "notes": [structured_note()], "careLogs": [] },
                { "areaId": "apple-tree", "plantings": [], "notes": [],
                  "careLogs": [{ "id": "c1", "type": "prune", "date": "2023-02-01" }] }
            ]
        }],
        "maintenanceTasks": [],
        "gardenEvents": [],
        "varieties": [tracked_variety(pea)]
    })
}

fn structured_note() -> Value {
    json!({
        "id": "note-a",
        "content": "Earthed up",
        "type": "info",
        "createdAt": "2023-06-01T00:00:00.000Z",
        "updatedAt": "2023-06-01T00:00:00.000Z"
    })
}

fn legacy_variety() -> Value {
    json!({ "id": "v1", "plantId": "pea", "name": "Kelvedon Wonder", "haveSeeds": true })
}

fn tracked_variety(plant_id: &str) -> Value {
    json!({
        "id": "v1",
        "plantId": plant_id,
        "name": "Kelvedon Wonder",
        "yearsUsed": [],
        "plannedYears": [],
        "seedsByYear": { "2024": "have" }
    })
}

#[test]
fn every_stored_version_migrates_to_a_loadable_document() {
    for version in 0..=latest_version() {
        let fixture = fixture_at(version);
        if version >= 1 {
            let report = validate(&fixture);
            assert!(report.valid, "v{version} fixture: {:?}", report.errors);
        }

        let outcome = migrate(fixture, &mut ctx()).unwrap();
        assert_eq!(outcome.from_version, version);
        assert_eq!(
            outcome.applied.len() as u32,
            latest_version() - version,
            "v{version}"
        );
        let report = validate(&outcome.document);
        assert!(report.valid, "v{version} output: {:?}", report.errors);

        let again = migrate(outcome.document.clone(), &mut ctx()).unwrap();
        assert!(again.is_noop(), "v{version} is not idempotent");

        let document: Document = serde_json::from_value(outcome.document)
            .unwrap_or_else(|err| panic!("v{version} does not decode: {err}"));
        assert_eq!(document.version, CURRENT_SCHEMA_VERSION);

        let north = document.area("north").unwrap();
        assert_eq!(north.kind, AreaKind::RotationBed, "v{version}");
        let season = document.season(2023).unwrap();
        assert_eq!(season.status, SeasonStatus::Historical, "v{version}");
        let north_season = season.area("north").unwrap();
        assert_eq!(north_season.rotation_group, Some(RotationGroup::Solanaceae));
        assert_eq!(north_season.plantings[0].plant_id, "potato", "v{version}");
        assert_eq!(north_season.notes[0].content, "Earthed up", "v{version}");

        if version >= 3 {
            let tree = document.area("apple-tree").unwrap();
            assert_eq!(tree.kind, AreaKind::Tree, "v{version}");
            assert_eq!(tree.primary_plant.as_ref().unwrap().plant_id, "apple");
            assert_eq!(document.area("shed").unwrap().kind, AreaKind::Infrastructure);
        }
        if version >= 5 {
            let tree_season = season.area("apple-tree").unwrap();
            assert_eq!(tree_season.care_logs[0].id, "c1", "v{version}");
        }
        if version >= 7 {
            let variety = document.variety("v1").unwrap();
            assert_eq!(variety.plant_id, "peas", "v{version}");
            assert_eq!(variety.seed_status(2024), SeedStatus::Have, "v{version}");
        }
    }
}

#[test]
fn version_zero_gains_meta_and_current_year() {
    let outcome = migrate(fixture_at(0), &mut ctx()).unwrap();

    assert_eq!(outcome.document["currentYear"], 2025);
    assert_eq!(outcome.document["meta"]["name"], "My Allotment");
    assert_eq!(outcome.document["meta"]["createdAt"], "2025-03-15T08:00:00.000Z");
}

#[test]
fn future_version_is_rejected() {
    let mut document = v8_document();
    document["version"] = json!(CURRENT_SCHEMA_VERSION + 1);

    let err = migrate(document, &mut ctx()).unwrap_err();
    assert_eq!(
        err,
        MigrationError::UnsupportedSchemaVersion {
            stored: CURRENT_SCHEMA_VERSION + 1,
            latest_supported: CURRENT_SCHEMA_VERSION,
        }
    );
}

#[test]
fn non_numeric_version_is_rejected() {
    let mut document = v8_document();
    document["version"] = json!("eight");

    assert!(matches!(
        migrate(document, &mut ctx()),
        Err(MigrationError::InvalidVersion(_))
    ));
}

#[test]
fn interrupted_migration_resumes_and_converges() {
    let clean = migrate(v8_document(), &mut ctx()).unwrap().document;

    let mut interrupted = clean.clone();
    interrupted["meta"]["migrationState"] = json!({
        "targetVersion": CURRENT_SCHEMA_VERSION,
        "startedAt": "2025-03-15T07:59:00.000Z",
        "step": 8
    });
    assert!(needs_migration(&interrupted).unwrap());

    let outcome = migrate(interrupted, &mut ctx()).unwrap();
    assert!(outcome.resumed);
    assert_eq!(outcome.applied.len(), 3);
    assert!(migration_marker(&outcome.document).is_none());
    assert_eq!(outcome.document, clean);
}

#[test]
fn mark_started_records_origin_version_once() {
    let marked = mark_started(v8_document(), &ctx()).unwrap();
    let marker = migration_marker(&marked).unwrap();
    assert_eq!(marker.step, 8);
    assert_eq!(marker.target_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(marker.started_at, "2025-03-15T08:00:00.000Z");

    let mut later = marked.clone();
    later["version"] = json!(10);
    let remarked = mark_started(later, &ctx()).unwrap();
    assert_eq!(migration_marker(&remarked).unwrap().step, 8);

    let outcome = migrate(remarked, &mut ctx()).unwrap();
    assert_eq!(outcome.from_version, 10);
    assert_eq!(outcome.applied.len(), 3);
}

#[test]
fn empty_unversioned_document_gets_default_layout() {
    let outcome = migrate(
        json!({ "currentYear": 2025, "seasons": [] }),
        &mut ctx(),
    )
    .unwrap();

    assert_eq!(outcome.from_version, 0);
    assert_eq!(outcome.applied.len() as u32, CURRENT_SCHEMA_VERSION);

    let document: Document = serde_json::from_value(outcome.document).unwrap();
    assert_eq!(
        document.layout.areas.len(),
        DEFAULT_LAYOUT.beds.len() + DEFAULT_LAYOUT.infrastructure.len()
    );
    assert_eq!(document.area("raspberries").unwrap().kind, AreaKind::PerennialBed);
    assert_eq!(document.area("shed").unwrap().kind, AreaKind::Infrastructure);
    assert_eq!(document.meta.created_at, "2025-03-15T08:00:00.000Z");
}

#[test]
fn document_with_season_data_keeps_its_own_layout() {
    let outcome = migrate(
        json!({
            "version": 2,
            "currentYear": 2023,
            "meta": { "name": "Plot" },
            "layout": {},
            "seasons": [{
                "year": 2023,
                "beds": [{ "bedId": "north", "plantings": [] }]
            }]
        }),
        &mut ctx(),
    )
    .unwrap();

    assert_eq!(outcome.document["layout"]["areas"], json!([]));
    assert_eq!(
        outcome.document["seasons"][0]["areas"][0]["areaId"],
        json!("north")
    );

    let document: Document = serde_json::from_value(outcome.document).unwrap();
    assert_eq!(document.season(2023).unwrap().status, SeasonStatus::Current);
}

#[test]
fn version_zero_chain_can_resume_from_its_marker() {
    let marked = mark_started(fixture_at(0), &ctx()).unwrap();
    assert_eq!(migration_marker(&marked).unwrap().step, 0);

    let mut interrupted = marked;
    interrupted["version"] = json!(4);
    let outcome = migrate(interrupted, &mut ctx()).unwrap();

    assert!(outcome.resumed);
    assert_eq!(outcome.applied.len() as u32, CURRENT_SCHEMA_VERSION);
    assert!(migration_marker(&outcome.document).is_none());
    assert_eq!(outcome.document, migrate(fixture_at(0), &mut ctx()).unwrap().document);
}
