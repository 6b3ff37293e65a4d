//! Document migration registry and executor.
//!
//! # Responsibility
//! - Register version-local migration steps in strictly increasing order.
//! - Chain pending steps from the stored version to the current one.
//! - Maintain the `meta.migrationState` resume marker.
//!
//! # Invariants
//! - Step `to` values are contiguous from 1 to `CURRENT_SCHEMA_VERSION`.
//! - Every step is a pure function of its input plus the injected context and
//!   is safe to re-apply to a document it already transformed.
//! - The runner, not the steps, writes `version`; it never decreases.
//! - A chain that ran leaves a document that validates at the current
//!   version, or it fails with `InvalidOutput`.
//! - A document carrying a resume marker is re-run from `min(version, step)`.

mod default_layout;
mod plant_ids;
mod steps;
mod unify;

pub use default_layout::{DefaultLayout, LayoutBed, LayoutStructure, DEFAULT_LAYOUT};
pub use plant_ids::canonical_plant_id;

use crate::context::EngineContext;
use crate::model::document::MigrationState;
use crate::schema::validate;
use log::info;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MigrationResult<T> = Result<T, MigrationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    NotAnObject,
    InvalidVersion(String),
    UnsupportedSchemaVersion { stored: u32, latest_supported: u32 },
    Step {
        to: u32,
        name: &'static str,
        message: String,
    },
    /// The migrated document does not validate at the current version.
    InvalidOutput(Vec<String>),
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "document must be a JSON object to migrate"),
            Self::InvalidVersion(value) => write!(f, "invalid document version `{value}`"),
            Self::UnsupportedSchemaVersion {
                stored,
                latest_supported,
            } => write!(
                f,
                "document schema version {stored} is newer than supported {latest_supported}"
            ),
            Self::Step { to, name, message } => {
                write!(f, "migration step `{name}` (to v{to}) failed: {message}")
            }
            Self::InvalidOutput(errors) => write!(
                f,
                "migrated document does not match the current schema: {}",
                errors.join("; ")
            ),
        }
    }
}

impl Error for MigrationError {}

/// Inputs a step may consult besides the document itself.
pub struct MigrationContext<'a> {
    pub engine: &'a mut EngineContext,
    /// Read-only fixture used to backfill genuinely empty legacy documents.
    pub default_layout: &'a DefaultLayout,
}

type StepFn = fn(Value, &mut MigrationContext<'_>) -> MigrationResult<Value>;

#[derive(Clone, Copy)]
struct MigrationStep {
    to: u32,
    name: &'static str,
    apply: StepFn,
}

const STEPS: &[MigrationStep] = &[
    MigrationStep {
        to: 1,
        name: "stamp_version",
        apply: steps::stamp_version,
    },
    MigrationStep {
        to: 2,
        name: "maintenance_tasks",
        apply: steps::add_maintenance_tasks,
    },
    MigrationStep {
        to: 3,
        name: "legacy_layout_collections",
        apply: steps::add_layout_collections,
    },
    MigrationStep {
        to: 4,
        name: "bed_season_notes",
        apply: steps::add_bed_season_notes,
    },
    MigrationStep {
        to: 5,
        name: "permanent_seasons",
        apply: steps::add_permanent_seasons,
    },
    MigrationStep {
        to: 6,
        name: "garden_events",
        apply: steps::add_garden_events,
    },
    MigrationStep {
        to: 7,
        name: "variety_catalog",
        apply: steps::add_variety_catalog,
    },
    MigrationStep {
        to: 8,
        name: "variety_seed_tracking",
        apply: steps::add_variety_seed_tracking,
    },
    MigrationStep {
        to: 9,
        name: "structured_notes",
        apply: steps::structure_notes,
    },
    MigrationStep {
        to: 10,
        name: "unify_areas",
        apply: unify::unify_areas,
    },
    MigrationStep {
        to: 11,
        name: "canonical_plant_ids",
        apply: plant_ids::canonicalize_plant_ids,
    },
];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.to)
}

/// Result of running the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub document: Value,
    pub from_version: u32,
    pub to_version: u32,
    /// Names of the steps that ran, in order.
    pub applied: Vec<&'static str>,
    /// Whether the input carried an interrupted-migration marker.
    pub resumed: bool,
}

impl MigrationOutcome {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Reads `version`; an absent version means a pre-versioning document (0).
pub fn stored_version(value: &Value) -> MigrationResult<u32> {
    let root = value.as_object().ok_or(MigrationError::NotAnObject)?;
    match root.get("version") {
        None | Some(Value::Null) => Ok(0),
        Some(version) => version
            .as_u64()
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| MigrationError::InvalidVersion(version.to_string())),
    }
}

/// Returns the resume marker when one is present and well-formed.
pub fn migration_marker(value: &Value) -> Option<MigrationState> {
    let marker = value.get("meta")?.get("migrationState")?;
    serde_json::from_value(marker.clone()).ok()
}

/// Whether loading `value` has to run the chain.
pub fn needs_migration(value: &Value) -> MigrationResult<bool> {
    Ok(stored_version(value)? < latest_version() || migration_marker(value).is_some())
}

/// Writes the resume marker into `meta` unless one is already present.
///
/// A missing or non-object `meta` (pre-versioning documents) is replaced by
/// an object holding only the marker; the first step fills in the rest.
pub fn mark_started(mut value: Value, ctx: &EngineContext) -> MigrationResult<Value> {
    let step = stored_version(&value)?;
    if migration_marker(&value).is_some() {
        return Ok(value);
    }

    let marker = MigrationState {
        target_version: latest_version(),
        started_at: ctx.timestamp(),
        step,
    };
    let marker = serde_json::to_value(marker).map_err(|err| MigrationError::Step {
        to: latest_version(),
        name: "mark_started",
        message: err.to_string(),
    })?;

    let meta = root_mut(&mut value)?
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    if let Some(meta) = meta.as_object_mut() {
        meta.insert("migrationState".to_string(), marker);
    }
    Ok(value)
}

/// Brings `value` up to the current schema.
///
/// Calling it on a current document without a marker is a no-op.
pub fn migrate(value: Value, ctx: &mut EngineContext) -> MigrationResult<MigrationOutcome> {
    let stored = stored_version(&value)?;
    let latest = latest_version();
    if stored > latest {
        return Err(MigrationError::UnsupportedSchemaVersion {
            stored,
            latest_supported: latest,
        });
    }

    let marker = migration_marker(&value);
    let resumed = marker.is_some();
    let start = marker.map_or(stored, |state| stored.min(state.step));

    if start == latest && !resumed {
        return Ok(MigrationOutcome {
            document: value,
            from_version: stored,
            to_version: latest,
            applied: Vec::new(),
            resumed,
        });
    }

    let mut migration_ctx = MigrationContext {
        engine: ctx,
        default_layout: &DEFAULT_LAYOUT,
    };
    let mut document = value;
    let mut applied = Vec::new();

    for step in STEPS.iter().filter(|step| step.to > start) {
        document = (step.apply)(document, &mut migration_ctx)?;
        set_version(&mut document, step.to)?;
        applied.push(step.name);
        info!(
            "event=migration_step module=migration status=ok to={} name={}",
            step.to, step.name
        );
    }

    if let Some(meta) = document.get_mut("meta").and_then(Value::as_object_mut) {
        meta.remove("migrationState");
    }

    let report = validate(&document);
    if !report.valid {
        return Err(MigrationError::InvalidOutput(report.errors));
    }

    Ok(MigrationOutcome {
        document,
        from_version: stored,
        to_version: latest,
        applied,
        resumed,
    })
}

fn set_version(document: &mut Value, version: u32) -> MigrationResult<()> {
    let root = document.as_object_mut().ok_or(MigrationError::NotAnObject)?;
    root.insert("version".to_string(), Value::from(version));
    Ok(())
}

pub(crate) fn root_mut(document: &mut Value) -> MigrationResult<&mut Map<String, Value>> {
    document.as_object_mut().ok_or(MigrationError::NotAnObject)
}

/// Inserts an empty array under `key` unless the key already holds one.
pub(crate) fn ensure_array(map: &mut Map<String, Value>, key: &str) {
    if !map.get(key).is_some_and(Value::is_array) {
        map.insert(key.to_string(), Value::Array(Vec::new()));
    }
}

/// Mutable iterator over the object entries of `map[key]` when it is an array.
pub(crate) fn objects_mut<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    map.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flat_map(|items| items.iter_mut())
        .filter_map(Value::as_object_mut)
}
