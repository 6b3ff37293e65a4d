//! Core document engine for Plotbook.
//! This crate owns the persisted allotment document: its schema, migrations,
//! storage and every mutation applied to it.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod migration;
pub mod model;
pub mod schema;
pub mod service;
pub mod storage;
pub mod temporal;

pub use config::{ConfigError, EngineConfig, DEFAULT_STORAGE_KEY};
pub use context::{Clock, EngineContext, FixedClock, IdGenerator, SequentialIds};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use migration::{migrate, MigrationError, MigrationOutcome};
pub use model::area::{
    Area, AreaKind, AreaUpdate, InfrastructureSubtype, KindChangeOptions, NewArea, PrimaryPlant,
    RotationGroup,
};
pub use model::document::{Document, CURRENT_SCHEMA_VERSION};
pub use model::season::{AreaSeason, SeasonRecord, SeasonStatus};
pub use model::variety::{SeedStatus, StoredVariety};
pub use schema::{repair, validate, ValidationReport};
pub use service::{Created, DocumentError, DocumentResult};
pub use storage::{
    DocumentStore, KeyValueStore, KvError, LoadOutcome, LoadReport, MemoryKeyValueStore,
    SqliteKeyValueStore, StorageError, StorageResult,
};
pub use temporal::was_area_active_in_year;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
