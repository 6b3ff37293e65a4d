//! Typed model of the persisted allotment document.
//!
//! # Responsibility
//! - Define the current-schema shape every loaded document is decoded into.
//! - Keep wire names (`camelCase`, kebab-case enums) stable for storage.
//!
//! # Invariants
//! - Only current-schema documents are represented here; legacy shapes are
//!   handled as untyped JSON inside `migration`.
//! - `Document::version` equals `CURRENT_SCHEMA_VERSION` after a load.

pub mod area;
pub mod document;
pub mod season;
pub mod variety;
