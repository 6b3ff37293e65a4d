//! Structural validation and one-shot repair of untyped documents.
//!
//! # Responsibility
//! - Check decoded JSON against the document shape before any migration runs.
//! - Rebuild a minimally valid document when only top-level fields are absent.
//!
//! # Invariants
//! - Validation never panics and accumulates every defect it finds.
//! - Legacy (`layout.beds` triplet) shapes are accepted only below
//!   `UNIFIED_SCHEMA_VERSION`, so stored documents can be loaded before
//!   migration. From that version on, a valid document decodes into the
//!   typed `Document`.
//! - Repair is attempted once and fails closed.

pub mod repair;
pub mod validate;

pub use repair::repair;
pub use validate::{validate, ValidationReport, UNIFIED_SCHEMA_VERSION};
