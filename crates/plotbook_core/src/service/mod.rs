//! Pure document operations.
//!
//! # Responsibility
//! - Append/update/remove over areas, seasons, plantings, notes, care logs,
//!   maintenance tasks and varieties.
//!
//! # Invariants
//! - Every operation takes `&Document` and returns a new document; the
//!   input is never mutated.
//! - Fresh ids and timestamps come only from the passed `EngineContext`.
//! - Updates addressing an unknown record return an unchanged copy; only
//!   season-level operations and kind changes report errors.
//! - Hard area removal leaves no season entry or maintenance task
//!   referencing the removed id.

pub mod area_service;
pub mod care_log_service;
pub mod maintenance_service;
pub mod planting_service;
pub mod season_service;
pub mod variety_service;

use crate::model::document::Document;
use crate::model::season::AreaSeason;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    AreaNotFound(String),
    SeasonNotFound(i32),
    SeasonExists(i32),
    /// The only remaining season cannot be removed.
    LastSeason(i32),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AreaNotFound(area_id) => write!(f, "area not found: {area_id}"),
            Self::SeasonNotFound(year) => write!(f, "season not found: {year}"),
            Self::SeasonExists(year) => write!(f, "season already exists: {year}"),
            Self::LastSeason(year) => {
                write!(f, "cannot remove season {year}: it is the only season")
            }
        }
    }
}

impl Error for DocumentError {}

/// Result of a create: the new document plus the generated id.
#[derive(Debug, Clone, PartialEq)]
pub struct Created<I = String> {
    pub document: Document,
    pub id: I,
}

/// Applies `apply` to the (year, area) entry of a copy of `document`.
///
/// Returns `None` when that season or entry does not exist.
pub(crate) fn with_area_season<T>(
    document: &Document,
    year: i32,
    area_id: &str,
    apply: impl FnOnce(&mut AreaSeason) -> T,
) -> Option<(Document, T)> {
    let mut next = document.clone();
    let entry = next.season_mut(year)?.area_mut(area_id)?;
    let result = apply(entry);
    Some((next, result))
}
