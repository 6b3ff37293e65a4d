//! Care log entries and harvest aggregation.
//!
//! # Invariants
//! - `harvest_total`/`harvest_unit` on an entry always reflect its current
//!   harvest-typed logs; every mutation here recomputes them.
//! - Units are not converted: the first harvest log that names a unit wins.

use crate::context::EngineContext;
use crate::model::document::Document;
use crate::model::season::{
    AreaSeason, CareLogEntry, CareLogType, CareLogUpdate, HarvestTotal, NewCareLogEntry,
};
use crate::service::planting_service::created_or_unchanged;
use crate::service::season_service::get_area_season;
use crate::service::{with_area_season, Created};

pub fn add_care_log_entry(
    document: &Document,
    year: i32,
    area_id: &str,
    input: NewCareLogEntry,
    ctx: &mut EngineContext,
) -> Created<Option<String>> {
    let applied = with_area_season(document, year, area_id, |entry| {
        let log = CareLogEntry {
            id: ctx.next_id("care"),
            kind: input.kind,
            date: input.date,
            description: input.description,
            quantity: input.quantity,
            unit: input.unit,
        };
        let id = log.id.clone();
        entry.care_logs.push(log);
        refresh_harvest_totals(entry);
        id
    });
    created_or_unchanged(document, applied)
}

pub fn update_care_log_entry(
    document: &Document,
    year: i32,
    area_id: &str,
    entry_id: &str,
    update: CareLogUpdate,
) -> Document {
    with_area_season(document, year, area_id, |entry| {
        if let Some(log) = entry.care_logs.iter_mut().find(|log| log.id == entry_id) {
            if let Some(kind) = update.kind {
                log.kind = kind;
            }
            if let Some(date) = update.date {
                log.date = date;
            }
            if let Some(description) = update.description {
                log.description = Some(description);
            }
            if let Some(quantity) = update.quantity {
                log.quantity = Some(quantity);
            }
            if let Some(unit) = update.unit {
                log.unit = Some(unit);
            }
        }
        refresh_harvest_totals(entry);
    })
    .map_or_else(|| document.clone(), |(next, ())| next)
}

pub fn remove_care_log_entry(
    document: &Document,
    year: i32,
    area_id: &str,
    entry_id: &str,
) -> Document {
    with_area_season(document, year, area_id, |entry| {
        entry.care_logs.retain(|log| log.id != entry_id);
        refresh_harvest_totals(entry);
    })
    .map_or_else(|| document.clone(), |(next, ())| next)
}

/// Shorthand for a harvest-typed care log.
pub fn log_harvest(
    document: &Document,
    year: i32,
    area_id: &str,
    quantity: f64,
    unit: impl Into<String>,
    date: impl Into<String>,
    ctx: &mut EngineContext,
) -> Created<Option<String>> {
    let mut input = NewCareLogEntry::new(CareLogType::Harvest, date);
    input.quantity = Some(quantity);
    input.unit = Some(unit.into());
    add_care_log_entry(document, year, area_id, input, ctx)
}

/// Sums harvest logs of one (year, area); `None` when there are none.
pub fn get_harvest_total(document: &Document, year: i32, area_id: &str) -> Option<HarvestTotal> {
    get_area_season(document, year, area_id).and_then(harvest_total)
}

fn harvest_total(entry: &AreaSeason) -> Option<HarvestTotal> {
    let mut harvests = entry
        .care_logs
        .iter()
        .filter(|log| log.kind == CareLogType::Harvest)
        .peekable();
    harvests.peek()?;

    let mut total = HarvestTotal {
        quantity: 0.0,
        unit: None,
    };
    for log in harvests {
        total.quantity += log.quantity.unwrap_or(0.0);
        if total.unit.is_none() {
            total.unit = log.unit.clone();
        }
    }
    Some(total)
}

fn refresh_harvest_totals(entry: &mut AreaSeason) {
    match harvest_total(entry) {
        Some(total) => {
            entry.harvest_total = Some(total.quantity);
            entry.harvest_unit = total.unit;
        }
        None => {
            entry.harvest_total = None;
            entry.harvest_unit = None;
        }
    }
}
