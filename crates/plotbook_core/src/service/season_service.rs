//! Season operations.
//!
//! # Invariants
//! - Season years are unique and kept in ascending order.
//! - The last remaining season cannot be removed.
//! - Auto-rotation only advances rotation beds that were grouped in an
//!   earlier season.

use crate::context::EngineContext;
use crate::model::area::{Area, AreaKind, RotationGroup};
use crate::model::document::Document;
use crate::model::season::{AreaSeason, SeasonRecord, SeasonStatus};
use crate::service::area_service::areas_for_year;
use crate::service::{with_area_season, DocumentError, DocumentResult};

/// Adds a season holding an empty entry for every area active in `year`.
///
/// With `auto_rotate`, each rotation bed takes the group after the one it
/// had in the nearest earlier season; without history it keeps its own.
pub fn add_season(
    document: &Document,
    year: i32,
    status: SeasonStatus,
    auto_rotate: bool,
    ctx: &mut EngineContext,
) -> DocumentResult<Document> {
    if document.season(year).is_some() {
        return Err(DocumentError::SeasonExists(year));
    }

    let areas = areas_for_year(document, year)
        .into_iter()
        .map(|area| {
            let mut entry = AreaSeason::new(area.id.clone());
            entry.rotation_group = if auto_rotate {
                rotated_group(document, area, year)
            } else {
                area.rotation_group
            };
            entry
        })
        .collect();

    let timestamp = ctx.timestamp();
    let mut next = document.clone();
    next.seasons.push(SeasonRecord {
        year,
        status,
        areas,
        notes: None,
        created_at: Some(timestamp.clone()),
        updated_at: Some(timestamp),
    });
    next.seasons.sort_by_key(|season| season.year);
    Ok(next)
}

/// Removes a season. When it was the current year, the latest remaining
/// season becomes current.
pub fn remove_season(document: &Document, year: i32) -> DocumentResult<Document> {
    if document.season(year).is_none() {
        return Err(DocumentError::SeasonNotFound(year));
    }
    if document.seasons.len() == 1 {
        return Err(DocumentError::LastSeason(year));
    }

    let mut next = document.clone();
    next.seasons.retain(|season| season.year != year);
    if next.current_year == year {
        if let Some(latest) = next.seasons.iter().map(|season| season.year).max() {
            next.current_year = latest;
        }
    }
    Ok(next)
}

pub fn set_current_year(document: &Document, year: i32) -> Document {
    let mut next = document.clone();
    next.current_year = year;
    next
}

pub fn update_season_status(
    document: &Document,
    year: i32,
    status: SeasonStatus,
    ctx: &mut EngineContext,
) -> DocumentResult<Document> {
    let mut next = document.clone();
    let season = next
        .season_mut(year)
        .ok_or(DocumentError::SeasonNotFound(year))?;
    season.status = status;
    season.updated_at = Some(ctx.timestamp());
    Ok(next)
}

/// Sets the rotation group snapshot of one (year, area) entry.
pub fn update_area_season_rotation(
    document: &Document,
    year: i32,
    area_id: &str,
    group: Option<RotationGroup>,
) -> Document {
    with_area_season(document, year, area_id, |entry| entry.rotation_group = group)
        .map_or_else(|| document.clone(), |(next, ())| next)
}

pub fn get_area_season<'a>(
    document: &'a Document,
    year: i32,
    area_id: &str,
) -> Option<&'a AreaSeason> {
    document.season(year)?.area(area_id)
}

/// Creates the (year, area) entry when missing, so plantings and logs can
/// be added to it.
pub fn ensure_area_season(
    document: &Document,
    year: i32,
    area_id: &str,
) -> DocumentResult<Document> {
    let area = document
        .area(area_id)
        .ok_or_else(|| DocumentError::AreaNotFound(area_id.to_string()))?;
    let season = document
        .season(year)
        .ok_or(DocumentError::SeasonNotFound(year))?;
    if season.area(area_id).is_some() {
        return Ok(document.clone());
    }

    let mut entry = AreaSeason::new(area_id);
    entry.rotation_group = area.rotation_group;

    let mut next = document.clone();
    if let Some(season) = next.season_mut(year) {
        season.areas.push(entry);
    }
    Ok(next)
}

fn rotated_group(document: &Document, area: &Area, year: i32) -> Option<RotationGroup> {
    if area.kind != AreaKind::RotationBed {
        return area.rotation_group;
    }

    let previous = document
        .seasons
        .iter()
        .filter(|season| season.year < year)
        .max_by_key(|season| season.year)
        .and_then(|season| season.area(&area.id))
        .and_then(|entry| entry.rotation_group);

    match previous {
        Some(group) => Some(group.next_in_rotation()),
        None => area.rotation_group,
    }
}
