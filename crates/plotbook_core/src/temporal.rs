//! Temporal visibility of areas across season years.

use crate::model::area::Area;

/// Returns whether `area` existed during season `year`.
///
/// Rules, first match wins:
/// 1. Non-empty `active_years` is authoritative.
/// 2. No temporal metadata at all means always active.
/// 3. Otherwise `created_year <= year < retired_year`, open ends unbounded.
pub fn was_area_active_in_year(area: &Area, year: i32) -> bool {
    if let Some(years) = area.active_years.as_deref() {
        if !years.is_empty() {
            return years.contains(&year);
        }
    }

    if !area.has_temporal_metadata() {
        return true;
    }

    let after_creation = area.created_year.map_or(true, |created| year >= created);
    let before_retirement = area.retired_year.map_or(true, |retired| year < retired);
    after_creation && before_retirement
}
