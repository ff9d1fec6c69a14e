//! Date ↔ pixel mapping. Pure functions over a [`Viewport`]; every other
//! part of the engine derives its horizontal geometry from these three so
//! that bars, grid lines and header bands share one pixel grid.

use chrono::NaiveDate;

use crate::model::Viewport;

/// Pixel offset of `date`, measured from the viewport origin (pixel 0).
pub fn date_to_offset(date: NaiveDate, view: &Viewport) -> f32 {
    let days = (date - view.origin).num_days() as f32;
    days * view.day_width
}

/// Inverse of [`date_to_offset`], rounded to the nearest whole day so that
/// snapping consumers land on calendar boundaries.
pub fn offset_to_date(px: f32, view: &Viewport) -> NaiveDate {
    let days = (px / view.day_width).round() as i64;
    view.origin + chrono::Duration::days(days)
}

/// Rendered width of `[start, end)`. Zero or negative durations floor to a
/// single day so the bar stays visible and draggable.
pub fn width_for_interval(start: NaiveDate, end: NaiveDate, view: &Viewport) -> f32 {
    let days = (end - start).num_days().max(1) as f32;
    days * view.day_width
}
