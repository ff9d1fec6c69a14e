use chrono::NaiveDate;

/// Hard bounds for the continuous zoom, pixels per calendar day.
pub const MIN_DAY_WIDTH: f32 = 2.0;
pub const MAX_DAY_WIDTH: f32 = 120.0;

/// Discrete zoom presets for the simpler scale-switching mode. Each maps to
/// a fixed day-width; the header band generator adapts on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomPreset {
    Day,
    Week,
    Month,
}

impl ZoomPreset {
    pub fn day_width(self) -> f32 {
        match self {
            ZoomPreset::Day => 40.0,
            ZoomPreset::Week => 30.0,
            ZoomPreset::Month => 10.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ZoomPreset::Day => "Day",
            ZoomPreset::Week => "Week",
            ZoomPreset::Month => "Month",
        }
    }
}

/// The visible window onto the timeline: which date sits at pixel 0, how
/// wide a day is, and how far the surface is scrolled.
///
/// Ephemeral state, owned by the app and passed by reference into every
/// subsystem; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Calendar date mapped to pixel offset 0.
    pub origin: NaiveDate,
    /// Pixels per calendar day, always inside `[MIN_DAY_WIDTH, MAX_DAY_WIDTH]`.
    pub day_width: f32,
    /// Horizontal scroll position within the rendered surface.
    pub scroll_px: f32,
}

impl Viewport {
    pub fn new(origin: NaiveDate) -> Self {
        Self {
            origin,
            day_width: 20.0,
            scroll_px: 0.0,
        }
    }

    /// Multiply the day-width by `factor`, keeping the date currently under
    /// `focal_px` (measured from the left edge of the visible surface) at
    /// that same pixel afterwards.
    ///
    /// Out-of-range requests clamp to the bounds rather than fail; the view
    /// must stay responsive at the ends of the zoom range.
    pub fn zoom_by(&mut self, factor: f32, focal_px: f32) {
        // Fractional days from origin to the focal pixel, at the old width.
        let focal_days = (self.scroll_px + focal_px) / self.day_width;
        self.day_width = (self.day_width * factor).clamp(MIN_DAY_WIDTH, MAX_DAY_WIDTH);
        self.scroll_px = focal_days * self.day_width - focal_px;
    }

    /// Switch to a discrete preset. The header composition changes
    /// qualitatively here, so no focal anchoring is attempted.
    pub fn zoom_to_preset(&mut self, preset: ZoomPreset) {
        let anchor_days = self.scroll_px / self.day_width;
        self.day_width = preset.day_width().clamp(MIN_DAY_WIDTH, MAX_DAY_WIDTH);
        self.scroll_px = anchor_days * self.day_width;
    }

    /// Scroll so that `date` sits `lead_px` from the left edge.
    pub fn scroll_to_date(&mut self, date: NaiveDate, lead_px: f32) {
        let days = (date - self.origin).num_days() as f32;
        self.scroll_px = days * self.day_width - lead_px;
    }

    /// Inclusive date range covered by a surface of `view_width` pixels,
    /// padded by one day on each side for partially visible columns.
    pub fn visible_range(&self, view_width: f32) -> (NaiveDate, NaiveDate) {
        let first = (self.scroll_px / self.day_width).floor() as i64 - 1;
        let last = ((self.scroll_px + view_width) / self.day_width).ceil() as i64 + 1;
        (
            self.origin + chrono::Duration::days(first),
            self.origin + chrono::Duration::days(last),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::axis;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn zoom_keeps_focal_date_fixed() {
        // origin 2024-01-01, 20 px/day: 2024-01-11 sits at offset 200.
        let mut view = Viewport::new(d(2024, 1, 1));
        view.day_width = 20.0;
        view.scroll_px = 0.0;
        assert_eq!(axis::date_to_offset(d(2024, 1, 11), &view), 200.0);

        view.zoom_by(2.0, 200.0);
        assert_eq!(view.day_width, 40.0);
        assert_eq!(axis::offset_to_date(view.scroll_px + 200.0, &view), d(2024, 1, 11));
    }

    #[test]
    fn zoom_clamps_at_bounds_without_failing() {
        let mut view = Viewport::new(d(2024, 1, 1));
        view.day_width = 100.0;
        view.zoom_by(10.0, 0.0);
        assert_eq!(view.day_width, MAX_DAY_WIDTH);
        view.zoom_by(0.0001, 0.0);
        assert_eq!(view.day_width, MIN_DAY_WIDTH);
    }

    #[test]
    fn preset_switch_uses_preset_width() {
        let mut view = Viewport::new(d(2024, 1, 1));
        view.zoom_to_preset(ZoomPreset::Month);
        assert_eq!(view.day_width, 10.0);
        view.zoom_to_preset(ZoomPreset::Day);
        assert_eq!(view.day_width, 40.0);
    }

    proptest! {
        /// For any viewport, zoom factor and focal pixel, the date under the
        /// focal pixel resolves identically (within a day) before and after.
        #[test]
        fn focal_invariant(
            day_width in 2.0f32..120.0,
            scroll in -5_000.0f32..5_000.0,
            factor in 0.1f32..10.0,
            focal in 0.0f32..1_500.0,
        ) {
            let mut view = Viewport::new(d(2024, 1, 1));
            view.day_width = day_width;
            view.scroll_px = scroll;
            let before = axis::offset_to_date(view.scroll_px + focal, &view);
            view.zoom_by(factor, focal);
            let after = axis::offset_to_date(view.scroll_px + focal, &view);
            let drift = (after - before).num_days().abs();
            prop_assert!(drift <= 1, "focal date drifted {drift} days");
        }

        /// Round-trip law: mapping a date to its offset and back is lossless.
        #[test]
        fn offset_round_trip(
            day_width in 2.0f32..120.0,
            day in -3_000i64..3_000,
        ) {
            let mut view = Viewport::new(d(2024, 1, 1));
            view.day_width = day_width;
            let date = view.origin + chrono::Duration::days(day);
            let px = axis::date_to_offset(date, &view);
            prop_assert_eq!(axis::offset_to_date(px, &view), date);
        }
    }
}
