//! Adaptive month/week/day header bands for a date range.
//!
//! Every band records its start date and the count of calendar days it
//! covers inside the requested range; the renderer derives pixel positions
//! from those counts and the shared day-width, so the bands can never drift
//! off the grid the entry bars use.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Below this day-width the day band is omitted entirely.
const DAY_BAND_MIN_WIDTH: f32 = 11.0;
/// Below this day-width the weekday name inside a day cell is omitted while
/// the numeric day is still shown.
const DAY_NAME_MIN_WIDTH: f32 = 35.0;

/// One labelled span in the month or week band.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub start: NaiveDate,
    /// Calendar days covered inside the generated range.
    pub days: i64,
    pub label: String,
}

/// One cell in the day band.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub label: String,
    /// Short weekday name; present only above the name threshold.
    pub name: Option<String>,
    pub weekend: bool,
}

/// The three aligned header rows.
#[derive(Debug, Clone, Default)]
pub struct HeaderBands {
    pub months: Vec<Band>,
    pub weeks: Vec<Band>,
    /// Empty when the zoom is too far out for day cells.
    pub days: Vec<DayCell>,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(date + Duration::days(31))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Generate the header rows for the inclusive range `[start, end]` at the
/// given day-width.
pub fn header_bands(start: NaiveDate, end: NaiveDate, day_width: f32) -> HeaderBands {
    let mut bands = HeaderBands::default();
    if end < start {
        return bands;
    }
    let range_end_excl = end + Duration::days(1);

    // Month row. The first and last bands are clipped to the range so their
    // day counts line up with the rows below.
    let mut cursor = start;
    while cursor < range_end_excl {
        let month_end = next_month(month_start(cursor)).min(range_end_excl);
        bands.months.push(Band {
            start: cursor,
            days: (month_end - cursor).num_days(),
            label: cursor.format("%b %Y").to_string(),
        });
        cursor = month_end;
    }

    // Week row, ISO week numbers (Thursday-anchored).
    let mut cursor = start;
    while cursor < range_end_excl {
        let week_end = (week_start(cursor) + Duration::days(7)).min(range_end_excl);
        bands.weeks.push(Band {
            start: cursor,
            days: (week_end - cursor).num_days(),
            label: format!("W{}", cursor.iso_week().week()),
        });
        cursor = week_end;
    }

    // Day row, dropped entirely once cells get too narrow to read.
    if day_width >= DAY_BAND_MIN_WIDTH {
        let with_names = day_width >= DAY_NAME_MIN_WIDTH;
        let mut date = start;
        while date < range_end_excl {
            let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            bands.days.push(DayCell {
                date,
                label: date.format("%-d").to_string(),
                name: with_names.then(|| date.format("%a").to_string()),
                weekend,
            });
            date += Duration::days(1);
        }
    }

    bands
}
