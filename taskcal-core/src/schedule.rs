//! Pure scheduling derivations.
//!
//! Everything here is deterministic and clock-free; the callers decide
//! what "now" means.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Monday-first weekday labels, as the store's `Day` column expects.
const DAY_OF_WEEK: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Hour of day a date-only deadline is considered due.
const DEADLINE_HOUR: u32 = 16;

/// Hours the clock is shifted back so a late-UTC evening still counts as
/// the same working day.
const WORKING_DAY_SHIFT_HOURS: i64 = 7;

/// Round up to the next quarter-hour mark, with seconds zeroed.
///
/// Adding 14 minutes and flooring to the mark means a time already on a
/// boundary stays put, while anything past it lands on the next one.
/// Used to pick a believable start for ad-hoc same-day events.
pub fn round_up_to_quarter_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let t = t + Duration::minutes(14);
    t - Duration::minutes((t.minute() % 15) as i64)
        - Duration::seconds(t.second() as i64)
        - Duration::nanoseconds(t.nanosecond() as i64)
}

/// Canonicalize a date-only deadline to its due instant: 16:00 on that
/// date in the store's nominal timezone. All comparisons and calendar
/// placements use this value, never the raw date.
pub fn effective_deadline(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(DEADLINE_HOUR, 0, 0)
        .expect("16:00:00 is a valid wall-clock time")
}

/// `MM/DD` of the upcoming Sunday on or after `date`. A Sunday maps to
/// itself.
pub fn week_bucket_label(date: NaiveDate) -> String {
    let days_to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
    let sunday = date + Duration::days(days_to_sunday);
    sunday.format("%m/%d").to_string()
}

/// Three-letter label for `date`'s weekday.
pub fn weekday_label(date: NaiveDate) -> &'static str {
    DAY_OF_WEEK[date.weekday().num_days_from_monday() as usize]
}

/// The working day `now` belongs to: the date part of `now` shifted back
/// 7 hours, so a late-UTC day boundary lines up with the local evening.
pub fn local_working_date(now: DateTime<Utc>) -> NaiveDate {
    (now - Duration::hours(WORKING_DAY_SHIFT_HOURS)).date_naive()
}
