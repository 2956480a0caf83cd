//! Timezone-naive expiry date handling.
//!
//! Expiry values arrive as date-only strings (`2026-02-20`), naive
//! timestamps (`2026-02-20T08:30:00`, `2026-02-20T08:30`) or offset
//! timestamps (`2026-02-20T00:00:00.000Z`, `2026-02-20T08:30+05:30`).
//! All of them collapse to a calendar date.
//! Offsets are dropped rather than applied so that a timestamp keeps the
//! date its producer wrote down, and no comparison ever mixes aware and
//! naive values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
// RFC 3339 requires seconds; these cover minute-precision offsets.
const OFFSET_MINUTE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Parse an expiry string into a naive calendar date.
///
/// Returns `None` when the input matches none of the accepted layouts.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pharmrank_core::parse_expiry;
///
/// let expected = NaiveDate::from_ymd_opt(2026, 2, 20);
/// assert_eq!(parse_expiry("2026-02-20"), expected);
/// assert_eq!(parse_expiry("2026-02-20T00:00:00.000Z"), expected);
/// assert_eq!(parse_expiry("2026-02-20 17:45:00"), expected);
/// assert_eq!(parse_expiry("next tuesday"), None);
/// ```
#[must_use]
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    let offset = DateTime::parse_from_rfc3339(trimmed).ok().or_else(|| {
        OFFSET_MINUTE_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
    });
    if let Some(timestamp) = offset {
        return Some(timestamp.naive_local().date());
    }
    // `Z` without seconds.
    let naive = trimmed.strip_suffix(['Z', 'z']).unwrap_or(trimmed);
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|timestamp| timestamp.date())
}

/// Whole days from `as_of` until `expiry`; negative once expired.
#[must_use]
pub fn days_until(expiry: NaiveDate, as_of: NaiveDate) -> i64 {
    expiry.signed_duration_since(as_of).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
    }

    #[rstest]
    #[case("2025-12-15")]
    #[case("  2025-12-15  ")]
    #[case("2025-12-15T00:00:00.000Z")]
    #[case("2025-12-15T23:59:59+05:30")]
    #[case("2025-12-15T23:59:59-08:00")]
    #[case("2025-12-15T06:00:00")]
    #[case("2025-12-15T06:00:00.123456")]
    #[case("2025-12-15 06:00:00")]
    #[case("2025-12-15T08:30")]
    #[case("2025-12-15 08:30")]
    #[case("2025-12-15T08:30Z")]
    #[case("2025-12-15T23:30+05:30")]
    fn accepts_dates_and_timestamps(#[case] raw: &str) {
        assert_eq!(parse_expiry(raw), Some(date(2025, 12, 15)));
    }

    #[rstest]
    #[case("")]
    #[case("15/12/2025")]
    #[case("2025-13-01")]
    #[case("2025-02-30")]
    #[case("soon")]
    #[case("2025-12-15Z")]
    #[case("2025-12-15T08")]
    fn rejects_unparseable_values(#[case] raw: &str) {
        assert_eq!(parse_expiry(raw), None);
    }

    #[rstest]
    #[case(date(2026, 1, 31), 30)]
    #[case(date(2026, 1, 1), 0)]
    #[case(date(2025, 12, 25), -7)]
    fn counts_days_until_expiry(#[case] expiry: NaiveDate, #[case] expected: i64) {
        assert_eq!(days_until(expiry, date(2026, 1, 1)), expected);
    }
}
