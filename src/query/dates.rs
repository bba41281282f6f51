//! Calendar parsing and relative-span arithmetic.
//!
//! Everything here works on naive local dates: a timestamp is reduced to
//! the calendar day it was written in, and time of day never takes part in
//! a comparison.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta};

use super::ast::{Span, Unit};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%Y/%m/%d"];

/// Parse a timestamp or a bare date. Bare dates land on midnight.
///
/// RFC 3339 input keeps the wall-clock time of its own offset, so
/// `2024-06-03T23:30:00-05:00` stays on June 3rd.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_day(input: &str) -> Option<NaiveDate> {
    parse_timestamp(input).map(|dt| dt.date())
}

/// Move `day` by `amount` units; negative amounts go backwards.
///
/// Days and weeks are fixed 24h steps. Months and years step the calendar
/// fields and clamp to the last day of a shorter month, so Mar 31 minus
/// one month is Feb 28 (or 29).
pub fn shift(day: NaiveDate, amount: i64, unit: Unit) -> Option<NaiveDate> {
    match unit {
        Unit::Days => day.checked_add_signed(TimeDelta::try_days(amount)?),
        Unit::Weeks => day.checked_add_signed(TimeDelta::try_days(amount.checked_mul(7)?)?),
        Unit::Months => shift_months(day, amount),
        Unit::Years => shift_months(day, amount.checked_mul(12)?),
    }
}

fn shift_months(day: NaiveDate, months: i64) -> Option<NaiveDate> {
    let step = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        day.checked_add_months(step)
    } else {
        day.checked_sub_months(step)
    }
}

/// `today - span`
pub fn span_start(today: NaiveDate, span: Span) -> Option<NaiveDate> {
    shift(today, span.amount.checked_neg()?, span.unit)
}

/// `today + span`
pub fn span_end(today: NaiveDate, span: Span) -> Option<NaiveDate> {
    shift(today, span.amount, span.unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_day("2024-06-03"), Some(day(2024, 6, 3)));
        assert_eq!(parse_day(" 2024-06-03 "), Some(day(2024, 6, 3)));
        assert_eq!(parse_day("2024-06-03T18:45:00"), Some(day(2024, 6, 3)));
        assert_eq!(parse_day("2024-06-03 08:00"), Some(day(2024, 6, 3)));
        assert_eq!(parse_day("Jun 3, 2024"), Some(day(2024, 6, 3)));
        assert_eq!(parse_day("June 03, 2024"), Some(day(2024, 6, 3)));
    }

    #[test]
    fn test_rfc3339_keeps_its_own_calendar_day() {
        assert_eq!(parse_day("2024-06-03T23:30:00-05:00"), Some(day(2024, 6, 3)));
        assert_eq!(parse_day("2024-06-03T00:10:00Z"), Some(day(2024, 6, 3)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("yesterday"), None);
        assert_eq!(parse_day("2024-13-01"), None);
        assert_eq!(parse_day("2024-02-30"), None);
    }

    #[test]
    fn test_bare_date_is_midnight() {
        let ts = parse_timestamp("2024-06-03").unwrap();
        assert_eq!(ts, day(2024, 6, 3).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_shift_fixed_units() {
        let today = day(2024, 6, 10);
        assert_eq!(shift(today, -7, Unit::Days), Some(day(2024, 6, 3)));
        assert_eq!(shift(today, 2, Unit::Weeks), Some(day(2024, 6, 24)));
        assert_eq!(shift(day(2024, 3, 1), -1, Unit::Days), Some(day(2024, 2, 29)));
    }

    #[test]
    fn test_shift_months_clamps_to_month_end() {
        assert_eq!(shift(day(2024, 3, 31), -1, Unit::Months), Some(day(2024, 2, 29)));
        assert_eq!(shift(day(2023, 1, 31), 1, Unit::Months), Some(day(2023, 2, 28)));
        assert_eq!(shift(day(2024, 2, 29), -1, Unit::Years), Some(day(2023, 2, 28)));
        assert_eq!(shift(day(2024, 6, 10), 3, Unit::Months), Some(day(2024, 9, 10)));
    }

    #[test]
    fn test_shift_overflow_is_none() {
        assert_eq!(shift(day(2024, 6, 10), i64::MAX, Unit::Days), None);
        assert_eq!(shift(day(2024, 6, 10), i64::MAX, Unit::Years), None);
        assert_eq!(span_start(day(2024, 6, 10), Span::new(i64::MIN, Unit::Days)), None);
    }

    #[test]
    fn test_span_bounds() {
        let today = day(2024, 6, 10);
        let week = Span::new(1, Unit::Weeks);
        assert_eq!(span_start(today, week), Some(day(2024, 6, 3)));
        assert_eq!(span_end(today, week), Some(day(2024, 6, 17)));
    }
}
