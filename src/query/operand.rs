//! Typed operands pulled out of a rule value.
//!
//! Each extractor accepts both the comma-encoded text form and the
//! structured payloads. Positions beyond the ones an operator needs are
//! ignored, so `10,50,90` reads as the range 10..=50.

use chrono::NaiveDate;
use std::borrow::Cow;

use super::ast::{RuleValue, Scalar, Span, Unit};
use super::dates;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("`{0}` is not a number")]
    Number(String),
    #[error("`{0}` is not a date")]
    Date(String),
    #[error("`{0}` is not a two-part value")]
    Pair(String),
    #[error("`{0}` is not an amount")]
    Amount(String),
    #[error("`{0}` is not a unit (days, weeks, months, years)")]
    Unit(String),
    #[error("date arithmetic out of range")]
    OutOfRange,
    #[error("`{0}` is not a usable rule value")]
    Malformed(String),
}

pub fn text(value: &RuleValue) -> Result<Cow<'_, str>, ValueError> {
    match value {
        RuleValue::Malformed(_) => Err(ValueError::Malformed(value.encoded().into_owned())),
        other => Ok(other.encoded()),
    }
}

pub fn number(value: &RuleValue) -> Result<f64, ValueError> {
    match value {
        RuleValue::Number(n) => finite_or_inf(*n),
        RuleValue::Text(s) => parse_number(s),
        other => Err(ValueError::Number(other.encoded().into_owned())),
    }
}

pub fn number_range(value: &RuleValue) -> Result<(f64, f64), ValueError> {
    match value {
        RuleValue::Pair(min, max) => Ok((scalar_number(min)?, scalar_number(max)?)),
        RuleValue::Text(s) => {
            let (min, max) = split_pair(s)?;
            Ok((parse_number(min)?, parse_number(max)?))
        }
        other => Err(ValueError::Pair(other.encoded().into_owned())),
    }
}

pub fn day(value: &RuleValue) -> Result<NaiveDate, ValueError> {
    match value {
        RuleValue::Text(s) => parse_day(s),
        other => Err(ValueError::Date(other.encoded().into_owned())),
    }
}

pub fn day_range(value: &RuleValue) -> Result<(NaiveDate, NaiveDate), ValueError> {
    match value {
        RuleValue::Pair(start, end) => Ok((scalar_day(start)?, scalar_day(end)?)),
        RuleValue::Text(s) => {
            let (start, end) = split_pair(s)?;
            Ok((parse_day(start)?, parse_day(end)?))
        }
        other => Err(ValueError::Pair(other.encoded().into_owned())),
    }
}

pub fn span(value: &RuleValue) -> Result<Span, ValueError> {
    match value {
        RuleValue::Span(span) => Ok(*span),
        RuleValue::Pair(amount, unit) => {
            let amount = match amount {
                Scalar::Number(n) if n.is_finite() => n.trunc() as i64,
                Scalar::Number(n) => return Err(ValueError::Amount(n.to_string())),
                Scalar::Text(s) => parse_amount(s)?,
            };
            Ok(Span::new(amount, parse_unit(&unit.to_string())?))
        }
        RuleValue::Text(s) => {
            let (amount, unit) = split_pair(s)?;
            Ok(Span::new(parse_amount(amount)?, parse_unit(unit)?))
        }
        other => Err(ValueError::Pair(other.encoded().into_owned())),
    }
}

fn split_pair(s: &str) -> Result<(&str, &str), ValueError> {
    let mut parts = s.split(',');
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(ValueError::Pair(s.to_string())),
    }
}

/// Decimal or exponent notation, surrounding whitespace allowed. Empty
/// input and NaN are rejected; infinities are kept.
fn parse_number(s: &str) -> Result<f64, ValueError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValueError::Number(s.to_string()));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| ValueError::Number(s.to_string()))
        .and_then(finite_or_inf)
}

fn finite_or_inf(n: f64) -> Result<f64, ValueError> {
    if n.is_nan() {
        Err(ValueError::Number(n.to_string()))
    } else {
        Ok(n)
    }
}

fn scalar_number(scalar: &Scalar) -> Result<f64, ValueError> {
    match scalar {
        Scalar::Number(n) => finite_or_inf(*n),
        Scalar::Text(s) => parse_number(s),
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, ValueError> {
    dates::parse_day(s).ok_or_else(|| ValueError::Date(s.to_string()))
}

fn scalar_day(scalar: &Scalar) -> Result<NaiveDate, ValueError> {
    match scalar {
        Scalar::Text(s) => parse_day(s),
        Scalar::Number(n) => Err(ValueError::Date(n.to_string())),
    }
}

/// Leading integer, like a lenient `parseInt`: `7`, `+7`, `-2`, `7.5` (7).
fn parse_amount(s: &str) -> Result<i64, ValueError> {
    let trimmed = s.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['+', '-']));
    let digits_len = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return Err(ValueError::Amount(s.to_string()));
    }
    trimmed[..digits_start + digits_len]
        .parse()
        .map_err(|_| ValueError::Amount(s.to_string()))
}

fn parse_unit(s: &str) -> Result<Unit, ValueError> {
    s.trim()
        .parse()
        .map_err(|_| ValueError::Unit(s.to_string()))
}
