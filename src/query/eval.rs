use chrono::{Local, NaiveDate};

use super::ast::{Combinator, Operator, Rule, RuleGroup, RuleNode, RuleValue, Span};
use super::dates;
use super::operand::{self, ValueError};
use crate::record::{FieldValue, Record};

/// Why a rule did not produce a match on its own terms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("operator `{operator}` does not apply to {kind} fields")]
    Unsupported {
        operator: Operator,
        kind: &'static str,
    },
    #[error("field `{field}` holds a {kind} value")]
    Untyped { field: String, kind: &'static str },
}

/// Records matching `query` as of today's local date, in input order.
pub fn apply_filters<'a>(records: &'a [Record], query: &RuleGroup) -> Vec<&'a Record> {
    apply_filters_at(records, query, Local::now().date_naive())
}

/// Records matching `query` with relative operators anchored at `today`.
pub fn apply_filters_at<'a>(
    records: &'a [Record],
    query: &RuleGroup,
    today: NaiveDate,
) -> Vec<&'a Record> {
    if query.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| evaluate(record, query, today))
        .collect()
}

/// An empty group is true whatever its combinator.
pub fn evaluate(record: &Record, group: &RuleGroup, today: NaiveDate) -> bool {
    if group.is_empty() {
        return true;
    }

    let mut results = group.rules.iter().map(|node| match node {
        RuleNode::Group(inner) => evaluate(record, inner, today),
        RuleNode::Rule(rule) => evaluate_rule(record, rule, today),
    });

    match group.combinator {
        Combinator::And => results.all(|matched| matched),
        Combinator::Or => results.any(|matched| matched),
    }
}

/// Fail-closed view of [`check_rule`].
pub fn evaluate_rule(record: &Record, rule: &Rule, today: NaiveDate) -> bool {
    check_rule(record, rule, today).unwrap_or_else(|err| {
        tracing::trace!(
            record = record.id(),
            field = %rule.field,
            operator = %rule.operator,
            error = %err,
            "rule failed closed"
        );
        false
    })
}

pub fn check_rule(record: &Record, rule: &Rule, today: NaiveDate) -> Result<bool, RuleError> {
    let value = record.get(&rule.field);

    match rule.operator {
        Operator::IsSet => return Ok(value.is_set()),
        Operator::IsNotSet => return Ok(!value.is_set()),
        _ => {}
    }

    match value {
        FieldValue::Text(s) => check_text(s, &rule.operator, &rule.value),
        FieldValue::Number(n) => check_number(*n, &rule.operator, &rule.value),
        FieldValue::Date(ts) => check_date(ts.date(), &rule.operator, &rule.value, today),
        FieldValue::Null | FieldValue::Other(_) => Err(RuleError::Untyped {
            field: rule.field.clone(),
            kind: value.kind_name(),
        }),
    }
}

fn check_text(field: &str, op: &Operator, value: &RuleValue) -> Result<bool, RuleError> {
    let field = field.to_lowercase();
    let needle = operand::text(value)?.to_lowercase();

    Ok(match op {
        Operator::Eq => field == needle,
        Operator::Ne => field != needle,
        Operator::Contains => field.contains(&needle),
        Operator::DoesNotContain | Operator::NotContains => !field.contains(&needle),
        Operator::StartsWith => field.starts_with(&needle),
        Operator::EndsWith => field.ends_with(&needle),
        _ => return Err(unsupported(op, "text")),
    })
}

fn check_number(field: f64, op: &Operator, value: &RuleValue) -> Result<bool, RuleError> {
    match op {
        Operator::IsNumeric => Ok(!field.is_nan()),
        Operator::IsNotNumeric => Ok(field.is_nan()),
        Operator::Between => {
            let (min, max) = operand::number_range(value)?;
            Ok(min <= field && field <= max)
        }
        Operator::NotBetween => {
            let (min, max) = operand::number_range(value)?;
            Ok(field < min || field > max)
        }
        _ => {
            let target = operand::number(value)?;
            compare(field, target, op).ok_or_else(|| unsupported(op, "number"))
        }
    }
}

fn check_date(
    day: NaiveDate,
    op: &Operator,
    value: &RuleValue,
    today: NaiveDate,
) -> Result<bool, RuleError> {
    Ok(match op {
        Operator::Eq | Operator::On => day == operand::day(value)?,
        Operator::Ne | Operator::NotOn => day != operand::day(value)?,
        Operator::Gt => day > operand::day(value)?,
        Operator::Lt => day < operand::day(value)?,
        Operator::Since => day >= operand::day(value)?,
        Operator::Between => {
            let (start, end) = operand::day_range(value)?;
            start <= day && day <= end
        }
        Operator::NotBetween => {
            let (start, end) = operand::day_range(value)?;
            day < start || day > end
        }
        Operator::Last => day >= span_start(today, operand::span(value)?)?,
        // Same cutoff, same comparison; kept as two operators until the
        // product decides whether they should differ.
        Operator::NotInTheLast | Operator::BeforeTheLast => {
            day < span_start(today, operand::span(value)?)?
        }
        Operator::InTheNext => {
            let horizon =
                dates::span_end(today, operand::span(value)?).ok_or(ValueError::OutOfRange)?;
            today <= day && day <= horizon
        }
        _ => return Err(unsupported(op, "date")),
    })
}

fn span_start(today: NaiveDate, span: Span) -> Result<NaiveDate, ValueError> {
    dates::span_start(today, span).ok_or(ValueError::OutOfRange)
}

fn compare<T: PartialOrd>(a: T, b: T, op: &Operator) -> Option<bool> {
    Some(match op {
        Operator::Eq => a == b,
        Operator::Ne => a != b,
        Operator::Gt => a > b,
        Operator::Lt => a < b,
        Operator::Ge => a >= b,
        Operator::Le => a <= b,
        _ => return None,
    })
}

fn unsupported(op: &Operator, kind: &'static str) -> RuleError {
    RuleError::Unsupported {
        operator: op.clone(),
        kind,
    }
}
