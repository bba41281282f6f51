use serde_yaml::Value as YamlValue;
use std::collections::HashMap;

use crate::record::{FieldValue, Record};

/// Lists count each of their items.
pub fn collect_values(records: &[&Record], field: &str) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records {
        match record.get(field) {
            FieldValue::Other(YamlValue::Sequence(items)) => {
                for item in items {
                    if let Some(s) = raw_to_string(item) {
                        *counts.entry(s).or_default() += 1;
                    }
                }
            }
            value => {
                if let Some(s) = value_to_string(value) {
                    *counts.entry(s).or_default() += 1;
                }
            }
        }
    }

    counts
}

pub fn format_values(counts: HashMap<String, usize>, show_count: bool) -> Vec<String> {
    let mut items: Vec<(String, usize)> = counts.into_iter().collect();

    if show_count {
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items
            .into_iter()
            .map(|(val, count)| format!("{}: {}", val, count))
            .collect()
    } else {
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(val, _)| val).collect()
    }
}

/// Dates group by calendar day.
fn value_to_string(v: &FieldValue) -> Option<String> {
    match v {
        FieldValue::Text(s) if !s.is_empty() => Some(s.clone()),
        FieldValue::Number(n) if !n.is_nan() => Some(n.to_string()),
        FieldValue::Date(ts) => Some(ts.date().to_string()),
        FieldValue::Other(raw) => raw_to_string(raw),
        _ => None,
    }
}

fn raw_to_string(v: &YamlValue) -> Option<String> {
    match v {
        YamlValue::String(s) if !s.is_empty() => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
