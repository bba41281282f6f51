//! Typed records.
//!
//! Raw rows arrive as JSON or YAML mappings. Each field is decoded once,
//! against the schema when the field is declared and from its raw shape
//! otherwise, into a [`FieldValue`] the evaluator can match on.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_yaml::Value as YamlValue;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::document;
use crate::error::LoadError;
use crate::query::dates;
use crate::schema::{FieldKind, Schema};

pub const ID_FIELD: &str = "id";

static MISSING: FieldValue = FieldValue::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// May be NaN when a number field held non-numeric text.
    Number(f64),
    Date(NaiveDateTime),
    Null,
    /// Lists, mappings, booleans, and values that did not fit their kind.
    Other(YamlValue),
}

impl FieldValue {
    pub fn is_set(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Date(_) => "date",
            FieldValue::Null => "null",
            FieldValue::Other(_) => "untyped",
        }
    }

    pub fn decode(raw: &YamlValue, kind: Option<FieldKind>) -> Self {
        match kind {
            Some(FieldKind::String) => decode_text(raw),
            Some(FieldKind::Number) => decode_number(raw),
            Some(FieldKind::Date) => decode_date(raw),
            None => infer(raw),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Date(ts) if ts.time() == chrono::NaiveTime::MIN => {
                write!(f, "{}", ts.format("%Y-%m-%d"))
            }
            FieldValue::Date(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Null => Ok(()),
            FieldValue::Other(v) => match v {
                YamlValue::Bool(b) => write!(f, "{b}"),
                YamlValue::String(s) => f.write_str(s),
                _ => f.write_str("…"),
            },
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Date(ts) => serializer.collect_str(&ts.format("%Y-%m-%dT%H:%M:%S")),
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Other(v) => v.serialize(serializer),
        }
    }
}

fn decode_text(raw: &YamlValue) -> FieldValue {
    match raw {
        YamlValue::String(s) => FieldValue::Text(s.clone()),
        YamlValue::Number(n) => FieldValue::Text(n.to_string()),
        YamlValue::Bool(b) => FieldValue::Text(b.to_string()),
        YamlValue::Null => FieldValue::Null,
        other => FieldValue::Other(other.clone()),
    }
}

fn decode_number(raw: &YamlValue) -> FieldValue {
    match raw {
        YamlValue::Number(_) => yaml_to_number(raw).map_or(FieldValue::Null, FieldValue::Number),
        YamlValue::String(s) if s.trim().is_empty() => FieldValue::Null,
        YamlValue::String(s) => FieldValue::Number(s.trim().parse().unwrap_or(f64::NAN)),
        YamlValue::Null => FieldValue::Null,
        other => FieldValue::Other(other.clone()),
    }
}

fn decode_date(raw: &YamlValue) -> FieldValue {
    match raw {
        YamlValue::String(s) if s.trim().is_empty() => FieldValue::Null,
        YamlValue::String(s) => match dates::parse_timestamp(s) {
            Some(ts) => FieldValue::Date(ts),
            None => FieldValue::Other(raw.clone()),
        },
        YamlValue::Null => FieldValue::Null,
        other => FieldValue::Other(other.clone()),
    }
}

fn infer(raw: &YamlValue) -> FieldValue {
    match raw {
        YamlValue::String(s) => FieldValue::Text(s.clone()),
        YamlValue::Number(_) => yaml_to_number(raw).map_or(FieldValue::Null, FieldValue::Number),
        YamlValue::Null => FieldValue::Null,
        other => FieldValue::Other(other.clone()),
    }
}

fn yaml_to_number(v: &YamlValue) -> Option<f64> {
    v.as_f64().or_else(|| v.as_i64().map(|i| i as f64))
}

/// One row, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn id(&self) -> &str {
        match self.fields.get(ID_FIELD) {
            Some(FieldValue::Text(id)) => id,
            _ => "",
        }
    }

    /// Absent fields read as [`FieldValue::Null`].
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&MISSING)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("record {index} is not a mapping")]
    NotAMapping { index: usize },
    #[error("record {index} has no id")]
    MissingId { index: usize },
}

pub fn decode_row(index: usize, row: &YamlValue, schema: &Schema) -> Result<Record, RowError> {
    let Some(mapping) = row.as_mapping() else {
        return Err(RowError::NotAMapping { index });
    };

    let mut fields = BTreeMap::new();
    for (key, raw) in mapping {
        let Some(name) = key.as_str() else {
            continue;
        };
        let value = if name == ID_FIELD {
            decode_text(raw)
        } else {
            FieldValue::decode(raw, schema.kind_of(name))
        };
        fields.insert(name.to_string(), value);
    }

    let record = Record { fields };
    if record.id().is_empty() {
        return Err(RowError::MissingId { index });
    }
    Ok(record)
}

/// A document is either a list of rows or a single row.
pub fn decode_document(doc: &YamlValue, schema: &Schema) -> Result<Vec<Record>, RowError> {
    match doc {
        YamlValue::Sequence(rows) => rows
            .iter()
            .enumerate()
            .map(|(index, row)| decode_row(index, row, schema))
            .collect(),
        YamlValue::Null => Ok(Vec::new()),
        single => decode_row(0, single, schema).map(|record| vec![record]),
    }
}

pub fn load_records(path: &Path, schema: &Schema) -> Result<Vec<Record>, LoadError> {
    let doc: YamlValue = document::read_document(path)?;
    decode_document(&doc, schema).map_err(|source| LoadError::Row {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every file in order. Ids must be unique across the whole set.
pub fn load_dataset(paths: &[PathBuf], schema: &Schema) -> Result<Vec<Record>, LoadError> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
        let batch = load_records(path, schema)?;
        tracing::debug!(path = %path.display(), count = batch.len(), "loaded records");
        for record in batch {
            if !seen.insert(record.id().to_string()) {
                return Err(LoadError::DuplicateId(record.id().to_string()));
            }
            records.push(record);
        }
    }

    Ok(records)
}
