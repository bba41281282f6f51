//! Field catalogue: which fields exist, what kind of value each holds,
//! and which operators the builder offers for it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[serde(alias = "text")]
    String,
    Number,
    Date,
}

const STRING_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::IsSet,
    Operator::IsNotSet,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Lt,
    Operator::Ge,
    Operator::Le,
    Operator::Between,
    Operator::NotBetween,
    Operator::IsNumeric,
    Operator::IsNotNumeric,
    Operator::IsSet,
    Operator::IsNotSet,
];

const DATE_OPERATORS: &[Operator] = &[
    Operator::On,
    Operator::NotOn,
    Operator::Gt,
    Operator::Lt,
    Operator::Since,
    Operator::Between,
    Operator::NotBetween,
    Operator::Last,
    Operator::NotInTheLast,
    Operator::BeforeTheLast,
    Operator::InTheNext,
    Operator::IsSet,
    Operator::IsNotSet,
];

impl FieldKind {
    pub fn operators(self) -> &'static [Operator] {
        match self {
            FieldKind::String => STRING_OPERATORS,
            FieldKind::Number => NUMBER_OPERATORS,
            FieldKind::Date => DATE_OPERATORS,
        }
    }

    /// Human label for an operator on this kind of field.
    pub fn operator_label(self, op: &Operator) -> &'static str {
        match (self, op) {
            (FieldKind::Date, Operator::Eq | Operator::On) => "on",
            (FieldKind::Date, Operator::Ne | Operator::NotOn) => "not on",
            (FieldKind::Date, Operator::Gt) => "after",
            (FieldKind::Date, Operator::Lt) => "before",
            (_, Operator::Eq) => "is",
            (_, Operator::Ne) => "is not",
            (_, Operator::Gt) => "greater than",
            (_, Operator::Lt) => "less than",
            (_, Operator::Ge) => "greater than or equal to",
            (_, Operator::Le) => "less than or equal to",
            (_, Operator::Contains) => "contains",
            (_, Operator::DoesNotContain | Operator::NotContains) => "does not contain",
            (_, Operator::StartsWith) => "starts with",
            (_, Operator::EndsWith) => "ends with",
            (_, Operator::IsSet) => "is set",
            (_, Operator::IsNotSet) => "is not set",
            (_, Operator::IsNumeric) => "is numeric",
            (_, Operator::IsNotNumeric) => "is not numeric",
            (_, Operator::Between) => "between",
            (_, Operator::NotBetween) => "not between",
            (_, Operator::On) => "on",
            (_, Operator::NotOn) => "not on",
            (_, Operator::Since) => "since",
            (_, Operator::Last) => "in the last",
            (_, Operator::NotInTheLast) => "not in the last",
            (_, Operator::BeforeTheLast) => "before the last",
            (_, Operator::InTheNext) => "in the next",
            (_, Operator::Unknown(_)) => "unknown",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FieldDef {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            kind,
            category: None,
            description: None,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// The user directory the builder ships with.
    pub fn users() -> Self {
        Self::new(vec![
            FieldDef::new("id", "ID", FieldKind::String),
            FieldDef::new("name", "Name", FieldKind::String),
            FieldDef::new("company", "Company", FieldKind::String),
            FieldDef::new("employees", "Employees", FieldKind::Number),
            FieldDef::new("created", "Created", FieldKind::Date),
            FieldDef::new("lastSeen", "Last Seen", FieldKind::Date),
        ])
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.get(name).map(|f| f.kind)
    }

    /// First field name declared more than once, if any.
    pub fn duplicate_field(&self) -> Option<&str> {
        self.fields.iter().enumerate().find_map(|(i, field)| {
            self.fields[..i]
                .iter()
                .any(|earlier| earlier.name == field.name)
                .then_some(field.name.as_str())
        })
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::users()
    }
}
