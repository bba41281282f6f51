use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value as YamlValue;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A tree of rules combined with a single boolean connective.
///
/// Unknown keys are rejected so that a malformed rule object never reads
/// as an empty group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroup {
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub rules: Vec<RuleNode>,
}

impl RuleGroup {
    pub fn new(combinator: Combinator, rules: Vec<RuleNode>) -> Self {
        Self { combinator, rules }
    }

    pub fn and(rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self::new(Combinator::And, rules.into_iter().collect())
    }

    pub fn or(rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self::new(Combinator::Or, rules.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A child of a group. Objects carrying `field` and `operator` are rules,
/// objects with only `combinator` and `rules` are nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Rule(Rule),
    Group(RuleGroup),
}

impl From<Rule> for RuleNode {
    fn from(rule: Rule) -> Self {
        RuleNode::Rule(rule)
    }
}

impl From<RuleGroup> for RuleNode {
    fn from(group: RuleGroup) -> Self {
        RuleNode::Group(group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    #[serde(alias = "AND")]
    And,
    #[serde(other)]
    Or,
}

impl Combinator {
    pub fn toggled(self) -> Self {
        match self {
            Combinator::And => Combinator::Or,
            Combinator::Or => Combinator::And,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "and"),
            Combinator::Or => write!(f, "or"),
        }
    }
}

/// A leaf predicate over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: Operator,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: RuleValue,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RuleValue, D::Error> {
    Option::<RuleValue>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Rule {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<RuleValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// A rule is complete when it names a field and an operator, and
    /// carries a value unless the operator takes none.
    pub fn is_complete(&self) -> bool {
        !self.field.is_empty()
            && !self.operator.as_str().is_empty()
            && (self.operator.is_value_less() || !self.value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    DoesNotContain,
    NotContains,
    StartsWith,
    EndsWith,
    IsSet,
    IsNotSet,
    IsNumeric,
    IsNotNumeric,
    Between,
    NotBetween,
    On,
    NotOn,
    Since,
    Last,
    NotInTheLast,
    BeforeTheLast,
    InTheNext,
    /// Any name the evaluator does not know. Never matches.
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "doesNotContain",
            Operator::NotContains => "notContains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::IsSet => "isSet",
            Operator::IsNotSet => "isNotSet",
            Operator::IsNumeric => "isNumeric",
            Operator::IsNotNumeric => "isNotNumeric",
            Operator::Between => "between",
            Operator::NotBetween => "notBetween",
            Operator::On => "on",
            Operator::NotOn => "notOn",
            Operator::Since => "since",
            Operator::Last => "last",
            Operator::NotInTheLast => "notInTheLast",
            Operator::BeforeTheLast => "beforeTheLast",
            Operator::InTheNext => "inTheNext",
            Operator::Unknown(name) => name,
        }
    }

    /// Operators that are decided by the field value alone.
    pub fn is_value_less(&self) -> bool {
        matches!(
            self,
            Operator::IsSet | Operator::IsNotSet | Operator::IsNumeric | Operator::IsNotNumeric
        )
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        match name {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "contains" => Operator::Contains,
            "doesNotContain" => Operator::DoesNotContain,
            "notContains" => Operator::NotContains,
            "startsWith" => Operator::StartsWith,
            "endsWith" => Operator::EndsWith,
            "isSet" => Operator::IsSet,
            "isNotSet" => Operator::IsNotSet,
            "isNumeric" => Operator::IsNumeric,
            "isNotNumeric" => Operator::IsNotNumeric,
            "between" => Operator::Between,
            "notBetween" => Operator::NotBetween,
            "on" => Operator::On,
            "notOn" => Operator::NotOn,
            "since" => Operator::Since,
            "last" => Operator::Last,
            "notInTheLast" => Operator::NotInTheLast,
            "beforeTheLast" => Operator::BeforeTheLast,
            "inTheNext" => Operator::InTheNext,
            other => Operator::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Operator::from(name.as_str())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a rule. `Text` may hold the comma-encoded forms
/// (`min,max`, `start,end`, `amount,unit`); the structured variants
/// carry the same information without the delimiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
    Pair(Scalar, Scalar),
    Span(Span),
    /// Any other shape. Kept so the rule fails on its own instead of
    /// failing the whole query.
    Malformed(YamlValue),
}

impl RuleValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, RuleValue::Text(s) if s.is_empty())
    }

    /// The comma-encoded form of the value.
    pub fn encoded(&self) -> Cow<'_, str> {
        match self {
            RuleValue::Text(s) => Cow::Borrowed(s),
            RuleValue::Number(n) => Cow::Owned(n.to_string()),
            RuleValue::Pair(a, b) => Cow::Owned(format!("{a},{b}")),
            RuleValue::Span(span) => Cow::Owned(span.to_string()),
            RuleValue::Malformed(raw) => Cow::Owned(serde_json::to_string(raw).unwrap_or_default()),
        }
    }
}

impl Default for RuleValue {
    fn default() -> Self {
        RuleValue::Text(String::new())
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        RuleValue::Text(s.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        RuleValue::Text(s)
    }
}

impl From<f64> for RuleValue {
    fn from(n: f64) -> Self {
        RuleValue::Number(n)
    }
}

impl From<Span> for RuleValue {
    fn from(span: Span) -> Self {
        RuleValue::Span(span)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// A relative distance from today, e.g. 7 days or 3 months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub amount: i64,
    pub unit: Unit,
}

impl Span {
    pub fn new(amount: i64, unit: Unit) -> Self {
        Self { amount, unit }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.amount, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Days,
    Weeks,
    Months,
    Years,
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "days" => Ok(Unit::Days),
            "weeks" => Ok(Unit::Weeks),
            "months" => Ok(Unit::Months),
            "years" => Ok(Unit::Years),
            _ => Err(format!("invalid unit: {value}")),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unit::Days => "days",
            Unit::Weeks => "weeks",
            Unit::Months => "months",
            Unit::Years => "years",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::from_str;

    #[test]
    fn test_nested_group_deserializes() {
        let group: RuleGroup = from_str(
            r#"
combinator: or
rules:
  - combinator: and
    rules:
      - { field: company, operator: "=", value: acme }
  - { field: employees, operator: between, value: "10,50" }
"#,
        )
        .unwrap();

        assert_eq!(group.combinator, Combinator::Or);
        assert!(matches!(&group.rules[0], RuleNode::Group(g) if g.rules.len() == 1));
        let RuleNode::Rule(rule) = &group.rules[1] else {
            panic!("Expected leaf rule");
        };
        assert_eq!(rule.operator, Operator::Between);
        assert_eq!(rule.value, RuleValue::Text("10,50".to_string()));
    }

    #[test]
    fn test_missing_rules_is_empty_group() {
        let group: RuleGroup = serde_json::from_str(r#"{"combinator": "and"}"#).unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn test_unknown_combinator_reads_as_or() {
        let group: RuleGroup = serde_json::from_str(r#"{"combinator": "xor", "rules": []}"#).unwrap();
        assert_eq!(group.combinator, Combinator::Or);
    }

    #[test]
    fn test_structured_values() {
        let rules: Vec<Rule> = serde_json::from_str(
            r#"[
                {"field": "employees", "operator": "=", "value": 50},
                {"field": "employees", "operator": "between", "value": [10, "50"]},
                {"field": "created", "operator": "last", "value": {"amount": 7, "unit": "days"}},
                {"field": "name", "operator": "isSet"}
            ]"#,
        )
        .unwrap();

        assert_eq!(rules[0].value, RuleValue::Number(50.0));
        assert_eq!(
            rules[1].value,
            RuleValue::Pair(Scalar::Number(10.0), Scalar::Text("50".to_string()))
        );
        assert_eq!(rules[2].value, RuleValue::Span(Span::new(7, Unit::Days)));
        assert!(rules[3].value.is_empty());
    }

    #[test]
    fn test_null_value_reads_as_empty() {
        let group: RuleGroup = from_str(
            r#"
rules:
  - { field: lastSeen, operator: isNotSet, value: ~ }
  - field: company
    operator: "="
    value:
"#,
        )
        .unwrap();

        for node in &group.rules {
            let RuleNode::Rule(rule) = node else {
                panic!("Expected leaf rule, got {node:?}");
            };
            assert!(rule.value.is_empty());
        }
    }

    #[test]
    fn test_odd_payloads_stay_rules() {
        let group: RuleGroup = serde_json::from_str(
            r#"{"combinator": "or", "rules": [
                {"field": "employees", "operator": "between", "value": [1, 2, 3]},
                {"field": "created", "operator": "last", "value": {"amount": 7.5, "unit": "days"}},
                {"field": "company", "operator": "=", "value": true}
            ]}"#,
        )
        .unwrap();

        assert_eq!(group.rules.len(), 3);
        for node in &group.rules {
            assert!(
                matches!(node, RuleNode::Rule(Rule { value: RuleValue::Malformed(_), .. })),
                "{node:?}"
            );
        }
    }

    #[test]
    fn test_rule_without_operator_is_rejected() {
        let result: Result<RuleGroup, _> = serde_json::from_str(
            r#"{"rules": [{"field": "employees", "value": 5}]}"#,
        );
        assert!(result.is_err());

        let result: Result<RuleGroup, _> = from_str("rules:\n  - { operator: isSet }\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_operator_round_trips_its_name() {
        let op = Operator::from("fuzzyMatch");
        assert_eq!(op, Operator::Unknown("fuzzyMatch".to_string()));
        assert_eq!(op.to_string(), "fuzzyMatch");
    }

    #[test]
    fn test_rule_completeness() {
        assert!(Rule::new("company", Operator::Eq, "acme").is_complete());
        assert!(Rule::new("company", Operator::IsSet, "").is_complete());
        assert!(Rule::new("employees", Operator::IsNotNumeric, "").is_complete());
        assert!(!Rule::new("company", Operator::Eq, "").is_complete());
        assert!(!Rule::new("", Operator::Eq, "acme").is_complete());
        assert!(!Rule::new("company", Operator::from(""), "acme").is_complete());
    }

    #[test]
    fn test_encoded_values() {
        assert_eq!(RuleValue::Number(50.0).encoded(), "50");
        assert_eq!(
            RuleValue::Pair(Scalar::Number(10.0), Scalar::Number(20.5)).encoded(),
            "10,20.5"
        );
        assert_eq!(RuleValue::Span(Span::new(3, Unit::Months)).encoded(), "3,months");
    }
}
