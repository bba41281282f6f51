//! Filter-row state behind the query builder.
//!
//! Every edit returns a new [`QueryBuilder`]; the previous value is left
//! untouched, so a caller can keep it for undo or diffing. [`build`]
//! turns the rows into the [`RuleGroup`] the evaluator consumes.
//!
//! [`build`]: QueryBuilder::build

use super::ast::{Combinator, Operator, Rule, RuleGroup, RuleNode, RuleValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRow {
    pub id: RowId,
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl FilterRow {
    fn blank(id: RowId) -> Self {
        Self {
            id,
            field: String::new(),
            operator: String::new(),
            value: String::new(),
        }
    }

    /// `None` while the row is still being filled in.
    pub fn to_rule(&self) -> Option<Rule> {
        let rule = Rule::new(
            self.field.clone(),
            Operator::from(self.operator.as_str()),
            RuleValue::Text(self.value.clone()),
        );
        rule.is_complete().then_some(rule)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    rows: Vec<FilterRow>,
    combinator: Combinator,
    next_id: u64,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// One blank row, ready for a field.
    pub fn new() -> Self {
        Self::empty().add_row()
    }

    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            combinator: Combinator::And,
            next_id: 0,
        }
    }

    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn last_row(&self) -> Option<RowId> {
        self.rows.last().map(|row| row.id)
    }

    pub fn add_row(&self) -> Self {
        let mut next = self.clone();
        next.push(FilterRow::blank(RowId(self.next_id)));
        next
    }

    /// Append a filled-in row.
    pub fn with_row(&self, field: &str, operator: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.push(FilterRow {
            id: RowId(self.next_id),
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        });
        next
    }

    pub fn remove_row(&self, id: RowId) -> Self {
        let mut next = self.clone();
        next.rows.retain(|row| row.id != id);
        next
    }

    /// Copy a row to the end of the list under a fresh id.
    pub fn duplicate_row(&self, id: RowId) -> Self {
        let Some(source) = self.rows.iter().find(|row| row.id == id) else {
            return self.clone();
        };
        let copy = FilterRow {
            id: RowId(self.next_id),
            ..source.clone()
        };
        let mut next = self.clone();
        next.push(copy);
        next
    }

    /// Picking a new field clears operator and value: the old operator may
    /// not exist for the new field's kind.
    pub fn set_field(&self, id: RowId, field: &str) -> Self {
        self.edit(id, |row| {
            row.field = field.to_string();
            row.operator.clear();
            row.value.clear();
        })
    }

    pub fn set_operator(&self, id: RowId, operator: &str) -> Self {
        self.edit(id, |row| row.operator = operator.to_string())
    }

    pub fn set_value(&self, id: RowId, value: &str) -> Self {
        self.edit(id, |row| row.value = value.to_string())
    }

    pub fn with_combinator(&self, combinator: Combinator) -> Self {
        Self {
            combinator,
            ..self.clone()
        }
    }

    pub fn toggle_combinator(&self) -> Self {
        self.with_combinator(self.combinator.toggled())
    }

    /// The query over complete rows only; partial rows are skipped.
    pub fn build(&self) -> RuleGroup {
        RuleGroup::new(
            self.combinator,
            self.rows
                .iter()
                .filter_map(FilterRow::to_rule)
                .map(RuleNode::Rule)
                .collect(),
        )
    }

    fn push(&mut self, row: FilterRow) {
        self.rows.push(row);
        self.next_id += 1;
    }

    fn edit(&self, id: RowId, apply: impl FnOnce(&mut FilterRow)) -> Self {
        let mut next = self.clone();
        if let Some(row) = next.rows.iter_mut().find(|row| row.id == id) {
            apply(row);
        }
        next
    }
}
