pub mod ast;
pub mod builder;
pub mod dates;
pub mod eval;
pub mod operand;
pub mod parser;

use std::path::Path;

use crate::document;
use crate::error::LoadError;

pub use ast::{Combinator, Operator, Rule, RuleGroup, RuleNode, RuleValue, Scalar, Span, Unit};
pub use builder::{FilterRow, QueryBuilder, RowId};
pub use eval::{apply_filters, apply_filters_at, check_rule, evaluate, evaluate_rule, RuleError};
pub use operand::ValueError;
pub use parser::{parse_rule, ParseError};

/// Read a rule group from a JSON or YAML file.
pub fn load_query(path: &Path) -> Result<RuleGroup, LoadError> {
    document::read_document(path)
}
