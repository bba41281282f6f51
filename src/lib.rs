pub mod config;
pub mod dataset;
pub mod document;
pub mod error;
pub mod query;
pub mod record;
pub mod schema;
pub mod table;
pub mod values;

pub use error::LoadError;
pub use query::{apply_filters, apply_filters_at, QueryBuilder, RuleGroup};
pub use record::{FieldValue, Record};
pub use schema::{FieldDef, FieldKind, Schema};
