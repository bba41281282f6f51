use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

use crate::schema::Schema;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] ::config::ConfigError),
    #[error("invalid date_format `{0}`")]
    DateFormat(String),
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub fields: Schema,
    /// Fixed reference date for relative operators; today when unset.
    #[serde(default)]
    pub today: Option<NaiveDate>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fields: Schema::users(),
            today: None,
            date_format: default_date_format(),
        }
    }
}

fn default_date_format() -> String {
    "%b %-d, %Y".to_string()
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let source = ::config::Config::builder()
                    .add_source(::config::File::from(path))
                    .build()?;
                source.try_deserialize::<Settings>()?
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::DateFormat(self.date_format.clone()));
        }
        if let Some(name) = self.fields.duplicate_field() {
            return Err(ConfigError::DuplicateField(name.to_string()));
        }
        Ok(())
    }
}
