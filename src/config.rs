use std::{collections::BTreeMap, fs::read_to_string, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::LinkedNotesError;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 1_000_000;

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_content_size() -> usize {
    DEFAULT_MAX_CONTENT_SIZE
}

/// Limits for one resolution pass.
///
/// Read from TOML either at the top level or under a `[resolver]` table:
///
/// ```toml
/// [resolver]
/// max_depth = 2
/// max_content_size = 50000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Recursion ceiling. Depth 0 is the document being published.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Bytes allowed per resolved fragment before it is truncated.
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_content_size: DEFAULT_MAX_CONTENT_SIZE,
        }
    }
}

impl ResolverOptions {
    pub fn validate(&self) -> Result<(), LinkedNotesError> {
        if self.max_depth == 0 {
            return Err(LinkedNotesError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LinkedNotesError> {
        let mut tables: BTreeMap<String, toml::Value> = toml::from_str(content)?;
        let options: ResolverOptions = match tables.remove("resolver") {
            Some(section) => section.try_into()?,
            None => toml::from_str(content)?,
        };
        options.validate()?;
        Ok(options)
    }

    /// Load options from `path`. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LinkedNotesError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read resolver options from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using default resolver options.");
            return Ok(Self::default());
        }
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, LinkedNotesError> {
        let mut config = BTreeMap::new();
        config.insert("resolver".to_string(), *self);
        Ok(toml::to_string(&config)?)
    }
}
