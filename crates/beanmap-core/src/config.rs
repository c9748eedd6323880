//! Mapper configuration files
//!
//! ```yaml
//! strict: true
//! known_suffixes: [DTO, BO]
//! mappings:
//!   - { source: PhoneEntry, destination: PhoneEntryDTO, bidirectional: true }
//! ```

use std::path::Path;
use std::sync::Arc;

use beanmap_model::TypeModel;
use beanmap_model::naming::default_suffixes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::mapper::Mapper;
use crate::{Error, Result};

/// Declarative mapper configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    /// Fail on missing getters and incompatible values
    #[serde(default)]
    pub strict: bool,

    /// Suffixes stripped before comparing accessor names
    #[serde(default = "default_suffixes")]
    pub known_suffixes: Vec<String>,

    /// Explicit type mappings, applied in order
    #[serde(default)]
    pub mappings: Vec<TypeMappingEntry>,
}

/// One explicit type mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeMappingEntry {
    pub source: String,
    pub destination: String,

    /// Also map `destination` back to `source`
    #[serde(default)]
    pub bidirectional: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            strict: false,
            known_suffixes: default_suffixes(),
            mappings: Vec::new(),
        }
    }
}

impl MapperConfig {
    /// Parse a configuration from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the YAML is malformed or a mapping names
    /// an empty class.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: MapperConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is invalid.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            "Loaded mapper configuration from {} ({} mappings)",
            path.display(),
            config.mappings.len()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (index, entry) in self.mappings.iter().enumerate() {
            if entry.source.trim().is_empty() || entry.destination.trim().is_empty() {
                return Err(Error::Config(format!(
                    "mapping #{index} must name both source and destination"
                )));
            }
        }
        Ok(())
    }
}

impl Mapper {
    /// Build a mapper from a configuration
    #[must_use]
    pub fn from_config(types: Arc<dyn TypeModel>, config: &MapperConfig) -> Self {
        let mut mapper = Mapper::new(types)
            .strict_mode(config.strict)
            .known_suffixes(config.known_suffixes.iter().cloned());
        for entry in &config.mappings {
            mapper = if entry.bidirectional {
                mapper.bi_mapping(&entry.source, &entry.destination)
            } else {
                mapper.mapping(&entry.source, &entry.destination)
            };
        }
        mapper
    }
}
