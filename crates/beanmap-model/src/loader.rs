//! Class registry loader
//!
//! Loads class and enum declarations from YAML:
//!
//! ```yaml
//! classes:
//!   - name: BookEntry
//!     properties:
//!       - { name: id, type: long }
//!       - { name: book, type: Book }
//!   - name: PhoneEntry
//!     extends: BookEntry
//!     properties:
//!       - { name: phoneNumber, type: String }
//! enums:
//!   - name: Color
//!     variants: [RED, GREEN]
//! ```
//!
//! Classes may be listed in any order; parents are registered first.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::accessor::{ROOT_TYPE, TypeHierarchy};
use crate::registry::{Access, ClassDef, ClassRegistry, EnumDef};
use crate::types::TypeRef;
use crate::{Error, Result};

/// Serializable registry format
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    classes: Vec<ClassFile>,
    #[serde(default)]
    enums: Vec<EnumFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassFile {
    name: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    properties: Vec<PropertyFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertyFile {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    access: AccessFile,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AccessFile {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl From<AccessFile> for Access {
    fn from(access: AccessFile) -> Self {
        match access {
            AccessFile::ReadWrite => Access::ReadWrite,
            AccessFile::ReadOnly => Access::ReadOnly,
            AccessFile::WriteOnly => Access::WriteOnly,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumFile {
    name: String,
    #[serde(default)]
    variants: Vec<String>,
}

impl ClassFile {
    fn into_def(self) -> Result<ClassDef> {
        let mut class = ClassDef::new(self.name);
        class.parent = self.extends;
        class.is_abstract = self.is_abstract;
        for property in self.properties {
            let ty = TypeRef::parse(&property.ty)?;
            class = class.property_with_access(property.name, ty, property.access.into());
        }
        Ok(class)
    }
}

impl ClassRegistry {
    /// Parse a registry from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, a property type cannot be
    /// parsed, a parent is missing, or the hierarchy contains a cycle.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: RegistryFile =
            serde_yaml::from_str(yaml).map_err(|e| Error::InvalidFormat(e.to_string()))?;

        let mut registry = ClassRegistry::new();
        for definition in file.enums {
            registry.register_enum(EnumDef::new(definition.name, definition.variants))?;
        }

        let mut pending = file
            .classes
            .into_iter()
            .map(ClassFile::into_def)
            .collect::<Result<Vec<_>>>()?;

        // Register classes whose parent is known until no progress is made.
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for class in pending {
                let ready = class
                    .parent
                    .as_deref()
                    .is_none_or(|parent| registry.classes_contains(parent));
                if ready {
                    registry.register_class(class)?;
                } else {
                    deferred.push(class);
                }
            }
            if deferred.len() == before {
                // Every remaining class waits on a parent that never appears.
                let class = deferred.swap_remove(0);
                return match class.parent {
                    Some(parent) if deferred.iter().any(|c| c.name == parent) => {
                        Err(Error::InheritanceCycle {
                            class: class.name,
                            parent,
                        })
                    }
                    parent => Err(Error::UnknownParent {
                        class: class.name,
                        parent: parent.unwrap_or_default(),
                    }),
                };
            }
            debug!(
                registered = before - deferred.len(),
                remaining = deferred.len(),
                "Registered class batch"
            );
            pending = deferred;
        }

        Ok(registry)
    }

    /// Load a registry from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is invalid.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&content)?;
        info!(
            "Loaded {} type declarations from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    fn classes_contains(&self, name: &str) -> bool {
        name == ROOT_TYPE || (self.contains(name) && !self.is_enum(name))
    }
}
