#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # beanmap-model
//!
//! Dynamic object model and declared type information for beanmap.
//!
//! This crate provides the values a mapper reads and writes (scalars,
//! enums, containers and shared object handles), the declared-type language
//! used by properties, and the collaborator traits through which the mapping
//! engine discovers properties and creates instances. A declarative
//! [`ClassRegistry`] implements those traits and can be loaded from YAML.

/// Collaborator traits consumed by the mapping engine.
pub mod accessor;
/// YAML loading for class registries.
pub mod loader;
/// Getter/setter naming conventions and suffix normalization.
pub mod naming;
/// Declarative class and enum registry.
pub mod registry;
/// Declared property types.
pub mod types;
/// Runtime values and object handles.
pub mod value;

pub use accessor::{Instantiator, Property, PropertyAccessor, ROOT_TYPE, TypeHierarchy, TypeModel};
pub use registry::{Access, ClassDef, ClassRegistry, EnumDef};
pub use types::{ScalarKind, SeqKind, TypeRef};
pub use value::{EnumValue, MapValue, ObjectId, ObjectRef, Value};

use thiserror::Error;

/// Errors that can occur when declaring types or creating instances
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    #[error("Unknown parent '{parent}' for class '{class}'")]
    UnknownParent { class: String, parent: String },

    #[error("Inheritance cycle: '{class}' cannot extend '{parent}'")]
    InheritanceCycle { class: String, parent: String },

    #[error("Unable to create instance of {class}: {reason}")]
    Instantiation { class: String, reason: String },

    #[error("Invalid type expression '{input}': {reason}")]
    TypeParse { input: String, reason: String },

    #[error("Invalid registry format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an unknown-type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Build an instantiation error with the failing class and reason.
    pub fn instantiation(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Build a type-expression parse error.
    pub fn type_parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeParse {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiation_error_names_the_class() {
        let error = Error::instantiation("BookDTO", "class is abstract");
        assert_eq!(
            error.to_string(),
            "Unable to create instance of BookDTO: class is abstract"
        );
    }

    #[test]
    fn type_parse_error_keeps_input() {
        match Error::type_parse("List<", "unbalanced brackets") {
            Error::TypeParse { input, reason } => {
                assert_eq!(input, "List<");
                assert_eq!(reason, "unbalanced brackets");
            }
            _ => panic!("expected type parse variant"),
        }
    }
}
