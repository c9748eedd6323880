#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # beanmap-core
//!
//! Convention-based recursive object graph mapper.
//!
//! Given a source object and a destination type, the [`Mapper`] builds a
//! structurally equivalent destination instance by pairing destination
//! setters with source getters by name. Cycles are preserved through an
//! identity table kept in the [`MappingContext`]; explicit type mappings
//! select subclass-correct destinations; custom mappers, bi-mappers and
//! hooks intercept mapping for specific type pairs.
//!
//! Mapping recurses once per level of property nesting, so very deep graphs
//! are bounded by the thread's stack size.

pub mod config;
pub mod context;
pub mod extensions;
pub mod mapper;
pub mod resolution;

pub use config::{MapperConfig, TypeMappingEntry};
pub use context::MappingContext;
pub use extensions::{ExtensionKind, ExtensionRegistry};
pub use mapper::Mapper;

use thiserror::Error;

/// Errors that can occur during mapping
#[derive(Error, Debug)]
pub enum Error {
    /// Strict mode: a destination setter has no matching source getter
    #[error("No suitable getter for {setter}() method in {source_class}")]
    PropertyNotFound { setter: String, source_class: String },

    /// Strict mode: a value cannot be stored in the declared destination type
    #[error("Unable to map {found} -> {expected}")]
    TypeMismatch { found: String, expected: String },

    /// The destination type cannot be instantiated
    #[error("Unable to create instance of {class}: {reason}")]
    Instantiation { class: String, reason: String },

    /// A container's generic arguments are missing from its declared type
    #[error("Cannot resolve {argument} type of {declared}")]
    UnresolvedElementType { declared: String, argument: String },

    /// A custom mapper, bi-mapper or hook failed
    #[error("Extension {name} failed: {message}")]
    Extension { name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Model(beanmap_model::Error),
}

impl Error {
    /// Build a property-not-found error.
    pub fn property_not_found(setter: impl Into<String>, source_class: impl Into<String>) -> Self {
        Self::PropertyNotFound {
            setter: setter.into(),
            source_class: source_class.into(),
        }
    }

    /// Build a type-mismatch error.
    pub fn type_mismatch(found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Build an unresolved-element-type error.
    pub fn unresolved(declared: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::UnresolvedElementType {
            declared: declared.into(),
            argument: argument.into(),
        }
    }

    /// Build an error raised from user extension code.
    pub fn extension(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extension {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Check if the error is a strict-mode violation rather than a defect
    #[must_use]
    pub fn is_strict_violation(&self) -> bool {
        matches!(self, Self::PropertyNotFound { .. } | Self::TypeMismatch { .. })
    }
}

impl From<beanmap_model::Error> for Error {
    fn from(error: beanmap_model::Error) -> Self {
        match error {
            beanmap_model::Error::Instantiation { class, reason } => {
                Self::Instantiation { class, reason }
            }
            other => Self::Model(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
