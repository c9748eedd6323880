//! Destination type resolution
//!
//! Picks the concrete class to instantiate for a source object. An explicit
//! mapping only ever narrows the declared destination: it is used when it is
//! assignable to the declared class, and ignored otherwise.

use std::collections::HashMap;

use beanmap_model::{ROOT_TYPE, TypeHierarchy};
use tracing::trace;

use crate::context::MappingContext;

/// Explicit mapping for a source class; the context wins over configuration
#[must_use]
pub fn explicit_mapping<'a>(
    context: &'a MappingContext,
    configured: &'a HashMap<String, String>,
    source_class: &str,
) -> Option<&'a str> {
    context
        .mapping(source_class)
        .or_else(|| configured.get(source_class).map(String::as_str))
}

/// Most specific destination class for a source class
///
/// `declared` is the statically requested class; [`ROOT_TYPE`] means any
/// class is acceptable, in which case the explicit mapping is used when
/// present and the source class otherwise.
pub fn resolve_destination<H>(
    types: &H,
    source_class: &str,
    declared: &str,
    explicit: Option<&str>,
) -> String
where
    H: TypeHierarchy + ?Sized,
{
    let resolved = if declared == ROOT_TYPE {
        explicit.unwrap_or(source_class)
    } else {
        match explicit {
            Some(explicit) if types.is_assignable(explicit, declared) => explicit,
            _ => declared,
        }
    };
    trace!(source = source_class, declared, resolved, "Resolved destination");
    resolved.to_string()
}
