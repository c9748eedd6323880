//! Mapping context
//!
//! Per-call-tree state: runtime type overrides and the identity table that
//! breaks cycles. A context lives as long as one mapping call tree, unless
//! the caller threads it through several calls to share identities.

use std::collections::HashMap;

use beanmap_model::{ObjectId, ObjectRef, Value};
use tracing::debug;

/// Cycle-detection and type-override state of one mapping call tree
///
/// Not `Send`: object handles are single-threaded.
#[derive(Debug, Default)]
pub struct MappingContext {
    /// Source class -> destination class overrides
    type_mappings: HashMap<String, String>,

    /// Source identity -> (source handle, destination value)
    ///
    /// The source handle keeps the object alive so its identity cannot be
    /// reused by a later allocation while the context exists.
    visited: HashMap<ObjectId, (ObjectRef, Value)>,
}

impl MappingContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type override for this call tree; last write wins
    pub fn add_mapping(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        let source = source.into();
        let destination = destination.into();
        debug!("Context mapping {} -> {}", source, destination);
        self.type_mappings.insert(source, destination);
    }

    /// Override registered for a source class
    #[must_use]
    pub fn mapping(&self, source: &str) -> Option<&str> {
        self.type_mappings.get(source).map(String::as_str)
    }

    /// Destination previously produced for this source object
    #[must_use]
    pub fn already_mapped(&self, source: &ObjectRef) -> Option<&Value> {
        self.visited.get(&source.id()).map(|(_, destination)| destination)
    }

    /// Record the destination produced for a source object
    ///
    /// An existing entry is kept; the first destination produced for an
    /// identity stays authoritative.
    pub fn register(&mut self, source: &ObjectRef, destination: Value) {
        self.visited
            .entry(source.id())
            .or_insert_with(|| (source.clone(), destination));
    }

    /// Check if a source object has been mapped in this context
    #[must_use]
    pub fn is_visited(&self, source: &ObjectRef) -> bool {
        self.visited.contains_key(&source.id())
    }

    /// Number of source objects mapped so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    /// Check if nothing has been mapped yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
