//! Recursive mapping engine
//!
//! A [`Mapper`] holds the configuration (type model, explicit mappings,
//! extensions, strict mode, known suffixes) and is shared read-only between
//! calls. Each call walks the source graph depth first:
//!
//! - maps and sequences are rebuilt with their elements mapped one by one,
//! - scalars and enums pass through when the destination accepts them,
//! - objects go through the identity table, then the extensions, and
//!   finally convention-based property copy followed by hooks.
//!
//! Recursion depth equals the property nesting depth of the source graph.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use beanmap_model::accessor::find_getter_in;
use beanmap_model::naming::default_suffixes;
use beanmap_model::{
    EnumValue, Instantiator, MapValue, ObjectRef, PropertyAccessor, ROOT_TYPE, SeqKind,
    TypeHierarchy, TypeModel, TypeRef, Value,
};
use tracing::{debug, trace, warn};

use crate::context::MappingContext;
use crate::extensions::{CustomBiMapper, CustomMapper, ExtensionRegistry, Hook, TypePair};
use crate::resolution::{explicit_mapping, resolve_destination};
use crate::{Error, Result};

static ANY_TYPE: TypeRef = TypeRef::Any;

/// Convention-based object graph mapper
#[derive(Clone)]
pub struct Mapper {
    types: Arc<dyn TypeModel>,
    mappings: HashMap<String, String>,
    extensions: ExtensionRegistry,
    strict: bool,
    known_suffixes: Vec<String>,
}

impl Mapper {
    /// Create a lenient mapper with the default suffixes and no mappings
    #[must_use]
    pub fn new(types: Arc<dyn TypeModel>) -> Self {
        Self {
            types,
            mappings: HashMap::new(),
            extensions: ExtensionRegistry::new(),
            strict: false,
            known_suffixes: default_suffixes(),
        }
    }

    /// Map instances of `source` to `destination` when the declared
    /// destination allows it; last registration wins
    #[must_use]
    pub fn mapping(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        let source = source.into();
        let destination = destination.into();
        debug!("Mapping {} -> {}", source, destination);
        self.mappings.insert(source, destination);
        self
    }

    /// Register a mapping in both directions
    #[must_use]
    pub fn bi_mapping(self, a: impl Into<String>, b: impl Into<String>) -> Self {
        let a = a.into();
        let b = b.into();
        self.mapping(a.clone(), b.clone()).mapping(b, a)
    }

    /// Take over mapping of `source` instances requested as `destination`
    #[must_use]
    pub fn custom_mapper<F>(
        mut self,
        source: impl Into<String>,
        destination: impl Into<String>,
        func: F,
    ) -> Self
    where
        F: Fn(&Mapper, &ObjectRef, &mut MappingContext) -> Result<Value> + Send + Sync + 'static,
    {
        let types = TypePair::new(source, destination);
        debug!("Custom mapper {}", types);
        self.extensions
            .add_mapper(CustomMapper::new(types, Arc::new(func)));
        self
    }

    /// Take over mapping between `a` and `b` in both directions
    #[must_use]
    pub fn custom_bi_mapper<F, B>(
        mut self,
        a: impl Into<String>,
        b: impl Into<String>,
        forward: F,
        backward: B,
    ) -> Self
    where
        F: Fn(&Mapper, &ObjectRef, &mut MappingContext) -> Result<Value> + Send + Sync + 'static,
        B: Fn(&Mapper, &ObjectRef, &mut MappingContext) -> Result<Value> + Send + Sync + 'static,
    {
        let types = TypePair::new(a, b);
        debug!("Custom bi-mapper {}", types);
        self.extensions.add_bi_mapper(CustomBiMapper::new(
            types,
            Arc::new(forward),
            Arc::new(backward),
        ));
        self
    }

    /// Run `func` after every convention-based mapping of a matching pair
    #[must_use]
    pub fn hook<F>(
        mut self,
        source: impl Into<String>,
        destination: impl Into<String>,
        func: F,
    ) -> Self
    where
        F: Fn(&ObjectRef, &ObjectRef) -> Result<()> + Send + Sync + 'static,
    {
        let types = TypePair::new(source, destination);
        debug!("Hook {}", types);
        self.extensions.add_hook(Hook::new(types, Arc::new(func)));
        self
    }

    /// Fail on missing getters and incompatible values instead of skipping
    #[must_use]
    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replace the suffixes stripped before comparing accessor names
    #[must_use]
    pub fn known_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_suffixes = suffixes.into_iter().map(Into::into).collect();
        debug!("Known suffixes: {:?}", self.known_suffixes);
        self
    }

    /// Type model used for introspection and instantiation
    #[must_use]
    pub fn types(&self) -> &Arc<dyn TypeModel> {
        &self.types
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    #[must_use]
    pub fn suffixes(&self) -> &[String] {
        &self.known_suffixes
    }

    /// Configured mapping for a source class
    #[must_use]
    pub fn configured_mapping(&self, source: &str) -> Option<&str> {
        self.mappings.get(source).map(String::as_str)
    }

    #[must_use]
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Map a value to a declared destination type in a fresh context
    ///
    /// # Errors
    ///
    /// Returns an error on strict-mode violations, instantiation failures,
    /// containers without element types, or extension failures.
    pub fn map(&self, source: &Value, destination: &TypeRef) -> Result<Value> {
        self.map_with_context(source, destination, &mut MappingContext::new())
    }

    /// Map a value, sharing identities and overrides through `context`
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_with_context(
        &self,
        source: &Value,
        destination: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Value> {
        self.map_value(source, destination, context)
    }

    /// Map an object to a class; `None` when the result is null
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`]. A custom mapper returning a non-object value is
    /// reported as a type mismatch.
    pub fn map_object(&self, source: &ObjectRef, class: &str) -> Result<Option<ObjectRef>> {
        self.map_object_with_context(source, class, &mut MappingContext::new())
    }

    /// Map an object to a class within a context
    ///
    /// # Errors
    ///
    /// See [`Mapper::map_object`].
    pub fn map_object_with_context(
        &self,
        source: &ObjectRef,
        class: &str,
        context: &mut MappingContext,
    ) -> Result<Option<ObjectRef>> {
        let destination = if class == ROOT_TYPE {
            TypeRef::Any
        } else {
            TypeRef::named(class)
        };
        match self.map_composite(source, &destination, context)? {
            Value::Null => Ok(None),
            Value::Object(object) => Ok(Some(object)),
            other => Err(Error::type_mismatch(other.type_name(), class)),
        }
    }

    /// Map every element of a sequence to `element`
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_sequence(&self, source: &[Value], element: &TypeRef) -> Result<Vec<Value>> {
        self.map_sequence_with_context(source, element, &mut MappingContext::new())
    }

    /// Map every element of a sequence within a context
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_sequence_with_context(
        &self,
        source: &[Value],
        element: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Vec<Value>> {
        self.map_elements(SeqKind::List, source, element, context)
    }

    /// Map every key to `key` and every value to `value`
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_map(&self, source: &MapValue, key: &TypeRef, value: &TypeRef) -> Result<MapValue> {
        self.map_map_with_context(source, key, value, &mut MappingContext::new())
    }

    /// Map every entry of a map within a context
    ///
    /// # Errors
    ///
    /// See [`Mapper::map`].
    pub fn map_map_with_context(
        &self,
        source: &MapValue,
        key: &TypeRef,
        value: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<MapValue> {
        self.map_entries(source, key, value, context)
    }

    fn map_value(
        &self,
        source: &Value,
        destination: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Value> {
        match source {
            Value::Null => Ok(Value::Null),
            Value::Map(map) => self.map_associative(map, destination, context),
            Value::List(items) => self.map_sequential(SeqKind::List, items, destination, context),
            Value::Set(items) => self.map_sequential(SeqKind::Set, items, destination, context),
            Value::Enum(value) => self.map_enum(value, destination),
            Value::Object(object) => self.map_composite(object, destination, context),
            scalar => self.map_scalar(scalar, destination),
        }
    }

    fn map_associative(
        &self,
        source: &MapValue,
        destination: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Value> {
        let (key, value) = match destination {
            TypeRef::Map { key, value } => (key.as_deref(), value.as_deref()),
            TypeRef::Any => (Some(&ANY_TYPE), Some(&ANY_TYPE)),
            _ => return self.incompatible("Map", destination),
        };
        // Null keys and values need no declared argument type
        let key = match key {
            Some(key) => key,
            None if source.iter().all(|(key, _)| key.is_null()) => &ANY_TYPE,
            None => return Err(Error::unresolved(destination.to_string(), "key")),
        };
        let value = match value {
            Some(value) => value,
            None if source.iter().all(|(_, value)| value.is_null()) => &ANY_TYPE,
            None => return Err(Error::unresolved(destination.to_string(), "value")),
        };
        self.map_entries(source, key, value, context).map(Value::Map)
    }

    fn map_entries(
        &self,
        source: &MapValue,
        key_type: &TypeRef,
        value_type: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<MapValue> {
        let mut mapped = MapValue::new();
        for (key, value) in source.iter() {
            let mapped_key = self.map_value(key, key_type, context)?;
            if mapped_key.is_null() {
                trace!("Dropping map entry whose key maps to null");
                continue;
            }
            let mapped_value = self.map_value(value, value_type, context)?;
            mapped.insert(mapped_key, mapped_value);
        }
        Ok(mapped)
    }

    fn map_sequential(
        &self,
        source_kind: SeqKind,
        items: &[Value],
        destination: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Value> {
        let (kind, element) = match destination {
            TypeRef::Sequence { kind, element } => (*kind, element.as_deref()),
            TypeRef::Any => (source_kind, Some(&ANY_TYPE)),
            _ => {
                let found = match source_kind {
                    SeqKind::List => "List",
                    SeqKind::Set => "Set",
                };
                return self.incompatible(found, destination);
            }
        };
        let mapped = match element {
            Some(element) => self.map_elements(kind, items, element, context)?,
            None if items.iter().all(Value::is_null) => {
                self.map_elements(kind, items, &ANY_TYPE, context)?
            }
            None => return Err(Error::unresolved(destination.to_string(), "element")),
        };
        Ok(match kind {
            SeqKind::List => Value::List(mapped),
            SeqKind::Set => Value::Set(mapped),
        })
    }

    /// Null elements stay null; elements mapped to null are dropped
    fn map_elements(
        &self,
        kind: SeqKind,
        items: &[Value],
        element: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Vec<Value>> {
        let mut mapped = Vec::with_capacity(items.len());
        for item in items {
            let value = if item.is_null() {
                Value::Null
            } else {
                let value = self.map_value(item, element, context)?;
                if value.is_null() {
                    trace!("Dropping {} element mapped to null", item.type_name());
                    continue;
                }
                value
            };
            if kind == SeqKind::Set && mapped.contains(&value) {
                continue;
            }
            mapped.push(value);
        }
        Ok(mapped)
    }

    fn map_scalar(&self, value: &Value, destination: &TypeRef) -> Result<Value> {
        let compatible = match destination {
            TypeRef::Any => true,
            TypeRef::Primitive(kind) | TypeRef::Scalar(kind) => value.scalar_kind() == Some(*kind),
            _ => false,
        };
        if compatible {
            Ok(value.clone())
        } else {
            self.incompatible(&value.type_name(), destination)
        }
    }

    fn map_enum(&self, value: &EnumValue, destination: &TypeRef) -> Result<Value> {
        match destination {
            TypeRef::Any => Ok(Value::Enum(value.clone())),
            TypeRef::Named(name) if *name == value.type_name => Ok(Value::Enum(value.clone())),
            TypeRef::Named(name)
                if self.types.is_enum(name) && self.types.enum_has_variant(name, &value.variant) =>
            {
                trace!("Translating {}.{} to {}", value.type_name, value.variant, name);
                Ok(Value::Enum(EnumValue::new(name.clone(), value.variant.clone())))
            }
            _ => self.incompatible(&value.type_name, destination),
        }
    }

    fn map_composite(
        &self,
        source: &ObjectRef,
        destination: &TypeRef,
        context: &mut MappingContext,
    ) -> Result<Value> {
        let source_class = source.class();
        let requested = match destination {
            TypeRef::Any => ROOT_TYPE.to_string(),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Primitive(kind) | TypeRef::Scalar(kind) => kind.boxed_name().to_string(),
            TypeRef::Sequence { .. } | TypeRef::Map { .. } => {
                return self.incompatible(&source_class, destination);
            }
        };

        if let Some(mapped) = context.already_mapped(source) {
            trace!("Reusing destination of {} {}", source_class, source.id());
            return Ok(mapped.clone());
        }

        if let Some(dispatch) = self
            .extensions
            .find_mapper(&*self.types, &source_class, &requested)
        {
            debug!(
                "Mapping {} -> {} with {} {}",
                source_class, requested, dispatch.kind, dispatch.types
            );
            let mapped = dispatch.call(self, source, context)?;
            if !mapped.is_null() {
                context.register(source, mapped.clone());
            }
            return Ok(mapped);
        }

        let declared = match destination {
            TypeRef::Named(name) if !self.types.is_enum(name) => name.as_str(),
            TypeRef::Any => ROOT_TYPE,
            _ => return self.incompatible(&source_class, destination),
        };
        let explicit = explicit_mapping(context, &self.mappings, &source_class);
        let class = resolve_destination(&*self.types, &source_class, declared, explicit);

        let instance = self.types.instantiate(&class)?;
        context.register(source, Value::Object(instance.clone()));
        self.copy_properties(source, &source_class, &instance, &class, context)?;

        for hook in self
            .extensions
            .hooks_for(&*self.types, &source_class, &class)
        {
            trace!("Running hook {}", hook.types);
            hook.apply(source, &instance)?;
        }
        Ok(Value::Object(instance))
    }

    fn copy_properties(
        &self,
        source: &ObjectRef,
        source_class: &str,
        instance: &ObjectRef,
        class: &str,
        context: &mut MappingContext,
    ) -> Result<()> {
        for property in self.types.settable_properties(class) {
            let Some(setter) = property.setter.as_deref() else {
                continue;
            };
            let Some(getter) =
                find_getter_in(&*self.types, source_class, setter, self.known_suffixes.as_slice())
            else {
                if self.strict {
                    return Err(Error::property_not_found(setter, source_class));
                }
                trace!("No getter for {}() in {}", setter, source_class);
                continue;
            };

            let value = source.get(&getter.name);
            if value.is_null() {
                continue;
            }
            trace!("{}.{} -> {}.{}", source_class, getter.name, class, property.name);
            let mapped = self.map_value(&value, &property.ty, context)?;
            if !mapped.is_null() {
                instance.set(property.name.clone(), mapped);
            }
        }
        Ok(())
    }

    fn incompatible(&self, found: &str, expected: &TypeRef) -> Result<Value> {
        if self.strict {
            return Err(Error::type_mismatch(found, expected.to_string()));
        }
        warn!("Skipping incompatible value: {} -> {}", found, expected);
        Ok(Value::Null)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("mappings", &self.mappings)
            .field("extensions", &self.extensions)
            .field("strict", &self.strict)
            .field("known_suffixes", &self.known_suffixes)
            .finish_non_exhaustive()
    }
}
