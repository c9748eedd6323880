//! Extension API
//!
//! Custom mappers, bidirectional custom mappers and hooks intercept mapping
//! for a declared (source class, destination class) pair. The pair is given
//! explicitly at registration and matched against runtime classes through
//! the type hierarchy.

use std::fmt;
use std::sync::Arc;

use beanmap_model::{ObjectRef, ROOT_TYPE, TypeHierarchy, Value};
use tracing::debug;

use crate::context::MappingContext;
use crate::mapper::Mapper;

/// Type alias for a custom mapping function
///
/// Receives the mapper that dispatched it, so nested values can be mapped
/// with the same configuration and context.
pub type MapperFn =
    Arc<dyn Fn(&Mapper, &ObjectRef, &mut MappingContext) -> crate::Result<Value> + Send + Sync>;

/// Type alias for a post-mapping hook (source, populated destination)
pub type HookFn = Arc<dyn Fn(&ObjectRef, &ObjectRef) -> crate::Result<()> + Send + Sync>;

/// Declared source and destination classes of an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePair {
    pub source: String,
    pub destination: String,
}

impl TypePair {
    /// Create a type pair
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Same pair in the opposite direction
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.destination.clone(), self.source.clone())
    }

    /// Check if the pair is universal on either side
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.source == ROOT_TYPE || self.destination == ROOT_TYPE
    }

    /// Check if a mapper declared with this pair can serve a request
    ///
    /// The runtime source class must be assignable to the declared source,
    /// and the declared destination must be assignable to the requested
    /// destination.
    pub fn serves<H>(&self, types: &H, source_class: &str, requested: &str) -> bool
    where
        H: TypeHierarchy + ?Sized,
    {
        !self.is_universal()
            && types.is_assignable(source_class, &self.source)
            && types.is_assignable(&self.destination, requested)
    }

    /// Check if a hook declared with this pair accepts a mapped object pair
    pub fn accepts<H>(&self, types: &H, source_class: &str, destination_class: &str) -> bool
    where
        H: TypeHierarchy + ?Sized,
    {
        !self.is_universal()
            && types.is_assignable(source_class, &self.source)
            && types.is_assignable(destination_class, &self.destination)
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Which extension produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    CustomMapper,
    BiMapperForward,
    BiMapperBackward,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionKind::CustomMapper => "custom mapper",
            ExtensionKind::BiMapperForward => "bi-mapper (forward)",
            ExtensionKind::BiMapperBackward => "bi-mapper (backward)",
        };
        f.write_str(name)
    }
}

/// A function taking over mapping for one type pair
#[derive(Clone)]
pub struct CustomMapper {
    pub types: TypePair,
    func: MapperFn,
}

impl CustomMapper {
    pub fn new(types: TypePair, func: MapperFn) -> Self {
        Self { types, func }
    }
}

/// A pair of functions mapping between two classes in both directions
#[derive(Clone)]
pub struct CustomBiMapper {
    /// Forward direction; backward maps `destination -> source`
    pub types: TypePair,
    forward: MapperFn,
    backward: MapperFn,
}

impl CustomBiMapper {
    pub fn new(types: TypePair, forward: MapperFn, backward: MapperFn) -> Self {
        Self {
            types,
            forward,
            backward,
        }
    }
}

/// A function run after convention-based mapping of a matching pair
#[derive(Clone)]
pub struct Hook {
    pub types: TypePair,
    func: HookFn,
}

impl Hook {
    pub fn new(types: TypePair, func: HookFn) -> Self {
        Self { types, func }
    }

    /// Run the hook on a mapped pair
    ///
    /// # Errors
    ///
    /// Returns whatever error the hook function reports.
    pub fn apply(&self, source: &ObjectRef, destination: &ObjectRef) -> crate::Result<()> {
        (self.func)(source, destination)
    }
}

/// A mapping function selected for a request
pub struct Dispatch<'a> {
    pub kind: ExtensionKind,
    pub types: TypePair,
    func: &'a MapperFn,
}

impl Dispatch<'_> {
    /// Invoke the selected function
    ///
    /// # Errors
    ///
    /// Returns whatever error the mapping function reports.
    pub fn call(
        &self,
        mapper: &Mapper,
        source: &ObjectRef,
        context: &mut MappingContext,
    ) -> crate::Result<Value> {
        (self.func)(mapper, source, context)
    }
}

/// Ordered registry of custom mappers, bi-mappers and hooks
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    mappers: Vec<CustomMapper>,
    bi_mappers: Vec<CustomBiMapper>,
    hooks: Vec<Hook>,
}

impl ExtensionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a custom mapper
    pub fn add_mapper(&mut self, mapper: CustomMapper) -> &mut Self {
        if mapper.types.is_universal() {
            debug!("Custom mapper {} declares Object and will never apply", mapper.types);
        }
        self.mappers.push(mapper);
        self
    }

    /// Append a custom bi-mapper
    pub fn add_bi_mapper(&mut self, bi_mapper: CustomBiMapper) -> &mut Self {
        if bi_mapper.types.is_universal() {
            debug!("Bi-mapper {} declares Object and will never apply", bi_mapper.types);
        }
        self.bi_mappers.push(bi_mapper);
        self
    }

    /// Append a hook
    pub fn add_hook(&mut self, hook: Hook) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    /// First mapping function able to serve a request
    ///
    /// Custom mappers are consulted first, then every bi-mapper forward
    /// and finally every bi-mapper backward, each in registration order.
    pub fn find_mapper<H>(&self, types: &H, source_class: &str, requested: &str) -> Option<Dispatch<'_>>
    where
        H: TypeHierarchy + ?Sized,
    {
        if let Some(mapper) = self
            .mappers
            .iter()
            .find(|mapper| mapper.types.serves(types, source_class, requested))
        {
            return Some(Dispatch {
                kind: ExtensionKind::CustomMapper,
                types: mapper.types.clone(),
                func: &mapper.func,
            });
        }

        if let Some(bi_mapper) = self
            .bi_mappers
            .iter()
            .find(|bi_mapper| bi_mapper.types.serves(types, source_class, requested))
        {
            return Some(Dispatch {
                kind: ExtensionKind::BiMapperForward,
                types: bi_mapper.types.clone(),
                func: &bi_mapper.forward,
            });
        }

        self.bi_mappers.iter().find_map(|bi_mapper| {
            let reversed = bi_mapper.types.reversed();
            reversed
                .serves(types, source_class, requested)
                .then_some(Dispatch {
                    kind: ExtensionKind::BiMapperBackward,
                    types: reversed,
                    func: &bi_mapper.backward,
                })
        })
    }

    /// Hooks accepting a mapped pair, in registration order
    pub fn hooks_for<'a, H>(
        &'a self,
        types: &'a H,
        source_class: &'a str,
        destination_class: &'a str,
    ) -> impl Iterator<Item = &'a Hook> + 'a
    where
        H: TypeHierarchy + ?Sized,
    {
        self.hooks
            .iter()
            .filter(move |hook| hook.types.accepts(types, source_class, destination_class))
    }

    /// Number of registered extensions of every kind
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappers.len() + self.bi_mappers.len() + self.hooks.len()
    }

    /// Check if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("mappers", &pair_names(self.mappers.iter().map(|m| &m.types)))
            .field("bi_mappers", &pair_names(self.bi_mappers.iter().map(|m| &m.types)))
            .field("hooks", &pair_names(self.hooks.iter().map(|h| &h.types)))
            .finish()
    }
}

fn pair_names<'a>(pairs: impl Iterator<Item = &'a TypePair>) -> Vec<String> {
    pairs.map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanmap_model::{ClassDef, ClassRegistry};

    fn hierarchy() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry
            .register_class(ClassDef::new("BookEntry"))
            .unwrap()
            .register_class(ClassDef::new("PhoneEntry").extends("BookEntry"))
            .unwrap()
            .register_class(ClassDef::new("BookEntryDTO"))
            .unwrap()
            .register_class(ClassDef::new("PhoneEntryDTO").extends("BookEntryDTO"))
            .unwrap();
        registry
    }

    fn constant(value: &'static str) -> MapperFn {
        Arc::new(move |_: &Mapper, _: &ObjectRef, _: &mut MappingContext| {
            Ok(Value::from(value))
        })
    }

    #[test]
    fn test_serves_follows_assignability() {
        let types = hierarchy();
        let pair = TypePair::new("BookEntry", "PhoneEntryDTO");

        assert!(pair.serves(&types, "PhoneEntry", "BookEntryDTO"));
        assert!(pair.serves(&types, "BookEntry", "PhoneEntryDTO"));
        assert!(pair.serves(&types, "BookEntry", ROOT_TYPE));
        assert!(!pair.serves(&types, "BookEntryDTO", "BookEntryDTO"));

        let narrow = TypePair::new("BookEntry", "BookEntryDTO");
        assert!(!narrow.serves(&types, "BookEntry", "PhoneEntryDTO"));
    }

    #[test]
    fn test_universal_pair_never_applies() {
        let types = hierarchy();
        assert!(!TypePair::new(ROOT_TYPE, "BookEntryDTO").serves(&types, "BookEntry", "BookEntryDTO"));
        assert!(!TypePair::new("BookEntry", ROOT_TYPE).serves(&types, "BookEntry", ROOT_TYPE));
        assert!(!TypePair::new(ROOT_TYPE, ROOT_TYPE).accepts(&types, "BookEntry", "BookEntryDTO"));
    }

    #[test]
    fn test_custom_mappers_precede_bi_mappers() {
        let types = hierarchy();
        let mut registry = ExtensionRegistry::new();
        registry
            .add_bi_mapper(CustomBiMapper::new(
                TypePair::new("BookEntry", "BookEntryDTO"),
                constant("forward"),
                constant("backward"),
            ))
            .add_mapper(CustomMapper::new(
                TypePair::new("BookEntry", "BookEntryDTO"),
                constant("custom"),
            ));

        let dispatch = registry
            .find_mapper(&types, "PhoneEntry", "BookEntryDTO")
            .unwrap();
        assert_eq!(dispatch.kind, ExtensionKind::CustomMapper);
    }

    #[test]
    fn test_bi_mapper_directions() {
        let types = hierarchy();
        let mut registry = ExtensionRegistry::new();
        registry.add_bi_mapper(CustomBiMapper::new(
            TypePair::new("BookEntry", "BookEntryDTO"),
            constant("forward"),
            constant("backward"),
        ));

        let forward = registry
            .find_mapper(&types, "BookEntry", "BookEntryDTO")
            .unwrap();
        assert_eq!(forward.kind, ExtensionKind::BiMapperForward);

        let backward = registry
            .find_mapper(&types, "PhoneEntryDTO", "BookEntry")
            .unwrap();
        assert_eq!(backward.kind, ExtensionKind::BiMapperBackward);
        assert_eq!(backward.types, TypePair::new("BookEntryDTO", "BookEntry"));

        assert!(registry.find_mapper(&types, "BookEntry", "BookEntry").is_none());
    }

    #[test]
    fn test_hooks_filtered_in_order() {
        let types = hierarchy();
        let noop: HookFn = Arc::new(|_: &ObjectRef, _: &ObjectRef| Ok(()));
        let mut registry = ExtensionRegistry::new();
        registry
            .add_hook(Hook::new(TypePair::new("BookEntry", "BookEntryDTO"), noop.clone()))
            .add_hook(Hook::new(TypePair::new("PhoneEntry", "BookEntryDTO"), noop.clone()))
            .add_hook(Hook::new(TypePair::new("PhoneEntry", "PhoneEntryDTO"), noop));

        let matching: Vec<String> = registry
            .hooks_for(&types, "PhoneEntry", "BookEntryDTO")
            .map(|hook| hook.types.to_string())
            .collect();
        assert_eq!(
            matching,
            vec!["BookEntry -> BookEntryDTO", "PhoneEntry -> BookEntryDTO"]
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_debug_lists_pairs() {
        let mut registry = ExtensionRegistry::new();
        registry.add_mapper(CustomMapper::new(
            TypePair::new("BookEntry", "BookEntryDTO"),
            constant("custom"),
        ));
        let debug = format!("{registry:?}");
        assert!(debug.contains("BookEntry -> BookEntryDTO"));
    }
}
