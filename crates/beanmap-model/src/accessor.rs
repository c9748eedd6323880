//! Collaborator traits consumed by the mapping engine
//!
//! The engine never inspects types on its own. It asks a [`TypeModel`] for
//! the class hierarchy, for the settable properties of a destination class,
//! for the readable counterpart of a setter on a source class, and for fresh
//! instances. [`ClassRegistry`](crate::ClassRegistry) is the bundled
//! implementation; code generators or other registries can provide their own.

use crate::naming::{getter_candidates, strip_known_suffix};
use crate::types::TypeRef;
use crate::value::ObjectRef;

/// Name of the universal root type, a supertype of every type
pub const ROOT_TYPE: &str = "Object";

/// A declared property and its accessor names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property (field) name
    pub name: String,

    /// Declared type
    pub ty: TypeRef,

    /// Getter name, if the property is readable
    pub getter: Option<String>,

    /// Setter name, if the property is writable
    pub setter: Option<String>,
}

/// Class hierarchy queries
pub trait TypeHierarchy: Send + Sync {
    /// Direct parent of a class; `None` for root-level classes and unknown names
    fn parent(&self, class: &str) -> Option<&str>;

    /// Check if a class or enum with this name is declared
    fn contains(&self, name: &str) -> bool;

    /// Check if `name` is a declared enum
    fn is_enum(&self, name: &str) -> bool;

    /// Check if an enum declares a variant
    fn enum_has_variant(&self, name: &str, variant: &str) -> bool;

    /// Check if a value of class `sub` can be stored where `sup` is declared
    fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        if sup == ROOT_TYPE {
            return true;
        }
        let mut current = Some(sub);
        while let Some(class) = current {
            if class == sup {
                return true;
            }
            current = self.parent(class);
        }
        false
    }

    /// Class chain from `class` up to (excluding) the root, most derived first
    fn lineage<'a>(&'a self, class: &'a str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(name) = current {
            if name == ROOT_TYPE {
                break;
            }
            chain.push(name);
            current = self.parent(name);
        }
        chain
    }
}

/// Property discovery for source and destination classes
pub trait PropertyAccessor: TypeHierarchy {
    /// Properties declared directly on `class` (not inherited)
    fn declared_properties(&self, class: &str) -> &[Property];

    /// All writable properties of `class`, including inherited ones
    ///
    /// Most derived declarations come first; a redeclared name keeps the
    /// most derived declaration.
    fn settable_properties(&self, class: &str) -> Vec<&Property> {
        let mut properties: Vec<&Property> = Vec::new();
        for name in self.lineage(class) {
            for property in self.declared_properties(name) {
                if property.setter.is_some()
                    && !properties.iter().any(|known| known.name == property.name)
                {
                    properties.push(property);
                }
            }
        }
        properties
    }

    /// Find the readable property on `source_class` matching a destination setter
    ///
    /// The expected getter names (`get…` and `is…`) and every candidate
    /// getter name are normalized by stripping the first matching suffix.
    /// The source chain is searched most derived first.
    fn find_getter<S: AsRef<str>>(
        &self,
        source_class: &str,
        setter: &str,
        suffixes: &[S],
    ) -> Option<&Property>
    where
        Self: Sized,
    {
        find_getter_in(self, source_class, setter, suffixes)
    }
}

/// Object-safe form of [`PropertyAccessor::find_getter`]
pub fn find_getter_in<'a, A, S>(
    accessor: &'a A,
    source_class: &str,
    setter: &str,
    suffixes: &[S],
) -> Option<&'a Property>
where
    A: PropertyAccessor + ?Sized,
    S: AsRef<str>,
{
    let (getter, boolean_getter) = getter_candidates(setter)?;
    let expected = strip_known_suffix(&getter, suffixes);
    let expected_boolean = strip_known_suffix(&boolean_getter, suffixes);

    for class in accessor.lineage(source_class) {
        for property in accessor.declared_properties(class) {
            let Some(candidate) = property.getter.as_deref() else {
                continue;
            };
            let candidate = strip_known_suffix(candidate, suffixes);
            if candidate == expected || candidate == expected_boolean {
                return Some(property);
            }
        }
    }
    None
}

/// Creation of destination instances
pub trait Instantiator: Send + Sync {
    /// Create a fresh instance of `class` with every property at its default
    ///
    /// # Errors
    ///
    /// Returns [`Error::Instantiation`](crate::Error::Instantiation) when the
    /// class is unknown, abstract, or not a class.
    fn instantiate(&self, class: &str) -> crate::Result<ObjectRef>;
}

/// Everything the mapping engine needs from a type system
pub trait TypeModel: PropertyAccessor + Instantiator {}

impl<T: PropertyAccessor + Instantiator> TypeModel for T {}
