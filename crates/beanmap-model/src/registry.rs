//! Declarative class registry
//!
//! A runtime type registry: classes declare their parent and their
//! properties, enums declare their variants. The registry answers the
//! hierarchy, property and instantiation queries of the mapping engine.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::accessor::{Instantiator, Property, PropertyAccessor, ROOT_TYPE, TypeHierarchy};
use crate::naming::{getter_name, setter_name};
use crate::types::{ScalarKind, TypeRef};
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};

/// Which accessors a property exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Declaration of a class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Class name
    pub name: String,

    /// Parent class; `None` extends the root type
    pub parent: Option<String>,

    /// Abstract classes cannot be instantiated
    pub is_abstract: bool,

    /// Declared properties, in declaration order
    pub properties: Vec<(String, TypeRef, Access)>,
}

impl ClassDef {
    /// Start a class declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            properties: Vec::new(),
        }
    }

    /// Set the parent class
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Mark the class abstract
    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a read/write property
    #[must_use]
    pub fn property(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.property_with_access(name, ty, Access::ReadWrite)
    }

    /// Add a property with only a getter
    #[must_use]
    pub fn read_only(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.property_with_access(name, ty, Access::ReadOnly)
    }

    /// Add a property with only a setter
    #[must_use]
    pub fn write_only(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.property_with_access(name, ty, Access::WriteOnly)
    }

    /// Add a property with explicit access
    #[must_use]
    pub fn property_with_access(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        access: Access,
    ) -> Self {
        self.properties.push((name.into(), ty, access));
        self
    }
}

/// Declaration of an enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Enum name
    pub name: String,

    /// Variant names, in declaration order
    pub variants: Vec<String>,
}

impl EnumDef {
    /// Declare an enum with its variants
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct ClassEntry {
    parent: Option<String>,
    is_abstract: bool,
    properties: Vec<Property>,
}

/// Registry of declared classes and enums
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
    enums: HashMap<String, EnumDef>,
}

impl ClassRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class
    ///
    /// The parent must already be registered. Re-registering a name replaces
    /// the previous declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is unknown, if the new parent would
    /// create an inheritance cycle, or if the name is reserved.
    pub fn register_class(&mut self, class: ClassDef) -> Result<&mut Self> {
        if class.name == ROOT_TYPE {
            return Err(Error::InvalidFormat(format!(
                "'{ROOT_TYPE}' is the root type and cannot be declared"
            )));
        }

        let parent = class.parent.filter(|parent| parent != ROOT_TYPE);
        if let Some(parent) = &parent {
            if !self.classes.contains_key(parent) {
                return Err(Error::UnknownParent {
                    class: class.name,
                    parent: parent.clone(),
                });
            }
            if self.is_assignable(parent, &class.name) {
                return Err(Error::InheritanceCycle {
                    class: class.name,
                    parent: parent.clone(),
                });
            }
        }

        let properties = class
            .properties
            .into_iter()
            .map(|(name, ty, access)| Property {
                getter: (access != Access::WriteOnly).then(|| getter_name(&name, &ty)),
                setter: (access != Access::ReadOnly).then(|| setter_name(&name)),
                name,
                ty,
            })
            .collect();

        if self.enums.remove(&class.name).is_some() {
            debug!("Class {} replaces enum of the same name", class.name);
        }
        let entry = ClassEntry {
            parent,
            is_abstract: class.is_abstract,
            properties,
        };
        if self.classes.insert(class.name.clone(), entry).is_some() {
            debug!("Replaced class declaration: {}", class.name);
        } else {
            trace!("Registered class: {}", class.name);
        }
        Ok(self)
    }

    /// Register an enum, replacing any declaration of the same name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is reserved or already used by a class
    /// that other classes extend.
    pub fn register_enum(&mut self, definition: EnumDef) -> Result<&mut Self> {
        if definition.name == ROOT_TYPE {
            return Err(Error::InvalidFormat(format!(
                "'{ROOT_TYPE}' is the root type and cannot be declared"
            )));
        }
        if let Some(child) = self
            .classes
            .iter()
            .find(|(_, entry)| entry.parent.as_deref() == Some(definition.name.as_str()))
            .map(|(name, _)| name.clone())
        {
            return Err(Error::InvalidFormat(format!(
                "enum '{}' would replace the parent of class '{child}'",
                definition.name
            )));
        }
        if self.classes.remove(&definition.name).is_some() {
            debug!("Enum {} replaces class of the same name", definition.name);
        }
        trace!("Registered enum: {}", definition.name);
        self.enums.insert(definition.name.clone(), definition);
        Ok(self)
    }

    /// Names of all declared classes, sorted
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of all declared enums, sorted
    #[must_use]
    pub fn enum_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.enums.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up an enum declaration
    #[must_use]
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    /// Check if a class is abstract
    #[must_use]
    pub fn is_abstract(&self, class: &str) -> bool {
        self.classes.get(class).is_some_and(|entry| entry.is_abstract)
    }

    /// Number of declared classes and enums
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len() + self.enums.len()
    }

    /// Check if nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypeHierarchy for ClassRegistry {
    fn parent(&self, class: &str) -> Option<&str> {
        self.classes.get(class)?.parent.as_deref()
    }

    fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.enums.contains_key(name)
    }

    fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    fn enum_has_variant(&self, name: &str, variant: &str) -> bool {
        self.enums
            .get(name)
            .is_some_and(|definition| definition.variants.iter().any(|v| v == variant))
    }
}

impl PropertyAccessor for ClassRegistry {
    fn declared_properties(&self, class: &str) -> &[Property] {
        self.classes
            .get(class)
            .map_or(&[], |entry| entry.properties.as_slice())
    }
}

impl Instantiator for ClassRegistry {
    fn instantiate(&self, class: &str) -> Result<ObjectRef> {
        let Some(entry) = self.classes.get(class) else {
            let reason = if self.enums.contains_key(class) {
                "enums cannot be instantiated"
            } else {
                "type is not declared"
            };
            return Err(Error::instantiation(class, reason));
        };
        if entry.is_abstract {
            return Err(Error::instantiation(class, "class is abstract"));
        }

        let object = ObjectRef::new(class);
        for name in self.lineage(class) {
            for property in self.declared_properties(name) {
                if !object.has_field(&property.name) {
                    object.set(property.name.clone(), default_value(&property.ty));
                }
            }
        }
        Ok(object)
    }
}

/// Default value of a freshly created property
#[must_use]
pub fn default_value(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Primitive(kind) => match kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Byte => Value::Byte(0),
            ScalarKind::Short => Value::Short(0),
            ScalarKind::Int => Value::Int(0),
            ScalarKind::Long => Value::Long(0),
            ScalarKind::Float => Value::Float(0.0),
            ScalarKind::Double => Value::Double(0.0),
            ScalarKind::Char => Value::Char('\0'),
            ScalarKind::String => Value::Null,
        },
        _ => Value::Null,
    }
}
