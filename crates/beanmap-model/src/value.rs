//! Runtime values and object handles
//!
//! Objects are shared through [`ObjectRef`] handles so a graph can contain
//! back-references and cycles. Equality between object values is identity,
//! never structure.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::ScalarKind;

/// Stable identity of an object for the lifetime of its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A composite object: its runtime class and its field values
#[derive(Debug)]
struct Object {
    class: String,
    fields: BTreeMap<String, Value>,
}

/// Shared handle to a composite object
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Create an empty object of the given class
    pub fn new(class: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(Object {
            class: class.into(),
            fields: BTreeMap::new(),
        })))
    }

    /// Create an object with initial field values
    pub fn with_fields<K, I>(class: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new(class);
        for (name, value) in fields {
            object.set(name, value);
        }
        object
    }

    /// Identity of this object
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId(Rc::as_ptr(&self.0).cast::<()>() as usize)
    }

    /// Runtime class name
    #[must_use]
    pub fn class(&self) -> String {
        self.0.borrow().class.clone()
    }

    /// Read a field; absent fields read as `Null`
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        self.0.borrow().fields.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Write a field
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().fields.insert(name.into(), value);
    }

    /// Check if a field has been written
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.0.borrow().fields.contains_key(name)
    }

    /// Names of all written fields, sorted
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    /// Check if two handles point to the same object
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    // Fields are not printed: graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("class", &self.class())
            .field("id", &self.id())
            .finish()
    }
}

/// A value of a declared enum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Enum type name
    pub type_name: String,

    /// Variant name
    pub variant: String,
}

impl EnumValue {
    /// Create an enum value
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
        }
    }
}

/// Insertion-ordered associative container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapValue {
    entries: Vec<(Value, Value)>,
}

impl MapValue {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing the value stored under an equal key
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Look up a value by key
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Value, Value)> for MapValue {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = MapValue::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Values that can be stored in object fields
#[derive(Debug, Clone)]
pub enum Value {
    /// Null/absent value
    Null,

    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),

    /// Enum variant
    Enum(EnumValue),

    /// Ordered sequence
    List(Vec<Value>),

    /// Ordered sequence without duplicates
    Set(Vec<Value>),

    /// Associative container
    Map(MapValue),

    /// Composite object
    Object(ObjectRef),
}

impl Value {
    /// Check if value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalar kind of a scalar value
    #[must_use]
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        Some(match self {
            Value::Bool(_) => ScalarKind::Bool,
            Value::Byte(_) => ScalarKind::Byte,
            Value::Short(_) => ScalarKind::Short,
            Value::Int(_) => ScalarKind::Int,
            Value::Long(_) => ScalarKind::Long,
            Value::Float(_) => ScalarKind::Float,
            Value::Double(_) => ScalarKind::Double,
            Value::Char(_) => ScalarKind::Char,
            Value::String(_) => ScalarKind::String,
            _ => return None,
        })
    }

    /// Runtime type name, used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Enum(value) => value.type_name.clone(),
            Value::List(_) => "List".to_string(),
            Value::Set(_) => "Set".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Object(object) => object.class(),
            scalar => scalar
                .scalar_kind()
                .map_or("unknown", ScalarKind::boxed_name)
                .to_string(),
        }
    }

    /// Object handle, if this is an object
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// String contents, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral value widened to `i64`
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Elements of a list or set
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map
    #[must_use]
    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<MapValue> for Value {
    fn from(value: MapValue) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_identity_equality() {
        let a = ObjectRef::with_fields("Book", [("name", Value::from("Book"))]);
        let b = ObjectRef::with_fields("Book", [("name", Value::from("Book"))]);

        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a.clone()), Value::Object(b.clone()));
        assert_eq!(a.id(), a.clone().id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_shared_handles_see_writes() {
        let book = ObjectRef::new("Book");
        let alias = book.clone();
        alias.set("id", Value::Long(7));
        assert_eq!(book.get("id"), Value::Long(7));
        assert_eq!(book.get("missing"), Value::Null);
        assert!(book.has_field("id"));
    }

    #[test]
    fn test_cyclic_debug_does_not_recurse() {
        let book = ObjectRef::new("Book");
        let entry = ObjectRef::with_fields("BookEntry", [("book", Value::Object(book.clone()))]);
        book.set("entries", Value::List(vec![Value::Object(entry)]));

        let debug = format!("{:?}", Value::Object(book));
        assert!(debug.contains("Book"));
    }

    #[test]
    fn test_map_insert_replaces_equal_key() {
        let mut map = MapValue::new();
        assert!(map.insert(Value::Long(1), Value::from("a")).is_none());
        assert_eq!(
            map.insert(Value::Long(1), Value::from("b")),
            Some(Value::from("a"))
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::Long(1)), Some(&Value::from("b")));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Long(1).type_name(), "Long");
        assert_eq!(Value::from("x").type_name(), "String");
        assert_eq!(Value::List(Vec::new()).type_name(), "List");
        assert_eq!(Value::Object(ObjectRef::new("Book")).type_name(), "Book");
        assert_eq!(Value::from(EnumValue::new("Color", "RED")).type_name(), "Color");
    }
}
