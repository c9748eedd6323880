//! Declared property types
//!
//! A [`TypeRef`] is what a property declares, as opposed to the runtime
//! [`Value`](crate::Value) stored in it. Declared types carry the generic
//! arguments the mapper needs to recurse into containers.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
}

impl ScalarKind {
    /// Name of the nullable (boxed) form
    #[must_use]
    pub fn boxed_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "Boolean",
            ScalarKind::Byte => "Byte",
            ScalarKind::Short => "Short",
            ScalarKind::Int => "Integer",
            ScalarKind::Long => "Long",
            ScalarKind::Float => "Float",
            ScalarKind::Double => "Double",
            ScalarKind::Char => "Character",
            ScalarKind::String => "String",
        }
    }

    /// Name of the primitive form, if the kind has one
    #[must_use]
    pub fn primitive_name(self) -> Option<&'static str> {
        match self {
            ScalarKind::Bool => Some("boolean"),
            ScalarKind::Byte => Some("byte"),
            ScalarKind::Short => Some("short"),
            ScalarKind::Int => Some("int"),
            ScalarKind::Long => Some("long"),
            ScalarKind::Float => Some("float"),
            ScalarKind::Double => Some("double"),
            ScalarKind::Char => Some("char"),
            ScalarKind::String => None,
        }
    }

    fn from_boxed_name(name: &str) -> Option<Self> {
        Some(match name {
            "Boolean" => ScalarKind::Bool,
            "Byte" => ScalarKind::Byte,
            "Short" => ScalarKind::Short,
            "Integer" => ScalarKind::Int,
            "Long" => ScalarKind::Long,
            "Float" => ScalarKind::Float,
            "Double" => ScalarKind::Double,
            "Character" => ScalarKind::Char,
            "String" => ScalarKind::String,
            _ => return None,
        })
    }

    fn from_primitive_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => ScalarKind::Bool,
            "byte" => ScalarKind::Byte,
            "short" => ScalarKind::Short,
            "int" => ScalarKind::Int,
            "long" => ScalarKind::Long,
            "float" => ScalarKind::Float,
            "double" => ScalarKind::Double,
            "char" => ScalarKind::Char,
            _ => return None,
        })
    }
}

/// Kind of ordered multi-value container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqKind {
    List,
    Set,
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Universal root type (`Object`)
    Any,

    /// Non-nullable scalar; defaults to zero
    Primitive(ScalarKind),

    /// Nullable (boxed) scalar
    Scalar(ScalarKind),

    /// Class or enum declared in a registry
    Named(String),

    /// List or set; `element` is `None` for a raw container
    Sequence {
        kind: SeqKind,
        element: Option<Box<TypeRef>>,
    },

    /// Associative container; arguments are `None` for a raw map
    Map {
        key: Option<Box<TypeRef>>,
        value: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    /// Parse a type expression such as `Map<Long, BookDTO>`
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeParse`] when the expression is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        parse_type(input.trim(), input)
    }

    /// Declared class or enum
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// `List<element>`
    #[must_use]
    pub fn list(element: TypeRef) -> Self {
        TypeRef::Sequence {
            kind: SeqKind::List,
            element: Some(Box::new(element)),
        }
    }

    /// `Set<element>`
    #[must_use]
    pub fn set(element: TypeRef) -> Self {
        TypeRef::Sequence {
            kind: SeqKind::Set,
            element: Some(Box::new(element)),
        }
    }

    /// `Map<key, value>`
    #[must_use]
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map {
            key: Some(Box::new(key)),
            value: Some(Box::new(value)),
        }
    }

    /// Check if this is the universal root type
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, TypeRef::Any)
    }

    /// Scalar kind for primitive and boxed scalar declarations
    #[must_use]
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeRef::Primitive(kind) | TypeRef::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Check if values of this type are booleans (getters use the `is` prefix)
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.scalar_kind() == Some(ScalarKind::Bool)
    }

    /// Declared class or enum name
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeRef::parse(s)
    }
}

fn parse_type(text: &str, original: &str) -> Result<TypeRef> {
    if text.is_empty() {
        return Err(Error::type_parse(original, "empty type"));
    }

    let (base, args) = match text.find('<') {
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| Error::type_parse(original, "unbalanced brackets"))?;
            (text[..open].trim(), Some(split_arguments(inner, original)?))
        }
        None => {
            if text.contains('>') {
                return Err(Error::type_parse(original, "unbalanced brackets"));
            }
            (text, None)
        }
    };

    let arity = |expected: usize| -> Result<Vec<TypeRef>> {
        match &args {
            Some(args) if args.len() == expected => args
                .iter()
                .map(|arg| parse_type(arg, original))
                .collect(),
            Some(args) => Err(Error::type_parse(
                original,
                format!("{base} expects {expected} type argument(s), found {}", args.len()),
            )),
            None => Ok(Vec::new()),
        }
    };

    match base {
        "List" | "Collection" | "Iterable" => {
            let element = arity(1)?.pop().map(Box::new);
            Ok(TypeRef::Sequence {
                kind: SeqKind::List,
                element,
            })
        }
        "Set" => {
            let element = arity(1)?.pop().map(Box::new);
            Ok(TypeRef::Sequence {
                kind: SeqKind::Set,
                element,
            })
        }
        "Map" => {
            let mut parsed = arity(2)?.into_iter().map(Box::new);
            Ok(TypeRef::Map {
                key: parsed.next(),
                value: parsed.next(),
            })
        }
        _ if args.is_some() => Err(Error::type_parse(
            original,
            format!("{base} does not take type arguments"),
        )),
        "Object" => Ok(TypeRef::Any),
        _ => {
            if let Some(kind) = ScalarKind::from_primitive_name(base) {
                Ok(TypeRef::Primitive(kind))
            } else if let Some(kind) = ScalarKind::from_boxed_name(base) {
                Ok(TypeRef::Scalar(kind))
            } else if is_identifier(base) {
                Ok(TypeRef::Named(base.to_string()))
            } else {
                Err(Error::type_parse(original, format!("invalid type name '{base}'")))
            }
        }
    }
}

/// Split generic arguments on top-level commas
fn split_arguments<'a>(inner: &'a str, original: &str) -> Result<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::type_parse(original, "unbalanced brackets"))?;
            }
            ',' if depth == 0 => {
                parts.push(inner[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::type_parse(original, "unbalanced brackets"));
    }
    parts.push(inner[start..].trim());
    Ok(parts)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$')
        }
        _ => false,
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("Object"),
            TypeRef::Primitive(kind) => {
                f.write_str(kind.primitive_name().unwrap_or(kind.boxed_name()))
            }
            TypeRef::Scalar(kind) => f.write_str(kind.boxed_name()),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Sequence { kind, element } => {
                let base = match kind {
                    SeqKind::List => "List",
                    SeqKind::Set => "Set",
                };
                match element {
                    Some(element) => write!(f, "{base}<{element}>"),
                    None => f.write_str(base),
                }
            }
            TypeRef::Map { key, value } => match (key, value) {
                (Some(key), Some(value)) => write!(f, "Map<{key}, {value}>"),
                _ => f.write_str("Map"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(TypeRef::parse("int").unwrap(), TypeRef::Primitive(ScalarKind::Int));
        assert_eq!(TypeRef::parse("Integer").unwrap(), TypeRef::Scalar(ScalarKind::Int));
        assert_eq!(TypeRef::parse("String").unwrap(), TypeRef::Scalar(ScalarKind::String));
        assert_eq!(TypeRef::parse("boolean").unwrap(), TypeRef::Primitive(ScalarKind::Bool));
        assert_eq!(TypeRef::parse("Object").unwrap(), TypeRef::Any);
    }

    #[test]
    fn test_parse_nested_generics() {
        let parsed = TypeRef::parse("Map<Long, List<BookEntryDTO>>").unwrap();
        assert_eq!(
            parsed,
            TypeRef::map(
                TypeRef::Scalar(ScalarKind::Long),
                TypeRef::list(TypeRef::named("BookEntryDTO"))
            )
        );
    }

    #[test]
    fn test_parse_raw_containers() {
        assert_eq!(
            TypeRef::parse("List").unwrap(),
            TypeRef::Sequence {
                kind: SeqKind::List,
                element: None
            }
        );
        assert_eq!(
            TypeRef::parse("Map").unwrap(),
            TypeRef::Map {
                key: None,
                value: None
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("List<Book").is_err());
        assert!(TypeRef::parse("Map<Long>").is_err());
        assert!(TypeRef::parse("Book<String>").is_err());
        assert!(TypeRef::parse("1Book").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["Map<Long, BookEntryDTO>", "Set<String>", "List", "long", "Character"] {
            let parsed = TypeRef::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn test_boolean_detection() {
        assert!(TypeRef::parse("Boolean").unwrap().is_boolean());
        assert!(!TypeRef::parse("String").unwrap().is_boolean());
    }
}
