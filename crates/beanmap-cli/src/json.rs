//! JSON documents for object graphs
//!
//! Objects carry their class in an `@class` member and may declare an `@id`;
//! `{"@ref": id}` points back at an object declared earlier in the document,
//! which is how shared references and cycles are written. Member types are
//! taken from the class registry, so `1` decodes as a `Long` or a `Byte`
//! depending on the declared property type.

use std::collections::HashMap;

use beanmap_model::{
    ClassRegistry, EnumValue, MapValue, ObjectId, ObjectRef, PropertyAccessor, ScalarKind,
    SeqKind, TypeHierarchy, TypeRef, Value,
};
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

const CLASS_KEY: &str = "@class";
const ID_KEY: &str = "@id";
const REF_KEY: &str = "@ref";
const ENTRY_KEY: &str = "key";
const ENTRY_VALUE: &str = "value";

/// Errors raised while decoding a JSON document
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("Class {class} has no property '{property}'")]
    UnknownProperty { class: String, property: String },

    #[error("Reference to undeclared object '{0}'")]
    UnknownReference(String),

    #[error("Object id '{0}' is declared twice")]
    DuplicateId(String),

    #[error("Enum {name} has no variant '{variant}'")]
    UnknownVariant { name: String, variant: String },

    #[error("Expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
}

impl DecodeError {
    fn mismatch(expected: &TypeRef, found: &JsonValue) -> Self {
        let found = match found {
            JsonValue::Null => "null".to_string(),
            JsonValue::Bool(_) => "a boolean".to_string(),
            JsonValue::Number(n) => format!("number {n}"),
            JsonValue::String(s) => format!("string \"{s}\""),
            JsonValue::Array(_) => "an array".to_string(),
            JsonValue::Object(_) => "an object".to_string(),
        };
        Self::Mismatch {
            expected: expected.to_string(),
            found,
        }
    }
}

/// Decode a document into a value of type `declared`
///
/// # Errors
///
/// Returns an error when the document does not fit the declared types.
pub fn decode(
    document: &JsonValue,
    declared: &TypeRef,
    types: &ClassRegistry,
) -> Result<Value, DecodeError> {
    Decoder {
        types,
        objects: HashMap::new(),
    }
    .value(document, declared)
}

struct Decoder<'a> {
    types: &'a ClassRegistry,
    objects: HashMap<String, ObjectRef>,
}

impl Decoder<'_> {
    fn value(&mut self, json: &JsonValue, declared: &TypeRef) -> Result<Value, DecodeError> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => match declared {
                TypeRef::Any | TypeRef::Primitive(ScalarKind::Bool) | TypeRef::Scalar(ScalarKind::Bool) => {
                    Ok(Value::Bool(*b))
                }
                _ => Err(DecodeError::mismatch(declared, json)),
            },
            JsonValue::Number(number) => decode_number(number, declared)
                .ok_or_else(|| DecodeError::mismatch(declared, json)),
            JsonValue::String(text) => self.string(text, declared, json),
            JsonValue::Array(items) => self.array(items, declared, json),
            JsonValue::Object(members) => self.object(members, declared, json),
        }
    }

    fn string(
        &self,
        text: &str,
        declared: &TypeRef,
        json: &JsonValue,
    ) -> Result<Value, DecodeError> {
        match declared {
            TypeRef::Any | TypeRef::Scalar(ScalarKind::String) => Ok(Value::from(text)),
            TypeRef::Primitive(ScalarKind::Char) | TypeRef::Scalar(ScalarKind::Char) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(DecodeError::mismatch(declared, json)),
                }
            }
            TypeRef::Named(name) if self.types.is_enum(name) => {
                if self.types.enum_has_variant(name, text) {
                    Ok(Value::Enum(EnumValue::new(name.clone(), text)))
                } else {
                    Err(DecodeError::UnknownVariant {
                        name: name.clone(),
                        variant: text.to_string(),
                    })
                }
            }
            _ => Err(DecodeError::mismatch(declared, json)),
        }
    }

    fn array(
        &mut self,
        items: &[JsonValue],
        declared: &TypeRef,
        json: &JsonValue,
    ) -> Result<Value, DecodeError> {
        let (kind, element) = match declared {
            TypeRef::Sequence { kind, element } => {
                (*kind, element.as_deref().cloned().unwrap_or(TypeRef::Any))
            }
            TypeRef::Map { key, value } => {
                let key = key.as_deref().cloned().unwrap_or(TypeRef::Any);
                let value = value.as_deref().cloned().unwrap_or(TypeRef::Any);
                return self.entries(items, declared, &key, &value);
            }
            TypeRef::Any => (SeqKind::List, TypeRef::Any),
            _ => return Err(DecodeError::mismatch(declared, json)),
        };
        let values = items
            .iter()
            .map(|item| self.value(item, &element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match kind {
            SeqKind::List => Value::List(values),
            SeqKind::Set => Value::Set(values),
        })
    }

    fn object(
        &mut self,
        members: &Map<String, JsonValue>,
        declared: &TypeRef,
        json: &JsonValue,
    ) -> Result<Value, DecodeError> {
        if let Some(reference) = members.get(REF_KEY) {
            let id = id_text(reference);
            let object = self
                .objects
                .get(&id)
                .cloned()
                .ok_or(DecodeError::UnknownReference(id))?;
            self.expect_class(&object.class(), declared)?;
            return Ok(Value::Object(object));
        }

        let class = match (members.get(CLASS_KEY), declared) {
            (Some(JsonValue::String(class)), _) => class.clone(),
            (None, TypeRef::Map { key, value }) => {
                let key = key.as_deref().cloned().unwrap_or(TypeRef::Any);
                let value = value.as_deref().cloned().unwrap_or(TypeRef::Any);
                return self.map(members, &key, &value);
            }
            (None, TypeRef::Named(class)) => class.clone(),
            _ => return Err(DecodeError::mismatch(declared, json)),
        };

        if !self.types.contains(&class) || self.types.is_enum(&class) {
            return Err(DecodeError::UnknownClass(class));
        }
        self.expect_class(&class, declared)?;

        let object = ObjectRef::new(class.clone());
        if let Some(id) = members.get(ID_KEY) {
            let id = id_text(id);
            if self.objects.insert(id.clone(), object.clone()).is_some() {
                return Err(DecodeError::DuplicateId(id));
            }
        }

        for (name, member) in members {
            if name.starts_with('@') {
                continue;
            }
            let ty = self
                .property_type(&class, name)
                .ok_or_else(|| DecodeError::UnknownProperty {
                    class: class.clone(),
                    property: name.clone(),
                })?;
            let value = self.value(member, &ty)?;
            object.set(name.clone(), value);
        }
        Ok(Value::Object(object))
    }

    fn map(
        &mut self,
        members: &Map<String, JsonValue>,
        key: &TypeRef,
        value: &TypeRef,
    ) -> Result<Value, DecodeError> {
        let mut map = MapValue::new();
        for (name, member) in members {
            let key_json = match key.scalar_kind() {
                None | Some(ScalarKind::String | ScalarKind::Char) => JsonValue::String(name.clone()),
                Some(_) => serde_json::from_str(name).unwrap_or_else(|_| JsonValue::String(name.clone())),
            };
            let mapped_key = self.value(&key_json, key)?;
            let mapped_value = self.value(member, value)?;
            map.insert(mapped_key, mapped_value);
        }
        Ok(Value::Map(map))
    }

    /// Maps whose keys are not scalars are written as `[{"key": .., "value": ..}]`
    fn entries(
        &mut self,
        items: &[JsonValue],
        declared: &TypeRef,
        key: &TypeRef,
        value: &TypeRef,
    ) -> Result<Value, DecodeError> {
        let mut map = MapValue::new();
        for item in items {
            let entry = item
                .as_object()
                .filter(|entry| {
                    entry.len() == 2
                        && entry.contains_key(ENTRY_KEY)
                        && entry.contains_key(ENTRY_VALUE)
                })
                .ok_or_else(|| DecodeError::mismatch(declared, item))?;
            let mapped_key = self.value(&entry[ENTRY_KEY], key)?;
            let mapped_value = self.value(&entry[ENTRY_VALUE], value)?;
            map.insert(mapped_key, mapped_value);
        }
        Ok(Value::Map(map))
    }

    fn expect_class(&self, class: &str, declared: &TypeRef) -> Result<(), DecodeError> {
        match declared {
            _ if declared.is_any() => Ok(()),
            TypeRef::Named(expected) if self.types.is_assignable(class, expected) => Ok(()),
            _ => Err(DecodeError::Mismatch {
                expected: declared.to_string(),
                found: class.to_string(),
            }),
        }
    }

    fn property_type(&self, class: &str, name: &str) -> Option<TypeRef> {
        self.types
            .lineage(class)
            .into_iter()
            .flat_map(|class| self.types.declared_properties(class))
            .find(|property| property.name == name)
            .map(|property| property.ty.clone())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decode_number(number: &Number, declared: &TypeRef) -> Option<Value> {
    let Some(kind) = declared.scalar_kind() else {
        if !declared.is_any() {
            return None;
        }
        return number
            .as_i64()
            .map(Value::Long)
            .or_else(|| number.as_f64().map(Value::Double));
    };
    match kind {
        ScalarKind::Byte => number.as_i64().and_then(|n| i8::try_from(n).ok()).map(Value::Byte),
        ScalarKind::Short => number.as_i64().and_then(|n| i16::try_from(n).ok()).map(Value::Short),
        ScalarKind::Int => number.as_i64().and_then(|n| i32::try_from(n).ok()).map(Value::Int),
        ScalarKind::Long => number.as_i64().map(Value::Long),
        ScalarKind::Float => number.as_f64().map(|n| Value::Float(n as f32)),
        ScalarKind::Double => number.as_f64().map(Value::Double),
        ScalarKind::Bool | ScalarKind::Char | ScalarKind::String => None,
    }
}

fn id_text(id: &JsonValue) -> String {
    match id {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encode a value as JSON
///
/// Every object gets a sequential `@id`; later occurrences of the same
/// object are written as `{"@ref": id}`.
#[must_use]
pub fn encode(value: &Value) -> JsonValue {
    Encoder::default().value(value)
}

#[derive(Default)]
struct Encoder {
    seen: HashMap<ObjectId, u64>,
}

impl Encoder {
    fn value(&mut self, value: &Value) -> JsonValue {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Byte(n) => JsonValue::from(*n),
            Value::Short(n) => JsonValue::from(*n),
            Value::Int(n) => JsonValue::from(*n),
            Value::Long(n) => JsonValue::from(*n),
            Value::Float(n) => float(f64::from(*n)),
            Value::Double(n) => float(*n),
            Value::Char(c) => JsonValue::String(c.to_string()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Enum(e) => JsonValue::String(e.variant.clone()),
            Value::List(items) | Value::Set(items) => {
                JsonValue::Array(items.iter().map(|item| self.value(item)).collect())
            }
            Value::Map(map) => self.map(map),
            Value::Object(object) => self.object(object),
        }
    }

    fn map(&mut self, map: &MapValue) -> JsonValue {
        let keys: Option<Vec<String>> = map.iter().map(|(key, _)| key_text(key)).collect();
        match keys {
            Some(keys) => {
                let mut members = Map::new();
                for (key, (_, value)) in keys.into_iter().zip(map.iter()) {
                    members.insert(key, self.value(value));
                }
                JsonValue::Object(members)
            }
            None => JsonValue::Array(
                map.iter()
                    .map(|(key, value)| {
                        let mut entry = Map::new();
                        entry.insert(ENTRY_KEY.to_string(), self.value(key));
                        entry.insert(ENTRY_VALUE.to_string(), self.value(value));
                        JsonValue::Object(entry)
                    })
                    .collect(),
            ),
        }
    }

    fn object(&mut self, object: &ObjectRef) -> JsonValue {
        let mut members = Map::new();
        if let Some(id) = self.seen.get(&object.id()) {
            members.insert(REF_KEY.to_string(), JsonValue::from(*id));
            return JsonValue::Object(members);
        }
        let id = self.seen.len() as u64 + 1;
        self.seen.insert(object.id(), id);

        members.insert(CLASS_KEY.to_string(), JsonValue::String(object.class()));
        members.insert(ID_KEY.to_string(), JsonValue::from(id));
        for name in object.field_names() {
            let value = object.get(&name);
            members.insert(name, self.value(&value));
        }
        JsonValue::Object(members)
    }
}

fn float(n: f64) -> JsonValue {
    Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Char(c) => Some(c.to_string()),
        Value::Enum(e) => Some(e.variant.clone()),
        Value::Bool(b) => Some(b.to_string()),
        other => other.as_i64().map(|n| n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ClassRegistry {
        ClassRegistry::from_yaml_str(
            r"
classes:
  - name: Book
    properties:
      - { name: id, type: Long }
      - { name: flags, type: 'Set<Byte>' }
      - { name: entries, type: 'List<BookEntry>' }
      - { name: entriesById, type: 'Map<Long, BookEntry>' }
      - { name: ranks, type: 'Map<BookEntry, Long>' }
  - name: BookEntry
    properties:
      - { name: book, type: Book }
      - { name: color, type: Color }
  - name: PhoneEntry
    extends: BookEntry
enums:
  - name: Color
    variants: [RED]
",
        )
        .unwrap()
    }

    #[test]
    fn test_decode_uses_declared_types() {
        let types = registry();
        let document = json!({
            "@class": "Book",
            "@id": 1,
            "id": 7,
            "flags": [1, 2],
            "entries": [{ "@class": "PhoneEntry", "@id": "e1", "book": { "@ref": 1 }, "color": "RED" }],
            "entriesById": { "5": { "@ref": "e1" } }
        });

        let value = decode(&document, &TypeRef::Any, &types).unwrap();
        let book = value.as_object().unwrap();
        assert_eq!(book.get("id"), Value::Long(7));
        assert_eq!(book.get("flags"), Value::Set(vec![Value::Byte(1), Value::Byte(2)]));

        let entries = book.get("entries");
        let entry = entries.as_sequence().unwrap()[0].as_object().unwrap().clone();
        assert_eq!(entry.class(), "PhoneEntry");
        assert_eq!(entry.get("book"), Value::Object(book.clone()));
        assert_eq!(entry.get("color"), Value::from(EnumValue::new("Color", "RED")));

        let by_id = book.get("entriesById");
        assert_eq!(
            by_id.as_map().unwrap().get(&Value::Long(5)),
            Some(&Value::Object(entry))
        );
    }

    #[test]
    fn test_decode_errors() {
        let types = registry();
        let cases = [
            json!({ "@class": "Missing" }),
            json!({ "@class": "Book", "title": "x" }),
            json!({ "@class": "Book", "id": "seven" }),
            json!({ "@class": "Book", "flags": [300] }),
            json!({ "@class": "Book", "entries": [{ "@ref": 9 }] }),
            json!({ "@class": "Book", "entries": [{ "@class": "Book" }] }),
            json!({ "@class": "BookEntry", "color": "BLUE" }),
        ];
        for document in cases {
            assert!(decode(&document, &TypeRef::Any, &types).is_err(), "{document}");
        }
    }

    #[test]
    fn test_references_follow_document_order() {
        let types = registry();
        let document: JsonValue = serde_json::from_str(
            r#"{
                "@class": "Book",
                "@id": 1,
                "entriesById": { "1": { "@class": "PhoneEntry", "@id": "p" } },
                "entries": [{ "@ref": "p" }]
            }"#,
        )
        .unwrap();

        let value = decode(&document, &TypeRef::Any, &types).unwrap();
        let book = value.as_object().unwrap();
        let by_id = book.get("entriesById");
        let indexed = by_id.as_map().unwrap().get(&Value::Long(1)).unwrap().clone();
        assert_eq!(book.get("entries"), Value::List(vec![indexed]));
    }

    #[test]
    fn test_reference_must_fit_declared_type() {
        let types = registry();
        let document = json!({ "@class": "Book", "@id": 1, "entries": [{ "@ref": 1 }] });

        let result = decode(&document, &TypeRef::Any, &types);
        assert!(
            matches!(&result, Err(DecodeError::Mismatch { found, .. }) if found == "Book"),
            "{result:?}"
        );
    }

    #[test]
    fn test_object_keyed_map_reads_back() {
        let types = registry();
        let book = ObjectRef::new("Book");
        let entry = ObjectRef::new("PhoneEntry");
        book.set("entries", Value::List(vec![Value::Object(entry.clone())]));
        let mut ranks = MapValue::new();
        ranks.insert(Value::Object(entry.clone()), Value::Long(3));
        book.set("ranks", Value::Map(ranks));

        let encoded = encode(&Value::Object(book));
        assert_eq!(encoded["ranks"], json!([{ "key": { "@ref": 2 }, "value": 3 }]));

        let decoded = decode(&encoded, &TypeRef::Any, &types).unwrap();
        let copy = decoded.as_object().unwrap();
        let entries = copy.get("entries");
        let copied_entry = entries.as_sequence().unwrap()[0].clone();
        let ranks = copy.get("ranks");
        assert_eq!(ranks.as_map().unwrap().get(&copied_entry), Some(&Value::Long(3)));
    }

    #[test]
    fn test_encode_writes_references() {
        let book = ObjectRef::with_fields("Book", [("id", Value::Long(7))]);
        let entry = ObjectRef::with_fields("BookEntry", [("book", Value::Object(book.clone()))]);
        book.set("entries", Value::List(vec![Value::Object(entry.clone())]));
        let mut by_id = MapValue::new();
        by_id.insert(Value::Long(5), Value::Object(entry));
        book.set("entriesById", Value::Map(by_id));

        let encoded = encode(&Value::Object(book));
        assert_eq!(
            encoded,
            json!({
                "@class": "Book",
                "@id": 1,
                "entries": [{ "@class": "BookEntry", "@id": 2, "book": { "@ref": 1 } }],
                "entriesById": { "5": { "@ref": 2 } },
                "id": 7
            })
        );
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&Value::Char('x')), json!("x"));
        assert_eq!(encode(&Value::Double(f64::NAN)), JsonValue::Null);
        assert_eq!(
            encode(&Value::from(EnumValue::new("Color", "RED"))),
            json!("RED")
        );
    }
}
