//! Address book fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use beanmap_model::{ClassRegistry, MapValue, ObjectRef, Value};

pub const LIBRARY: &str = include_str!("../../../../testdata/library.yaml");

pub fn library() -> Arc<ClassRegistry> {
    Arc::new(ClassRegistry::from_yaml_str(LIBRARY).expect("library.yaml is valid"))
}

pub fn book(id: i64, name: &str) -> ObjectRef {
    ObjectRef::with_fields("Book", [("id", Value::Long(id)), ("name", Value::from(name))])
}

/// A book with a phone entry (id 1) and an address entry (id 2), both
/// pointing back at the book and indexed by id
pub fn test_book(id: i64) -> ObjectRef {
    let book = book(id, "Book");
    let phone = ObjectRef::with_fields(
        "PhoneEntry",
        [
            ("id", Value::Long(1)),
            ("book", Value::Object(book.clone())),
            ("phoneNumber", Value::from("123456789")),
        ],
    );
    let address = ObjectRef::with_fields(
        "AddressEntry",
        [
            ("id", Value::Long(2)),
            ("book", Value::Object(book.clone())),
            ("city", Value::from("Paris")),
            ("country", Value::from("France")),
        ],
    );
    book.set(
        "entries",
        Value::List(vec![Value::Object(phone.clone()), Value::Object(address.clone())]),
    );
    let by_id: MapValue = [
        (Value::Long(1), Value::Object(phone)),
        (Value::Long(2), Value::Object(address)),
    ]
    .into_iter()
    .collect();
    book.set("entriesById", Value::Map(by_id));
    book
}

/// Elements of a list or set field
pub fn elements(object: &ObjectRef, field: &str) -> Vec<Value> {
    object
        .get(field)
        .as_sequence()
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

/// Object stored at `index` of a list field
pub fn element(object: &ObjectRef, field: &str, index: usize) -> ObjectRef {
    elements(object, field)[index]
        .as_object()
        .expect("element is an object")
        .clone()
}
