//! Integration test: mappers built from YAML configuration files

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use beanmap_core::{Error, Mapper, MapperConfig};
use beanmap_model::{ClassRegistry, Value};
use common::{element, test_book};

fn library_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../testdata/library.yaml")
}

const ROUND_TRIP: &str = r"
strict: true
mappings:
  - { source: PhoneEntry, destination: PhoneEntryDTO, bidirectional: true }
  - { source: AddressEntry, destination: AddressEntryDTO, bidirectional: true }
";

#[test]
fn test_round_trip_from_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("mapper.yaml");
    std::fs::write(&config_path, ROUND_TRIP)?;

    let types = Arc::new(ClassRegistry::from_yaml_file(library_path())?);
    let config = MapperConfig::from_yaml_file(&config_path)?;
    let mapper = Mapper::from_config(types, &config);

    let source = test_book(3);
    let dto = mapper
        .map_object(&source, "BookDTO")?
        .expect("book maps to a DTO");
    assert_eq!(element(&dto, "entries", 0).class(), "PhoneEntryDTO");
    assert_eq!(element(&dto, "entries", 1).class(), "AddressEntryDTO");

    let copy = mapper.map_object(&dto, "Book")?.expect("DTO maps back");
    assert_eq!(copy.get("id"), Value::Long(3));
    assert_eq!(element(&copy, "entries", 1).get("city"), Value::from("Paris"));
    Ok(())
}

#[test]
fn test_one_way_mapping_is_not_reversed() -> Result<()> {
    let yaml = "mappings: [{ source: PhoneEntry, destination: PhoneEntryDTO }]";
    let config = MapperConfig::from_yaml_str(yaml)?;
    let types = Arc::new(ClassRegistry::from_yaml_file(library_path())?);
    let mapper = Mapper::from_config(types, &config);

    let dto = mapper.map_object(&test_book(0), "BookDTO")?.expect("mapped");
    let copy = mapper.map_object(&dto, "Book")?.expect("mapped back");
    assert_eq!(element(&copy, "entries", 0).class(), "BookEntry");
    Ok(())
}

#[test]
fn test_custom_suffixes_from_config() -> Result<()> {
    let types = Arc::new(ClassRegistry::from_yaml_str(
        r"
classes:
  - name: Person
    properties:
      - { name: name, type: String }
  - name: PersonView
    properties:
      - { name: nameView, type: String }
",
    )?);
    let config = MapperConfig::from_yaml_str("known_suffixes: [View]")?;
    let mapper = Mapper::from_config(types, &config);

    let person = beanmap_model::ObjectRef::with_fields("Person", [("name", Value::from("Ada"))]);
    let view = mapper.map_object(&person, "PersonView")?.expect("mapped");
    assert_eq!(view.get("nameView"), Value::from("Ada"));
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() {
    let result = MapperConfig::from_yaml_str("strict: maybe");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_mapper_shared_across_threads() -> Result<()> {
    let types = Arc::new(ClassRegistry::from_yaml_file(library_path())?);
    let config = MapperConfig::from_yaml_str(ROUND_TRIP)?;
    let mapper = Arc::new(Mapper::from_config(types, &config));

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let mapper = Arc::clone(&mapper);
            thread::spawn(move || -> beanmap_core::Result<i64> {
                let dto = mapper
                    .map_object(&test_book(id), "BookDTO")?
                    .ok_or_else(|| Error::Config("unexpected null".to_string()))?;
                Ok(match dto.get("id") {
                    Value::Long(id) => id,
                    _ => -1,
                })
            })
        })
        .collect();

    for (expected, handle) in (0..4).zip(handles) {
        let id = handle.join().expect("mapping thread panicked")?;
        assert_eq!(id, expected);
    }
    Ok(())
}
