//! Shared fixtures for the integration tests

#![allow(dead_code)]

use flight_sdk::{Catalog, Datatype, Flight, InMemoryCatalog};
use std::sync::Arc;

pub const ORG: &str = "00000000-0000-0000-0000-00000000000a";

/// A small model: people appear in vehicles, people know people
pub fn catalog() -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();
    catalog.add_property_type("nc.SubjectIdentification", Datatype::String);
    catalog.add_property_type("nc.PersonGivenName", Datatype::String);
    catalog.add_property_type("nc.PersonSurName", Datatype::String);
    catalog.add_property_type("ol.datasource", Datatype::String);
    catalog.add_property_type("ol.id", Datatype::String);
    catalog.add_property_type("ol.count", Datatype::Int64);
    catalog.add_property_type("general.datetime", Datatype::DateTimeOffset);
    catalog.add_entity_type(
        "general.person",
        &["nc.SubjectIdentification"],
        &["nc.PersonGivenName", "nc.PersonSurName", "ol.datasource"],
    );
    catalog.add_entity_type("ol.vehicle", &["ol.id"], &["ol.count"]);
    catalog.add_association_type(
        "ol.appearsin",
        &["ol.id"],
        &["general.datetime"],
        &["general.person"],
        &["ol.vehicle"],
        false,
    );
    catalog.add_entity_set("People", "general.person");
    catalog.add_entity_set("Vehicles", "ol.vehicle");
    catalog.add_entity_set("AppearsIn", "ol.appearsin");
    Arc::new(catalog)
}

pub const DOCUMENT: &str = r#"
organizationId: "00000000-0000-0000-0000-00000000000a"
entityDefinitions:
  people:
    fqn: general.person
    entitySetName: People
    propertyDefinitions:
      nc.SubjectIdentification:
        type: nc.SubjectIdentification
        column: ssn
      nc.PersonGivenName:
        type: nc.PersonGivenName
        column: first
      ol.datasource:
        type: ol.datasource
        transforms:
        - !<transforms.ValueTransform>
          value: "registry"
    name: people
  vehicles:
    fqn: ol.vehicle
    entitySetName: Vehicles
    propertyDefinitions:
      ol.id:
        type: ol.id
        column: plate
      ol.count:
        type: ol.count
        transforms:
        - !<transforms.ColumnTransform>
          column: seats
        - !<transforms.ParseIntTransform> {}
    name: vehicles
associationDefinitions:
  appearsin:
    fqn: ol.appearsin
    entitySetName: AppearsIn
    src: people
    dst: vehicles
    propertyDefinitions:
      ol.id:
        type: ol.id
        transforms:
        - !<transforms.HashTransform>
          columns: ["ssn", "plate"]
          hashFunction: sha256
    name: appearsin
"#;

pub fn flight() -> Flight {
    let mut flight = Flight::new("demo", Catalog::in_memory(catalog()));
    flight
        .deserialize_from_str(DOCUMENT, None)
        .expect("fixture document parses");
    flight
}
