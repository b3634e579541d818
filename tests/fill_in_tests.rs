//! Fill-in tests

mod common;

use flight_sdk::transforms::{self, NodeKind};
use flight_sdk::{Catalog, FillInConfig, Flight};

const SKETCH: &str = r#"
organizationId: "00000000-0000-0000-0000-00000000000a"
entityDefinitions:
  person:
    propertyDefinitions:
      pk:
        column: ssn
      PersonGivenName:
        column: first
      ol.datasource: registry
  vehicle:
    propertyDefinitions:
      ol.id:
        column: plate
      ol.count:
        type: ol.count
        column: seats
associationDefinitions:
  appearsin:
    src: person
    dst: vehicle
    propertyDefinitions: {}
"#;

fn sketch() -> Flight {
    let mut flight = Flight::new("sketch", Catalog::in_memory(common::catalog()));
    flight.deserialize_from_str(SKETCH, None).unwrap();
    flight
}

mod fill_in_tests {
    use super::*;

    #[test]
    fn test_filled_sketch_validates() {
        let mut flight = sketch();
        assert!(!flight.necessary_components_validation().validated);

        flight.fill_in(&FillInConfig::default().with_entity_set_prefix("Demo"));
        assert_eq!(flight.entity_definitions.get("person").unwrap().entity_set_name, "DemoPerson");
        assert!(flight.necessary_components_validation().validated);
        assert!(flight.parsers_validation().validated);
        assert!(flight.edm_validation().validated);
    }

    #[test]
    fn test_generated_association_key() {
        let mut flight = sketch();
        flight.fill_in(&FillInConfig::default());
        let association = flight.association_definitions.get("appearsin").unwrap();
        assert_eq!(association.name, "appearsin");
        let key = association.property_definitions.get("ol.id").unwrap();
        let columns: Vec<String> = transforms::columns(&key.transforms).into_iter().collect();
        assert_eq!(columns, vec!["plate", "ssn"]);
    }

    #[test]
    fn test_schema_refreshed_after_fill_in() {
        let mut flight = sketch();
        flight.fill_in(&FillInConfig::default());
        let schema = flight.schema();
        let person = schema.entity_definitions.get("person").unwrap();
        assert_eq!(person.fqn, "general.person");
        assert!(schema.association_definitions.contains_key("appearsin"));
    }

    #[test]
    fn test_filled_flight_writes_readable_document() {
        let mut flight = sketch();
        flight.fill_in(&FillInConfig::default().with_parsers(true));
        let text = flight.to_string();

        let mut again = Flight::new("sketch", Catalog::in_memory(common::catalog()));
        again.deserialize_from_str(&text, None).unwrap();
        assert_eq!(again.to_string(), text);
        let seats = again
            .entity_definitions
            .get("vehicle")
            .unwrap()
            .property_definitions
            .get("ol.count")
            .unwrap();
        assert!(transforms::kinds_used(&seats.transforms).contains(&NodeKind::ParseInt));
    }
}
