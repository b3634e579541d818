//! Flight document and wiki tests

mod common;

use flight_sdk::{Catalog, Flight, FlightError};
use std::io::Write;
use uuid::Uuid;

mod document_tests {
    use super::*;

    #[test]
    fn test_deserialize_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(common::DOCUMENT.as_bytes()).unwrap();

        let mut flight = Flight::new("demo", Catalog::in_memory(common::catalog()));
        flight.deserialize(file.path(), None).unwrap();

        assert_eq!(flight.organization_id, Some(Uuid::parse_str(common::ORG).unwrap()));
        assert_eq!(flight.entity_definitions.len(), 2);
        assert_eq!(flight.association_definitions.len(), 1);
        let association = flight.association_definitions.get("appearsin").unwrap();
        assert_eq!(association.src_alias, "people");
        assert_eq!(association.dst_alias, "vehicles");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut flight = Flight::new("demo", Catalog::in_memory(common::catalog()));
        let err = flight.deserialize(dir.path().join("absent.yaml"), None).unwrap_err();
        assert!(matches!(err, FlightError::FileRead { .. }));
    }

    #[test]
    fn test_written_document_reads_back() {
        let flight = common::flight();
        let text = flight.to_string();
        assert!(text.starts_with(&format!("organizationId: \"{}\"\n", common::ORG)));

        let mut again = Flight::new("demo", Catalog::in_memory(common::catalog()));
        again.deserialize_from_str(&text, None).unwrap();
        assert_eq!(again.to_string(), text);
        assert_eq!(again.get_all_columns(), flight.get_all_columns());
    }

    #[test]
    fn test_schema_tracks_edits() {
        let mut flight = common::flight();
        assert!(flight.schema().entity_definitions.contains_key("people"));

        assert!(flight.delete_entity_definition("vehicles"));
        assert!(!flight.schema().entity_definitions.contains_key("vehicles"));
        assert!(flight.association_definitions.is_empty());
    }

    #[test]
    fn test_delete_column_drops_dependents() {
        let mut flight = common::flight();
        let emptied = flight.delete_column("plate");
        assert!(!emptied);
        assert!(!flight.get_all_columns().contains("plate"));
        assert!(flight.entity_definitions.contains_key("people"));
        // vehicles lost their key, and the association went with them
        assert!(!flight.entity_definitions.contains_key("vehicles"));
        assert!(flight.association_definitions.is_empty());
    }

    #[test]
    fn test_columns_and_datatypes() {
        let flight = common::flight();
        let columns: Vec<String> = flight.get_all_columns().into_iter().collect();
        assert_eq!(columns, vec!["first", "plate", "seats", "ssn"]);
        assert!(flight.datatype_conflicts().is_empty());
    }
}

mod wiki_tests {
    use super::*;

    #[test]
    fn test_wiki_from_document() {
        let flight = common::flight();
        let wiki = flight.to_wiki();
        assert!(wiki.starts_with("people [People] (general.person)\n- ssn (nc.SubjectIdentification)\n"));
        assert!(wiki.contains("- seats (ol.count)\n"));
        assert!(wiki.contains("people -> appearsin [AppearsIn] (ol.appearsin) -> vehicles\n- plate,ssn (ol.id)\n"));
    }

    #[test]
    fn test_wiki_into_fresh_flight() {
        let wiki = common::flight().to_wiki();
        let mut flight = Flight::new("wiki", Catalog::in_memory(common::catalog()));
        flight.from_wiki(&wiki);

        assert_eq!(flight.entity_definitions.len(), 2);
        let people = flight.get_entity_definition_by_name("people").unwrap();
        assert_eq!(people.entity_set_name, "People");
        assert_eq!(flight.get_entity("ol.vehicle").len(), 1);
        assert!(flight.association_definitions.contains_key("appearsin"));
    }
}
