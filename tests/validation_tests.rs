//! Validation tests against the in-memory catalog

mod common;

use flight_sdk::catalog::Warehouse;
use flight_sdk::transforms::{Arg, Node, NodeKind};
use flight_sdk::{
    AssociationDefinition, CatalogError, EntityDefinition, LogLevel, PropertyDefinition, ValidationConfig,
};
use std::collections::BTreeMap;

struct Table(BTreeMap<String, String>);

impl Warehouse for Table {
    fn get_datatypes(&self, table: &str) -> Result<BTreeMap<String, String>, CatalogError> {
        match table {
            "offline" => Err(CatalogError::Network("connection refused".to_string())),
            "stops" => Ok(self.0.clone()),
            _ => Ok(BTreeMap::new()),
        }
    }
}

fn stops_table() -> Table {
    Table(
        [("ssn", "text"), ("first", "text"), ("plate", "character varying"), ("seats", "text")]
            .into_iter()
            .map(|(c, t)| (c.to_string(), t.to_string()))
            .collect(),
    )
}

mod flight_validation_tests {
    use super::*;

    #[test]
    fn test_valid_flight_passes() {
        let flight = common::flight();
        let report = flight.flight_validation(Some("stops"), Some(&stops_table()));
        assert!(report.validated, "{}", report);
        assert!(report.all_issues().iter().all(|issue| !issue.contains("doesn't exist")));
    }

    #[test]
    fn test_report_prints_tree() {
        let flight = common::flight();
        let report = flight.red_flags_validation();
        let text = report.to_string();
        assert!(text.contains("Misc. Red Flags that Aren't Necessarily Errors in Flight demo"));
        assert!(text.contains("Graph Connectivity for Flight demo"));
    }

    #[test]
    fn test_datasource_required_for_people() {
        let mut flight = common::flight();
        flight.entity_definitions.get_mut("people").unwrap().property_definitions.remove("ol.datasource");
        let report = flight.datasource_validation();
        assert_eq!(report.issues, vec!["Entity definition people needs a datasource."]);
        assert!(!flight.red_flags_validation().validated);
    }

    #[test]
    fn test_unknown_source_entity() {
        let mut flight = common::flight();
        flight.association_definitions.get_mut("appearsin").unwrap().src_alias = "drivers".to_string();
        let report = flight.source_destination_validation();
        assert!(report.issues.contains(&"Source entity drivers doesn't exist.".to_string()));
        assert!(!report.validated);
    }

    #[test]
    fn test_missing_timezone() {
        let mut flight = common::flight();
        let when = Node::new(NodeKind::DateTime)
            .with_arg("column", Arg::Column("seen_at".into()))
            .with_arg("pattern", Arg::List(vec!["yyyy-MM-dd HH:mm:ss".into()]));
        flight.association_definitions.get_mut("appearsin").unwrap().property_definitions.insert(
            "general.datetime",
            PropertyDefinition::new("general.datetime").with_transforms(vec![when]),
        );
        let report = flight.parsers_validation();
        assert_eq!(
            report.issues,
            vec!["In entity definition appearsin: In property general.datetime: No timezone"]
        );
        // no timezone argument, so nothing to flag as deprecated
        assert!(flight.datetime_timezone_validation().validated);
    }

    #[test]
    fn test_duplicate_association_reported_once() {
        let mut flight = common::flight();
        let copy = flight.association_definitions.get("appearsin").unwrap().clone();
        flight.add_association_definition("appearsin2", copy);

        let report = flight.check_edges_edm();
        assert!(!report.validated);
        let unique = &report.sub_reports[2];
        assert_eq!(unique.title, "Check if edges are uniquely defined");
        assert_eq!(
            unique.issues,
            vec!["There are multiple associations to wire ol.appearsin --> people --> vehicles"]
        );
        assert_eq!(
            flight.unique_names_validation().issues,
            vec!["There are many entity/association definitions with name appearsin."]
        );
    }
}

mod entity_validation_tests {
    use super::*;

    #[test]
    fn test_delete_key_column() {
        let catalog = common::catalog();
        let mut definition = EntityDefinition::new("people", "general.person", "People").with_property(
            "nc.SubjectIdentification",
            PropertyDefinition::new("nc.SubjectIdentification")
                .with_transforms(vec![Node::concat(vec!["ssn".into()], None)]),
        );
        assert!(definition.delete_column(catalog.as_ref(), "ssn"));
        assert!(definition.property_definitions.is_empty());
    }

    #[test]
    fn test_delete_other_column_keeps_key() {
        let catalog = common::catalog();
        let mut definition = EntityDefinition::new("people", "general.person", "People")
            .with_property("nc.SubjectIdentification", PropertyDefinition::new("nc.SubjectIdentification").with_column("ssn"))
            .with_property("nc.PersonGivenName", PropertyDefinition::new("nc.PersonGivenName").with_column("first"));
        assert!(!definition.delete_column(catalog.as_ref(), "first"));
        assert_eq!(definition.property_definitions.len(), 1);
    }

    #[test]
    fn test_association_needs_endpoints() {
        let association = AssociationDefinition::new(
            EntityDefinition::new("appearsin", "ol.appearsin", "AppearsIn")
                .with_property("ol.id", PropertyDefinition::new("ol.id").with_column("plate")),
            "people",
            "",
        );
        let report = association.necessary_components_validation(LogLevel::None);
        assert!(!report.validated);
        assert_eq!(report.all_issues(), vec!["Destination not defined."]);
    }
}

mod warehouse_tests {
    use super::*;

    #[test]
    fn test_matching_table() {
        let flight = common::flight();
        let report = flight.warehouse_validation(Some("stops"), &stops_table());
        assert!(report.validated, "{}", report);
        assert_eq!(report.sub_reports.len(), 3);
    }

    #[test]
    fn test_unreachable_and_absent_tables() {
        let flight = common::flight();
        let report = flight.warehouse_validation(Some("offline"), &stops_table());
        assert!(!report.validated);
        assert!(report.sub_reports[0].issues[0].starts_with("Could not read table offline"));

        let report = flight.warehouse_validation(Some("archive"), &stops_table());
        assert_eq!(report.sub_reports[0].issues, vec!["The table archive does not exist."]);
    }

    #[test]
    fn test_missing_columns() {
        let flight = common::flight();
        let mut table = stops_table();
        table.0.remove("first");
        let report = flight.warehouse_validation(Some("stops"), &table);
        assert_eq!(
            report.sub_reports[1].issues,
            vec!["The following columns are missing from the table: first"]
        );
    }
}

mod proofread_tests {
    use super::*;

    #[test]
    fn test_proofread_creates_entity_sets() {
        let mut flight = common::flight()
            .with_config(ValidationConfig::new().with_log_level(LogLevel::None));
        flight.entity_definitions.get_mut("vehicles").unwrap().entity_set_name = "Cars".to_string();

        let columns = vec!["ssn".to_string(), "first".to_string(), "plate".to_string(), "seats".to_string()];
        let report = flight.proofread(Some(&columns), true, &[]);
        assert!(!report.validated);
        assert_eq!(
            report.sub_reports[1].sub_reports[0].issues,
            vec!["The entity set Cars doesn't exist."]
        );

        let report = flight.proofread(Some(&columns), true, &["analyst@example.com".to_string()]);
        assert!(report.validated, "{}", report);
        assert!(flight.entity_sets_validation().validated);
    }

    #[test]
    fn test_registering_endpoints() {
        let mut flight = common::flight();
        flight.entity_definitions.insert(
            "owners",
            EntityDefinition::new("owners", "general.person", "People").with_property(
                "nc.SubjectIdentification",
                PropertyDefinition::new("nc.SubjectIdentification").with_column("owner"),
            ),
        );
        flight.association_definitions.get_mut("appearsin").unwrap().dst_alias = "owners".to_string();
        assert!(!flight.source_destination_validation().validated);

        flight.add_src_dst_to_edm().unwrap();
        assert!(flight.source_destination_validation().validated);
        assert!(flight.add_and_check_edm().validated);
    }
}
