//! Wiki shorthand for flights
//!
//! ```text
//! people [NCRICPeople] (general.person)
//! - ssn (nc.SubjectIdentification)
//!
//! people -> appearsin [NCRICAppearsIn] (ol.appearsin) -> vehicles
//! - id (ol.id)
//! ```

use super::association::AssociationDefinition;
use super::entity::EntityDefinition;
use super::property::PropertyDefinition;
use super::Flight;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;
use tracing::info;

static ENTITY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^\S+\s+\[\S+\]\s+\(\S+\))(?:\n-[^\n]+)+").unwrap());

static ASSOCIATION_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\S+\s+(?:->|→|-->)\s+\S+\s+\[\S+\]\s+\(\S+\)\s+(?:->|→|-->)\s+\S+(?:\n-[^\n]+)*")
        .unwrap()
});

static ENTITY_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+)\s+\[(\S+)\]\s+\((\S+)\)").unwrap());

static ASSOCIATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)\s+(?:->|→|-->)\s+(\S+)\s+\[(\S+)\]\s+\((\S+)\)\s+(?:->|→|-->)\s+(\S+)").unwrap()
});

static PROPERTY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s+(\S+)\s+\((\S+)\)").unwrap());

/// Property definitions listed under a header, keyed by property type
fn properties(block: &str) -> Vec<(String, PropertyDefinition)> {
    PROPERTY_LINE
        .captures_iter(block)
        .map(|caps| {
            let type_fqn = caps[2].to_string();
            let property = PropertyDefinition::new(type_fqn.clone()).with_column(&caps[1]);
            (type_fqn, property)
        })
        .collect()
}

impl Flight {
    /// Add the entities and associations written in wiki shorthand.
    ///
    /// Definitions are keyed by name. Each listed property reads one column.
    pub fn from_wiki(&mut self, text: &str) {
        for block in ENTITY_BLOCK.find_iter(text) {
            let block = block.as_str();
            let Some(header) = ENTITY_HEADER.captures(block) else {
                continue;
            };
            let mut definition = EntityDefinition::new(&header[1], &header[3], &header[2]);
            for (alias, property) in properties(block) {
                definition.property_definitions.insert(alias, property);
            }
            self.entity_definitions.insert(&header[1], definition);
        }

        for block in ASSOCIATION_BLOCK.find_iter(text) {
            let block = block.as_str();
            let Some(header) = ASSOCIATION_HEADER.captures(block) else {
                continue;
            };
            let mut definition = EntityDefinition::new(&header[2], &header[4], &header[3]);
            for (alias, property) in properties(block) {
                definition.property_definitions.insert(alias, property);
            }
            self.association_definitions.insert(
                &header[2],
                AssociationDefinition::new(definition, &header[1], &header[5]),
            );
        }

        self.refresh_schema();
        info!(
            "Read {} entities and {} associations from wiki shorthand",
            self.entity_definitions.len(),
            self.association_definitions.len()
        );
    }

    /// Render the flight in wiki shorthand. Properties computed from several
    /// columns list them comma separated.
    pub fn to_wiki(&self) -> String {
        let mut blocks = Vec::new();
        for (alias, definition) in self.entity_definitions.iter() {
            let mut block = format!(
                "{} [{}] ({})\n",
                alias, definition.entity_set_name, definition.fqn
            );
            write_properties(&mut block, definition);
            blocks.push(block);
        }
        for association in self.association_definitions.values() {
            let mut block = format!(
                "{} -> {} [{}] ({}) -> {}\n",
                association.src_alias,
                association.name,
                association.entity_set_name,
                association.fqn,
                association.dst_alias
            );
            write_properties(&mut block, association);
            blocks.push(block);
        }
        blocks.join("\n")
    }
}

fn write_properties(out: &mut String, definition: &EntityDefinition) {
    for property in definition.property_definitions.values() {
        let columns = match &property.column {
            Some(column) => column.clone(),
            None => property.get_columns().into_iter().collect::<Vec<_>>().join(","),
        };
        let _ = writeln!(out, "- {} ({})", columns, property.type_fqn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, InMemoryCatalog};
    use crate::transforms::Node;
    use std::sync::Arc;

    const WIKI: &str = "\
people [NCRICPeople] (general.person)
- ssn (nc.SubjectIdentification)
- first (nc.PersonGivenName)

vehicles [NCRICVehicles] (ol.vehicle)
- plate (ol.id)

people → appearsin [NCRICAppearsIn] (ol.appearsin) -> vehicles
- plate (ol.id)
";

    fn flight() -> Flight {
        Flight::new("wiki", Catalog::in_memory(Arc::new(InMemoryCatalog::new())))
    }

    #[test]
    fn test_from_wiki() {
        let mut flight = flight();
        flight.from_wiki(WIKI);
        assert_eq!(flight.entity_definitions.len(), 2);
        let people = flight.entity_definitions.get("people").unwrap();
        assert_eq!(people.entity_set_name, "NCRICPeople");
        assert_eq!(people.fqn, "general.person");
        assert_eq!(
            people.property_definitions.get("nc.PersonGivenName").unwrap().column.as_deref(),
            Some("first")
        );

        let association = flight.association_definitions.get("appearsin").unwrap();
        assert_eq!(association.src_alias, "people");
        assert_eq!(association.dst_alias, "vehicles");
        assert!(association.is_association());
        assert!(flight.schema().association_definitions.contains_key("appearsin"));
    }

    #[test]
    fn test_association_without_properties() {
        let mut flight = flight();
        flight.from_wiki("a --> knows [Knows] (ol.knows) --> b\n");
        assert!(flight.entity_definitions.is_empty());
        let association = flight.association_definitions.get("knows").unwrap();
        assert!(association.property_definitions.is_empty());
    }

    #[test]
    fn test_to_wiki_reads_back() {
        let mut flight = flight();
        flight.from_wiki(WIKI);
        let text = flight.to_wiki();
        assert!(text.contains("people [NCRICPeople] (general.person)\n- ssn (nc.SubjectIdentification)\n"));
        assert!(text.contains("\npeople -> appearsin [NCRICAppearsIn] (ol.appearsin) -> vehicles\n"));

        let mut again = Flight::new("wiki", Catalog::in_memory(Arc::new(InMemoryCatalog::new())));
        again.from_wiki(&text);
        assert_eq!(again.to_wiki(), text);
    }

    #[test]
    fn test_to_wiki_joins_transform_columns() {
        let mut flight = flight();
        flight.add_entity_definition(
            "people",
            EntityDefinition::new("people", "general.person", "People").with_property(
                "nc.SubjectIdentification",
                PropertyDefinition::new("nc.SubjectIdentification")
                    .with_transforms(vec![Node::hash(vec!["last".into(), "first".into()])]),
            ),
        );
        assert!(flight.to_wiki().contains("- first,last (nc.SubjectIdentification)"));
    }
}
