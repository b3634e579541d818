//! Flight functionality
//!
//! A flight maps the rows of one source table onto entities and associations
//! of the catalog's data model. This module holds the definitions, reads and
//! writes flight documents and the wiki shorthand, fills in omitted fields
//! and validates the result against the catalog.

pub mod association;
pub mod config;
pub mod deduce;
pub mod definitions;
pub mod document;
pub mod entity;
pub mod error;
pub mod fill_in;
pub mod property;
pub mod schema;
pub mod validate;
pub mod wiki;

pub use association::AssociationDefinition;
pub use config::{FillInConfig, ValidationConfig};
pub use deduce::FqnDeducer;
pub use definitions::DefinitionMap;
pub use entity::{EntityDefinition, EntitySetMemo};
pub use error::{FlightError, FlightResult};
pub use property::PropertyDefinition;
pub use schema::{DefinitionSchema, FlightSchema, PropertySchema, TreeSchema};

use crate::catalog::Catalog;
use crate::models::{Datatype, EntitySet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A complete flight: entity and association definitions keyed by alias
#[derive(Debug, Clone)]
pub struct Flight {
    pub name: String,
    pub organization_id: Option<Uuid>,
    pub entity_definitions: DefinitionMap<EntityDefinition>,
    pub association_definitions: DefinitionMap<AssociationDefinition>,
    pub config: ValidationConfig,
    catalog: Catalog,
    schema: FlightSchema,
}

impl Flight {
    pub fn new(name: impl Into<String>, catalog: Catalog) -> Self {
        Self {
            name: name.into(),
            organization_id: None,
            entity_definitions: DefinitionMap::new(),
            association_definitions: DefinitionMap::new(),
            config: ValidationConfig::default(),
            catalog,
            schema: FlightSchema::default(),
        }
    }

    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_organization_id(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn add_entity_definition(&mut self, alias: impl Into<String>, definition: EntityDefinition) {
        self.entity_definitions.insert(alias, definition);
    }

    pub fn add_association_definition(&mut self, alias: impl Into<String>, definition: AssociationDefinition) {
        self.association_definitions.insert(alias, definition);
    }

    /// Entity definitions, then association definitions, with their aliases
    pub fn all_definitions(&self) -> impl Iterator<Item = (&str, &EntityDefinition)> {
        self.entity_definitions.iter().chain(
            self.association_definitions
                .iter()
                .map(|(alias, association)| (alias, &association.definition)),
        )
    }

    /// Alias of the entity definition an association endpoint refers to.
    ///
    /// `name` matches an alias whose definition has no name or the same
    /// name, otherwise the first definition with that name.
    pub fn entity_alias_by_name(&self, name: &str) -> Option<&str> {
        if let Some(definition) = self.entity_definitions.get(name) {
            if definition.name.is_empty() || definition.name == name {
                return self.entity_definitions.keys().find(|alias| *alias == name);
            }
        }
        self.entity_definitions
            .iter()
            .find(|(_, definition)| definition.name == name)
            .map(|(alias, _)| alias)
    }

    /// Look up an entity definition by alias, then by name
    pub fn get_entity_definition_by_name(&self, name: &str) -> Option<&EntityDefinition> {
        self.entity_alias_by_name(name)
            .and_then(|alias| self.entity_definitions.get(alias))
    }

    /// Entity definitions writing the entity type `fqn`
    pub fn get_entity(&self, fqn: &str) -> Vec<&EntityDefinition> {
        self.entity_definitions
            .values()
            .filter(|definition| definition.fqn == fqn)
            .collect()
    }

    /// Recompute the schema snapshot from the current definitions
    pub fn refresh_schema(&mut self) {
        let tag = |mut schema: DefinitionSchema| {
            schema.flight = self.name.clone();
            schema
        };
        let schema = FlightSchema {
            entity_definitions: self
                .entity_definitions
                .iter()
                .map(|(alias, definition)| (alias.to_string(), tag(definition.get_schema())))
                .collect(),
            association_definitions: self
                .association_definitions
                .iter()
                .map(|(alias, definition)| (alias.to_string(), tag(definition.get_schema())))
                .collect(),
        };
        self.schema = schema;
    }

    /// Schema snapshot as of the last refresh
    pub fn schema(&self) -> &FlightSchema {
        &self.schema
    }

    /// Remove `column` from every definition.
    ///
    /// Definitions that lose their primary key are dropped, and so are the
    /// associations of dropped entities. Returns whether no entity definition
    /// is left.
    pub fn delete_column(&mut self, column: &str) -> bool {
        let edm = Arc::clone(&self.catalog.edm);
        let mut dropped = Vec::new();
        for (alias, definition) in self.entity_definitions.iter_mut() {
            if definition.delete_column(edm.as_ref(), column) {
                dropped.push(alias.to_string());
            }
        }
        for alias in &dropped {
            info!("Dropping entity definition {} after deleting column {}", alias, column);
            self.delete_entity_definition(alias);
        }
        self.association_definitions
            .retain(|_, association| !association.delete_column(edm.as_ref(), column));
        self.refresh_schema();
        self.entity_definitions.is_empty()
    }

    /// Remove an entity definition, by alias or name, and every association
    /// touching it. Returns whether anything was removed.
    pub fn delete_entity_definition(&mut self, name: &str) -> bool {
        let mut real_name = name.to_string();
        let removed = match self.entity_definitions.remove(name) {
            Some(definition) => {
                if !definition.name.is_empty() {
                    real_name = definition.name;
                }
                true
            }
            None => {
                let alias = self
                    .entity_definitions
                    .iter()
                    .filter(|(_, definition)| definition.name == name)
                    .map(|(alias, _)| alias.to_string())
                    .last();
                alias
                    .and_then(|alias| self.entity_definitions.remove(&alias))
                    .is_some()
            }
        };

        let before = self.association_definitions.len();
        self.association_definitions.retain(|alias, association| {
            !(association.src_alias == real_name
                || association.dst_alias == real_name
                || alias == name
                || association.name == name)
        });
        removed || self.association_definitions.len() != before
    }

    /// Every column read anywhere in the flight
    pub fn get_all_columns(&self) -> BTreeSet<String> {
        self.all_definitions()
            .flat_map(|(_, definition)| definition.get_columns())
            .collect()
    }

    /// One entity set per distinct entity set name.
    ///
    /// Titles are the name with `remove_prefix` removed and wrapped in
    /// `add_prefix` and `add_suffix`. Fails when one entity set name is used
    /// with two fqns.
    pub fn get_all_entity_sets(
        &self,
        remove_prefix: &str,
        add_prefix: &str,
        add_suffix: &str,
        contacts: &[String],
    ) -> FlightResult<Vec<EntitySet>> {
        let edm = self.catalog.edm.as_ref();
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        let mut out = Vec::new();
        for (_, definition) in self.all_definitions() {
            match seen.get(definition.entity_set_name.as_str()) {
                Some(fqn) if *fqn != definition.fqn => {
                    return Err(FlightError::ConflictingEntitySet(definition.entity_set_name.clone()));
                }
                Some(_) => continue,
                None => {}
            }
            seen.insert(&definition.entity_set_name, &definition.fqn);
            let trimmed = if remove_prefix.is_empty() {
                definition.entity_set_name.clone()
            } else {
                definition.entity_set_name.replace(remove_prefix, "")
            };
            let mut entity_set = EntitySet::new(
                definition.entity_set_name.clone(),
                definition.entity_type(edm).id,
            );
            entity_set.title = format!("{}{}{}", add_prefix, trimmed, add_suffix);
            entity_set.organization_id = self.organization_id;
            entity_set.contacts = contacts.to_vec();
            out.push(entity_set);
        }
        Ok(out)
    }

    /// Datatype of every property type used, keyed by fqn.
    ///
    /// Property types the catalog cannot resolve map to `None`.
    pub fn get_datatypes(&self) -> BTreeMap<String, Option<Datatype>> {
        let edm = self.catalog.edm.as_ref();
        self.all_definitions()
            .flat_map(|(_, definition)| definition.property_definitions.values())
            .map(|property| {
                (
                    property.type_fqn.clone(),
                    property.property_type(edm).datatype.clone(),
                )
            })
            .collect()
    }

    /// Distinct datatypes written from each directly mapped column
    fn datatypes_per_column(&self) -> BTreeMap<String, BTreeSet<Datatype>> {
        let edm = self.catalog.edm.as_ref();
        let mut out: BTreeMap<String, BTreeSet<Datatype>> = BTreeMap::new();
        for (_, definition) in self.all_definitions() {
            for property in definition.property_definitions.values() {
                let (Some(column), Some(datatype)) =
                    (&property.column, &property.property_type(edm).datatype)
                else {
                    continue;
                };
                out.entry(column.clone()).or_default().insert(datatype.clone());
            }
        }
        out
    }

    /// The datatype each directly mapped column is written as.
    ///
    /// A column written as several datatypes resolves to its only non-String
    /// datatype; columns with more than one are left out, see
    /// [`Flight::datatype_conflicts`].
    pub fn get_datatypes_by_column(&self) -> BTreeMap<String, Datatype> {
        self.datatypes_per_column()
            .into_iter()
            .filter_map(|(column, datatypes)| {
                let non_string: Vec<&Datatype> = datatypes.iter().filter(|d| !d.is_string()).collect();
                let resolved = match non_string.as_slice() {
                    [] => Some(Datatype::String),
                    [only] => Some((*only).clone()),
                    _ => None,
                };
                resolved.map(|datatype| (column, datatype))
            })
            .collect()
    }

    /// Columns written as more than one non-String datatype
    pub fn datatype_conflicts(&self) -> BTreeMap<String, BTreeSet<Datatype>> {
        self.datatypes_per_column()
            .into_iter()
            .filter(|(_, datatypes)| datatypes.iter().filter(|d| !d.is_string()).count() > 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    fn catalog() -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        catalog.add_property_type("nc.SubjectIdentification", Datatype::String);
        catalog.add_property_type("ol.id", Datatype::String);
        catalog.add_property_type("ol.count", Datatype::Int64);
        catalog.add_property_type("ol.amount", Datatype::Double);
        catalog.add_entity_type("general.person", &["nc.SubjectIdentification"], &["ol.count"]);
        catalog.add_entity_type("ol.vehicle", &["ol.id"], &["ol.count"]);
        Arc::new(catalog)
    }

    fn flight() -> Flight {
        let mut flight = Flight::new("demo", Catalog::in_memory(catalog()));
        flight.add_entity_definition(
            "people",
            EntityDefinition::new("people", "general.person", "People")
                .with_property("nc.SubjectIdentification", PropertyDefinition::new("nc.SubjectIdentification").with_column("ssn")),
        );
        flight.add_entity_definition(
            "cars",
            EntityDefinition::new("vehicles", "ol.vehicle", "Cars")
                .with_property("ol.id", PropertyDefinition::new("ol.id").with_column("plate"))
                .with_property("ol.count", PropertyDefinition::new("ol.count").with_column("n")),
        );
        flight.add_association_definition(
            "owns",
            AssociationDefinition::new(EntityDefinition::new("owns", "ol.owns", "Owns"), "people", "vehicles"),
        );
        flight
    }

    #[test]
    fn test_lookup_by_alias_then_name() {
        let flight = flight();
        assert_eq!(flight.entity_alias_by_name("people"), Some("people"));
        assert_eq!(flight.entity_alias_by_name("vehicles"), Some("cars"));
        // alias whose definition carries a different name
        assert!(flight.get_entity_definition_by_name("cars").is_none());
        assert_eq!(flight.get_entity("ol.vehicle").len(), 1);
    }

    #[test]
    fn test_delete_entity_definition_drops_associations() {
        let mut flight = flight();
        assert!(flight.delete_entity_definition("cars"));
        assert!(flight.association_definitions.is_empty());
        assert_eq!(flight.entity_definitions.len(), 1);
    }

    #[test]
    fn test_delete_column_drops_keyless_definitions() {
        let mut flight = flight();
        assert!(!flight.delete_column("ssn"));
        assert!(!flight.entity_definitions.contains_key("people"));
        assert!(flight.association_definitions.is_empty());
        assert!(!flight.schema().entity_definitions.contains_key("people"));
    }

    #[test]
    fn test_all_columns_and_schema() {
        let mut flight = flight();
        flight.refresh_schema();
        let columns: Vec<String> = flight.get_all_columns().into_iter().collect();
        assert_eq!(columns, vec!["n", "plate", "ssn"]);
        assert_eq!(flight.schema().association_definitions["owns"].src.as_deref(), Some("people"));
        assert_eq!(flight.schema().entity_definitions["cars"].flight, "demo");
    }

    #[test]
    fn test_get_all_entity_sets() {
        let mut flight = flight();
        let sets = flight.get_all_entity_sets("", "Demo ", "", &["me@example.com".to_string()]).unwrap();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].title, "Demo People");
        assert_eq!(sets[0].entity_type_id, InMemoryCatalog::type_id("general.person"));

        flight.add_entity_definition("other", EntityDefinition::new("other", "ol.vehicle", "People"));
        let err = flight.get_all_entity_sets("", "", "", &[]).unwrap_err();
        assert!(matches!(err, FlightError::ConflictingEntitySet(name) if name == "People"));
    }

    #[test]
    fn test_datatypes_by_column() {
        let mut flight = flight();
        flight.add_entity_definition(
            "tally",
            EntityDefinition::new("tally", "ol.vehicle", "Tally")
                .with_property("ol.id", PropertyDefinition::new("ol.id").with_column("n"))
                .with_property("ol.amount", PropertyDefinition::new("ol.amount").with_column("plate")),
        );
        let by_column = flight.get_datatypes_by_column();
        assert_eq!(by_column["n"], Datatype::Int64);
        assert_eq!(by_column["ssn"], Datatype::String);
        assert_eq!(by_column["plate"], Datatype::Double);
        assert!(flight.datatype_conflicts().is_empty());

        flight.add_entity_definition(
            "clash",
            EntityDefinition::new("clash", "ol.vehicle", "Clash")
                .with_property("ol.amount", PropertyDefinition::new("ol.amount").with_column("n")),
        );
        assert!(!flight.get_datatypes_by_column().contains_key("n"));
        assert!(flight.datatype_conflicts().contains_key("n"));
        assert_eq!(flight.get_datatypes()["ol.count"], Some(Datatype::Int64));
    }
}
