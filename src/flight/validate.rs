//! Flight-wide validations
//!
//! Each check returns a [`ValidationReport`] and logs its outcome at the
//! flight's configured level. Definition-level checks called from here run
//! silently and are folded into the flight-level report.

use super::entity::{common_prefix, EntitySetMemo};
use super::error::{FlightError, FlightResult};
use super::Flight;
use crate::catalog::Warehouse;
use crate::models::EntitySet;
use crate::transforms;
use crate::validation::{LogLevel, ValidationReport};
use once_cell::sync::Lazy;
use petgraph::graph::NodeIndex;
use petgraph::{Graph, Undirected};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

static DATE_TRANSFORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"Date[a-zA-Z]*Transform").unwrap());

impl Flight {
    fn title_for(&self, title: &str) -> String {
        if self.name.is_empty() {
            title.to_string()
        } else {
            format!("{} for Flight {}", title, self.name)
        }
    }

    fn title_in(&self, title: &str) -> String {
        if self.name.is_empty() {
            title.to_string()
        } else {
            format!("{} in Flight {}", title, self.name)
        }
    }

    fn finish(&self, mut report: ValidationReport) -> ValidationReport {
        report.validate();
        report.print_status(self.config.log_level);
        report
    }

    /// The organization id, at least one entity definition and the
    /// necessary components of every definition
    pub fn necessary_components_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Necessary Components Defined Validation"));
        if self.organization_id.is_none() {
            report.fail("Add missing organizationId.");
        }
        if self.entity_definitions.is_empty() {
            report.fail("This flight has no entity definitions.");
        }

        let entity_reports = self
            .entity_definitions
            .iter()
            .map(|(key, definition)| (key, definition.necessary_components_validation(LogLevel::None)));
        let association_reports = self
            .association_definitions
            .iter()
            .map(|(key, definition)| (key, definition.necessary_components_validation(LogLevel::None)));
        for (key, sub) in entity_reports.chain(association_reports) {
            if !sub.validated {
                for issue in sub.all_issues() {
                    report.fail(format!("In entity definition {}: {}", key, issue));
                }
            }
        }
        self.finish(report)
    }

    pub fn unique_names_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Unique Names Validation"));
        let mut seen = BTreeSet::new();
        for (_, definition) in self.all_definitions() {
            if !seen.insert(definition.name.as_str()) {
                report.fail(format!(
                    "There are many entity/association definitions with name {}.",
                    definition.name
                ));
            }
        }
        self.finish(report)
    }

    /// Association endpoints exist and are allowed by the association type
    pub fn source_destination_validation(&self) -> ValidationReport {
        let edm = self.catalog().edm.as_ref();
        let mut report = ValidationReport::new(self.title_for("Source and Destination Validation"));
        report.note("Consider calling flight.add_src_dst_to_edm() with the current flight instance.");

        for association in self.association_definitions.values() {
            let src = self.get_entity_definition_by_name(&association.src_alias);
            let dst = self.get_entity_definition_by_name(&association.dst_alias);
            if src.is_none() {
                report.fail(format!("Source entity {} doesn't exist.", association.src_alias));
            }
            if dst.is_none() {
                report.fail(format!("Destination entity {} doesn't exist.", association.dst_alias));
            }
            let (Some(src), Some(dst)) = (src, dst) else {
                continue;
            };
            let association_type = association.association_type(edm);
            if !association_type.src.contains(&src.entity_type(edm).id) {
                report.fail(format!("{} doesn't have {} in its sources.", association.fqn, src.fqn));
            }
            if !association_type.dst.contains(&dst.entity_type(edm).id) {
                report.fail(format!(
                    "{} doesn't have {} in its destinations.",
                    association.fqn, dst.fqn
                ));
            }
        }
        self.finish(report)
    }

    /// Every fqn exists in the catalog, plus the endpoint check
    pub fn edm_validation(&self) -> ValidationReport {
        let edm = self.catalog().edm.as_ref();
        let mut report = ValidationReport::new(self.title_for("EDM Validation"));
        for (key, definition) in self.all_definitions() {
            let sub = definition.fqn_validation(edm, LogLevel::None);
            if !sub.validated {
                for issue in &sub.issues {
                    report.fail(format!("In entity definition {}: {}", key, issue));
                }
            }
        }
        report.push(self.source_destination_validation());
        self.finish(report)
    }

    pub fn parsers_validation(&self) -> ValidationReport {
        let edm = self.catalog().edm.as_ref();
        let mut report = ValidationReport::new(self.title_for("Parsers Validation"));
        for (key, definition) in self.all_definitions() {
            let sub = definition.parsers_validation(edm, LogLevel::None);
            if !sub.validated {
                for issue in &sub.issues {
                    report.fail(format!("In entity definition {}: {}", key, issue));
                }
            }
        }
        self.finish(report)
    }

    /// Columns are written as one datatype each and every property parses
    /// its values into its datatype
    pub fn datatypes_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Datatypes Validation"));
        for (column, datatypes) in self.datatype_conflicts() {
            let names: Vec<&str> = datatypes.iter().map(|d| d.as_str()).collect();
            report.fail(format!("Column {} is expected to be: {}.", column, names.join(", ")));
        }
        report.push(self.parsers_validation());
        self.finish(report)
    }

    /// Flags date transforms carrying a `timezone` argument
    pub fn datetime_timezone_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("DatetimeTransform Time Zone Validation"));
        for (key, definition) in self.all_definitions() {
            for (alias, property) in definition.property_definitions.iter() {
                let dated = transforms::kinds_used(&property.transforms)
                    .iter()
                    .any(|kind| DATE_TRANSFORM.is_match(kind.name()));
                if dated && transforms::timezone_present(&property.transforms) {
                    report.fail(format!(
                        "In {}, {} is using a Date*Transform with timezone argument. \
                         This is deprecated and will not have the desired behavior.",
                        key, alias
                    ));
                }
            }
        }
        self.finish(report)
    }

    /// Entity sets exist and hold the entity types written to them
    pub fn entity_sets_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Entity Sets Validation"));
        let mut memo = EntitySetMemo::new();
        for (_, definition) in self.all_definitions() {
            let sub = definition.entity_set_validation(
                self.catalog(),
                &mut memo,
                self.config.overlap_threshold,
                LogLevel::None,
            );
            if !sub.validated {
                for issue in sub.issues {
                    report.fail(issue);
                }
            }
        }
        self.finish(report)
    }

    /// Compare the columns the flight reads with the live source table
    pub fn warehouse_validation(&self, table_name: Option<&str>, warehouse: &dyn Warehouse) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Warehouse Validation"));
        let Some(table_name) = table_name.filter(|t| !t.is_empty()) else {
            report.fail("No table name given.");
            return self.finish(report);
        };

        let mut exists = ValidationReport::new("Check if table exists.");
        let table = match warehouse.get_datatypes(table_name) {
            Ok(table) => table,
            Err(e) => {
                warn!("Could not read table {}: {}", table_name, e);
                exists.fail(format!("Could not read table {}: {}", table_name, e));
                Default::default()
            }
        };
        if exists.validated && table.is_empty() {
            exists.fail(format!("The table {} does not exist.", table_name));
        }
        exists.print_status(self.config.log_level);
        let table_found = exists.validated;
        report.push(exists);
        if !table_found {
            return self.finish(report);
        }

        let missing: Vec<String> = self
            .get_all_columns()
            .into_iter()
            .filter(|column| !table.contains_key(column))
            .collect();
        let mut missing_report = ValidationReport::new("Missing columns");
        if !missing.is_empty() {
            missing_report.fail(format!(
                "The following columns are missing from the table: {}",
                missing.join(", ")
            ));
        }
        missing_report.print_status(self.config.log_level);
        report.push(missing_report);

        let mut mismatches = ValidationReport::new("Mismatching data types");
        for (column, datatype) in self.get_datatypes_by_column() {
            let Some(current) = table.get(&column) else {
                continue;
            };
            let required = datatype.warehouse_types();
            if !required.is_empty() && !required.contains(&current.as_str()) {
                mismatches.fail(format!(
                    "Column \"{}\" is of type \"{}\" but should be: \"{}\"",
                    column,
                    current,
                    required.join(", ")
                ));
            }
        }
        mismatches.print_status(self.config.log_level);
        report.push(mismatches);
        self.finish(report)
    }

    /// Every column the flight reads is among `table_columns`
    pub fn columns_validation(&self, table_columns: &[String]) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Columns Validation"));
        let used = self.get_all_columns();
        let available: BTreeSet<&str> = table_columns.iter().map(String::as_str).collect();
        let unknown: Vec<&str> = used
            .iter()
            .map(String::as_str)
            .filter(|column| !available.contains(column))
            .collect();
        if !unknown.is_empty() {
            report.fail(format!("These columns don't exist: {}", unknown.join(", ")));
        }
        let unused: Vec<&str> = available
            .iter()
            .copied()
            .filter(|column| !used.contains(*column))
            .collect();
        let used: Vec<&str> = used.iter().map(String::as_str).collect();
        report.note(format!("{} columns used: {}", used.len(), used.join(", ")));
        report.note(format!("{} columns not used: {}", unused.len(), unused.join(", ")));
        self.finish(report)
    }

    /// Every entity is linked by an association and every association
    /// endpoint names an entity
    pub fn graph_connectivity_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Graph Connectivity"));

        let mut graph = Graph::<&str, &str, Undirected>::new_undirected();
        let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();
        let entity_names: BTreeSet<&str> = self
            .entity_definitions
            .iter()
            .map(|(alias, definition)| {
                if definition.name.is_empty() { alias } else { definition.name.as_str() }
            })
            .collect();
        for name in entity_names.iter().copied() {
            node_map.entry(name).or_insert_with(|| graph.add_node(name));
        }
        let mut endpoints = BTreeSet::new();
        for association in self.association_definitions.values() {
            let src = association.src_alias.as_str();
            let dst = association.dst_alias.as_str();
            endpoints.insert(src);
            endpoints.insert(dst);
            let src_node = *node_map.entry(src).or_insert_with(|| graph.add_node(src));
            let dst_node = *node_map.entry(dst).or_insert_with(|| graph.add_node(dst));
            graph.add_edge(src_node, dst_node, association.name.as_str());
        }

        let unlinked: Vec<&str> = entity_names.difference(&endpoints).copied().collect();
        if !unlinked.is_empty() {
            report.fail(format!(
                "The following entity sets are not linked to anything: {}",
                unlinked.join(", ")
            ));
        }
        let unknown: Vec<&str> = endpoints.difference(&entity_names).copied().collect();
        if !unknown.is_empty() {
            report.fail(format!(
                "The following entity sets are not correctly referenced in their association: {}",
                unknown.join(", ")
            ));
        }
        let components = petgraph::algo::connected_components(&graph);
        report.note(format!("The flight graph has {} connected components.", components));
        self.finish(report)
    }

    /// Aliases match names and property aliases match property types
    pub fn consistent_names_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_in("Double Check Name Inconsistencies"));
        for (alias, definition) in self.all_definitions() {
            if alias != definition.name {
                report.fail(format!(
                    "Entity alias '{}' doesn't match its name '{}'.",
                    alias, definition.name
                ));
            }
            for (property_alias, property) in definition.property_definitions.iter() {
                if property_alias != property.type_fqn {
                    report.fail(format!(
                        "Property alias '{}' doesn't match its type '{}'.",
                        property_alias, property.type_fqn
                    ));
                }
            }
        }
        self.finish(report)
    }

    /// Person entities record their datasource
    pub fn datasource_validation(&self) -> ValidationReport {
        let mut report = ValidationReport::new(self.title_for("Datasource Validation"));
        for definition in self.entity_definitions.values() {
            if definition.fqn != self.config.person_fqn {
                continue;
            }
            let has_datasource = definition
                .property_definitions
                .values()
                .any(|p| p.type_fqn == self.config.datasource_fqn);
            if !has_datasource {
                report.fail(format!("Entity definition {} needs a datasource.", definition.name));
            }
        }
        self.finish(report)
    }

    /// Checks whose failures deserve a look but need not block a run
    pub fn red_flags_validation(&self) -> ValidationReport {
        let report = ValidationReport::new(self.title_in("Misc. Red Flags that Aren't Necessarily Errors"))
            .with_sub_reports(vec![
                self.graph_connectivity_validation(),
                self.consistent_names_validation(),
                self.datasource_validation(),
                self.datetime_timezone_validation(),
            ]);
        self.finish(report)
    }

    /// Whether the flight is ready to run. The warehouse check only runs
    /// when a warehouse is given.
    pub fn final_pre_launch_validation(
        &self,
        table_name: Option<&str>,
        warehouse: Option<&dyn Warehouse>,
    ) -> ValidationReport {
        let mut subs = vec![self.edm_validation()];
        if let Some(warehouse) = warehouse {
            subs.push(self.warehouse_validation(table_name, warehouse));
        }
        subs.extend([
            self.entity_sets_validation(),
            self.necessary_components_validation(),
            self.unique_names_validation(),
            self.datatypes_validation(),
        ]);
        let report = ValidationReport::new(self.title_for("Final Pre-launch Validation")).with_sub_reports(subs);
        self.finish(report)
    }

    /// Pre-launch checks plus red flags
    pub fn flight_validation(&self, table_name: Option<&str>, warehouse: Option<&dyn Warehouse>) -> ValidationReport {
        let title = if self.name.is_empty() {
            "Flight Validation".to_string()
        } else {
            format!("Flight Validation for {}", self.name)
        };
        let report = ValidationReport::new(title).with_sub_reports(vec![
            self.final_pre_launch_validation(table_name, warehouse),
            self.red_flags_validation(),
        ]);
        self.finish(report)
    }

    /// Association endpoints are defined, allowed by the catalog and wired
    /// only once per association type
    pub fn check_edges_edm(&self) -> ValidationReport {
        let edm = self.catalog().edm.as_ref();
        let mut defined = ValidationReport::new("Check if sources and destinations are defined");
        let mut allowed = ValidationReport::new("Check if sources and destinations are allowed in the EDM");
        let mut unique = ValidationReport::new("Check if edges are uniquely defined");

        let mut seen = BTreeSet::new();
        let mut duplicated = BTreeSet::new();
        for association in self.association_definitions.values() {
            let edge = (
                association.fqn.as_str(),
                association.src_alias.as_str(),
                association.dst_alias.as_str(),
            );
            if !seen.insert(edge) {
                duplicated.insert(edge);
            }

            let association_type = association.association_type(edm);
            match self.get_entity_definition_by_name(&association.src_alias) {
                None => defined.fail(format!(
                    "Unknown source entity set {} for Association {}",
                    association.src_alias, association.name
                )),
                Some(src) if !association_type.src.contains(&src.entity_type(edm).id) => allowed.fail(format!(
                    "Entity type {} is not a source for Association type {}",
                    src.fqn, association.fqn
                )),
                Some(_) => {}
            }
            match self.get_entity_definition_by_name(&association.dst_alias) {
                None => defined.fail(format!(
                    "Unknown destination entity set {} for Association {}",
                    association.dst_alias, association.name
                )),
                Some(dst) if !association_type.dst.contains(&dst.entity_type(edm).id) => allowed.fail(format!(
                    "Entity type {} is not a destination for Association type {}",
                    dst.fqn, association.fqn
                )),
                Some(_) => {}
            }
        }
        for (fqn, src, dst) in duplicated {
            unique.fail(format!(
                "There are multiple associations to wire {} --> {} --> {}",
                fqn, src, dst
            ));
        }

        let mut report =
            ValidationReport::new("Edges validation").with_sub_reports(vec![defined, allowed, unique]);
        report.validate();
        report
    }

    /// Property membership and parsers of every definition, then the edges
    pub fn add_and_check_edm(&self) -> ValidationReport {
        let edm = self.catalog().edm.as_ref();
        let definitions: Vec<ValidationReport> = self
            .association_definitions
            .values()
            .map(|association| association.add_and_check_edm(edm))
            .chain(
                self.entity_definitions
                    .values()
                    .map(|definition| definition.add_and_check_edm(edm)),
            )
            .collect();
        let parsers =
            ValidationReport::new("Check if property types have appropriate parsers").with_sub_reports(definitions);
        let mut report =
            ValidationReport::new("EDM Validation").with_sub_reports(vec![parsers, self.check_edges_edm()]);
        report.validate();
        report
    }

    /// Entity sets exist, hold the right entity type and are not near
    /// duplicates of other entity sets.
    ///
    /// With `create_by` contacts, missing entity sets are created instead of
    /// reported.
    pub fn check_entity_sets_against_stack(&self, create_by: &[String]) -> ValidationReport {
        let edm = self.catalog().edm.as_ref();
        let entity_sets = self.catalog().entity_sets.as_ref();
        let mut exist = ValidationReport::new("Check if entity sets exist");
        let mut fqn_match = ValidationReport::new("Check if FQN match between the catalog and the flight");
        let mut overlap = ValidationReport::new("Check if there are entity sets in the catalog that might be targeted");
        let mut created = ValidationReport::new("Check if there are entity sets that need to be created");

        let all_entity_sets = entity_sets.get_all_entity_sets().unwrap_or_else(|e| {
            warn!("Could not list entity sets: {}", e);
            Vec::new()
        });
        let mut done = BTreeSet::new();
        for (_, definition) in self.all_definitions() {
            let name = definition.entity_set_name.as_str();
            if !done.insert(name) {
                continue;
            }
            let type_id = definition.entity_type(edm).id;
            let existing = entity_sets
                .get_entity_set_id(name)
                .and_then(|id| entity_sets.get_entity_set(id));
            match existing {
                Ok(entity_set) => {
                    if entity_set.entity_type_id != type_id {
                        fqn_match.fail(format!(
                            "The entity type of {} does not match the existing entity set.",
                            name
                        ));
                    }
                }
                Err(_) if !create_by.is_empty() => {
                    let mut entity_set = EntitySet::new(name, type_id);
                    entity_set.organization_id = self.organization_id;
                    entity_set.contacts = create_by.to_vec();
                    match entity_sets.create_entity_sets(&[entity_set]) {
                        Ok(_) => {
                            info!("Created entity set {}", name);
                            created.note(format!("Created entity set {}.", name));
                        }
                        Err(e) => created.fail(format!("Couldn't create entity set {}: {}", name, e)),
                    }
                }
                Err(_) => exist.fail(format!("The entity set {} doesn't exist.", name)),
            }

            let mut candidates: Vec<(usize, &str)> = all_entity_sets
                .iter()
                .filter(|entity_set| entity_set.entity_type_id == type_id && entity_set.name != name)
                .map(|entity_set| (common_prefix(name, &entity_set.name), entity_set.name.as_str()))
                .filter(|(count, _)| *count >= self.config.overlap_threshold)
                .collect();
            if !candidates.is_empty() {
                candidates.sort_by(|a, b| b.cmp(a));
                let names: Vec<&str> = candidates.iter().map(|(_, name)| *name).collect();
                overlap.note(format!("For {}, did you mean any from: {}", name, names.join(", ")));
            }
        }

        let mut subs = vec![exist, fqn_match, overlap];
        if !create_by.is_empty() {
            subs.push(created);
        }
        let mut report = ValidationReport::new("Entity Set Validation").with_sub_reports(subs);
        report.validate();
        report
    }

    /// Thorough review before a first run.
    ///
    /// Without `authenticated` the entity set check is replaced by a failing
    /// placeholder. The column check only runs when `table_columns` is given.
    pub fn proofread(
        &self,
        table_columns: Option<&[String]>,
        authenticated: bool,
        create_by: &[String],
    ) -> ValidationReport {
        let mut subs = vec![self.add_and_check_edm()];
        if authenticated {
            subs.push(self.check_entity_sets_against_stack(create_by));
        } else {
            subs.push(
                ValidationReport::new("Couldn't check entity sets against the stack.").with_issues(vec![
                    "Entity sets were not checked without an authenticated catalog.".to_string(),
                ]),
            );
        }
        subs.extend([
            self.consistent_names_validation(),
            self.graph_connectivity_validation(),
            self.source_destination_validation(),
            self.datasource_validation(),
        ]);
        if let Some(table_columns) = table_columns {
            subs.push(self.columns_validation(table_columns));
        }
        let report = ValidationReport::new("Proofreading the flight").with_sub_reports(subs);
        self.finish(report)
    }

    /// Register every association endpoint type the catalog does not allow
    /// yet, then forget the cached association types.
    pub fn add_src_dst_to_edm(&mut self) -> FlightResult<()> {
        let edm = Arc::clone(&self.catalog().edm);
        let mut additions: Vec<(Uuid, Uuid, bool)> = Vec::new();
        for association in self.association_definitions.values() {
            let src = self
                .get_entity_definition_by_name(&association.src_alias)
                .ok_or_else(|| FlightError::UnknownEntity(association.src_alias.clone()))?;
            let dst = self
                .get_entity_definition_by_name(&association.dst_alias)
                .ok_or_else(|| FlightError::UnknownEntity(association.dst_alias.clone()))?;
            let association_type = association.association_type(edm.as_ref());
            if association_type.is_sentinel() {
                warn!("Association type {} not found, skipping", association.fqn);
                continue;
            }
            let id = association_type.entity_type.id;
            let src_id = src.entity_type(edm.as_ref()).id;
            let dst_id = dst.entity_type(edm.as_ref()).id;
            if !association_type.src.contains(&src_id) {
                additions.push((id, src_id, true));
                info!("Adding {} as a source of {}", src.fqn, association.fqn);
            }
            if !association_type.dst.contains(&dst_id) {
                additions.push((id, dst_id, false));
                info!("Adding {} as a destination of {}", dst.fqn, association.fqn);
            }
        }

        for (association_type_id, entity_type_id, is_src) in additions {
            if is_src {
                edm.add_src_entity_type_to_association_type(association_type_id, entity_type_id)?;
            } else {
                edm.add_dst_entity_type_to_association_type(association_type_id, entity_type_id)?;
            }
        }
        for association in self.association_definitions.values_mut() {
            association.clear_resolved();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogError, InMemoryCatalog};
    use crate::flight::{AssociationDefinition, EntityDefinition, PropertyDefinition, ValidationConfig};
    use crate::models::Datatype;
    use crate::transforms::{Arg, Node, NodeKind};
    use std::collections::BTreeMap;

    fn catalog() -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        catalog.add_property_type("nc.SubjectIdentification", Datatype::String);
        catalog.add_property_type("ol.datasource", Datatype::String);
        catalog.add_property_type("ol.id", Datatype::String);
        catalog.add_property_type("ol.count", Datatype::Int64);
        catalog.add_property_type("general.datetime", Datatype::DateTimeOffset);
        catalog.add_entity_type("general.person", &["nc.SubjectIdentification"], &["ol.datasource"]);
        catalog.add_entity_type("ol.vehicle", &["ol.id"], &["ol.count"]);
        catalog.add_association_type(
            "ol.appearsin",
            &["ol.id"],
            &["general.datetime"],
            &["general.person"],
            &["general.person"],
            false,
        );
        catalog.add_entity_set("People", "general.person");
        catalog.add_entity_set("PeopleArchive", "general.person");
        catalog.add_entity_set("Vehicles", "ol.vehicle");
        catalog.add_entity_set("AppearsIn", "ol.appearsin");
        Arc::new(catalog)
    }

    fn person() -> EntityDefinition {
        EntityDefinition::new("people", "general.person", "People")
            .with_property("nc.SubjectIdentification", PropertyDefinition::new("nc.SubjectIdentification").with_column("ssn"))
            .with_property("ol.datasource", PropertyDefinition::new("ol.datasource").with_transforms(vec![Node::value("demo")]))
    }

    fn vehicle() -> EntityDefinition {
        EntityDefinition::new("vehicles", "ol.vehicle", "Vehicles")
            .with_property("ol.id", PropertyDefinition::new("ol.id").with_column("plate"))
    }

    fn appearsin(src: &str, dst: &str) -> AssociationDefinition {
        AssociationDefinition::new(
            EntityDefinition::new("appearsin", "ol.appearsin", "AppearsIn")
                .with_property("ol.id", PropertyDefinition::new("ol.id").with_column("plate")),
            src,
            dst,
        )
    }

    fn flight() -> Flight {
        let mut flight = Flight::new("demo", Catalog::in_memory(catalog())).with_organization_id(Uuid::new_v4());
        flight.add_entity_definition("people", person());
        flight.add_entity_definition("vehicles", vehicle());
        flight.add_association_definition("appearsin", appearsin("people", "vehicles"));
        flight
    }

    struct Table(BTreeMap<String, String>);

    impl Warehouse for Table {
        fn get_datatypes(&self, _table: &str) -> Result<BTreeMap<String, String>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_necessary_components() {
        let flight = flight();
        let report = flight.necessary_components_validation();
        assert!(report.validated, "{}", report);
        assert_eq!(report.title, "Necessary Components Defined Validation for Flight demo");

        let mut empty = Flight::new("", Catalog::in_memory(catalog()));
        empty.add_association_definition("appearsin", appearsin("", "vehicles"));
        let report = empty.necessary_components_validation();
        assert!(!report.validated);
        assert!(report.issues.contains(&"Add missing organizationId.".to_string()));
        assert!(report.issues.contains(&"This flight has no entity definitions.".to_string()));
        assert!(report.issues.contains(&"In entity definition appearsin: Source not defined.".to_string()));
    }

    #[test]
    fn test_unique_names() {
        let mut flight = flight();
        assert!(flight.unique_names_validation().validated);
        flight.add_entity_definition("people2", person());
        let report = flight.unique_names_validation();
        assert_eq!(report.issues, vec!["There are many entity/association definitions with name people."]);
    }

    #[test]
    fn test_missing_source_is_reported() {
        let mut flight = flight();
        flight.add_association_definition("ghost", appearsin("nobody", "people"));
        let report = flight.source_destination_validation();
        assert!(!report.validated);
        assert!(report.issues.contains(&"Source entity nobody doesn't exist.".to_string()));
        // the registration hint is always first
        assert!(report.issues[0].contains("add_src_dst_to_edm"));
    }

    #[test]
    fn test_disallowed_destination_and_repair() {
        let mut flight = flight();
        let report = flight.source_destination_validation();
        assert_eq!(
            report.issues[1..].to_vec(),
            vec!["ol.appearsin doesn't have ol.vehicle in its destinations."]
        );

        flight.add_src_dst_to_edm().unwrap();
        assert!(flight.source_destination_validation().validated);
        assert!(flight.check_edges_edm().validated);
    }

    #[test]
    fn test_add_src_dst_to_edm_requires_endpoints() {
        let mut flight = flight();
        flight.add_association_definition("ghost", appearsin("nobody", "people"));
        let err = flight.add_src_dst_to_edm().unwrap_err();
        assert!(matches!(err, FlightError::UnknownEntity(name) if name == "nobody"));
    }

    #[test]
    fn test_edm_validation_prefixes_fqn_issues() {
        let mut flight = flight();
        flight.add_entity_definition("boats", EntityDefinition::new("boats", "ol.boat", "Boats"));
        let report = flight.edm_validation();
        assert!(!report.validated);
        assert!(report.issues.contains(&"In entity definition boats: Entity type ol.boat doesn't exist.".to_string()));
        assert_eq!(report.sub_reports.len(), 1);
    }

    #[test]
    fn test_datatypes_and_parsers() {
        let mut flight = flight();
        flight
            .entity_definitions
            .get_mut("vehicles")
            .unwrap()
            .property_definitions
            .insert("ol.count", PropertyDefinition::new("ol.count").with_column("plate"));
        let report = flight.datatypes_validation();
        assert!(!report.validated);
        assert!(report.issues.is_empty());
        assert_eq!(
            report.sub_reports[0].issues,
            vec!["In entity definition vehicles: In property ol.count: No Numeric parser"]
        );
    }

    #[test]
    fn test_datetime_timezone() {
        let mut flight = flight();
        assert!(flight.datetime_timezone_validation().validated);
        let parser = Node::new(NodeKind::DateTime).with_arg("timezone", Arg::Scalar("UTC".into()));
        flight.association_definitions.get_mut("appearsin").unwrap().property_definitions.insert(
            "general.datetime",
            PropertyDefinition::new("general.datetime").with_transforms(vec![Node::column("when"), parser]),
        );
        let report = flight.datetime_timezone_validation();
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].starts_with("In appearsin, general.datetime is using a Date*Transform"));
    }

    #[test]
    fn test_entity_sets_validation_suggests_similar() {
        let mut flight = flight();
        assert!(flight.entity_sets_validation().validated);
        flight.entity_definitions.get_mut("people").unwrap().entity_set_name = "PeopleArchived".to_string();
        let report = flight.entity_sets_validation();
        assert_eq!(
            report.issues,
            vec!["The entity set PeopleArchived doesn't exist. Did you mean any of these: PeopleArchive, People"]
        );
    }

    #[test]
    fn test_warehouse_validation() {
        let flight = flight();
        let report = flight.warehouse_validation(None, &Table(BTreeMap::new()));
        assert_eq!(report.issues, vec!["No table name given."]);

        let report = flight.warehouse_validation(Some("cars"), &Table(BTreeMap::new()));
        assert!(!report.sub_reports[0].validated);
        assert_eq!(report.sub_reports.len(), 1);

        let table = Table(BTreeMap::from([
            ("ssn".to_string(), "text".to_string()),
            ("plate".to_string(), "bigint".to_string()),
        ]));
        let report = flight.warehouse_validation(Some("cars"), &table);
        assert!(report.sub_reports[1].validated);
        assert_eq!(
            report.sub_reports[2].issues,
            vec![r#"Column "plate" is of type "bigint" but should be: "text, character varying""#]
        );
    }

    #[test]
    fn test_columns_validation() {
        let flight = flight();
        let report = flight.columns_validation(&["ssn".to_string(), "extra".to_string()]);
        assert!(!report.validated);
        assert_eq!(report.issues[0], "These columns don't exist: plate");
        assert!(report.issues.contains(&"1 columns not used: extra".to_string()));
    }

    #[test]
    fn test_graph_connectivity() {
        let mut flight = flight();
        assert!(flight.graph_connectivity_validation().validated);
        flight.add_entity_definition("lonely", EntityDefinition::new("lonely", "ol.vehicle", "Vehicles"));
        flight.add_association_definition("ghost", appearsin("people", "nobody"));
        let report = flight.graph_connectivity_validation();
        assert_eq!(report.issues[0], "The following entity sets are not linked to anything: lonely");
        assert!(report.issues[1].ends_with("in their association: nobody"));
    }

    #[test]
    fn test_consistent_names_and_datasource() {
        let mut flight = flight();
        assert!(flight.consistent_names_validation().validated);
        flight.add_entity_definition(
            "suspect",
            EntityDefinition::new("suspects", "general.person", "People")
                .with_property("ssn", PropertyDefinition::new("nc.SubjectIdentification").with_column("ssn")),
        );
        let report = flight.consistent_names_validation();
        assert_eq!(
            report.issues,
            vec![
                "Entity alias 'suspect' doesn't match its name 'suspects'.",
                "Property alias 'ssn' doesn't match its type 'nc.SubjectIdentification'.",
            ]
        );
        let report = flight.datasource_validation();
        assert_eq!(report.issues, vec!["Entity definition suspects needs a datasource."]);
    }

    #[test]
    fn test_duplicate_edges_reported_once() {
        let mut flight = flight();
        flight.add_association_definition("appearsin2", appearsin("people", "vehicles"));
        flight.add_association_definition("appearsin3", appearsin("people", "vehicles"));
        let report = flight.check_edges_edm();
        assert_eq!(
            report.sub_reports[2].issues,
            vec!["There are multiple associations to wire ol.appearsin --> people --> vehicles"]
        );
    }

    #[test]
    fn test_check_entity_sets_against_stack_creates() {
        let mut flight = flight();
        flight.add_entity_definition("boats", EntityDefinition::new("boats", "ol.vehicle", "VehiclesBoats"));
        let report = flight.check_entity_sets_against_stack(&[]);
        assert_eq!(report.sub_reports[0].issues, vec!["The entity set VehiclesBoats doesn't exist."]);
        assert!(report.sub_reports[2]
            .issues
            .contains(&"For VehiclesBoats, did you mean any from: Vehicles".to_string()));
        assert!(report.sub_reports[2].validated);

        let report = flight.check_entity_sets_against_stack(&["me@example.com".to_string()]);
        assert!(report.validated, "{}", report);
        assert_eq!(report.sub_reports[3].issues, vec!["Created entity set VehiclesBoats."]);
        assert!(flight.check_entity_sets_against_stack(&[]).sub_reports[0].validated);
    }

    #[test]
    fn test_composite_reports() {
        let flight = flight().with_config(ValidationConfig::new().with_log_level(LogLevel::Failures));
        let report = flight.flight_validation(None, None);
        assert_eq!(report.title, "Flight Validation for demo");
        assert_eq!(report.sub_reports[0].sub_reports.len(), 5);
        assert_eq!(report.sub_reports[1].sub_reports.len(), 4);
        // the vehicle destination is not registered for ol.appearsin
        assert!(!report.validated);

        let report = flight.proofread(Some(&["ssn".to_string(), "plate".to_string()]), false, &[]);
        assert_eq!(report.sub_reports.len(), 7);
        assert!(!report.sub_reports[1].validated);
    }
}
