//! Entity definitions
//!
//! An entity definition turns each source row into one entity of a catalog
//! entity type, written to one entity set. Association definitions reuse it
//! and add an edge between two other definitions.

use super::definitions::DefinitionMap;
use super::error::{FlightError, FlightResult};
use super::property::PropertyDefinition;
use super::schema::{DefinitionSchema, TreeSchema};
use crate::catalog::{self, Catalog, EdmApi};
use crate::models::{AssociationType, EntitySet, EntityType};
use crate::transforms::{self, Node, NodeKind};
use crate::validation::{LogLevel, ValidationReport};
use once_cell::unsync::OnceCell;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Legal values of `updateType`
pub const UPDATE_TYPES: &[&str] = &["Merge", "PartialReplace", "Replace"];

/// Key property used when the entity type declares none
pub const DEFAULT_KEY: &str = "ol.id";

/// Entity set lookups shared across one validation run.
///
/// Definitions writing the same fqn to the same entity set are checked once,
/// and the full entity set listing is fetched at most once.
#[derive(Debug, Default)]
pub struct EntitySetMemo {
    done: HashMap<(String, String), ValidationReport>,
    all_entity_sets: Option<Vec<EntitySet>>,
}

impl EntitySetMemo {
    pub fn new() -> Self {
        Self::default()
    }

    fn all_entity_sets(&mut self, catalog: &Catalog) -> &[EntitySet] {
        self.all_entity_sets.get_or_insert_with(|| {
            catalog.entity_sets.get_all_entity_sets().unwrap_or_else(|e| {
                warn!("Could not list entity sets: {}", e);
                Vec::new()
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct EntityDefinition {
    pub name: String,
    pub fqn: String,
    pub entity_set_name: String,
    pub update_type: String,
    pub conditions: Vec<Node>,
    pub property_definitions: DefinitionMap<PropertyDefinition>,
    is_association: bool,
    entity_type: OnceCell<EntityType>,
    association_type: OnceCell<AssociationType>,
}

impl Default for EntityDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            fqn: String::new(),
            entity_set_name: String::new(),
            update_type: "Merge".to_string(),
            conditions: Vec::new(),
            property_definitions: DefinitionMap::new(),
            is_association: false,
            entity_type: OnceCell::new(),
            association_type: OnceCell::new(),
        }
    }
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>, fqn: impl Into<String>, entity_set_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fqn: fqn.into(),
            entity_set_name: entity_set_name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn association(mut self) -> Self {
        self.is_association = true;
        self
    }

    pub fn with_property(mut self, alias: impl Into<String>, definition: PropertyDefinition) -> Self {
        self.property_definitions.insert(alias, definition);
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Node>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn is_association(&self) -> bool {
        self.is_association
    }

    /// Read a definition from its document mapping. `alias` names it in errors.
    pub fn from_mapping(alias: &str, map: &Mapping) -> FlightResult<Self> {
        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let mut definition = Self {
            name: text("name"),
            fqn: text("fqn"),
            entity_set_name: text("entitySetName"),
            ..Self::default()
        };
        if let Some(update_type) = map.get("updateType").and_then(Value::as_str) {
            definition.update_type = update_type.to_string();
        }
        if let Some(conditions) = map.get("conditions") {
            definition.conditions = transforms::parse(conditions)
                .map_err(|source| FlightError::Transform {
                    context: format!("conditions of {}", alias),
                    source,
                })?
                .nodes;
        }
        match map.get("propertyDefinitions") {
            None | Some(Value::Null) => {}
            Some(Value::Mapping(properties)) => {
                for (key, value) in properties {
                    let key = key.as_str().ok_or_else(|| {
                        FlightError::InvalidDefinition(format!("non-text property alias in {}", alias))
                    })?;
                    let property = PropertyDefinition::from_value(value).map_err(|source| {
                        FlightError::Transform {
                            context: format!("property {} of {}", key, alias),
                            source,
                        }
                    })?;
                    definition.property_definitions.insert(key, property);
                }
            }
            Some(_) => {
                return Err(FlightError::InvalidDefinition(format!(
                    "propertyDefinitions of {} is not a mapping",
                    alias
                )));
            }
        }
        Ok(definition)
    }

    /// The resolved entity type, looked up on first use.
    ///
    /// Associations resolve through their association type. Failed lookups
    /// resolve to the sentinel type with no key and no properties.
    pub fn entity_type(&self, edm: &dyn EdmApi) -> &EntityType {
        if self.is_association {
            return &self.association_type(edm).entity_type;
        }
        self.entity_type
            .get_or_init(|| catalog::resolve_entity_type(edm, &self.fqn))
    }

    pub(crate) fn association_type(&self, edm: &dyn EdmApi) -> &AssociationType {
        self.association_type
            .get_or_init(|| catalog::resolve_association_type(edm, &self.fqn))
    }

    /// Forget every resolved type, including those of the properties
    pub fn clear_resolved(&mut self) {
        self.entity_type = OnceCell::new();
        self.association_type = OnceCell::new();
        for property in self.property_definitions.values_mut() {
            property.clear_resolved();
        }
    }

    /// Fqns of the primary key property types, `ol.id` when none are declared
    pub fn key_fqns(&self, edm: &dyn EdmApi) -> Vec<String> {
        let keys = catalog::key_fqns(edm, self.entity_type(edm));
        if keys.is_empty() {
            vec![DEFAULT_KEY.to_string()]
        } else {
            keys
        }
    }

    /// Alias of the property definition holding the primary key, if any
    pub fn pk_alias(&self, edm: &dyn EdmApi) -> Option<&str> {
        let keys = self.key_fqns(edm);
        self.property_definitions
            .iter()
            .find(|(alias, property)| {
                keys.iter().any(|key| key == alias || *key == property.type_fqn)
            })
            .map(|(alias, _)| alias)
    }

    /// Add a primary key property definition unless one exists.
    ///
    /// With `infer_columns` the key reads every column the definition reads,
    /// otherwise `columns`. A single unhashed column is used directly, several
    /// unhashed columns are concatenated, and otherwise they are hashed with
    /// SHA-256. `suffix` is appended as a literal through a
    /// `ConcatCombineTransform`. Returns whether a key was added.
    pub fn add_pk_if_missing(
        &mut self,
        edm: &dyn EdmApi,
        infer_columns: bool,
        columns: &[String],
        hash_by_default: bool,
        suffix: Option<&str>,
    ) -> bool {
        if self.pk_alias(edm).is_some() {
            return false;
        }
        let columns: Vec<String> = if infer_columns {
            self.get_columns().into_iter().collect()
        } else {
            columns.to_vec()
        };
        let Some(key) = self.key_fqns(edm).into_iter().next() else {
            return false;
        };

        let mut pk = PropertyDefinition::new(key.clone());
        if hash_by_default {
            pk.transforms = vec![Node::hash(columns)];
        } else if columns.len() == 1 {
            pk.column = columns.into_iter().next();
        } else if columns.len() > 1 {
            pk.transforms = vec![Node::concat(columns, None)];
        }
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            let mut chain = std::mem::take(&mut pk.transforms);
            if let Some(column) = pk.column.take() {
                chain.push(Node::column(column));
            }
            chain.push(Node::value(suffix));
            pk.transforms = vec![Node::combine(chain)];
        }
        self.property_definitions.insert(key, pk);
        true
    }

    /// Filter out rows with no data behind a literal-backed property.
    ///
    /// Only acts when there are no conditions yet and some property uses a
    /// `ValueTransform`. Returns whether conditions were added.
    pub fn auto_generate_conditions(&mut self) -> bool {
        if !self.conditions.is_empty() {
            return false;
        }
        let has_literal = self
            .property_definitions
            .values()
            .any(|p| transforms::kinds_used(&p.transforms).contains(&NodeKind::Value));
        let columns = self.get_columns();
        if !has_literal || columns.is_empty() {
            return false;
        }
        if columns.len() > 1 {
            self.conditions.push(Node::new(NodeKind::ConditionalOr));
        }
        self.conditions.extend(columns.into_iter().map(Node::is_not_null));
        true
    }

    /// Property definitions in writing order: the primary key first
    pub fn sort_properties_for_writing(&self, edm: &dyn EdmApi) -> Vec<(&str, &PropertyDefinition)> {
        let mut out: Vec<_> = self.property_definitions.iter().collect();
        if let Some(pk) = self.pk_alias(edm) {
            if let Some(i) = out.iter().position(|(alias, _)| *alias == pk) {
                let entry = out.remove(i);
                out.insert(0, entry);
            }
        }
        out
    }

    /// Every column read by the property definitions
    pub fn get_columns(&self) -> BTreeSet<String> {
        self.property_definitions
            .values()
            .flat_map(PropertyDefinition::get_columns)
            .collect()
    }

    /// Columns read by the primary key property definitions.
    ///
    /// For entity types without keys, the columns of the first `ol.id`
    /// property.
    pub fn get_columns_from_pk(&self, edm: &dyn EdmApi) -> BTreeSet<String> {
        let keys = &self.entity_type(edm).key;
        if keys.is_empty() {
            return self
                .property_definitions
                .values()
                .find(|p| p.type_fqn == DEFAULT_KEY)
                .map(PropertyDefinition::get_columns)
                .unwrap_or_default();
        }
        self.property_definitions
            .values()
            .filter(|p| keys.contains(&p.property_type(edm).id))
            .flat_map(PropertyDefinition::get_columns)
            .collect()
    }

    /// Remove `column` from properties and conditions.
    ///
    /// Emptied property definitions are dropped. Returns whether the
    /// definition lost its primary key and should be dropped too.
    pub fn delete_column(&mut self, edm: &dyn EdmApi, column: &str) -> bool {
        self.property_definitions
            .retain(|_, property| !property.delete_column(column));
        transforms::delete_column(&mut self.conditions, column);

        let keys = &self.entity_type(edm).key;
        if keys.is_empty() {
            return self.get_columns_from_pk(edm).is_empty();
        }
        !self
            .property_definitions
            .values()
            .any(|p| keys.contains(&p.property_type(edm).id))
    }

    pub fn get_schema(&self) -> DefinitionSchema {
        DefinitionSchema {
            fqn: self.fqn.clone(),
            entity_set_name: self.entity_set_name.clone(),
            name: self.name.clone(),
            properties: self
                .property_definitions
                .values()
                .map(PropertyDefinition::get_schema)
                .collect(),
            conditions: TreeSchema::of(&self.conditions),
            ..DefinitionSchema::default()
        }
    }

    fn kind_label(&self) -> &'static str {
        if self.is_association { "Association" } else { "Entity" }
    }

    /// Check that everything needed to write this definition is present
    pub fn necessary_components_validation(&self, log_level: LogLevel) -> ValidationReport {
        let mut report = ValidationReport::new(format!(
            "Necessary Components Validation for Entity {}",
            self.name
        ));
        if self.fqn.is_empty() {
            report.fail("FQN not defined.");
        }
        if self.entity_set_name.is_empty() {
            report.fail("Entity set name not defined.");
        }
        if self.property_definitions.is_empty() {
            report.fail("Property definitions not defined.");
        }
        if self.name.is_empty() {
            report.fail("Entity definition name not defined.");
        }
        if !UPDATE_TYPES.contains(&self.update_type.as_str()) {
            report.fail(r#"Update type not in {"Merge", "PartialReplace", "Replace"}"#);
        }
        for (key, property) in self.property_definitions.iter() {
            if property.type_fqn.is_empty() {
                report.fail(format!("Property definition {} is missing a type.", key));
            }
            match (&property.column, property.transforms.is_empty()) {
                (None, true) => report.fail(format!(
                    "In property definition {}, neither column nor transforms are defined.",
                    key
                )),
                (Some(_), false) => report.fail(format!(
                    "In property definition {}, both column and transforms are defined.",
                    key
                )),
                _ => {}
            }
        }
        report.validate();
        report.print_status(log_level);
        report
    }

    /// Check the entity type exists and holds every property type used
    pub fn fqn_validation(&self, edm: &dyn EdmApi, log_level: LogLevel) -> ValidationReport {
        let mut report = ValidationReport::new(format!(
            "FQN Validation for {} {}",
            self.kind_label(),
            self.name
        ));
        let entity_type = self.entity_type(edm);
        if entity_type.key.is_empty() {
            report.fail(format!("Entity type {} doesn't exist.", self.fqn));
        }
        for property in self.property_definitions.values() {
            let property_type = property.property_type(edm);
            if property_type.is_sentinel() || !entity_type.properties.contains(&property_type.id) {
                report.fail(format!(
                    "Property type {} is currently not in entity type {}",
                    property.type_fqn, self.fqn
                ));
            }
        }
        report.validate();
        report.print_status(log_level);
        report
    }

    /// Check the entity set exists and holds this definition's entity type.
    ///
    /// When it fails, entity sets of the same type whose names share at least
    /// `threshold` leading characters are suggested.
    pub fn entity_set_validation(
        &self,
        catalog: &Catalog,
        memo: &mut EntitySetMemo,
        threshold: usize,
        log_level: LogLevel,
    ) -> ValidationReport {
        let memo_key = (self.fqn.clone(), self.entity_set_name.clone());
        if let Some(done) = memo.done.get(&memo_key) {
            return done.clone();
        }

        let mut report = ValidationReport::new(format!(
            "Entity Set Validation for {} {}",
            self.kind_label(),
            self.name
        ));
        let type_id = self.entity_type(catalog.edm.as_ref()).id;
        let existing = catalog
            .entity_sets
            .get_entity_set_id(&self.entity_set_name)
            .and_then(|id| catalog.entity_sets.get_entity_set(id));
        match existing {
            Ok(entity_set) if entity_set.entity_type_id != type_id => report.fail(format!(
                "The fqn listed for {} does not match that of the existing entity set.",
                self.entity_set_name
            )),
            Ok(_) => {}
            Err(e) => {
                warn!("Entity set {} not found: {}", self.entity_set_name, e);
                report.fail(format!("The entity set {} doesn't exist.", self.entity_set_name));
            }
        }

        if !report.validated {
            let mut overlap: Vec<(usize, &str)> = memo
                .all_entity_sets(catalog)
                .iter()
                .filter(|entity_set| entity_set.entity_type_id == type_id)
                .map(|entity_set| (common_prefix(&self.entity_set_name, &entity_set.name), entity_set.name.as_str()))
                .filter(|(count, _)| *count >= threshold)
                .collect();
            if !overlap.is_empty() {
                overlap.sort_by(|a, b| b.cmp(a));
                let names: Vec<&str> = overlap.iter().map(|(_, name)| *name).collect();
                let hint = format!(" Did you mean any of these: {}", names.join(", "));
                if let Some(last) = report.issues.last_mut() {
                    last.push_str(&hint);
                }
            }
        }

        report.validate();
        report.print_status(log_level);
        memo.done.insert(memo_key, report.clone());
        report
    }

    /// Parser checks of every property, flattened into one report
    pub fn parsers_validation(&self, edm: &dyn EdmApi, log_level: LogLevel) -> ValidationReport {
        let mut report = ValidationReport::new(format!(
            "Parsers Validation for {} Definition {}",
            self.kind_label(),
            self.name
        ));
        for (key, property) in self.property_definitions.iter() {
            let sub = property.check_datatype_parsers(edm);
            if !sub.validated {
                for issue in &sub.issues {
                    report.fail(format!("In property {}: {}", key, issue));
                }
            }
        }
        report.validate();
        report.print_status(log_level);
        report
    }

    /// Per-property catalog membership and parser reports
    pub fn add_and_check_edm(&self, edm: &dyn EdmApi) -> ValidationReport {
        let entity_type = self.entity_type(edm);
        let mut report = ValidationReport::new(format!("EDM Check for {} {}", self.kind_label(), self.name));
        for property in self.property_definitions.values() {
            if !entity_type.properties.contains(&property.property_type(edm).id) {
                report.push(ValidationReport::new(format!("Membership of {}", property.type_fqn)).with_issues(
                    vec![format!(
                        "Property type {} is currently not in entity type {}",
                        property.type_fqn, self.fqn
                    )],
                ));
            }
            report.push(property.check_datatype_parsers(edm));
        }
        report.validate();
        report
    }
}

/// Number of leading characters `a` and `b` share
pub(crate) fn common_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
