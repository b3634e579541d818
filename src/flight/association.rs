//! Association definitions

use super::entity::EntityDefinition;
use super::error::{FlightError, FlightResult};
use super::schema::DefinitionSchema;
use crate::catalog::EdmApi;
use crate::models::AssociationType;
use crate::validation::{LogLevel, ValidationReport};
use serde_yaml::{Mapping, Value};
use std::ops::{Deref, DerefMut};

/// An entity definition that also connects a source and a destination
/// definition, referenced by alias or by name
#[derive(Debug, Clone)]
pub struct AssociationDefinition {
    pub definition: EntityDefinition,
    pub src_alias: String,
    pub dst_alias: String,
}

impl Default for AssociationDefinition {
    fn default() -> Self {
        Self {
            definition: EntityDefinition::default().association(),
            src_alias: String::new(),
            dst_alias: String::new(),
        }
    }
}

impl AssociationDefinition {
    pub fn new(definition: EntityDefinition, src_alias: impl Into<String>, dst_alias: impl Into<String>) -> Self {
        Self {
            definition: definition.association(),
            src_alias: src_alias.into(),
            dst_alias: dst_alias.into(),
        }
    }

    /// Read an association from its document mapping.
    ///
    /// The `src` and `dst` keys must be present; empty values are left to
    /// validation.
    pub fn from_mapping(alias: &str, map: &Mapping) -> FlightResult<Self> {
        let endpoint = |key: &str| match map.get(key) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(Value::Null) => Ok(String::new()),
            _ => Err(FlightError::InvalidDefinition(format!(
                "association {} needs a {} alias",
                alias, key
            ))),
        };
        let src_alias = endpoint("src")?;
        let dst_alias = endpoint("dst")?;
        Ok(Self::new(
            EntityDefinition::from_mapping(alias, map)?,
            src_alias,
            dst_alias,
        ))
    }

    /// The resolved association type, looked up on first use
    pub fn association_type(&self, edm: &dyn EdmApi) -> &AssociationType {
        self.definition.association_type(edm)
    }

    pub fn necessary_components_validation(&self, log_level: LogLevel) -> ValidationReport {
        let entity_report = self.definition.necessary_components_validation(log_level);
        let mut endpoints = ValidationReport::new(format!(
            "Source and Destination Defined for Association {}",
            self.name
        ));
        if self.src_alias.is_empty() {
            endpoints.fail("Source not defined.");
        }
        if self.dst_alias.is_empty() {
            endpoints.fail("Destination not defined.");
        }
        endpoints.print_status(log_level);

        let mut report = ValidationReport::new(format!(
            "Necessary Components Validation for Association {}",
            self.name
        ))
        .with_sub_reports(vec![entity_report, endpoints]);
        report.validate();
        report.print_status(log_level);
        report
    }

    pub fn get_schema(&self) -> DefinitionSchema {
        DefinitionSchema {
            src: Some(self.src_alias.clone()),
            dst: Some(self.dst_alias.clone()),
            ..self.definition.get_schema()
        }
    }
}

impl Deref for AssociationDefinition {
    type Target = EntityDefinition;

    fn deref(&self) -> &Self::Target {
        &self.definition
    }
}

impl DerefMut for AssociationDefinition {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.definition
    }
}
