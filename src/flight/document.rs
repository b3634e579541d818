//! Reading and writing flight documents
//!
//! A flight document is YAML with an `organizationId`, an
//! `entityDefinitions` mapping and an `associationDefinitions` mapping.
//! Transform and condition trees use `!<kind>` tags, which are normalized
//! before loading.

use super::association::AssociationDefinition;
use super::entity::EntityDefinition;
use super::error::{FlightError, FlightResult};
use super::Flight;
use crate::transforms::{self, quote, write_nodes};
use serde_yaml::{Mapping, Value};
use std::cmp::Reverse;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

impl Flight {
    /// Load definitions from a flight file.
    ///
    /// `organization_id` is used when the document does not carry one.
    pub fn deserialize(&mut self, path: impl AsRef<Path>, organization_id: Option<Uuid>) -> FlightResult<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| FlightError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.deserialize_from_str(&text, organization_id)
    }

    /// Load definitions from flight document text, replacing definitions
    /// with the same alias.
    pub fn deserialize_from_str(&mut self, text: &str, organization_id: Option<Uuid>) -> FlightResult<()> {
        let normalized = transforms::normalize_tags(text);
        let document: Value = serde_yaml::from_str(&normalized)?;
        let Value::Mapping(document) = document else {
            return Err(FlightError::InvalidDefinition(
                "flight document must be a mapping".to_string(),
            ));
        };

        self.organization_id = match document.get("organizationId") {
            Some(Value::Null) => None,
            Some(Value::String(id)) => Some(
                Uuid::parse_str(id).map_err(|_| FlightError::InvalidOrganizationId(id.clone()))?,
            ),
            Some(other) => return Err(FlightError::InvalidOrganizationId(format!("{:?}", other))),
            None => Some(organization_id.ok_or(FlightError::MissingOrganizationId)?),
        };

        for (alias, map) in section(&document, "entityDefinitions")? {
            let definition = EntityDefinition::from_mapping(&alias, map)?;
            self.entity_definitions.insert(alias, definition);
        }
        for (alias, map) in section(&document, "associationDefinitions")? {
            let definition = AssociationDefinition::from_mapping(&alias, map)?;
            self.association_definitions.insert(alias, definition);
        }

        self.refresh_schema();
        info!(
            "Finished deserializing the flight: {} entities, {} associations",
            self.entity_definitions.len(),
            self.association_definitions.len()
        );
        Ok(())
    }

    /// Entity definitions, most connected first
    fn entities_for_writing(&self) -> Vec<(&str, &EntityDefinition)> {
        let mut out: Vec<_> = self.entity_definitions.iter().collect();
        out.sort_by_key(|(alias, definition)| {
            let touches = |endpoint: &str| {
                endpoint == *alias || (!definition.name.is_empty() && endpoint == definition.name)
            };
            Reverse(
                self.association_definitions
                    .values()
                    .filter(|a| touches(&a.src_alias) || touches(&a.dst_alias))
                    .count(),
            )
        });
        out
    }

    /// Association definitions grouped by fqn, each group ordered by the
    /// trailing number of the alias
    fn associations_for_writing(&self) -> Vec<(&str, &AssociationDefinition)> {
        let mut fqns: Vec<&str> = Vec::new();
        for association in self.association_definitions.values() {
            if !fqns.contains(&association.fqn.as_str()) {
                fqns.push(&association.fqn);
            }
        }
        let mut out = Vec::new();
        for fqn in fqns {
            let mut group: Vec<_> = self
                .association_definitions
                .iter()
                .filter(|(_, a)| a.fqn == fqn)
                .collect();
            group.sort_by_key(|&(alias, _)| trailing_number(alias));
            out.extend(group);
        }
        out
    }
}

fn section<'a>(document: &'a Mapping, key: &str) -> FlightResult<Vec<(String, &'a Mapping)>> {
    let entries = match document.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Mapping(entries)) => entries,
        Some(_) => {
            return Err(FlightError::InvalidDefinition(format!("{} must be a mapping", key)));
        }
    };
    entries
        .iter()
        .map(|(alias, definition)| {
            let alias = match alias {
                Value::String(alias) => alias.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(FlightError::InvalidDefinition(format!(
                        "{} has a non-text alias {:?}",
                        key, other
                    )));
                }
            };
            match definition {
                Value::Mapping(map) => Ok((alias, map)),
                _ => Err(FlightError::InvalidDefinition(format!(
                    "definition {} must be a mapping",
                    alias
                ))),
            }
        })
        .collect()
}

/// Numeric suffix of `alias` as a sort key: digit count, then the digits.
/// No suffix sorts as zero.
fn trailing_number(alias: &str) -> (usize, &str) {
    let digits = alias.chars().rev().take_while(char::is_ascii_digit).count();
    let number = alias[alias.len() - digits..].trim_start_matches('0');
    (number.len(), number)
}

impl fmt::Display for Flight {
    /// Canonical document form: two-space indentation, entities before
    /// associations, primary keys ahead of other properties.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edm = self.catalog().edm.as_ref();
        match self.organization_id {
            Some(id) => writeln!(f, "organizationId: {}", quote(&id.to_string()))?,
            None => writeln!(f, "organizationId: null")?,
        }

        let entities = self.entities_for_writing();
        let associations: Vec<(&str, &EntityDefinition, Option<&AssociationDefinition>)> = self
            .associations_for_writing()
            .into_iter()
            .map(|(alias, a)| (alias, &a.definition, Some(a)))
            .collect();
        let sections = [
            (
                "entityDefinitions",
                entities.into_iter().map(|(alias, e)| (alias, e, None)).collect::<Vec<_>>(),
            ),
            ("associationDefinitions", associations),
        ];

        for (key, definitions) in sections {
            if definitions.is_empty() {
                writeln!(f, "{}: {{}}", key)?;
                continue;
            }
            writeln!(f, "{}:", key)?;
            for (alias, definition, association) in definitions {
                writeln!(f, "  {}:", alias)?;
                writeln!(f, "    fqn: {}", quote(&definition.fqn))?;
                writeln!(f, "    entitySetName: {}", quote(&definition.entity_set_name))?;
                if !definition.update_type.is_empty() {
                    writeln!(f, "    updateType: {}", quote(&definition.update_type))?;
                }
                if let Some(association) = association {
                    writeln!(f, "    src: {}", quote(&association.src_alias))?;
                    writeln!(f, "    dst: {}", quote(&association.dst_alias))?;
                }
                writeln!(f, "    propertyDefinitions:")?;
                for (property_alias, property) in definition.sort_properties_for_writing(edm) {
                    writeln!(f, "      {}:", property_alias)?;
                    writeln!(f, "        type: {}", quote(&property.type_fqn))?;
                    if let Some(column) = &property.column {
                        writeln!(f, "        column: {}", quote(column))?;
                    }
                    if !property.transforms.is_empty() {
                        writeln!(f, "        transforms:")?;
                        f.write_str(&write_nodes(&property.transforms, 8))?;
                    }
                }
                if !definition.conditions.is_empty() {
                    writeln!(f, "    conditions:")?;
                    f.write_str(&write_nodes(&definition.conditions, 4))?;
                }
                writeln!(f, "    name: {}", quote(&definition.name))?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
