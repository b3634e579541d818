//! Catalog types as reported by the metadata catalog

use super::datatype::Datatype;
use super::fqn::Fqn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Shared view over catalog types used by fqn deduction
pub trait CatalogType {
    fn fqn(&self) -> &Fqn;
    fn title(&self) -> &str;
    fn description(&self) -> &str;

    /// Whether the type is marked deprecated in its name, title or description.
    fn is_deprecated(&self, marker: &str) -> bool {
        let marker = marker.to_lowercase();
        self.fqn().name.to_lowercase().contains(&marker)
            || self.title().to_lowercase().contains(&marker)
            || self.description().to_lowercase().contains(&marker)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub fqn: Fqn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl PropertyType {
    /// Empty stand-in for a type the catalog could not resolve
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.id.is_nil()
    }
}

impl CatalogType for PropertyType {
    fn fqn(&self) -> &Fqn {
        &self.fqn
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub fqn: Fqn,
    /// Ordered primary key property type ids
    #[serde(default)]
    pub key: Vec<Uuid>,
    #[serde(default)]
    pub properties: BTreeSet<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl EntityType {
    /// Empty stand-in with no key and no properties
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.id.is_nil()
    }
}

impl CatalogType for EntityType {
    fn fqn(&self) -> &Fqn {
        &self.fqn
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
}

/// An entity type that may connect source and destination entity types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationType {
    pub entity_type: EntityType,
    #[serde(default)]
    pub src: BTreeSet<Uuid>,
    #[serde(default)]
    pub dst: BTreeSet<Uuid>,
    #[serde(default)]
    pub bidirectional: bool,
}

impl AssociationType {
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.entity_type.is_sentinel()
    }
}

/// A named collection instance of an entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySet {
    #[serde(default)]
    pub id: Uuid,
    pub entity_type_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl EntitySet {
    pub fn new(name: impl Into<String>, entity_type_id: Uuid) -> Self {
        let name = name.into();
        Self {
            id: Uuid::nil(),
            entity_type_id,
            title: name.clone(),
            name,
            organization_id: None,
            contacts: Vec::new(),
        }
    }
}
