//! Catalog collaborator abstraction
//!
//! Defines the blocking interfaces a flight is resolved and validated against:
//! - EdmApi: entity, property and association types (the EDM)
//! - EntitySetsApi: the entity-set registry
//! - Warehouse: live table structure of the source data
//!
//! `InMemoryCatalog` implements the first two for offline work and tests.

pub mod memory;

pub use memory::InMemoryCatalog;

use crate::models::{AssociationType, EntitySet, EntityType, Fqn, PropertyType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Error type for catalog operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Catalog backend error: {0}")]
    Backend(String),
}

/// Trait for the entity data model (EDM) service
pub trait EdmApi: Send + Sync {
    fn get_property_type(&self, id: Uuid) -> Result<PropertyType, CatalogError>;

    fn get_property_type_id(&self, fqn: &Fqn) -> Result<Uuid, CatalogError>;

    fn get_entity_type(&self, id: Uuid) -> Result<EntityType, CatalogError>;

    fn get_entity_type_id(&self, fqn: &Fqn) -> Result<Uuid, CatalogError>;

    /// Association types share their id with their underlying entity type
    fn get_association_type(&self, id: Uuid) -> Result<AssociationType, CatalogError>;

    fn get_all_entity_types(&self) -> Result<Vec<EntityType>, CatalogError>;

    fn get_all_property_types(&self) -> Result<Vec<PropertyType>, CatalogError>;

    fn add_src_entity_type_to_association_type(
        &self,
        association_type_id: Uuid,
        entity_type_id: Uuid,
    ) -> Result<(), CatalogError>;

    fn add_dst_entity_type_to_association_type(
        &self,
        association_type_id: Uuid,
        entity_type_id: Uuid,
    ) -> Result<(), CatalogError>;
}

/// Trait for the entity-set registry
pub trait EntitySetsApi: Send + Sync {
    fn get_entity_set_id(&self, name: &str) -> Result<Uuid, CatalogError>;

    fn get_entity_set(&self, id: Uuid) -> Result<EntitySet, CatalogError>;

    fn get_all_entity_sets(&self) -> Result<Vec<EntitySet>, CatalogError>;

    /// Create entity sets, returning the assigned ids keyed by name
    fn create_entity_sets(
        &self,
        entity_sets: &[EntitySet],
    ) -> Result<BTreeMap<String, Uuid>, CatalogError>;
}

/// Trait for the warehouse holding the source table
pub trait Warehouse {
    /// Physical column types of `table`, keyed by column name.
    ///
    /// An empty map means the table does not exist.
    fn get_datatypes(&self, table: &str) -> Result<BTreeMap<String, String>, CatalogError>;
}

/// Handles to the catalog services a flight resolves against
#[derive(Clone)]
pub struct Catalog {
    pub edm: Arc<dyn EdmApi>,
    pub entity_sets: Arc<dyn EntitySetsApi>,
}

impl Catalog {
    pub fn new(edm: Arc<dyn EdmApi>, entity_sets: Arc<dyn EntitySetsApi>) -> Self {
        Self { edm, entity_sets }
    }

    /// Use one in-memory catalog for both services
    pub fn in_memory(catalog: Arc<InMemoryCatalog>) -> Self {
        Self {
            edm: catalog.clone(),
            entity_sets: catalog,
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

/// Look up a property type by its `namespace.name` text.
///
/// A malformed fqn or a failed lookup yields the sentinel type.
pub fn resolve_property_type(edm: &dyn EdmApi, fqn: &str) -> PropertyType {
    let Some(parsed) = Fqn::parse(fqn) else {
        return PropertyType::sentinel();
    };
    match edm
        .get_property_type_id(&parsed)
        .and_then(|id| edm.get_property_type(id))
    {
        Ok(property_type) => property_type,
        Err(e) => {
            debug!("Could not resolve property type {}: {}", fqn, e);
            PropertyType::sentinel()
        }
    }
}

/// Look up an entity type by its `namespace.name` text, falling back to the sentinel.
pub fn resolve_entity_type(edm: &dyn EdmApi, fqn: &str) -> EntityType {
    let Some(parsed) = Fqn::parse(fqn) else {
        return EntityType::sentinel();
    };
    match edm
        .get_entity_type_id(&parsed)
        .and_then(|id| edm.get_entity_type(id))
    {
        Ok(entity_type) => entity_type,
        Err(e) => {
            debug!("Could not resolve entity type {}: {}", fqn, e);
            EntityType::sentinel()
        }
    }
}

/// Look up an association type by the fqn of its entity type, falling back to the sentinel.
pub fn resolve_association_type(edm: &dyn EdmApi, fqn: &str) -> AssociationType {
    let Some(parsed) = Fqn::parse(fqn) else {
        return AssociationType::sentinel();
    };
    match edm
        .get_entity_type_id(&parsed)
        .and_then(|id| edm.get_association_type(id))
    {
        Ok(association_type) => association_type,
        Err(e) => {
            debug!("Could not resolve association type {}: {}", fqn, e);
            AssociationType::sentinel()
        }
    }
}

/// Fqns of the primary key property types of `entity_type`, in key order.
///
/// Key types the catalog cannot resolve are skipped.
pub fn key_fqns(edm: &dyn EdmApi, entity_type: &EntityType) -> Vec<String> {
    entity_type
        .key
        .iter()
        .filter_map(|id| edm.get_property_type(*id).ok())
        .map(|property_type| property_type.fqn.to_string())
        .collect()
}
