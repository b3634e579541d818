//! In-memory catalog
//!
//! Holds entity, property and association types plus entity sets in process.
//! Type ids are deterministic UUID v5 values derived from the fqn, so a flight
//! and a catalog built independently agree on ids without a lookup.

use super::{CatalogError, EdmApi, EntitySetsApi};
use crate::models::{AssociationType, Datatype, EntitySet, EntityType, Fqn, PropertyType};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Store {
    property_types: BTreeMap<Uuid, PropertyType>,
    entity_types: BTreeMap<Uuid, EntityType>,
    association_types: BTreeMap<Uuid, AssociationType>,
    entity_sets: BTreeMap<Uuid, EntitySet>,
}

/// Catalog kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    store: RwLock<Store>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic id for a type fqn
    pub fn type_id(fqn: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("type:{}", fqn).as_bytes())
    }

    /// Deterministic id for an entity set name
    pub fn entity_set_id(name: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("entity-set:{}", name).as_bytes())
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a property type with the given datatype
    pub fn add_property_type(&self, fqn: &str, datatype: Datatype) -> Uuid {
        self.insert_property_type(PropertyType {
            id: Self::type_id(fqn),
            fqn: fqn.parse().unwrap_or_default(),
            datatype: Some(datatype),
            title: fqn.to_string(),
            description: String::new(),
        })
    }

    /// Register a fully specified property type
    pub fn insert_property_type(&self, property_type: PropertyType) -> Uuid {
        let id = property_type.id;
        debug!("Registering property type {}", property_type.fqn);
        self.write().property_types.insert(id, property_type);
        id
    }

    /// Register an entity type. Key property types are also members of the type.
    pub fn add_entity_type(&self, fqn: &str, key: &[&str], properties: &[&str]) -> Uuid {
        self.insert_entity_type(Self::build_entity_type(fqn, key, properties))
    }

    pub fn insert_entity_type(&self, entity_type: EntityType) -> Uuid {
        let id = entity_type.id;
        debug!("Registering entity type {}", entity_type.fqn);
        self.write().entity_types.insert(id, entity_type);
        id
    }

    /// Register an association type with its allowed source and destination entity types
    pub fn add_association_type(
        &self,
        fqn: &str,
        key: &[&str],
        properties: &[&str],
        src: &[&str],
        dst: &[&str],
        bidirectional: bool,
    ) -> Uuid {
        let entity_type = Self::build_entity_type(fqn, key, properties);
        let id = entity_type.id;
        let association_type = AssociationType {
            entity_type: entity_type.clone(),
            src: src.iter().map(|fqn| Self::type_id(fqn)).collect(),
            dst: dst.iter().map(|fqn| Self::type_id(fqn)).collect(),
            bidirectional,
        };
        let mut store = self.write();
        store.entity_types.insert(id, entity_type);
        store.association_types.insert(id, association_type);
        id
    }

    /// Register an entity set bound to the entity type named by `entity_type_fqn`
    pub fn add_entity_set(&self, name: &str, entity_type_fqn: &str) -> Uuid {
        let mut entity_set = EntitySet::new(name, Self::type_id(entity_type_fqn));
        entity_set.id = Self::entity_set_id(name);
        let id = entity_set.id;
        self.write().entity_sets.insert(id, entity_set);
        id
    }

    fn build_entity_type(fqn: &str, key: &[&str], properties: &[&str]) -> EntityType {
        let key: Vec<Uuid> = key.iter().map(|fqn| Self::type_id(fqn)).collect();
        let mut members: BTreeSet<Uuid> = properties.iter().map(|fqn| Self::type_id(fqn)).collect();
        members.extend(key.iter().copied());
        EntityType {
            id: Self::type_id(fqn),
            fqn: fqn.parse().unwrap_or_default(),
            key,
            properties: members,
            title: fqn.to_string(),
            description: String::new(),
        }
    }
}

impl EdmApi for InMemoryCatalog {
    fn get_property_type(&self, id: Uuid) -> Result<PropertyType, CatalogError> {
        self.read()
            .property_types
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("property type {}", id)))
    }

    fn get_property_type_id(&self, fqn: &Fqn) -> Result<Uuid, CatalogError> {
        self.read()
            .property_types
            .values()
            .find(|p| &p.fqn == fqn)
            .map(|p| p.id)
            .ok_or_else(|| CatalogError::NotFound(format!("property type {}", fqn)))
    }

    fn get_entity_type(&self, id: Uuid) -> Result<EntityType, CatalogError> {
        self.read()
            .entity_types
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("entity type {}", id)))
    }

    fn get_entity_type_id(&self, fqn: &Fqn) -> Result<Uuid, CatalogError> {
        self.read()
            .entity_types
            .values()
            .find(|e| &e.fqn == fqn)
            .map(|e| e.id)
            .ok_or_else(|| CatalogError::NotFound(format!("entity type {}", fqn)))
    }

    fn get_association_type(&self, id: Uuid) -> Result<AssociationType, CatalogError> {
        self.read()
            .association_types
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("association type {}", id)))
    }

    fn get_all_entity_types(&self) -> Result<Vec<EntityType>, CatalogError> {
        Ok(self.read().entity_types.values().cloned().collect())
    }

    fn get_all_property_types(&self) -> Result<Vec<PropertyType>, CatalogError> {
        Ok(self.read().property_types.values().cloned().collect())
    }

    fn add_src_entity_type_to_association_type(
        &self,
        association_type_id: Uuid,
        entity_type_id: Uuid,
    ) -> Result<(), CatalogError> {
        let mut store = self.write();
        let association_type = store
            .association_types
            .get_mut(&association_type_id)
            .ok_or_else(|| CatalogError::NotFound(format!("association type {}", association_type_id)))?;
        association_type.src.insert(entity_type_id);
        Ok(())
    }

    fn add_dst_entity_type_to_association_type(
        &self,
        association_type_id: Uuid,
        entity_type_id: Uuid,
    ) -> Result<(), CatalogError> {
        let mut store = self.write();
        let association_type = store
            .association_types
            .get_mut(&association_type_id)
            .ok_or_else(|| CatalogError::NotFound(format!("association type {}", association_type_id)))?;
        association_type.dst.insert(entity_type_id);
        Ok(())
    }
}

impl EntitySetsApi for InMemoryCatalog {
    fn get_entity_set_id(&self, name: &str) -> Result<Uuid, CatalogError> {
        self.read()
            .entity_sets
            .values()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .ok_or_else(|| CatalogError::NotFound(format!("entity set {}", name)))
    }

    fn get_entity_set(&self, id: Uuid) -> Result<EntitySet, CatalogError> {
        self.read()
            .entity_sets
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("entity set {}", id)))
    }

    fn get_all_entity_sets(&self) -> Result<Vec<EntitySet>, CatalogError> {
        Ok(self.read().entity_sets.values().cloned().collect())
    }

    fn create_entity_sets(
        &self,
        entity_sets: &[EntitySet],
    ) -> Result<BTreeMap<String, Uuid>, CatalogError> {
        let mut store = self.write();
        if let Some(existing) = entity_sets
            .iter()
            .find(|new| store.entity_sets.values().any(|s| s.name == new.name))
        {
            return Err(CatalogError::Backend(format!(
                "entity set {} already exists",
                existing.name
            )));
        }
        let mut created = BTreeMap::new();
        for entity_set in entity_sets {
            let mut entity_set = entity_set.clone();
            if entity_set.id.is_nil() {
                entity_set.id = Self::entity_set_id(&entity_set.name);
            }
            created.insert(entity_set.name.clone(), entity_set.id);
            store.entity_sets.insert(entity_set.id, entity_set);
        }
        Ok(created)
    }
}
