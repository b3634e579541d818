//! Models module for the SDK
//!
//! Defines the catalog-side data structures a flight is resolved against:
//! fully qualified names, datatypes, property/entity/association types and
//! entity sets.

pub mod datatype;
pub mod fqn;
pub mod types;

pub use datatype::Datatype;
pub use fqn::Fqn;
pub use types::{AssociationType, CatalogType, EntitySet, EntityType, PropertyType};
