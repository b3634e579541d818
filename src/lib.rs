//! Flight SDK - define, check and serialize flights
//!
//! A flight maps the rows of a source table onto the entities and
//! associations of a catalog-managed graph model. Provides:
//! - Transform and condition trees (reading, writing, column discovery)
//! - Flight documents and the wiki shorthand
//! - Fill-in of omitted names, types, keys, conditions and parsers
//! - Validation reports against a catalog and a source warehouse
//! - Catalog interfaces with an in-memory implementation

pub mod catalog;
pub mod flight;
pub mod models;
pub mod transforms;
pub mod validation;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, EdmApi, EntitySetsApi, InMemoryCatalog, Warehouse};
pub use flight::{
    AssociationDefinition, DefinitionMap, EntityDefinition, FillInConfig, Flight, FlightError, FlightResult,
    FlightSchema, FqnDeducer, PropertyDefinition, ValidationConfig,
};
pub use models::{AssociationType, Datatype, EntitySet, EntityType, Fqn, PropertyType};
pub use transforms::{Node, NodeKind, TransformError};
pub use validation::{LogLevel, ValidationReport};
