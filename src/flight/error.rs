//! Error types for flight operations

use crate::catalog::CatalogError;
use crate::transforms::TransformError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort reading or mutating a flight
#[derive(Error, Debug)]
pub enum FlightError {
    /// Failed to read flight file
    #[error("Failed to read flight file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Flight document is not valid YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Flights require an organization ID")]
    MissingOrganizationId,

    #[error("Invalid organization ID: {0}")]
    InvalidOrganizationId(String),

    /// A transform or condition tree is malformed
    #[error("In {context}: {source}")]
    Transform {
        context: String,
        #[source]
        source: TransformError,
    },

    /// A definition does not have the expected shape
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// One entity set name is bound to two entity types
    #[error("{0} is registered for different fqns")]
    ConflictingEntitySet(String),

    #[error("Unknown entity definition: {0}")]
    UnknownEntity(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result type for flight operations
pub type FlightResult<T> = Result<T, FlightError>;
