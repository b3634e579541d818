//! Configuration for fill-in and validation

use super::deduce::FqnDeducer;
use crate::validation::LogLevel;
use serde::{Deserialize, Serialize};

/// Which fill-in passes run, and how.
///
/// Passes run in a fixed order; turning an early pass off can leave later
/// passes with nothing to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillInConfig {
    /// Strip spaces from multi-word aliases
    pub normalize_aliases: bool,
    /// Derive missing entity set names from the alias
    pub create_entity_set_names: bool,
    /// Prepended to derived entity set names
    pub entity_set_prefix: String,
    /// Deduce missing entity fqns from the alias
    pub create_entity_fqns: bool,
    /// Use the alias as name where the name is missing
    pub create_entity_names: bool,
    /// Replace the `pk` property alias with the real primary key fqn
    pub resolve_pk_placeholders: bool,
    /// Deduce missing property types from the property alias
    pub create_property_types: bool,
    /// Add primary key property definitions where none exists
    pub gen_missing_pks: bool,
    /// Key entities on all of their columns instead of `default_pk_columns`
    pub infer_pk_columns: bool,
    pub default_pk_columns: Vec<String>,
    /// Hash key columns rather than using them directly
    pub hash_by_default: bool,
    /// Add not-null conditions for literal-backed entities
    pub add_conditions: bool,
    /// Append default parsers for typed properties
    pub make_parsers: bool,
    /// Timezone given to generated date and time parsers
    pub timezone: Option<String>,
    pub deducer: FqnDeducer,
}

impl Default for FillInConfig {
    fn default() -> Self {
        Self {
            normalize_aliases: true,
            create_entity_set_names: true,
            entity_set_prefix: String::new(),
            create_entity_fqns: true,
            create_entity_names: true,
            resolve_pk_placeholders: true,
            create_property_types: true,
            gen_missing_pks: true,
            infer_pk_columns: true,
            default_pk_columns: Vec::new(),
            hash_by_default: true,
            add_conditions: false,
            make_parsers: true,
            timezone: None,
            deducer: FqnDeducer::default(),
        }
    }
}

impl FillInConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// A config with every pass disabled
    pub fn none() -> Self {
        Self {
            normalize_aliases: false,
            create_entity_set_names: false,
            create_entity_fqns: false,
            create_entity_names: false,
            resolve_pk_placeholders: false,
            create_property_types: false,
            gen_missing_pks: false,
            infer_pk_columns: false,
            hash_by_default: false,
            make_parsers: false,
            ..Self::default()
        }
    }

    pub fn with_entity_set_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entity_set_prefix = prefix.into();
        self
    }

    pub fn with_missing_pks(mut self, enabled: bool) -> Self {
        self.gen_missing_pks = enabled;
        self
    }

    /// Key entities on `columns` instead of inferring key columns
    pub fn with_default_pk_columns(mut self, columns: Vec<String>) -> Self {
        self.infer_pk_columns = false;
        self.default_pk_columns = columns;
        self
    }

    pub fn with_hash_by_default(mut self, enabled: bool) -> Self {
        self.hash_by_default = enabled;
        self
    }

    pub fn with_conditions(mut self, enabled: bool) -> Self {
        self.add_conditions = enabled;
        self
    }

    pub fn with_parsers(mut self, enabled: bool) -> Self {
        self.make_parsers = enabled;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_deducer(mut self, deducer: FqnDeducer) -> Self {
        self.deducer = deducer;
        self
    }
}

/// Configuration for validation runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub log_level: LogLevel,
    /// Leading characters an existing entity set name must share with a
    /// missing one to be suggested as an alternative
    pub overlap_threshold: usize,
    /// Entity type whose definitions must carry a datasource property
    pub person_fqn: String,
    pub datasource_fqn: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::None,
            overlap_threshold: 3,
            person_fqn: "general.person".to_string(),
            datasource_fqn: "ol.datasource".to_string(),
        }
    }
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn with_overlap_threshold(mut self, threshold: usize) -> Self {
        self.overlap_threshold = threshold;
        self
    }
}
