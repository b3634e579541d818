//! Fill-in inference
//!
//! Completes what a hand-written flight usually leaves out: entity set names,
//! definition names, fqns, primary keys, not-null conditions and parsers.
//! The passes run in a fixed order since later ones read what earlier ones
//! produce.

use super::config::FillInConfig;
use super::entity::EntityDefinition;
use super::Flight;
use crate::catalog::EdmApi;
use crate::models::{EntityType, PropertyType};
use once_cell::unsync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Catalog type listings, fetched at most once per fill-in run
struct TypePools<'a> {
    edm: &'a dyn EdmApi,
    entity_types: OnceCell<Vec<EntityType>>,
    property_types: OnceCell<Vec<PropertyType>>,
}

impl<'a> TypePools<'a> {
    fn new(edm: &'a dyn EdmApi) -> Self {
        Self {
            edm,
            entity_types: OnceCell::new(),
            property_types: OnceCell::new(),
        }
    }

    fn entity_types(&self) -> &[EntityType] {
        self.entity_types.get_or_init(|| {
            self.edm.get_all_entity_types().unwrap_or_else(|e| {
                warn!("Could not list entity types: {}", e);
                Vec::new()
            })
        })
    }

    fn property_types(&self) -> &[PropertyType] {
        self.property_types.get_or_init(|| {
            self.edm.get_all_property_types().unwrap_or_else(|e| {
                warn!("Could not list property types: {}", e);
                Vec::new()
            })
        })
    }
}

/// `Word` from `wORD`
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Entity set name derived from an alias: capitalized words without digits
fn entity_set_name_for(alias: &str, prefix: &str) -> String {
    let words: String = alias
        .split(' ')
        .map(|word| capitalize(word).chars().filter(|c| !c.is_ascii_digit()).collect::<String>())
        .collect();
    format!("{}{}", prefix, words)
}

/// Per-definition passes: names, entity set name, fqns and the `pk`
/// placeholder. Returns the normalized alias when it differs.
fn fill_in_definition(
    alias: &str,
    definition: &mut EntityDefinition,
    config: &FillInConfig,
    pools: &TypePools<'_>,
) -> Option<String> {
    let edm = pools.edm;
    if definition.entity_set_name.is_empty() && config.create_entity_set_names {
        definition.entity_set_name = entity_set_name_for(alias, &config.entity_set_prefix);
    }

    let normalized = if config.normalize_aliases && alias.contains(' ') {
        Some(alias.split(' ').collect::<String>())
    } else {
        None
    };
    let alias = normalized.as_deref().unwrap_or(alias);

    if definition.fqn.is_empty() && config.create_entity_fqns {
        definition.fqn = config.deducer.deduce(alias, pools.entity_types()).to_string();
        definition.clear_resolved();
        debug!("Deduced fqn {} for {}", definition.fqn, alias);
    }

    if config.create_entity_names {
        if definition.name.is_empty() {
            definition.name = alias.to_string();
        } else if definition.name != alias {
            warn!("Entity alias '{}' doesn't match its name '{}'", alias, definition.name);
        }
    }

    if config.resolve_pk_placeholders && definition.property_definitions.contains_key("pk") {
        let key = definition
            .key_fqns(edm)
            .into_iter()
            .next()
            .unwrap_or_default();
        definition.property_definitions.rename("pk", key.clone());
        if let Some(pk) = definition.property_definitions.get_mut(&key) {
            pk.type_fqn = key;
            pk.clear_resolved();
        }
    }

    if config.create_property_types {
        for (property_alias, property) in definition.property_definitions.iter_mut() {
            if property.type_fqn.is_empty() {
                property.type_fqn = config
                    .deducer
                    .deduce(property_alias, pools.property_types())
                    .to_string();
                property.clear_resolved();
            }
        }
    }

    normalized
}

impl Flight {
    /// Fill in omitted fields, then refresh the schema.
    ///
    /// Passes, each switched by `config`:
    /// 1. derive entity set names, normalize aliases, deduce fqns and names
    /// 2. resolve `pk` placeholders and deduce missing property types
    /// 3. re-key renamed definitions, rewriting association endpoints
    /// 4. generate missing primary keys, entities before associations
    /// 5. add not-null conditions for literal-backed entities
    /// 6. add default parsers
    pub fn fill_in(&mut self, config: &FillInConfig) {
        let edm = Arc::clone(&self.catalog().edm);
        let pools = TypePools::new(edm.as_ref());

        let mut renames: Vec<(String, String)> = Vec::new();
        let definitions = self.entity_definitions.iter_mut().chain(
            self.association_definitions
                .iter_mut()
                .map(|(alias, association)| (alias, &mut association.definition)),
        );
        for (alias, definition) in definitions {
            if let Some(normalized) = fill_in_definition(alias, definition, config, &pools) {
                renames.push((alias.to_string(), normalized));
            }
        }

        for (from, to) in &renames {
            if self.entity_definitions.rename(from, to.clone()) {
                for association in self.association_definitions.values_mut() {
                    if association.src_alias == *from {
                        association.src_alias = to.clone();
                    }
                    if association.dst_alias == *from {
                        association.dst_alias = to.clone();
                    }
                }
            } else {
                self.association_definitions.rename(from, to.clone());
            }
            debug!("Renamed definition {} to {}", from, to);
        }

        if config.gen_missing_pks {
            self.add_missing_pks(edm.as_ref(), config);
        }

        if config.add_conditions {
            for definition in self.entity_definitions.values_mut() {
                definition.auto_generate_conditions();
            }
        }

        if config.make_parsers {
            let timezone = config.timezone.as_deref();
            let mut added = 0;
            for definition in self
                .entity_definitions
                .values_mut()
                .chain(self.association_definitions.values_mut().map(|a| &mut a.definition))
            {
                for property in definition.property_definitions.values_mut() {
                    if property.add_datatype_parser_if_needed(edm.as_ref(), timezone) {
                        added += 1;
                    }
                }
            }
            debug!("Added {} parsers", added);
        }

        self.refresh_schema();
        info!("Filled in flight {}", self.name);
    }

    fn add_missing_pks(&mut self, edm: &dyn EdmApi, config: &FillInConfig) {
        for definition in self.entity_definitions.values_mut() {
            definition.add_pk_if_missing(
                edm,
                config.infer_pk_columns,
                &config.default_pk_columns,
                config.hash_by_default,
                None,
            );
        }

        let mut endpoint_columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, association) in self.association_definitions.iter() {
            let src = self.get_entity_definition_by_name(&association.src_alias);
            let dst = self.get_entity_definition_by_name(&association.dst_alias);
            let (Some(src), Some(dst)) = (src, dst) else {
                warn!("Skipping primary key of association {}: unknown source or destination", alias);
                continue;
            };
            let mut columns: BTreeSet<String> = src.get_columns_from_pk(edm);
            columns.extend(dst.get_columns_from_pk(edm));
            endpoint_columns.insert(alias.to_string(), columns.into_iter().collect());
        }

        for (alias, association) in self.association_definitions.iter_mut() {
            let Some(columns) = endpoint_columns.get(alias) else {
                continue;
            };
            let suffix = association.name.clone();
            association.add_pk_if_missing(edm, false, columns, config.hash_by_default, Some(&suffix));
        }
    }
}
