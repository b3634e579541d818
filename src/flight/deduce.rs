//! Fqn deduction from aliases
//!
//! Fill-in lets authors skip namespaces: an alias such as `vehicle2` is
//! matched against the catalog's type names to find `ol.vehicle`.

use crate::models::{CatalogType, Fqn};
use serde::{Deserialize, Serialize};

/// Rules for turning an alias into a catalog fqn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FqnDeducer {
    /// Namespace paired with the alias when nothing in the catalog matches
    pub default_namespace: String,
    /// Namespace that wins when several namespaces carry a matching name
    pub preferred_namespace: String,
    /// Types whose name, title or description contain this are skipped
    pub deprecated_marker: String,
}

impl Default for FqnDeducer {
    fn default() -> Self {
        Self {
            default_namespace: "ol".to_string(),
            preferred_namespace: "ol".to_string(),
            deprecated_marker: "-d".to_string(),
        }
    }
}

impl FqnDeducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    pub fn with_preferred_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.preferred_namespace = namespace.into();
        self
    }

    /// Deduce the fqn meant by `alias`, looking it up in `pool`.
    ///
    /// Digits and spaces are stripped first. An alias that already contains a
    /// dot is split as-is.
    pub fn deduce<T: CatalogType>(&self, alias: &str, pool: &[T]) -> Fqn {
        let name: String = alias
            .chars()
            .filter(|c| !c.is_ascii_digit() && *c != ' ')
            .collect();

        if let Some((namespace, rest)) = name.split_once('.') {
            let rest = rest.split('.').next().unwrap_or_default();
            return Fqn::new(namespace, rest);
        }
        match name.as_str() {
            "is" => return Fqn::new("o", "is"),
            "person" | "datetime" => return Fqn::new("general", name.as_str()),
            _ => {}
        }

        let lowered = name.to_lowercase();
        // namespace -> matching name, in catalog order
        let mut matches: Vec<(&str, &str)> = Vec::new();
        for candidate in pool {
            let fqn = candidate.fqn();
            if fqn.name.to_lowercase() != lowered || candidate.is_deprecated(&self.deprecated_marker) {
                continue;
            }
            let namespace = fqn.namespace.as_str();
            match matches.iter().position(|m| m.0 == namespace) {
                Some(i) => matches[i].1 = fqn.name.as_str(),
                None => matches.push((namespace, fqn.name.as_str())),
            }
        }

        let chosen = matches
            .iter()
            .find(|m| m.0 == self.preferred_namespace)
            .or_else(|| matches.first());
        match chosen {
            Some((namespace, matched)) => Fqn::new(*namespace, *matched),
            None => Fqn::new(self.default_namespace.clone(), name),
        }
    }
}
