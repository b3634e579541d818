//! Fully qualified names of catalog types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `namespace.name` pair identifying a catalog type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fqn {
    pub namespace: String,
    pub name: String,
}

impl Fqn {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Split `namespace.name` at the first dot.
    ///
    /// Returns `None` when there is no dot or either side is empty, which callers
    /// treat the same way as a failed catalog lookup.
    pub fn parse(value: &str) -> Option<Self> {
        let (namespace, name) = value.split_once('.')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(namespace, name))
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty() && self.name.is_empty()
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for Fqn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{}' is not a namespace.name pair", s))
    }
}
