//! Insertion-ordered alias maps

use indexmap::IndexMap;

/// Alias-keyed map that keeps insertion order.
///
/// Definitions are written back in the order they were read, and a renamed
/// alias keeps its position.
#[derive(Debug, Clone)]
pub struct DefinitionMap<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for DefinitionMap<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

/// Equal when the same aliases map to equal values in the same order.
impl<T: PartialEq> PartialEq for DefinitionMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T> DefinitionMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace in place, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.shift_remove(key)
    }

    /// Move the value under `from` to `to`, keeping its position.
    ///
    /// An existing entry under `to` is dropped. Returns false when `from` is
    /// absent.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> bool {
        let to = to.into();
        if from == to {
            return self.contains_key(from);
        }
        if !self.contains_key(from) {
            return false;
        }
        self.entries.shift_remove(&to);
        let Some(index) = self.entries.get_index_of(from) else {
            return false;
        };
        if let Some((_, value)) = self.entries.shift_remove_index(index) {
            self.entries.shift_insert(index, to, value);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut T) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for DefinitionMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<T> IntoIterator for DefinitionMap<T> {
    type Item = (String, T);
    type IntoIter = indexmap::map::IntoIter<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
