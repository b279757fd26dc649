use std::collections::hash_map::{self, HashMap};

/// Values indexed by song key. A later insert under an existing key replaces
/// the earlier value.
#[derive(Clone, Debug)]
pub struct KeyedCollection<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for KeyedCollection<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> KeyedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: T) -> Option<T> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, T> {
        self.entries.iter()
    }
}

impl<T> FromIterator<(String, T)> for KeyedCollection<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut collection = KeyedCollection::new();
        for (key, value) in iter {
            collection.insert(key, value);
        }
        collection
    }
}

/// Entries of `source` whose key is absent from `destination`.
pub fn missing<T: Clone, U>(
    source: &KeyedCollection<T>,
    destination: &KeyedCollection<U>,
) -> Vec<T> {
    source
        .iter()
        .filter(|(key, _)| !destination.contains_key(key))
        .map(|(_, value)| value.clone())
        .collect()
}
