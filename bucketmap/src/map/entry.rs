use std::mem;

/// A key/value pair.
///
/// Inside a [`BucketMap`](super::BucketMap) an entry is owned by exactly one
/// bucket; the entries handed out by [`BucketMap::entry_set`] are clones
/// taken under the bucket's lock, so changing them never touches the map.
///
/// Two entries are equal when both their keys and their values are equal.
///
/// [`BucketMap::entry_set`]: super::BucketMap::entry_set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Entry { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Overwrites the value, returning the previous one. The key never changes.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        mem::replace(&mut self.value, value)
    }
}

impl<K, V> From<(K, V)> for Entry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Entry::new(key, value)
    }
}

impl<K, V> From<Entry<K, V>> for (K, V) {
    fn from(entry: Entry<K, V>) -> Self {
        entry.into_parts()
    }
}
