use crossbeam::utils::CachePadded;
use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::ops::Deref;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use super::Entry;
use crate::error::{Error, Result};

/// Number of buckets used by [`BucketMap::new`].
pub const DEFAULT_CAPACITY: usize = 10;

type Bucket<K, V> = Vec<Entry<K, V>>;

type ProtectedBucket<K, V> = CachePadded<RwLock<Bucket<K, V>>>;

fn position<K, V, Q>(bucket: &[Entry<K, V>], key: &Q) -> Option<usize>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    bucket.iter().position(|entry| entry.key().borrow() == key)
}

struct MaybeValueRef<'a, K, V> {
    guard: RwLockReadGuard<'a, Bucket<K, V>>,
}

impl<'a, K, V> MaybeValueRef<'a, K, V> {
    fn find<Q>(self, key: &Q) -> Option<ValueRef<'a, K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        position(&self.guard, key).map(|idx| ValueRef {
            idx,
            guard: self.guard,
        })
    }
}

/// A borrowed value inside a [`BucketMap`].
///
/// The bucket holding the value stays read-locked until this is dropped, so
/// writers to that bucket (including the current thread) block meanwhile.
pub struct ValueRef<'a, K, V> {
    idx: usize,
    guard: RwLockReadGuard<'a, Bucket<K, V>>,
}

impl<'a, K, V> ValueRef<'a, K, V> {
    pub fn key(&self) -> &K {
        self.guard[self.idx].key()
    }
}

impl<'a, K, V> Deref for ValueRef<'a, K, V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        self.guard[self.idx].value()
    }
}

/// A concurrent hash map with a fixed number of buckets, each guarded by its
/// own reader/writer lock.
///
/// Single-key operations lock only the bucket the key resolves to, so
/// operations on different buckets never contend. Operations that span the
/// whole map (`len`, `clear`, the snapshot collections, `contains_value`)
/// lock one bucket at a time in index order and never hold two bucket locks
/// at once. They see each bucket consistently, but entries inserted or
/// removed concurrently in other buckets may or may not be reflected.
///
/// The bucket count is fixed at construction; the map never resizes.
pub struct BucketMap<K, V, S = RandomState> {
    buckets: Box<[ProtectedBucket<K, V>]>,
    state: S,
}

impl<K, V> Default for BucketMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BucketMap<K, V, RandomState> {
    /// Creates a map with [`DEFAULT_CAPACITY`] buckets.
    pub fn new() -> Self {
        BucketMap::build(DEFAULT_CAPACITY, RandomState::default())
    }

    /// Creates a map with `capacity` buckets.
    ///
    /// Fails with [`Error::ZeroCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        BucketMap::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V, S> BucketMap<K, V, S> {
    /// Creates a map with `capacity` buckets that uses `hasher` to pick the
    /// bucket for a key.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(BucketMap::build(capacity, hasher))
    }

    fn build(capacity: usize, hasher: S) -> Self {
        let buckets: Vec<ProtectedBucket<K, V>> = (0..capacity)
            .map(|_| CachePadded::new(RwLock::new(Vec::new())))
            .collect();
        debug!(capacity, "created bucket map");
        BucketMap {
            buckets: buckets.into_boxed_slice(),
            state: hasher,
        }
    }

    /// Number of buckets. Fixed for the lifetime of the map.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn hasher(&self) -> &S {
        &self.state
    }

    fn read_bucket(&self, index: usize) -> Result<RwLockReadGuard<'_, Bucket<K, V>>> {
        self.buckets[index].read().map_err(|_| poisoned(index))
    }

    fn write_bucket(&self, index: usize) -> Result<RwLockWriteGuard<'_, Bucket<K, V>>> {
        self.buckets[index].write().map_err(|_| poisoned(index))
    }

    /// Visits every bucket in index order under its read lock, releasing each
    /// lock before taking the next.
    fn fold_buckets<B, F>(&self, init: B, mut f: F) -> Result<B>
    where
        F: FnMut(B, &[Entry<K, V>]) -> B,
    {
        let mut acc = init;
        for index in 0..self.buckets.len() {
            let bucket = self.read_bucket(index)?;
            acc = f(acc, &bucket);
        }
        Ok(acc)
    }

    /// Counts the entries of every bucket.
    ///
    /// Buckets are counted one after another, so under concurrent mutation the
    /// result need not match the map's contents at any single instant.
    pub fn len(&self) -> Result<usize> {
        self.fold_buckets(0, |acc, bucket| acc + bucket.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes every entry, one bucket at a time.
    ///
    /// If a bucket's lock is poisoned the buckets before it have already been
    /// cleared.
    pub fn clear(&self) -> Result<()> {
        trace!(capacity = self.capacity(), "clearing bucket map");
        for index in 0..self.buckets.len() {
            self.write_bucket(index)?.clear();
        }
        Ok(())
    }

    pub fn contains_value(&self, value: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        for index in 0..self.buckets.len() {
            let bucket = self.read_bucket(index)?;
            if bucket.iter().any(|entry| entry.value() == value) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns a copy of every value. Values shared by several keys appear
    /// once per key.
    pub fn values(&self) -> Result<Vec<V>>
    where
        V: Clone,
    {
        self.fold_buckets(Vec::new(), |mut values, bucket| {
            values.extend(bucket.iter().map(|entry| entry.value().clone()));
            values
        })
    }
}

impl<K, V, S> BucketMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = self.state.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    /// Returns a clone of the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        Ok(self.get_ref(key)?.map(|value| V::clone(&value)))
    }

    /// Returns a reference to the value stored for `key`, keeping its bucket
    /// read-locked while the reference lives.
    pub fn get_ref<Q>(&self, key: &Q) -> Result<Option<ValueRef<'_, K, V>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let searcher = MaybeValueRef {
            guard: self.read_bucket(self.bucket_index(key))?,
        };
        Ok(searcher.find(key))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.read_bucket(self.bucket_index(key))?;
        Ok(position(&bucket, key).is_some())
    }

    /// Maps `key` to `value`, returning the value it replaced, if any.
    pub fn put(&self, key: K, value: V) -> Result<Option<V>> {
        let mut bucket = self.write_bucket(self.bucket_index(&key))?;
        match position(&bucket, &key) {
            Some(idx) => Ok(Some(bucket[idx].replace_value(value))),
            None => {
                bucket.push(Entry::new(key, value));
                Ok(None)
            }
        }
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut bucket = self.write_bucket(self.bucket_index(key))?;
        Ok(position(&bucket, key).map(|idx| bucket.remove(idx).into_value()))
    }

    /// Puts every pair from `source` in turn. Other threads may observe the
    /// batch partially applied.
    pub fn put_all<I>(&self, source: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in source {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// Returns a copy of every key.
    pub fn key_set(&self) -> Result<HashSet<K>>
    where
        K: Clone,
    {
        self.fold_buckets(HashSet::new(), |mut keys, bucket| {
            keys.extend(bucket.iter().map(|entry| entry.key().clone()));
            keys
        })
    }

    /// Returns a copy of every key/value pair.
    pub fn entry_set(&self) -> Result<HashSet<Entry<K, V>>>
    where
        K: Clone,
        V: Clone + Hash + Eq,
    {
        self.fold_buckets(HashSet::new(), |mut entries, bucket| {
            entries.extend(bucket.iter().cloned());
            entries
        })
    }
}

impl<K, V, S> fmt::Debug for BucketMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketMap")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

fn poisoned(bucket: usize) -> Error {
    warn!(bucket, "bucket lock poisoned");
    Error::Poisoned { bucket }
}
