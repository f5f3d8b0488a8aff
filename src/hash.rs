//! Fixed-bucket hash table with separate chaining, shared by the AS registry
//! and the visited set.

const FNV_OFFSET_64: u64 = 14695981039346656037;
const FNV_PRIME_64: u64 = 1099511628211;

/// 64-bit FNV hash over the eight little-endian bytes of `key`.
pub fn fnv_hash(key: u64) -> u64 {
    key.to_le_bytes().iter().fold(FNV_OFFSET_64, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME_64)
    })
}

pub trait TableKey: Copy + Eq {
    fn hash_key(&self) -> u64;
}

impl TableKey for u32 {
    fn hash_key(&self) -> u64 {
        fnv_hash(u64::from(*self))
    }
}

impl TableKey for usize {
    fn hash_key(&self) -> u64 {
        fnv_hash(*self as u64)
    }
}

/// The bucket count is chosen at construction and never changes; long chains
/// are the price of a too small table.
#[derive(Debug, Clone)]
pub struct ChainedTable<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
}

impl<K: TableKey, V> ChainedTable<K, V> {
    pub fn with_buckets(buckets: usize) -> Self {
        let mut table = Vec::new();
        table.resize_with(buckets.max(1), Vec::new);
        ChainedTable {
            buckets: table,
            len: 0,
        }
    }

    fn bucket_of(&self, key: &K) -> usize {
        (key.hash_key() % self.buckets.len() as u64) as usize
    }

    /// Returns the rejected pair when `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), (K, V)> {
        if self.contains(&key) {
            return Err((key, value));
        }
        let bucket = self.bucket_of(&key);
        self.buckets[bucket].push((key, value));
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let bucket = self.bucket_of(key);
        let chain = &mut self.buckets[bucket];
        let position = chain.iter().position(|(k, _)| k == key)?;
        self.len -= 1;
        Some(chain.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Empties every chain but keeps the bucket array and chain capacity.
    pub fn clear(&mut self) {
        for chain in self.buckets.iter_mut() {
            chain.clear();
        }
        self.len = 0;
    }

    /// Bucket order, then insertion order inside a bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|chain| chain.iter().map(|(k, v)| (k, v)))
    }
}
