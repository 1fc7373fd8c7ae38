/// Storage keys under which the store keeps its two values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Serialized collection of memory locations.
    pub collection: String,
    /// Fingerprint of the last applied seed dataset.
    pub seed_fingerprint: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            collection: "for_my_love_memory_locations".to_string(),
            seed_fingerprint: "for_my_love_memory_seed_version".to_string(),
        }
    }
}

/// Settings for opening a durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database name; LMDB files live in `<name>.lmdb`.
    pub name: String,
    /// Upper bound of the LMDB memory map in bytes. Photos are stored inline,
    /// so this bounds the total size of the collection.
    pub map_size: usize,
    pub keys: StorageKeys,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "for_my_love_memories".to_string(),
            map_size: 10 * 1024 * 1024,
            keys: StorageKeys::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Directory holding the LMDB environment.
    pub fn lmdb_dir(&self) -> String {
        format!("{}.lmdb", self.name)
    }
}
