//! Key/value storage substrate.
//!
//! The store only needs whole-value reads and writes addressed by string keys.
//! [`LmdbStorage`](crate::lmdb_storage::LmdbStorage) provides the durable
//! implementation; [`MemoryStorage`] keeps everything in a map and is used for
//! tests and for hosts that persist elsewhere.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::app_response::AppResponse;

/// Whole-value key/value storage.
///
/// Writes replace the value wholesale. `write_batch` applies every pair or
/// none of them.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        self.write_batch(&[(key, value)])
    }

    fn write_batch(&self, entries: &[(&str, &str)]) -> Result<(), AppResponse>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        (**self).get(key)
    }

    fn write_batch(&self, entries: &[(&str, &str)]) -> Result<(), AppResponse> {
        (**self).write_batch(entries)
    }
}

/// In-memory [`KeyValueStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, AppResponse> {
        self.values
            .lock()
            .map_err(|_| AppResponse::DatabaseError("Memory storage lock poisoned".to_string()))
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize, AppResponse> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppResponse> {
        Ok(self.lock()?.is_empty())
    }

    pub fn remove(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.lock()?.remove(key))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write_batch(&self, entries: &[(&str, &str)]) -> Result<(), AppResponse> {
        let mut values = self.lock()?;
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}
