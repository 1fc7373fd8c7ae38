//! LMDB-backed durable storage.

use std::path::Path;
use std::sync::RwLock;

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::config::StoreConfig;
use crate::storage::KeyValueStorage;

const DB_NAME: &str = "memory_locations";

/// Durable [`KeyValueStorage`] over a single named LMDB database.
pub struct LmdbStorage {
    env: RwLock<Option<Environment>>,
    db: Database,
    path: String,
}

impl LmdbStorage {
    /// Opens (creating if needed) the environment in `<config.name>.lmdb`.
    pub fn init(config: &StoreConfig) -> Result<Self, AppResponse> {
        let path = config.lmdb_dir();
        std::fs::create_dir_all(&path)?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(config.map_size)
            .open(Path::new(&path))?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        info!("LMDB storage opened at {}", path);
        Ok(Self {
            env: RwLock::new(Some(env)),
            db,
            path,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.env.read().map(|env| env.is_some()).unwrap_or(false)
    }

    /// Drops the environment. Later reads and writes fail with `DatabaseError`.
    pub fn close_database(&self) -> Result<(), AppResponse> {
        let mut env = self
            .env
            .write()
            .map_err(|_| AppResponse::DatabaseError("LMDB environment lock poisoned".to_string()))?;
        match env.take() {
            Some(environment) => {
                if let Err(e) = environment.sync(true) {
                    warn!("Failed to sync LMDB environment before close: {e}");
                }
                info!("LMDB storage at {} closed", self.path);
            }
            None => debug!("LMDB storage at {} was already closed", self.path),
        }
        Ok(())
    }

    fn with_env<T>(
        &self,
        op: impl FnOnce(&Environment) -> Result<T, AppResponse>,
    ) -> Result<T, AppResponse> {
        let guard = self
            .env
            .read()
            .map_err(|_| AppResponse::DatabaseError("LMDB environment lock poisoned".to_string()))?;
        match guard.as_ref() {
            Some(env) => op(env),
            None => Err(AppResponse::DatabaseError(format!(
                "LMDB storage at {} is closed",
                self.path
            ))),
        }
    }
}

impl KeyValueStorage for LmdbStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        self.with_env(|env| {
            let txn = env.begin_ro_txn()?;
            let value = match txn.get(self.db, &key) {
                Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                    AppResponse::SerializationError(format!("Invalid UTF-8 under key {key}: {e}"))
                })?),
                Err(lmdb::Error::NotFound) => None,
                Err(e) => return Err(AppResponse::from(e)),
            };
            txn.commit()?;
            Ok(value)
        })
    }

    fn write_batch(&self, entries: &[(&str, &str)]) -> Result<(), AppResponse> {
        self.with_env(|env| {
            let mut txn = env.begin_rw_txn()?;
            for (key, value) in entries {
                txn.put(self.db, key, value, WriteFlags::empty())?;
            }
            txn.commit()?;
            Ok(())
        })
    }
}

impl Drop for LmdbStorage {
    fn drop(&mut self) {
        if let Err(e) = self.close_database() {
            warn!("Error closing LMDB storage on drop: {e}");
        }
    }
}
