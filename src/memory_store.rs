//! Memory-location store.
//!
//! Every public operation first reconciles stored state with the bundled seed
//! dataset, then performs a read-modify-write of the whole collection. Storage
//! is injected; a store without a usable substrate is represented by
//! [`StorageCapability::Disabled`] and answers reads with an empty collection
//! and writes with a no-op.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::config::StorageKeys;
use crate::memory_location::{non_empty_or, MemoryLocation, MemoryLocationInput, DEFAULT_ICON_COLOR};
use crate::seed::{reconcile, ReconcileOutcome, SeedDataset};
use crate::storage::KeyValueStorage;

/// Order token that sorts by newest `created_date` first.
pub const CREATED_DATE_DESC: &str = "-created_date";

/// Source of "now" for timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// ISO 8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp; unparsable values map to the Unix epoch.
fn timestamp_millis(value: &str) -> i64 {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.timestamp_millis();
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Ordering applied by [`MemoryLocationStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Order in which records sit in storage.
    #[default]
    Storage,
    /// Newest `created_date` first; ties keep storage order.
    CreatedDateDesc,
}

impl ListOrder {
    /// Only the literal `-created_date` selects a sort.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(CREATED_DATE_DESC) => ListOrder::CreatedDateDesc,
            _ => ListOrder::Storage,
        }
    }

    fn apply(self, mut items: Vec<MemoryLocation>) -> Vec<MemoryLocation> {
        if self == ListOrder::CreatedDateDesc {
            // sort_by_key is stable, so equal timestamps keep their storage order
            items.sort_by_key(|item| std::cmp::Reverse(timestamp_millis(&item.created_date)));
        }
        items
    }
}

/// Whether a storage substrate is present.
#[derive(Debug)]
pub enum StorageCapability<S> {
    Available(S),
    Disabled,
}

pub struct MemoryLocationStore<S> {
    storage: StorageCapability<S>,
    seed: SeedDataset,
    keys: StorageKeys,
    clock: Box<dyn Clock + Send + Sync>,
}

impl<S: KeyValueStorage> MemoryLocationStore<S> {
    pub fn new(storage: S, seed: SeedDataset, keys: StorageKeys) -> Self {
        Self {
            storage: StorageCapability::Available(storage),
            seed,
            keys,
            clock: Box::new(SystemClock),
        }
    }

    /// Store for hosts without durable storage.
    pub fn disabled(seed: SeedDataset, keys: StorageKeys) -> Self {
        Self {
            storage: StorageCapability::Disabled,
            seed,
            keys,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.storage, StorageCapability::Disabled)
    }

    pub fn storage(&self) -> Option<&S> {
        match &self.storage {
            StorageCapability::Available(storage) => Some(storage),
            StorageCapability::Disabled => None,
        }
    }

    pub fn seed(&self) -> &SeedDataset {
        &self.seed
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    fn read_collection(&self, storage: &S) -> Result<Vec<MemoryLocation>, AppResponse> {
        let raw = match storage.get(&self.keys.collection)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        match serde_json::from_str::<Vec<MemoryLocation>>(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("Stored memory collection is unreadable, treating as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    fn write_collection(&self, items: &[MemoryLocation]) -> Result<(), AppResponse> {
        match &self.storage {
            StorageCapability::Available(storage) => {
                let json = serde_json::to_string(items)?;
                storage.set(&self.keys.collection, &json)
            }
            StorageCapability::Disabled => Ok(()),
        }
    }

    /// Applies seed reconciliation and returns the effective collection.
    fn ensure_initialized(&self) -> Result<Vec<MemoryLocation>, AppResponse> {
        let storage = match &self.storage {
            StorageCapability::Available(storage) => storage,
            StorageCapability::Disabled => return Ok(Vec::new()),
        };

        let stored_fingerprint = storage.get(&self.keys.seed_fingerprint)?;
        let stored = self.read_collection(storage)?;
        let reconciled = reconcile(
            &self.seed,
            stored_fingerprint.as_deref(),
            stored,
            self.clock.now(),
        );

        if let Some(fingerprint) = &reconciled.fingerprint {
            match reconciled.outcome {
                ReconcileOutcome::Reseeded => info!(
                    "Bundled seed dataset changed; replacing stored collection with {} records",
                    reconciled.collection.len()
                ),
                _ => info!(
                    "Seeding empty storage with {} bundled records",
                    reconciled.collection.len()
                ),
            }
            let json = serde_json::to_string(&reconciled.collection)?;
            storage.write_batch(&[
                (self.keys.collection.as_str(), json.as_str()),
                (self.keys.seed_fingerprint.as_str(), fingerprint.as_str()),
            ])?;
        }

        Ok(reconciled.collection)
    }

    /// Lists records, sorted newest first when `order_by` is `-created_date`.
    pub fn list(&self, order_by: Option<&str>) -> Result<Vec<MemoryLocation>, AppResponse> {
        let items = self.ensure_initialized()?;
        Ok(ListOrder::from_token(order_by).apply(items))
    }

    /// Creates a record with a fresh id and timestamps.
    pub fn create(&self, input: MemoryLocationInput) -> Result<MemoryLocation, AppResponse> {
        let (latitude, longitude) = input.required_coordinates()?;
        let mut items = self.ensure_initialized()?;

        let now = format_timestamp(self.clock.now());
        let item = MemoryLocation {
            id: uuid::Uuid::new_v4().to_string(),
            created_date: now.clone(),
            updated_date: now,
            title: input.title.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            date: input.date.unwrap_or_default(),
            location_name: input.location_name.unwrap_or_default(),
            latitude,
            longitude,
            icon_color: non_empty_or(input.icon_color, DEFAULT_ICON_COLOR),
            photos: input.photos.unwrap_or_default(),
        };

        items.push(item.clone());
        self.write_collection(&items)?;
        debug!("Created memory {}", item.id);
        Ok(item)
    }

    /// Overwrites the fields present in `input` on the record with `id`.
    pub fn update(&self, id: &str, input: MemoryLocationInput) -> Result<MemoryLocation, AppResponse> {
        let mut items = self.ensure_initialized()?;
        let index = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(AppResponse::memory_not_found)?;

        let (latitude, longitude) = input.merged_coordinates(&items[index])?;
        let existing = &items[index];
        let updated = MemoryLocation {
            id: existing.id.clone(),
            created_date: existing.created_date.clone(),
            updated_date: format_timestamp(self.clock.now()),
            title: input.title.unwrap_or_else(|| existing.title.clone()),
            description: input.description.unwrap_or_else(|| existing.description.clone()),
            date: input.date.unwrap_or_else(|| existing.date.clone()),
            location_name: input.location_name.unwrap_or_else(|| existing.location_name.clone()),
            latitude,
            longitude,
            icon_color: input.icon_color.unwrap_or_else(|| existing.icon_color.clone()),
            photos: input.photos.unwrap_or_else(|| existing.photos.clone()),
        };

        items[index] = updated.clone();
        self.write_collection(&items)?;
        debug!("Updated memory {}", id);
        Ok(updated)
    }

    /// Removes the record with `id`. Returns whether one was present; removing
    /// an unknown id is not an error.
    pub fn remove(&self, id: &str) -> Result<bool, AppResponse> {
        let items = self.ensure_initialized()?;
        let before = items.len();
        let remaining: Vec<MemoryLocation> = items.into_iter().filter(|item| item.id != id).collect();
        let removed = remaining.len() != before;
        self.write_collection(&remaining)?;
        Ok(removed)
    }

    /// Empties the collection, leaving the seed fingerprint untouched. Returns
    /// the number of records dropped.
    pub fn clear(&self) -> Result<usize, AppResponse> {
        let dropped = match &self.storage {
            StorageCapability::Available(storage) => self.read_collection(storage)?.len(),
            StorageCapability::Disabled => 0,
        };
        self.write_collection(&[])?;
        info!("Cleared {} memories from storage", dropped);
        Ok(dropped)
    }

    /// Newest-first snapshot in the canonical record shape, ready to become the
    /// next bundled seed dataset.
    pub fn export_for_deploy(&self) -> Result<Vec<MemoryLocation>, AppResponse> {
        self.list(Some(CREATED_DATE_DESC))
    }

    /// [`export_for_deploy`](Self::export_for_deploy) rendered as indented JSON.
    pub fn export_json(&self) -> Result<String, AppResponse> {
        let items = self.export_for_deploy()?;
        Ok(serde_json::to_string_pretty(&items)?)
    }

    /// Writes the export artifact to `path`, replacing any existing file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<usize, AppResponse> {
        let items = self.export_for_deploy()?;
        let json = serde_json::to_string_pretty(&items)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Exported {} memories to {}", items.len(), path.as_ref().display());
        Ok(items.len())
    }
}
