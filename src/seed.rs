//! Bundled seed dataset and reconciliation against stored state.
//!
//! The bundled dataset is the deployment's source of truth. Whenever its
//! fingerprint differs from the one recorded in storage, the stored collection
//! is replaced by the normalized dataset; local edits are expected to have
//! been exported and folded back into the bundled file beforehand.
//!
//! [`reconcile`] is pure: it decides what the collection should be and which
//! fingerprint (if any) must be persisted, without touching storage.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::app_response::AppResponse;
use crate::memory_location::{coerce_coordinate, MemoryLocation, DEFAULT_ICON_COLOR};
use crate::memory_store::format_timestamp;

/// Seed file embedded at build time.
const BUNDLED_MEMORIES: &str = include_str!("../data/memories.json");

/// Read-only list of memory-location-shaped records.
///
/// Records are kept as raw JSON: they may omit ids and timestamps or carry
/// coordinates as strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedDataset {
    records: Vec<JsonValue>,
}

impl SeedDataset {
    pub fn new(records: Vec<JsonValue>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let value: JsonValue = serde_json::from_str(json)?;
        match value {
            JsonValue::Array(records) => Ok(Self { records }),
            _ => Err(AppResponse::SerializationError(
                "Seed dataset must be a JSON array".to_string(),
            )),
        }
    }

    /// Builds a dataset from exported records, so an export can be installed as
    /// the next seed.
    pub fn from_records(records: &[MemoryLocation]) -> Result<Self, AppResponse> {
        let records = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// The dataset shipped with this build (`data/memories.json`).
    pub fn bundled() -> Result<Self, AppResponse> {
        Self::from_json(BUNDLED_MEMORIES)
    }

    pub fn records(&self) -> &[JsonValue] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Content fingerprint: hex SHA-256 of the compact JSON serialization.
    pub fn fingerprint(&self) -> String {
        let serialized = JsonValue::Array(self.records.clone()).to_string();
        hex::encode(Sha256::digest(serialized.as_bytes()))
    }

    /// Normalizes every record into a [`MemoryLocation`].
    pub fn normalize(&self, now: DateTime<Utc>) -> Vec<MemoryLocation> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, raw)| normalize_seed_record(index, raw, now))
            .collect()
    }
}

/// Turns one raw seed record into a complete record.
///
/// Numeric ids are kept as their decimal text. Missing ids fall back to
/// `seed-<millis>-<index>`; missing timestamps become `now`; unparsable
/// coordinates become `0`.
pub fn normalize_seed_record(index: usize, raw: &JsonValue, now: DateTime<Utc>) -> MemoryLocation {
    let text = |field: &str| -> Option<String> {
        raw.get(field)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let coordinate = |field: &str| raw.get(field).and_then(coerce_coordinate).unwrap_or(0.0);
    let stamp = format_timestamp(now);

    let id = match raw.get("id") {
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => text("id"),
    }
    .unwrap_or_else(|| format!("seed-{}-{}", now.timestamp_millis(), index));
    let created_date = text("created_date").unwrap_or_else(|| stamp.clone());
    let updated_date = text("updated_date").unwrap_or(stamp);
    let photos = raw
        .get("photos")
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    MemoryLocation {
        id,
        created_date,
        updated_date,
        title: text("title").unwrap_or_default(),
        description: text("description").unwrap_or_default(),
        date: text("date").unwrap_or_default(),
        location_name: text("location_name").unwrap_or_default(),
        latitude: coordinate("latitude"),
        longitude: coordinate("longitude"),
        icon_color: text("icon_color").unwrap_or_else(|| DEFAULT_ICON_COLOR.to_string()),
        photos,
    }
}

/// Which branch of reconciliation applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Bundled dataset changed; the stored collection was replaced.
    Reseeded,
    /// Stored collection kept as is.
    Kept,
    /// Storage was empty and got the bundled dataset.
    Seeded,
    /// Nothing stored and nothing bundled.
    Empty,
}

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub collection: Vec<MemoryLocation>,
    /// Fingerprint to persist alongside `collection`; `None` means storage
    /// must not be written.
    pub fingerprint: Option<String>,
    pub outcome: ReconcileOutcome,
}

impl Reconciliation {
    pub fn needs_write(&self) -> bool {
        self.fingerprint.is_some()
    }
}

/// Decides the effective collection given the bundled dataset and stored state.
pub fn reconcile(
    seed: &SeedDataset,
    stored_fingerprint: Option<&str>,
    stored: Vec<MemoryLocation>,
    now: DateTime<Utc>,
) -> Reconciliation {
    if seed.is_empty() {
        let outcome = if stored.is_empty() {
            ReconcileOutcome::Empty
        } else {
            ReconcileOutcome::Kept
        };
        return Reconciliation {
            collection: stored,
            fingerprint: None,
            outcome,
        };
    }

    let current = seed.fingerprint();
    if stored_fingerprint != Some(current.as_str()) {
        return Reconciliation {
            collection: seed.normalize(now),
            fingerprint: Some(current),
            outcome: ReconcileOutcome::Reseeded,
        };
    }

    if !stored.is_empty() {
        return Reconciliation {
            collection: stored,
            fingerprint: None,
            outcome: ReconcileOutcome::Kept,
        };
    }

    Reconciliation {
        collection: seed.normalize(now),
        fingerprint: Some(current),
        outcome: ReconcileOutcome::Seeded,
    }
}
