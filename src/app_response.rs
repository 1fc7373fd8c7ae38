use std::fmt::{Display, Formatter};

use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

/// Message carried by [`AppResponse::ValidationError`] when a coordinate is rejected.
pub const INVALID_COORDINATES: &str = "Latitude and longitude must be valid numbers";

/// Message carried by [`AppResponse::NotFound`] when an update targets an unknown id.
pub const MEMORY_NOT_FOUND: &str = "Memory not found";

/// Outcome of a store or FFI operation.
///
/// Store methods use this as their error type; the C ABI serializes the whole
/// enum (success included) so callers get one uniform JSON envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::NotFound => AppResponse::NotFound("Key not found in storage".to_string()),
            LmdbError::Corrupted | LmdbError::PageNotFound => {
                AppResponse::DatabaseError(format!("Storage is corrupted: {}", err))
            }
            LmdbError::MapFull => {
                AppResponse::DatabaseError("Storage map is full; increase map_size".to_string())
            }
            _ => AppResponse::DatabaseError(format!("LMDB error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for AppResponse {
    fn from(err: std::io::Error) -> Self {
        AppResponse::DatabaseError(format!("IO error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    pub fn invalid_coordinates() -> Self {
        AppResponse::ValidationError(INVALID_COORDINATES.to_string())
    }

    pub fn memory_not_found() -> Self {
        AppResponse::NotFound(MEMORY_NOT_FOUND.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AppResponse::Ok(_))
    }
}
