//! # Memory Locations Core
//!
//! A local store for "memory location" records: titled anecdotes pinned to map
//! coordinates, with a free-form date, a color tag and inline photos. Records
//! persist in LMDB and are exposed to host applications (Flutter, web shells)
//! over a C ABI.
//!
//! ## Features
//!
//! - **Bundled seed dataset**: `data/memories.json` is embedded at build time
//!   and replaces the stored collection whenever its content fingerprint changes
//! - **Validated CRUD**: coordinates must be finite numbers; invalid input never
//!   reaches storage
//! - **Export for deploy**: a newest-first snapshot in the exact shape of the
//!   seed file, so it can replace the bundled dataset for the next build
//! - **Graceful degradation**: when storage cannot be opened the store answers
//!   reads with an empty collection and ignores writes
//!
//! ## Quick Start
//!
//! ```no_run
//! use memory_locations_core::{create_store, create_memory, list_memories, free_response};
//! use std::ffi::CString;
//!
//! let name = CString::new("my_memories").unwrap();
//! let store = create_store(name.as_ptr());
//!
//! let payload = CString::new(r#"{"title":"Picnic","latitude":"48.85","longitude":2.35}"#).unwrap();
//! let created = create_memory(store, payload.as_ptr());
//! free_response(created);
//!
//! let order = CString::new("-created_date").unwrap();
//! let listed = list_memories(store, order.as_ptr());
//! free_response(listed);
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_store`] - Open the LMDB-backed store
//! - [`list_memories`] - List records, optionally newest first
//! - [`create_memory`] - Insert a new record
//! - [`update_memory`] - Patch an existing record
//! - [`remove_memory`] - Delete a record by id
//! - [`clear_memories`] - Delete every record
//! - [`export_for_deploy`] - Export the collection as a seed file
//! - [`export_to_file`] - Write the export to disk
//! - [`elapsed_since`] - Time-together counter
//! - [`encode_photo`] - Read an image file into an inline data URL
//! - [`close_store`] / [`free_store`] / [`free_response`] - Resource cleanup
//!
//! Every function returns a JSON-serialized [`AppResponse`]; success payloads
//! are themselves JSON strings inside `Ok`.

pub mod app_response;
pub mod config;
pub mod elapsed;
pub mod lmdb_storage;
pub mod memory_location;
pub mod memory_store;
pub mod photo;
pub mod seed;
pub mod storage;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
pub use crate::config::{StorageKeys, StoreConfig};
pub use crate::lmdb_storage::LmdbStorage;
pub use crate::memory_location::{IconColor, MemoryLocation, MemoryLocationInput};
pub use crate::memory_store::{Clock, ListOrder, MemoryLocationStore, StorageCapability, SystemClock};
pub use crate::seed::{reconcile, ReconcileOutcome, Reconciliation, SeedDataset};
pub use crate::storage::{KeyValueStorage, MemoryStorage};

use crate::elapsed::{parse_start_date, Elapsed};

/// Store handle handed out over the C ABI.
pub type AppStoreState = MemoryLocationStore<LmdbStorage>;

/// Opens the store for `<name>.lmdb` seeded from the bundled dataset.
///
/// The LMDB environment is created as a directory named `<name>.lmdb`. On
/// first access the bundled `data/memories.json` is written into it, and it
/// replaces the stored collection whenever the bundled content changes.
///
/// # Parameters
///
/// * `name` - A null-terminated C string with the database name (a path
///   without the `.lmdb` suffix)
///
/// # Returns
///
/// Returns a pointer to an [`AppStoreState`]. If LMDB cannot be opened the
/// returned store is disabled: lists are empty and writes are ignored.
///
/// # Safety
///
/// `name` must be null or a valid null-terminated string. The returned pointer
/// must be released with [`free_store`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use memory_locations_core::{create_store, free_store};
///
/// let name = CString::new("for_my_love_memories").unwrap();
/// let store = create_store(name.as_ptr());
///
/// if !store.is_null() {
///     // Store ready (possibly disabled if storage was unavailable)
///     free_store(store);
/// }
/// ```
///
/// # Errors
///
/// Returns a null pointer if:
/// - `name` is null
/// - `name` contains invalid UTF-8
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut AppStoreState {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = StoreConfig::new(name_str);
    let seed = match SeedDataset::bundled() {
        Ok(seed) => seed,
        Err(e) => {
            warn!("Bundled seed dataset is unreadable, starting without it: {e}");
            SeedDataset::empty()
        }
    };

    let store = match LmdbStorage::init(&config) {
        Ok(storage) => {
            info!("✅ Memory store opened at {}", config.lmdb_dir());
            MemoryLocationStore::new(storage, seed, config.keys)
        }
        Err(e) => {
            warn!("❌ Storage unavailable at {}, store disabled: {e}", config.lmdb_dir());
            MemoryLocationStore::disabled(seed, config.keys)
        }
    };

    Box::into_raw(Box::new(store))
}

/// Lists records. A null `order_by` keeps storage order; `"-created_date"`
/// sorts newest first.
///
/// # Safety
///
/// `state` must come from [`create_store`]; `order_by` may be null.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn list_memories(state: *mut AppStoreState, order_by: *const c_char) -> *const c_char {
    let state = match state_ref(state, "list_memories") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let order = if order_by.is_null() {
        None
    } else {
        match c_ptr_to_string(order_by, "order_by") {
            Ok(order) => Some(order),
            Err(err) => return err,
        }
    };

    respond_json(state.list(order.as_deref()))
}

/// Creates a record from a JSON payload (see [`MemoryLocationInput`]).
///
/// The store assigns a fresh id and stamps `created_date` and `updated_date`
/// with the same instant. Unset text fields become `""`, `icon_color` defaults
/// to `"rose"` and `photos` to `[]`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `json_ptr` - Null-terminated C string containing the payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. On success the `Ok`
/// payload is the created record serialized as JSON. Release it with
/// [`free_response`].
///
/// # Safety
///
/// Both pointers must be valid.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use memory_locations_core::{create_store, create_memory, free_response};
///
/// let name = CString::new("for_my_love_memories").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let json = CString::new(r#"{"title":"Picnic","latitude":"48.85","longitude":2.35}"#).unwrap();
/// let result = create_memory(store, json.as_ptr());
/// free_response(result);
/// ```
///
/// # JSON Format
///
/// ```json
/// {
///   "title": "optional text",
///   "description": "optional text",
///   "date": "optional free-form date",
///   "location_name": "optional text",
///   "latitude": 48.85,
///   "longitude": "2.35",
///   "icon_color": "rose | amber | purple | blue | teal | red | any text",
///   "photos": ["data:image/jpeg;base64,..."]
/// }
/// ```
///
/// `latitude` and `longitude` are required and may be numbers or numeric
/// strings.
///
/// # Errors
///
/// - `BadRequest` for a null state or payload pointer, or invalid UTF-8
/// - `SerializationError` for malformed JSON
/// - `ValidationError` if a coordinate is missing, `null` or not a finite number
/// - `DatabaseError` if the write fails
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_memory(state: *mut AppStoreState, json_ptr: *const c_char) -> *const c_char {
    let state = match state_ref(state, "create_memory") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let input = match parse_input(json_ptr) {
        Ok(input) => input,
        Err(err) => return err,
    };

    respond_json(state.create(input))
}

/// Applies a JSON patch to the record with `id`.
///
/// Fields present in the payload overwrite the stored ones; absent fields are
/// kept. `updated_date` is set to now; `id` and `created_date` never change.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_store`]
/// * `id` - Null-terminated C string with the record id
/// * `json_ptr` - Null-terminated C string containing the patch
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. On success the `Ok`
/// payload is the updated record serialized as JSON. Release it with
/// [`free_response`].
///
/// # Safety
///
/// All pointers must be valid.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use memory_locations_core::{create_store, update_memory, free_response};
///
/// let name = CString::new("for_my_love_memories").unwrap();
/// let store = create_store(name.as_ptr());
///
/// let id = CString::new("b7f3c2a4-5d1e-4c8f-9a2b-3e6d7f8a9b01").unwrap();
/// let patch = CString::new(r#"{"title":"First date","icon_color":"red"}"#).unwrap();
/// let result = update_memory(store, id.as_ptr(), patch.as_ptr());
/// free_response(result);
/// ```
///
/// # JSON Format
///
/// Same shape as [`create_memory`], with every field optional. A coordinate
/// that is present must be a number or numeric string; `"latitude": null` is
/// rejected. `null` for any other field leaves it unchanged.
///
/// # Errors
///
/// - `BadRequest` for null pointers or invalid UTF-8
/// - `SerializationError` for malformed JSON
/// - `NotFound` if no record has `id`
/// - `ValidationError` if a provided coordinate is not a finite number
/// - `DatabaseError` if the write fails
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_memory(
    state: *mut AppStoreState,
    id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = match state_ref(state, "update_memory") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let input = match parse_input(json_ptr) {
        Ok(input) => input,
        Err(err) => return err,
    };

    respond_json(state.update(&id_str, input))
}

/// Removes the record with `id`. Unknown ids succeed as well.
///
/// # Safety
///
/// Both pointers must be valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_memory(state: *mut AppStoreState, id: *const c_char) -> *const c_char {
    let state = match state_ref(state, "remove_memory") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match state.remove(&id_str) {
        Ok(true) => response_to_c_string(&AppResponse::success(format!("Memory {id_str} deleted"))),
        Ok(false) => response_to_c_string(&AppResponse::success(format!("No memory with id {id_str}"))),
        Err(e) => response_to_c_string(&e),
    }
}

/// Deletes every record. The seed fingerprint is kept.
///
/// # Safety
///
/// `state` must be valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_memories(state: *mut AppStoreState) -> *const c_char {
    let state = match state_ref(state, "clear_memories") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.clear() {
        Ok(count) => response_to_c_string(&AppResponse::success(format!("{count} memories cleared"))),
        Err(e) => response_to_c_string(&e),
    }
}

/// Returns the export artifact (indented JSON array, newest first).
///
/// # Safety
///
/// `state` must be valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_for_deploy(state: *mut AppStoreState) -> *const c_char {
    let state = match state_ref(state, "export_for_deploy") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.export_json() {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&e),
    }
}

/// Writes the export artifact to `path`.
///
/// # Safety
///
/// Both pointers must be valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_to_file(state: *mut AppStoreState, path: *const c_char) -> *const c_char {
    let state = match state_ref(state, "export_to_file") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let path_str = match c_ptr_to_string(path, "path") {
        Ok(path) => path,
        Err(err) => return err,
    };

    match state.export_to_file(&path_str) {
        Ok(count) => response_to_c_string(&AppResponse::success(format!(
            "Exported {count} memories to {path_str}"
        ))),
        Err(e) => response_to_c_string(&e),
    }
}

/// Time elapsed since `start` (`YYYY-MM-DD` or RFC 3339). A null `start` uses
/// the built-in together-since date.
///
/// # Safety
///
/// `start` must be null or a valid null-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn elapsed_since(start: *const c_char) -> *const c_char {
    let now = chrono::Utc::now();
    if start.is_null() {
        return respond_json(Ok(Elapsed::since_together(now)));
    }

    let start_str = match c_ptr_to_string(start, "start") {
        Ok(s) => s,
        Err(err) => return err,
    };

    respond_json(parse_start_date(&start_str).map(|start| Elapsed::between(start, now)))
}

/// Reads an image file and returns it as an inline data URL.
///
/// # Safety
///
/// `path` must be valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn encode_photo(path: *const c_char) -> *const c_char {
    let path_str = match c_ptr_to_string(path, "path") {
        Ok(path) => path,
        Err(err) => return err,
    };

    match photo::read_photo(&path_str) {
        Ok(url) => response_to_c_string(&AppResponse::Ok(url)),
        Err(e) => response_to_c_string(&e),
    }
}

/// Closes the underlying LMDB environment. The handle stays allocated; later
/// calls report a database error.
///
/// # Safety
///
/// `state` must be valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut AppStoreState) -> *const c_char {
    let state = match state_ref(state, "close_store") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let result = match state.storage() {
        Some(storage) => storage.close_database(),
        None => Ok(()),
    };

    match result {
        Ok(()) => response_to_c_string(&AppResponse::success("Store closed successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a handle returned by [`create_store`].
///
/// # Safety
///
/// `state` must come from [`create_store`] and must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_store(state: *mut AppStoreState) {
    if state.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(state) });
}

/// Releases a string returned by any function in this library.
///
/// # Safety
///
/// `response` must come from this library and must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(response: *const c_char) {
    if response.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(response as *mut c_char) });
}

fn state_ref<'a>(state: *mut AppStoreState, fn_name: &str) -> Result<&'a AppStoreState, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(s) => Ok(s),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {fn_name}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_input(json_ptr: *const c_char) -> Result<MemoryLocationInput, *const c_char> {
    let json_str = c_ptr_to_string(json_ptr, "JSON")?;
    serde_json::from_str(&json_str).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Serializes a successful value into `AppResponse::Ok`, or forwards the error.
fn respond_json<T: Serialize>(result: Result<T, AppResponse>) -> *const c_char {
    match result {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => {
                let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
                response_to_c_string(&error)
            }
        },
        Err(e) => response_to_c_string(&e),
    }
}

/// Converts an [`AppResponse`] into an owned C string for FFI callers.
///
/// Returns null if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer into a `String`, mapping null pointers and
/// invalid UTF-8 to a serialized `BadRequest`.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
