//! Record types for memory locations.
//!
//! [`MemoryLocation`] is the canonical persisted shape: its field order is the
//! order written to storage and to export artifacts, so an export can be dropped
//! in as the next bundled seed dataset unchanged. [`MemoryLocationInput`] is the
//! partial payload accepted by create and update.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;

/// Color tag used when a record does not name one.
pub const DEFAULT_ICON_COLOR: &str = "rose";

/// A titled personal anecdote pinned to map coordinates.
///
/// `latitude` and `longitude` are always finite on a persisted record; the
/// store rejects anything else before writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLocation {
    pub id: String,
    pub created_date: String,
    pub updated_date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form date text. Not validated.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_icon_color")]
    pub icon_color: String,
    /// Inline-encoded images (`data:` URLs).
    #[serde(default)]
    pub photos: Vec<String>,
}

fn default_icon_color() -> String {
    DEFAULT_ICON_COLOR.to_string()
}

/// Partial record used by create and update.
///
/// Coordinates are kept as raw JSON so that numeric strings coming from form
/// inputs (`"1.5"`) are accepted while anything non-numeric is reported as a
/// validation error instead of a deserialization failure. A coordinate sent
/// as `null` is kept as `Some(Value::Null)` so it is rejected rather than read
/// as "not provided". For the other optional fields `null` means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryLocationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub latitude: Option<JsonValue>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub longitude: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

impl MemoryLocationInput {
    /// Payload with only the two required coordinates set.
    pub fn at(latitude: impl Into<JsonValue>, longitude: impl Into<JsonValue>) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_location_name(mut self, location_name: impl Into<String>) -> Self {
        self.location_name = Some(location_name.into());
        self
    }

    pub fn with_icon_color(mut self, icon_color: impl Into<String>) -> Self {
        self.icon_color = Some(icon_color.into());
        self
    }

    pub fn with_photos(mut self, photos: Vec<String>) -> Self {
        self.photos = Some(photos);
        self
    }

    /// Validates both coordinates for a new record.
    pub fn required_coordinates(&self) -> Result<(f64, f64), AppResponse> {
        let latitude = self.latitude.as_ref().and_then(coerce_coordinate);
        let longitude = self.longitude.as_ref().and_then(coerce_coordinate);
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Ok((lat, lng)),
            _ => Err(AppResponse::invalid_coordinates()),
        }
    }

    /// Validates the coordinates present in an update, falling back to the
    /// current values for the ones left out.
    pub fn merged_coordinates(&self, current: &MemoryLocation) -> Result<(f64, f64), AppResponse> {
        let latitude = match &self.latitude {
            Some(raw) => coerce_coordinate(raw),
            None => Some(current.latitude),
        };
        let longitude = match &self.longitude {
            Some(raw) => coerce_coordinate(raw),
            None => Some(current.longitude),
        };
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Ok((lat, lng)),
            _ => Err(AppResponse::invalid_coordinates()),
        }
    }
}

/// Wraps any value that is present in the payload, `null` included.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

/// Coerces a raw JSON coordinate into a finite number.
///
/// Numbers pass if finite; strings are trimmed and parsed. Everything else,
/// including empty strings and `null`, yields `None`.
pub fn coerce_coordinate(raw: &JsonValue) -> Option<f64> {
    let parsed = match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

/// Returns `value` unless it is empty, in which case `fallback` is used.
pub(crate) fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// Known color tags for map markers. The store itself accepts any string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconColor {
    Rose,
    Amber,
    Purple,
    Blue,
    Teal,
    Red,
}

impl IconColor {
    pub const ALL: [IconColor; 6] = [
        IconColor::Rose,
        IconColor::Amber,
        IconColor::Purple,
        IconColor::Blue,
        IconColor::Teal,
        IconColor::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IconColor::Rose => "rose",
            IconColor::Amber => "amber",
            IconColor::Purple => "purple",
            IconColor::Blue => "blue",
            IconColor::Teal => "teal",
            IconColor::Red => "red",
        }
    }

    /// Resolves a stored tag, `None` for tags outside the known palette.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.as_str() == tag)
    }
}

impl MemoryLocation {
    /// Known color for this record, falling back to rose for unknown tags.
    pub fn marker_color(&self) -> IconColor {
        IconColor::from_tag(&self.icon_color).unwrap_or(IconColor::Rose)
    }
}
