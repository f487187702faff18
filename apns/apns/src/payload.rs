use serde::Serialize;
use serde_json::{Map, Value};

use crate::RequestError;

/// Notification payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Raw JSON object, sent as is. Must contain an `aps` key.
    Json(Map<String, Value>),
    /// Payload built from typed fields.
    Aps(ApsPayload),
}

/// The `aps` dictionary. <https://developer.apple.com/documentation/usernotifications/generating-a-remote-notification>
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aps {
    /// Alert message to display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    /// Number to display in a badge on the app icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    /// Name of a sound file in the app bundle, or `default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Notification type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `1` for a background update notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_available: Option<u8>,
}

/// Typed payload, the `aps` dictionary plus custom top-level keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApsPayload {
    /// The `aps` dictionary.
    pub aps: Aps,
    /// Custom keys next to `aps`. An `aps` key here is rejected when encoding.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl ApsPayload {
    /// Creates an [`ApsPayload`] with an alert message.
    ///
    /// ```
    /// # use apns::ApsPayload;
    /// let mut payload = ApsPayload::alert("Hello");
    /// payload.aps.badge = Some(1);
    /// ```
    pub fn alert<T>(alert: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            aps: Aps {
                alert: Some(alert.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Json(map)
    }
}

impl From<ApsPayload> for Payload {
    fn from(payload: ApsPayload) -> Self {
        Self::Aps(payload)
    }
}

impl Payload {
    /// JSON object to put on the wire.
    pub fn to_json_map(&self) -> Result<Map<String, Value>, RequestError> {
        match self {
            Self::Json(map) => {
                if !map.contains_key("aps") {
                    return Err(RequestError::MissingAps);
                }
                Ok(map.clone())
            }
            Self::Aps(payload) => {
                if payload.custom.contains_key("aps") {
                    return Err(RequestError::CustomAps);
                }
                let mut map = match serde_json::to_value(payload)? {
                    Value::Object(map) => map,
                    _ => return Err(RequestError::MissingAps),
                };
                rename_content_available(&mut map);
                Ok(map)
            }
        }
    }
}

/// Renames `aps.contentAvailable` to `aps.content-available`.
///
/// Only that one key is touched, nothing happens when it is absent.
///
/// ```
/// # use apns::rename_content_available;
/// let mut map = serde_json::json!({"aps": {"contentAvailable": 1}});
/// rename_content_available(map.as_object_mut().unwrap());
/// assert_eq!(serde_json::json!({"aps": {"content-available": 1}}), map);
/// ```
pub fn rename_content_available(payload: &mut Map<String, Value>) {
    if let Some(Value::Object(aps)) = payload.get_mut("aps") {
        if let Some(v) = aps.remove("contentAvailable") {
            aps.insert("content-available".to_string(), v);
        }
    }
}
