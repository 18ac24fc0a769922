//! Button records and interaction events.
//!
//! A [`ButtonConfig`] is an open JSON object: the transform fields are
//! typed, everything else a client sends rides along in `extra` and is
//! written back verbatim on serialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;

/// Field names with a default applied when a client omits them.
pub const POSITION: &str = "position";
pub const ROTATION: &str = "rotation";
pub const SCALE: &str = "scale";

/// Default uniform scale.
pub const DEFAULT_SCALE: f64 = 1.0;

/// 3D vector used for position and rotation. Extra keys are rejected
/// rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Persisted button configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub id: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f64,
    /// Caller-supplied fields outside the known schema.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of normalising a raw update payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub config: ButtonConfig,
    /// Which of position/rotation/scale were filled in. Diagnostic only.
    pub defaulted: Vec<&'static str>,
}

impl ButtonConfig {
    /// Record with every transform field at its default.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: DEFAULT_SCALE,
            extra: Map::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Validate a raw client payload and fill in missing transform fields.
    ///
    /// `null` counts as absent. The returned record is the complete new
    /// value for its id; nothing is merged from any previously stored record.
    pub fn from_raw(raw: Value) -> Result<Normalized, SyncError> {
        let Value::Object(mut fields) = raw else {
            return Err(SyncError::Validation("payload must be a JSON object".into()));
        };

        let id = match fields.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(SyncError::Validation("missing id".into())),
        };

        let mut defaulted = Vec::new();

        let position = match take_present(&mut fields, POSITION) {
            Some(v) => parse_vec3(POSITION, v)?,
            None => {
                defaulted.push(POSITION);
                Vec3::ZERO
            }
        };
        let rotation = match take_present(&mut fields, ROTATION) {
            Some(v) => parse_vec3(ROTATION, v)?,
            None => {
                defaulted.push(ROTATION);
                Vec3::ZERO
            }
        };
        let scale = match take_present(&mut fields, SCALE) {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| SyncError::Validation("invalid scale: expected a number".into()))?,
            None => {
                defaulted.push(SCALE);
                DEFAULT_SCALE
            }
        };

        Ok(Normalized {
            config: ButtonConfig {
                id,
                position,
                rotation,
                scale,
                extra: fields,
            },
            defaulted,
        })
    }

    /// Encode as JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from JSON bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn take_present(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match fields.remove(key) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v),
    }
}

fn parse_vec3(field: &str, value: Value) -> Result<Vec3, SyncError> {
    serde_json::from_value(value).map_err(|_| {
        SyncError::Validation(format!("invalid {field}: expected {{x, y, z}} numbers"))
    })
}

/// Ephemeral hover/click event from a client. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    pub button_id: String,
    pub interaction_type: String,
}

impl InteractionEvent {
    /// Validate the wire shape `{type, button_id}`.
    pub fn from_raw(raw: &Value) -> Result<Self, SyncError> {
        let invalid = || SyncError::Validation("Invalid button interaction data".into());

        let fields = raw.as_object().ok_or_else(invalid)?;
        let interaction_type = non_empty_str(fields.get("type")).ok_or_else(invalid)?;
        let button_id = non_empty_str(fields.get("button_id")).ok_or_else(invalid)?;

        Ok(Self {
            button_id: button_id.to_string(),
            interaction_type: interaction_type.to_string(),
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Broadcast shape of a relayed interaction. Note the renaming from the
/// inbound `button_id`/`type` to `id`/`state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChanged {
    pub id: String,
    pub state: String,
    pub status: String,
}

impl From<InteractionEvent> for StateChanged {
    fn from(event: InteractionEvent) -> Self {
        Self {
            id: event.button_id,
            state: event.interaction_type,
            status: "success".to_string(),
        }
    }
}
