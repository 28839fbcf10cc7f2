//! Controller <-> engine message protocol
//!
//! Requests travel as `{ "request": <name>, "data": <payload> }` and are
//! answered once. State changes travel the other way as one-way
//! notifications shaped `{ "type": <name>, "value": <number> }`.

use crate::error::{ProtocolError, Result};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Liveness check
pub const PING: &str = "PING";

/// Read the current settings
pub const GET_MEDIA_SETTINGS: &str = "GET MediaSettings";

/// Change the volume
pub const UPDATE_MEDIA_VOLUME: &str = "UPDATE MediaVolume";

/// Change the stereo pan
pub const UPDATE_MEDIA_PAN: &str = "UPDATE MediaPan";

/// Change the playback speed
pub const UPDATE_MEDIA_SPEED: &str = "UPDATE MediaSpeed";

// Names used by the first content-script generation, still accepted
const LEGACY_GET_AUDIO_SETTINGS: &str = "GET AudioSettings";
const LEGACY_UPDATE_AUDIO_VOLUME: &str = "UPDATE AudioVolume";
const LEGACY_UPDATE_AUDIO_PAN: &str = "UPDATE AudioPan";
const LEGACY_UPDATE_AUDIO_SPEED: &str = "UPDATE AudioSpeed";

/// Raw request envelope as it crosses the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub request: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// Decoded controller request
///
/// Update payloads stay raw: normalization is the state store's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Ping,
    GetSettings,
    UpdateVolume(Value),
    UpdatePan(Value),
    UpdateSpeed(Value),
}

impl Request {
    /// Decode a request from an untrusted message
    ///
    /// The payload may be `{ "<field>": value }` or the bare value.
    pub fn parse(message: &Value) -> Result<Self> {
        let object = message
            .as_object()
            .ok_or_else(|| ProtocolError::MalformedMessage("expected an object".to_string()))?;

        let name = object
            .get("request")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProtocolError::MalformedMessage("missing string field `request`".to_string())
            })?;

        let data = object.get("data").unwrap_or(&Value::Null);

        match name {
            PING => Ok(Self::Ping),
            GET_MEDIA_SETTINGS | LEGACY_GET_AUDIO_SETTINGS => Ok(Self::GetSettings),
            UPDATE_MEDIA_VOLUME | LEGACY_UPDATE_AUDIO_VOLUME => {
                Ok(Self::UpdateVolume(payload_field(data, "volume")))
            }
            UPDATE_MEDIA_PAN | LEGACY_UPDATE_AUDIO_PAN => {
                Ok(Self::UpdatePan(payload_field(data, "pan")))
            }
            UPDATE_MEDIA_SPEED | LEGACY_UPDATE_AUDIO_SPEED => {
                Ok(Self::UpdateSpeed(payload_field(data, "speed")))
            }
            other => Err(ProtocolError::UnknownRequest(other.to_string())),
        }
    }

    /// Canonical request name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => PING,
            Self::GetSettings => GET_MEDIA_SETTINGS,
            Self::UpdateVolume(_) => UPDATE_MEDIA_VOLUME,
            Self::UpdatePan(_) => UPDATE_MEDIA_PAN,
            Self::UpdateSpeed(_) => UPDATE_MEDIA_SPEED,
        }
    }

    /// Whether handling this request may change the shared settings
    pub fn is_state_changing(&self) -> bool {
        matches!(
            self,
            Self::UpdateVolume(_) | Self::UpdatePan(_) | Self::UpdateSpeed(_)
        )
    }

    /// Encode as a wire envelope
    pub fn to_envelope(&self) -> Envelope {
        let data = match self {
            Self::Ping | Self::GetSettings => Value::Null,
            Self::UpdateVolume(volume) => json!({ "volume": volume }),
            Self::UpdatePan(pan) => json!({ "pan": pan }),
            Self::UpdateSpeed(speed) => json!({ "speed": speed }),
        };

        Envelope {
            request: self.name().to_string(),
            data,
        }
    }

    /// Encode as a JSON message
    pub fn to_message(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_envelope())?)
    }
}

fn payload_field(data: &Value, field: &str) -> Value {
    match data {
        Value::Object(map) => map.get(field).cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Engine answer to a request
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Liveness marker
    Pong(String),
    /// Current settings snapshot
    Settings(Settings),
    /// Update accepted (no payload)
    Ack,
}

impl Response {
    /// Encode for the transport (`Ack` becomes `null`)
    pub fn into_value(self) -> Value {
        match self {
            Self::Pong(marker) => Value::String(marker),
            Self::Settings(settings) => {
                let mut map = Map::new();
                map.insert("volume".to_string(), json!(settings.volume()));
                map.insert("pan".to_string(), json!(settings.pan()));
                map.insert("speed".to_string(), json!(settings.speed()));
                Value::Object(map)
            }
            Self::Ack => Value::Null,
        }
    }
}

/// One-way engine -> controller notification
///
/// Serialized as `{ "type": "VOLUME_UPDATED", "value": 0.5 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    VolumeUpdated(f64),
    SpeedUpdated(f64),
    PanUpdated(f64),
}

impl Notification {
    /// New value carried by the notification
    pub fn value(&self) -> f64 {
        match self {
            Self::VolumeUpdated(value) | Self::SpeedUpdated(value) | Self::PanUpdated(value) => {
                *value
            }
        }
    }

    /// Decode a notification from an untrusted message
    pub fn parse(message: &Value) -> Result<Self> {
        Ok(serde_json::from_value(message.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_request() {
        assert_eq!(
            Request::parse(&json!({"request": "PING"})).unwrap(),
            Request::Ping
        );
        assert_eq!(
            Request::parse(&json!({"request": "GET MediaSettings"})).unwrap(),
            Request::GetSettings
        );
        assert_eq!(
            Request::parse(&json!({"request": "UPDATE MediaVolume", "data": {"volume": 0.5}}))
                .unwrap(),
            Request::UpdateVolume(json!(0.5))
        );
        assert_eq!(
            Request::parse(&json!({"request": "UPDATE MediaPan", "data": {"pan": "abc"}}))
                .unwrap(),
            Request::UpdatePan(json!("abc"))
        );
        assert_eq!(
            Request::parse(&json!({"request": "UPDATE MediaSpeed", "data": {"speed": 20}}))
                .unwrap(),
            Request::UpdateSpeed(json!(20))
        );
    }

    #[test]
    fn accepts_legacy_names_and_bare_payloads() {
        assert_eq!(
            Request::parse(&json!({"request": "GET AudioSettings"})).unwrap(),
            Request::GetSettings
        );
        assert_eq!(
            Request::parse(&json!({"request": "UPDATE AudioVolume", "data": 0.3})).unwrap(),
            Request::UpdateVolume(json!(0.3))
        );
    }

    #[test]
    fn missing_payload_field_is_null() {
        assert_eq!(
            Request::parse(&json!({"request": "UPDATE MediaPan", "data": {}})).unwrap(),
            Request::UpdatePan(Value::Null)
        );
        assert_eq!(
            Request::parse(&json!({"request": "UPDATE MediaPan"})).unwrap(),
            Request::UpdatePan(Value::Null)
        );
    }

    #[test]
    fn rejects_malformed_messages() {
        assert!(matches!(
            Request::parse(&json!("PING")),
            Err(ProtocolError::MalformedMessage(_))
        ));
        assert!(matches!(
            Request::parse(&json!({"request": 7})),
            Err(ProtocolError::MalformedMessage(_))
        ));
    }

    #[test]
    fn reports_unknown_request_names() {
        match Request::parse(&json!({"request": "DELETE Everything"})) {
            Err(ProtocolError::UnknownRequest(name)) => assert_eq!(name, "DELETE Everything"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn envelope_round_trip_through_parse() {
        let request = Request::UpdateSpeed(json!(1.5));
        let message = request.to_message().unwrap();

        assert_eq!(
            message,
            json!({"request": "UPDATE MediaSpeed", "data": {"speed": 1.5}})
        );
        assert_eq!(Request::parse(&message).unwrap(), request);

        // No data key for requests without payload
        assert_eq!(
            Request::Ping.to_message().unwrap(),
            json!({"request": "PING"})
        );
    }

    #[test]
    fn response_encoding() {
        assert_eq!(Response::Pong("pong".into()).into_value(), json!("pong"));
        assert_eq!(Response::Ack.into_value(), Value::Null);
        assert_eq!(
            Response::Settings(Settings::new(0.5, 0.0, 1.0)).into_value(),
            json!({"volume": 0.5, "pan": 0.0, "speed": 1.0})
        );
    }

    #[test]
    fn notification_wire_shape() {
        let value = serde_json::to_value(Notification::VolumeUpdated(0.5)).unwrap();
        assert_eq!(value, json!({"type": "VOLUME_UPDATED", "value": 0.5}));

        let value = serde_json::to_value(Notification::PanUpdated(-1.0)).unwrap();
        assert_eq!(value, json!({"type": "PAN_UPDATED", "value": -1.0}));

        let parsed = Notification::parse(&json!({"type": "SPEED_UPDATED", "value": 2.0})).unwrap();
        assert_eq!(parsed, Notification::SpeedUpdated(2.0));
        assert_eq!(parsed.value(), 2.0);
    }
}
