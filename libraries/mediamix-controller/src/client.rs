//! Typed requests to a Mediamix engine.

use crate::error::{ClientError, Result};
use crate::transport::Transport;
use mediamix_core::{Request, Settings};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Controller-side client for one engine.
///
/// # Example
///
/// ```ignore
/// use mediamix_controller::{ChannelTransport, MixerClient};
///
/// let (transport, calls) = ChannelTransport::new(16);
/// // hand `calls` to the engine host ...
///
/// let client = MixerClient::new(transport);
/// let settings = client.connect().await?;
/// client.set_volume(settings.volume() / 2.0).await?;
/// ```
pub struct MixerClient<T: Transport> {
    transport: T,
}

impl<T: Transport> MixerClient<T> {
    /// Create a new client over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request(&self, request: &Request) -> Result<Value> {
        debug!(request = request.name(), "Sending request");
        self.transport.send(request.to_message()?).await
    }

    /// Liveness check, returns the engine's marker.
    pub async fn ping(&self) -> Result<String> {
        match self.request(&Request::Ping).await? {
            Value::String(marker) => Ok(marker),
            other => Err(ClientError::UnexpectedResponse(format!(
                "PING answered with {}",
                other
            ))),
        }
    }

    /// Read the engine's current settings.
    pub async fn get_settings(&self) -> Result<Settings> {
        let response = self.request(&Request::GetSettings).await?;
        if !response.is_object() {
            return Err(ClientError::UnexpectedResponse(format!(
                "settings answered with {}",
                response
            )));
        }

        Ok(serde_json::from_value(response)?)
    }

    /// Check the engine is reachable, then read its settings.
    ///
    /// This is what the controller does when it opens.
    pub async fn connect(&self) -> Result<Settings> {
        match self.ping().await {
            Ok(marker) => debug!(marker = %marker, "Engine answered ping"),
            Err(e) => {
                warn!(error = %e, "Engine unreachable");
                return Err(e);
            }
        }

        let settings = self.get_settings().await?;
        info!(
            volume = settings.volume(),
            pan = settings.pan(),
            speed = settings.speed(),
            "Connected to engine"
        );
        Ok(settings)
    }

    /// Set the shared volume.
    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.send_update(Request::UpdateVolume(json!(volume))).await
    }

    /// Set the shared stereo pan.
    pub async fn set_pan(&self, pan: f64) -> Result<()> {
        self.send_update(Request::UpdatePan(json!(pan))).await
    }

    /// Set the shared playback speed.
    pub async fn set_speed(&self, speed: f64) -> Result<()> {
        self.send_update(Request::UpdateSpeed(json!(speed))).await
    }

    /// Send an update request carrying an arbitrary (possibly invalid) value.
    ///
    /// The engine normalizes the value; the reply is always empty.
    pub async fn send_update(&self, request: Request) -> Result<()> {
        match self.request(&request).await? {
            Value::Null => Ok(()),
            other => Err(ClientError::UnexpectedResponse(format!(
                "{} answered with {}",
                request.name(),
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_connect_pings_then_reads_settings() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();

        transport
            .expect_send()
            .with(eq(json!({"request": "PING"})))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!("pong")));
        transport
            .expect_send()
            .with(eq(json!({"request": "GET MediaSettings"})))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!({"volume": 0.5, "pan": -0.5, "speed": 2.0})));

        let client = MixerClient::new(transport);
        let settings = client.connect().await.unwrap();

        assert_eq!(settings, Settings::new(0.5, -0.5, 2.0));
    }

    #[tokio::test]
    async fn test_connect_stops_when_ping_fails() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(ClientError::ConnectionFailed("no receiver".into())));

        let client = MixerClient::new(transport);
        let err = client.connect().await.unwrap_err();

        assert!(err.is_connection_failure());
    }

    #[tokio::test]
    async fn test_updates_send_field_payloads() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .with(eq(json!({"request": "UPDATE MediaVolume", "data": {"volume": 0.25}})))
            .times(1)
            .returning(|_| Ok(Value::Null));
        transport
            .expect_send()
            .with(eq(json!({"request": "UPDATE MediaPan", "data": {"pan": 1.0}})))
            .times(1)
            .returning(|_| Ok(Value::Null));
        transport
            .expect_send()
            .with(eq(json!({"request": "UPDATE MediaSpeed", "data": {"speed": 1.5}})))
            .times(1)
            .returning(|_| Ok(Value::Null));

        let client = MixerClient::new(transport);
        client.set_volume(0.25).await.unwrap();
        client.set_pan(1.0).await.unwrap();
        client.set_speed(1.5).await.unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_responses() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| Ok(json!(42)));

        let client = MixerClient::new(transport);

        assert!(matches!(
            client.ping().await,
            Err(ClientError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            client.get_settings().await,
            Err(ClientError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            client.set_volume(0.1).await,
            Err(ClientError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_from_untrusted_engine_are_normalized() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(json!({"volume": "loud", "pan": 3, "speed": 99})));

        let client = MixerClient::new(transport);
        let settings = client.get_settings().await.unwrap();

        assert_eq!(settings, Settings::new(1.0, 1.0, 16.0));
    }
}
