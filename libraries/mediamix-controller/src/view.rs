//! State of the controller surface.
//!
//! The controller shows one slider per setting with percentage read-outs
//! for volume and speed, or a connection error instead of the settings.

use crate::error::{ClientError, Result};
use mediamix_core::{Notification, Settings};

/// Message shown when the engine cannot be reached
pub const CONNECTION_FAILED_MESSAGE: &str = "Connection failed.";

/// Slider positions of a connected controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerPanel {
    pub volume: f64,
    pub pan: f64,
    pub speed: f64,
}

impl MixerPanel {
    pub fn volume_percent(&self) -> i64 {
        percent(self.volume)
    }

    pub fn speed_percent(&self) -> i64 {
        percent(self.speed)
    }
}

impl From<Settings> for MixerPanel {
    fn from(settings: Settings) -> Self {
        Self {
            volume: settings.volume(),
            pan: settings.pan(),
            speed: settings.speed(),
        }
    }
}

fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// What the controller displays
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerView {
    Connected(MixerPanel),
    /// Settings are hidden, only the error message is shown
    ConnectionFailed,
}

impl ControllerView {
    /// View for the outcome of [`crate::MixerClient::connect`]
    ///
    /// Only a connection failure switches to the error view; other errors
    /// are returned to the caller.
    pub fn from_connect(outcome: Result<Settings>) -> Result<Self> {
        match outcome {
            Ok(settings) => Ok(Self::Connected(settings.into())),
            Err(ClientError::ConnectionFailed(_)) => Ok(Self::ConnectionFailed),
            Err(e) => Err(e),
        }
    }

    pub fn panel(&self) -> Option<&MixerPanel> {
        match self {
            Self::Connected(panel) => Some(panel),
            Self::ConnectionFailed => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::Connected(_) => None,
            Self::ConnectionFailed => Some(CONNECTION_FAILED_MESSAGE),
        }
    }

    /// Move the slider named by an engine notification
    ///
    /// Ignored while disconnected.
    pub fn apply(&mut self, notification: &Notification) {
        let Self::Connected(panel) = self else {
            return;
        };

        match *notification {
            Notification::VolumeUpdated(value) => panel.volume = value,
            Notification::PanUpdated(value) => panel.pan = value,
            Notification::SpeedUpdated(value) => panel.speed = value,
        }
    }
}
