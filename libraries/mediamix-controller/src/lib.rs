//! Mediamix Controller
//!
//! The controller side of the Mediamix protocol: typed requests to an
//! engine over a pluggable [`Transport`], and the [`ControllerView`] model
//! of the controller surface.
//!
//! A transport that cannot reach the engine reports
//! [`ClientError::ConnectionFailed`], which the view turns into its
//! disconnected state instead of an error.

#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod transport;
pub mod view;

pub use client::MixerClient;
pub use error::{ClientError, Result};
pub use transport::{ChannelTransport, EngineCall, Transport};
pub use view::{ControllerView, MixerPanel, CONNECTION_FAILED_MESSAGE};

pub use mediamix_core::{Notification, Settings};
