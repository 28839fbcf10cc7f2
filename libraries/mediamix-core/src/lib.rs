//! Mediamix Core
//!
//! Platform-agnostic building blocks shared by the Mediamix engine (which
//! runs inside a document and drives its media elements) and the controller
//! (the UI surface that adjusts them).
//!
//! This crate provides:
//! - **Settings**: the validated (volume, pan, speed) triple and partial patches
//! - **Protocol**: request envelopes, responses and one-way notifications
//! - **Errors**: `ProtocolError` and the crate `Result` alias
//!
//! # Example
//!
//! ```rust
//! use mediamix_core::protocol::Request;
//! use mediamix_core::Settings;
//! use serde_json::json;
//!
//! // Out-of-range input is clamped, never rejected
//! let settings = Settings::default().with_speed(20.0);
//! assert_eq!(settings.speed(), 16.0);
//!
//! // Decode a controller message
//! let request = Request::parse(&json!({
//!     "request": "UPDATE MediaVolume",
//!     "data": { "volume": 0.5 }
//! }))
//! .unwrap();
//! assert!(request.is_state_changing());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod protocol;
pub mod settings;

pub use error::{ProtocolError, Result};
pub use protocol::{Envelope, Notification, Request, Response};
pub use settings::{parse_number, Settings, SettingsPatch};
