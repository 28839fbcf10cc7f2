//! Mediamix Engine
//!
//! Shared media-state store and audio-graph synchronization for one
//! document: every audio/video element in the page (including elements
//! added later, and elements inside same-origin frames) plays at one shared
//! volume, stereo pan and speed set by an external controller.
//!
//! This crate provides:
//! - Element discovery (fresh query on every state change, no caching)
//! - An audio graph that routes each element exactly once
//!   (source tap -> gain -> pan -> output)
//! - A validated settings store with per-field and aggregate change events
//! - A request/response endpoint speaking the controller protocol, plus
//!   one-way change notifications
//! - Optional per-host UI adapters
//!
//! # Architecture
//!
//! `mediamix-engine` is platform-agnostic: the host document and the audio
//! primitive are reached through the [`DocumentScope`], [`MediaElement`]
//! and [`ProcessingContext`] traits. The `wasm` feature implements them over
//! `web-sys` for browser pages; [`headless`] implements them in memory.
//!
//! Everything runs on one thread, as reactions to inbound messages or page
//! events, so no locking is involved.
//!
//! # Example
//!
//! ```rust
//! use mediamix_engine::headless::{HeadlessContext, HeadlessDocument};
//! use mediamix_engine::{EngineConfig, MediaKind, MixerEndpoint};
//! use serde_json::json;
//!
//! let document = HeadlessDocument::new();
//! let video = document.add_element(MediaKind::Video);
//!
//! let mut engine = MixerEndpoint::new(
//!     document.clone(),
//!     || Ok(HeadlessContext::new()),
//!     EngineConfig::default(),
//! );
//! engine.set_notifier(|notification| println!("{notification:?}"));
//!
//! engine
//!     .handle_message(&json!({"request": "UPDATE MediaVolume", "data": {"volume": 0.5}}))
//!     .unwrap();
//!
//! assert_eq!(video.gain(), Some(0.5));
//! ```

pub mod adapter;
pub mod config;
pub mod element;
pub mod endpoint;
mod error;
pub mod graph;
pub mod headless;
pub mod registry;
pub mod store;
pub mod wasm;

// Public exports
pub use adapter::{
    AdapterControls, AdapterTable, Affordance, BadgeAdapter, HostPattern, NoOpAdapter, UiAdapter,
};
pub use config::{EngineConfig, UnknownRequestPolicy};
pub use element::{DocumentScope, ElementId, MediaElement, MediaKind};
pub use endpoint::MixerEndpoint;
pub use error::{EngineError, Result};
pub use graph::{AudioGraph, GraphNode, ProcessingContext};
pub use registry::{collect_media_elements, ElementRegistry};
pub use store::{EventKind, StateStore, StoreEvent, SubscriptionId};

pub use mediamix_core::{Notification, Request, Response, Settings, SettingsPatch};
