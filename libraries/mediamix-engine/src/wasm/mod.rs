//! WASM bindings for mediamix-engine
//!
//! This module implements the engine's document and audio traits over
//! `web-sys` and exposes a JavaScript-friendly wrapper, so the engine can
//! run as a page script. The surrounding extension glue forwards runtime
//! messages to `handleMessage` and relays `onNotification` callbacks.

#[cfg(feature = "wasm")]
pub mod audio;

#[cfg(feature = "wasm")]
pub mod badge;

#[cfg(feature = "wasm")]
pub mod dom;

#[cfg(feature = "wasm")]
pub mod engine;

#[cfg(feature = "wasm")]
pub use engine::WasmMixerEngine;
