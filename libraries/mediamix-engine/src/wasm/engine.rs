//! WASM-compatible engine wrapper

use super::audio::WebAudioContext;
use super::badge::badge_or_noop;
use super::dom::DomDocument;
use crate::adapter::{AdapterTable, HostPattern};
use crate::config::EngineConfig;
use crate::endpoint::MixerEndpoint;
use js_sys::Function;
use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type DomEndpoint = MixerEndpoint<DomDocument, WebAudioContext>;

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// WASM-compatible media engine
///
/// This wraps the core [`MixerEndpoint`] with a JavaScript-friendly API.
#[wasm_bindgen]
pub struct WasmMixerEngine {
    inner: Rc<RefCell<DomEndpoint>>,
    adapters: AdapterTable,

    // Event callback
    on_notification: Rc<RefCell<Option<Function>>>,
}

impl WasmMixerEngine {
    fn engine(&self) -> Result<Ref<'_, DomEndpoint>, JsValue> {
        self.inner
            .try_borrow()
            .map_err(|_| JsValue::from_str("Engine is busy"))
    }
}

#[wasm_bindgen]
impl WasmMixerEngine {
    /// Create the engine for the current page
    ///
    /// `config` is an optional plain object with engine configuration fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmMixerEngine, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid engine config: {}", e)))?
        };

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;

        let mut endpoint =
            MixerEndpoint::new(DomDocument::new(document), WebAudioContext::new, config);

        let on_notification: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&on_notification);
        endpoint.set_notifier(move |notification| {
            let Some(cb) = sink.borrow().clone() else {
                return;
            };
            let Ok(value) = to_js(notification) else {
                return;
            };

            // Delivered after the current call has released the engine, so
            // the callback may read it
            let deliver = Closure::once_into_js(move || {
                cb.call1(&JsValue::NULL, &value).ok();
            });
            match web_sys::window() {
                Some(window) => window.queue_microtask(deliver.unchecked_ref()),
                None => warn!("No window to deliver notification"),
            }
        });

        Ok(Self {
            inner: Rc::new(RefCell::new(endpoint)),
            adapters: AdapterTable::new(),
            on_notification,
        })
    }

    /// Handle one controller message, returning the reply
    ///
    /// Returns `undefined` when the message is dropped without a reply.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> Result<JsValue, JsValue> {
        let message: serde_json::Value = serde_wasm_bindgen::from_value(message)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse message: {}", e)))?;

        let mut engine = self
            .inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Engine is busy"))?;

        match engine
            .handle_message(&message)
            .map_err(|e| JsValue::from_str(&e.to_string()))?
        {
            Some(reply) => to_js(&reply),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Register the one-way notification callback
    #[wasm_bindgen(js_name = onNotification)]
    pub fn on_notification(&self, callback: Function) {
        *self.on_notification.borrow_mut() = Some(callback);
    }

    /// Attach newly added elements and re-apply the current settings
    pub fn refresh(&self) -> Result<usize, JsValue> {
        let mut engine = self
            .inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Engine is busy"))?;
        Ok(engine.refresh())
    }

    /// Get current settings as `{volume, pan, speed}`
    #[wasm_bindgen(js_name = getSettings)]
    pub fn get_settings(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine()?.settings())
    }

    /// Number of elements routed through the audio graph
    #[wasm_bindgen(js_name = trackedCount)]
    pub fn tracked_count(&self) -> Result<usize, JsValue> {
        Ok(self.engine()?.graph().tracked_count())
    }

    // ===== UI Adapters =====

    /// Show a volume badge on `domain` (and its subdomains), inside the
    /// first element matching `selector`
    #[wasm_bindgen(js_name = registerBadge)]
    pub fn register_badge(&mut self, domain: String, selector: String) {
        let name = format!("badge:{}", domain);
        self.adapters
            .register(HostPattern::Domain(domain), move || {
                badge_or_noop(&name, &selector)
            });
    }

    /// Select and start the adapter for the current host
    ///
    /// Returns the adapter name ("noop" for unregistered hosts).
    #[wasm_bindgen(js_name = startAdapter)]
    pub fn start_adapter(&self) -> Result<String, JsValue> {
        let host = web_sys::window()
            .map(|window| window.location())
            .and_then(|location| location.hostname().ok())
            .unwrap_or_default();

        let mut adapter = self.adapters.select(&host);
        let controls = MixerEndpoint::adapter_controls(&self.inner);

        self.inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Engine is busy"))?
            .run_adapter(adapter.as_mut(), controls);

        Ok(adapter.name().to_string())
    }
}
