//! Web Audio processing context

use super::dom::DomElement;
use crate::error::{EngineError, Result};
use crate::graph::ProcessingContext;
use tracing::warn;
use wasm_bindgen::JsValue;
use web_sys::{AudioContext, GainNode, MediaElementAudioSourceNode, StereoPannerNode};

fn describe(error: &JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{error:?}"))
}

/// Nodes routing one element; dropping them does not disconnect the graph
pub struct WebAudioRoute {
    _source: MediaElementAudioSourceNode,
    gain: GainNode,
    panner: StereoPannerNode,
}

/// The page's shared `AudioContext`
pub struct WebAudioContext {
    context: AudioContext,
}

impl WebAudioContext {
    pub fn new() -> Result<Self> {
        let context = AudioContext::new()
            .map_err(|e| EngineError::context_unavailable(describe(&e)))?;
        Ok(Self { context })
    }
}

impl ProcessingContext for WebAudioContext {
    type Element = DomElement;
    type Route = WebAudioRoute;

    fn connect(&mut self, element: &DomElement) -> Result<WebAudioRoute> {
        let graph_error = |e: JsValue| EngineError::graph(describe(&e));

        let source = self
            .context
            .create_media_element_source(element.media())
            .map_err(graph_error)?;

        let chain = self.context.create_gain().and_then(|gain| {
            let panner = self.context.create_stereo_panner()?;
            source
                .connect_with_audio_node(&gain)
                .and_then(|node| node.connect_with_audio_node(&panner))
                .and_then(|node| node.connect_with_audio_node(&self.context.destination()))?;
            Ok((gain, panner))
        });

        let (gain, panner) = match chain {
            Ok(stages) => stages,
            Err(e) => {
                // The tap already took the element's output; keep it audible
                source.disconnect().ok();
                if let Err(direct) = source.connect_with_audio_node(&self.context.destination()) {
                    warn!(error = %describe(&direct), "Failed to restore direct output");
                }
                return Err(graph_error(e));
            }
        };

        // A context created outside a user gesture starts suspended and
        // would silence every routed element
        if let Err(e) = self.context.resume() {
            warn!(error = %describe(&e), "Failed to resume audio context");
        }

        Ok(WebAudioRoute {
            _source: source,
            gain,
            panner,
        })
    }

    fn set_gain(&mut self, route: &WebAudioRoute, gain: f32) {
        route.gain.gain().set_value(gain);
    }

    fn set_pan(&mut self, route: &WebAudioRoute, pan: f32) {
        route.panner.pan().set_value(pan);
    }
}
