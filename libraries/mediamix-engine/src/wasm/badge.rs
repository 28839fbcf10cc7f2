//! In-page volume badge

use crate::adapter::{
    wheel_steps, AdapterControls, Affordance, BadgeAdapter, NoOpAdapter, UiAdapter,
};
use crate::error::{EngineError, Result};
use mediamix_core::Settings;
use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, WheelEvent};

const BADGE_CLASS: &str = "mediamix-badge";

fn document_error(error: &JsValue) -> EngineError {
    EngineError::Document(error.as_string().unwrap_or_else(|| format!("{error:?}")))
}

/// Small element showing the shared volume
///
/// Click resets the settings, the mouse wheel nudges the volume.
pub struct DomBadge {
    element: Element,
}

impl DomBadge {
    /// Insert a badge into the first element matching `selector`
    /// (the document body when nothing matches)
    pub fn mount(document: &Document, selector: &str) -> Result<Self> {
        let anchor = match document.query_selector(selector) {
            Ok(Some(anchor)) => anchor,
            _ => document
                .body()
                .map(Into::into)
                .ok_or_else(|| EngineError::Document("document has no body".to_string()))?,
        };

        let element = document
            .create_element("div")
            .map_err(|e| document_error(&e))?;
        element.set_class_name(BADGE_CLASS);
        anchor
            .append_child(&element)
            .map_err(|e| document_error(&e))?;

        Ok(Self { element })
    }
}

impl Affordance for DomBadge {
    fn render(&self, settings: &Settings) {
        let percent = (settings.volume() * 100.0).round();
        self.element.set_text_content(Some(&format!("{percent}%")));
    }

    fn bind(&self, controls: AdapterControls) {
        let on_click = {
            let controls = controls.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| controls.activate())
        };

        let on_wheel = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let steps = event
                .dyn_ref::<WheelEvent>()
                .and_then(|wheel| wheel_steps(wheel.delta_y()));
            if let Some(steps) = steps {
                event.prevent_default();
                controls.adjust(steps);
            }
        });

        for (name, listener) in [("click", &on_click), ("wheel", &on_wheel)] {
            if let Err(e) = self
                .element
                .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
            {
                warn!(event = name, error = %document_error(&e), "Failed to bind badge listener");
            }
        }

        // Listeners live as long as the page
        on_click.forget();
        on_wheel.forget();
    }
}

/// Build a badge adapter, falling back to the no-op adapter when the badge
/// cannot be mounted
pub fn badge_or_noop(name: &str, selector: &str) -> Box<dyn UiAdapter> {
    let document = web_sys::window().and_then(|window| window.document());
    let mounted = document
        .ok_or_else(|| EngineError::Document("no document".to_string()))
        .and_then(|document| DomBadge::mount(&document, selector));

    match mounted {
        Ok(badge) => Box::new(BadgeAdapter::new(name, badge)),
        Err(e) => {
            warn!(adapter = name, error = %e, "Falling back to no-op adapter");
            Box::new(NoOpAdapter)
        }
    }
}
