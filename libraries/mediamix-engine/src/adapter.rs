//! Optional in-page UI adapters
//!
//! An adapter reacts to store changes to keep an in-page affordance up to
//! date, and forwards the affordance's interactions to the engine through
//! [`AdapterControls`]. Which adapter runs is decided by an
//! [`AdapterTable`] keyed on the host name; unknown hosts always get the
//! [`NoOpAdapter`].

use crate::store::{EventKind, StateStore, StoreEvent};
use mediamix_core::Settings;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Callbacks an adapter uses to drive the engine
#[derive(Clone)]
pub struct AdapterControls {
    on_activate: Rc<dyn Fn()>,
    on_adjust: Rc<dyn Fn(f64)>,
}

impl AdapterControls {
    /// # Arguments
    /// * `on_activate` - Reset the settings to their defaults
    /// * `on_adjust` - Relative volume change in adjustment steps
    pub fn new(on_activate: impl Fn() + 'static, on_adjust: impl Fn(f64) + 'static) -> Self {
        Self {
            on_activate: Rc::new(on_activate),
            on_adjust: Rc::new(on_adjust),
        }
    }

    pub fn activate(&self) {
        (self.on_activate)();
    }

    pub fn adjust(&self, steps: f64) {
        (self.on_adjust)(steps);
    }
}

/// Volume steps for one wheel event, `None` when it has no vertical motion
///
/// Wheel up (negative delta) is louder.
pub fn wheel_steps(delta_y: f64) -> Option<f64> {
    if delta_y == 0.0 || delta_y.is_nan() {
        return None;
    }
    Some(-delta_y.signum())
}

impl fmt::Debug for AdapterControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterControls").finish_non_exhaustive()
    }
}

/// Per-host UI strategy
pub trait UiAdapter {
    fn name(&self) -> &str;

    /// Start reacting to `store` changes and wire interactions to `controls`
    fn run(&mut self, store: &mut StateStore, controls: AdapterControls);
}

/// Adapter for hosts without an in-page affordance
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAdapter;

impl UiAdapter for NoOpAdapter {
    fn name(&self) -> &str {
        "noop"
    }

    fn run(&mut self, _store: &mut StateStore, _controls: AdapterControls) {}
}

/// In-page widget driven by a [`BadgeAdapter`]
pub trait Affordance {
    /// Show the given settings
    fn render(&self, settings: &Settings);

    /// Forward the widget's interactions (click, wheel, ...) to `controls`
    fn bind(&self, controls: AdapterControls);
}

/// Adapter that mirrors the current volume in an injected badge
pub struct BadgeAdapter<A: Affordance> {
    name: String,
    affordance: Rc<A>,
}

impl<A: Affordance> BadgeAdapter<A> {
    pub fn new(name: impl Into<String>, affordance: A) -> Self {
        Self {
            name: name.into(),
            affordance: Rc::new(affordance),
        }
    }

    pub fn affordance(&self) -> &A {
        &self.affordance
    }
}

impl<A: Affordance + 'static> UiAdapter for BadgeAdapter<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, store: &mut StateStore, controls: AdapterControls) {
        self.affordance.render(&store.current());
        self.affordance.bind(controls);

        let affordance = Rc::clone(&self.affordance);
        store.subscribe(EventKind::State, move |event| {
            if let StoreEvent::StateChanged(settings) = event {
                affordance.render(settings);
            }
        });
    }
}

/// Host name predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Exactly this host
    Exact(String),
    /// This domain or any subdomain of it
    Domain(String),
}

impl HostPattern {
    /// Case-insensitive match; a trailing `:port` on `host` is ignored
    pub fn matches(&self, host: &str) -> bool {
        let host = host
            .rsplit_once(':')
            .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
            .map_or(host, |(name, _)| name)
            .to_ascii_lowercase();

        match self {
            HostPattern::Exact(expected) => host == expected.to_ascii_lowercase(),
            HostPattern::Domain(domain) => {
                let domain = domain.to_ascii_lowercase();
                host == domain || host.ends_with(&format!(".{domain}"))
            }
        }
    }
}

/// Constructor of one adapter instance
pub type AdapterFactory = Box<dyn Fn() -> Box<dyn UiAdapter>>;

/// Ordered host -> adapter table with a no-op default
#[derive(Default)]
pub struct AdapterTable {
    entries: Vec<(HostPattern, AdapterFactory)>,
}

impl AdapterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; earlier entries win
    pub fn register(
        &mut self,
        pattern: HostPattern,
        factory: impl Fn() -> Box<dyn UiAdapter> + 'static,
    ) -> &mut Self {
        self.entries.push((pattern, Box::new(factory)));
        self
    }

    /// Pick the adapter for a host, never fails
    pub fn select(&self, host: &str) -> Box<dyn UiAdapter> {
        let adapter = self
            .entries
            .iter()
            .find(|(pattern, _)| pattern.matches(host))
            .map_or_else(|| Box::new(NoOpAdapter) as Box<dyn UiAdapter>, |(_, factory)| factory());

        debug!(host, adapter = adapter.name(), "Selected UI adapter");
        adapter
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
