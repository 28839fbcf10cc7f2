//! Messaging endpoint - request handling and change broadcast
//!
//! Ties the registry, the audio graph and the state store together behind
//! the controller protocol. Every state-changing request runs the same
//! sequence, start to finish, inside one call:
//!
//! 1. re-scan the document and attach any element not yet in the graph
//! 2. delegate the update to the state store
//! 3. apply the resulting settings to the graph
//! 4. flush notifications raised by the store to the notifier
//!
//! The store's subscribers only queue notifications; they are delivered in
//! step 4 so a controller never hears about a change before it is audible.

use crate::adapter::{AdapterControls, UiAdapter};
use crate::config::{EngineConfig, UnknownRequestPolicy};
use crate::element::DocumentScope;
use crate::error::{EngineError, Result};
use crate::graph::{AudioGraph, ProcessingContext};
use crate::registry::ElementRegistry;
use crate::store::{EventKind, StateStore, StoreEvent, SubscriptionId};
use mediamix_core::{Notification, ProtocolError, Request, Response, Settings, SettingsPatch};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// One-way channel to the controller
pub type Notifier = Box<dyn FnMut(&Notification)>;

/// Engine instance of one document scope
pub struct MixerEndpoint<S, C>
where
    S: DocumentScope + Clone,
    C: ProcessingContext<Element = S::Element>,
{
    config: EngineConfig,
    registry: ElementRegistry<S>,
    graph: AudioGraph<C>,
    store: StateStore,
    outbox: Rc<RefCell<VecDeque<Notification>>>,
    notifier: Option<Notifier>,
}

fn notification_for(event: &StoreEvent) -> Option<Notification> {
    match *event {
        StoreEvent::VolumeChanged(value) => Some(Notification::VolumeUpdated(value)),
        StoreEvent::PanChanged(value) => Some(Notification::PanUpdated(value)),
        StoreEvent::SpeedChanged(value) => Some(Notification::SpeedUpdated(value)),
        StoreEvent::StateChanged(_) => None,
    }
}

impl<S, C> MixerEndpoint<S, C>
where
    S: DocumentScope + Clone,
    C: ProcessingContext<Element = S::Element>,
{
    /// Create the engine for a document
    ///
    /// # Arguments
    /// * `document` - Root document scope the engine lives in
    /// * `context_factory` - Builds the shared processing context on first need
    /// * `config` - Engine configuration
    pub fn new(
        document: S,
        context_factory: impl FnMut() -> Result<C> + 'static,
        config: EngineConfig,
    ) -> Self {
        let mut store = StateStore::new();
        let outbox = Rc::new(RefCell::new(VecDeque::new()));

        for kind in [EventKind::Volume, EventKind::Pan, EventKind::Speed] {
            let sink = Rc::clone(&outbox);
            store.subscribe(kind, move |event| {
                if let Some(notification) = notification_for(event) {
                    sink.borrow_mut().push_back(notification);
                }
            });
        }

        info!(
            include_subdocuments = config.include_subdocuments,
            unknown_requests = ?config.unknown_requests,
            "Created media engine"
        );

        Self {
            registry: ElementRegistry::new(document, config.include_subdocuments),
            graph: AudioGraph::new(context_factory),
            store,
            outbox,
            notifier: None,
            config,
        }
    }

    /// Install the one-way notifier (replaces any previous one)
    pub fn set_notifier(&mut self, notifier: impl FnMut(&Notification) + 'static) {
        self.notifier = Some(Box::new(notifier));
    }

    pub fn clear_notifier(&mut self) {
        self.notifier = None;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ElementRegistry<S> {
        &self.registry
    }

    pub fn graph(&self) -> &AudioGraph<C> {
        &self.graph
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Current committed settings
    pub fn settings(&self) -> Settings {
        self.store.current()
    }

    /// Subscribe to store events without access to the store itself
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&StoreEvent) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Handle a raw message from the transport
    ///
    /// Returns `Ok(None)` when the message is dropped without an answer
    /// (unknown request under the `ignore` policy). Updates answer
    /// `Some(Value::Null)`.
    pub fn handle_message(&mut self, message: &Value) -> Result<Option<Value>> {
        match Request::parse(message) {
            Ok(request) => Ok(Some(self.handle(request).into_value())),
            Err(ProtocolError::UnknownRequest(name)) => self.unknown_request(name),
            Err(e) => {
                warn!(error = %e, "Rejected malformed message");
                Err(e.into())
            }
        }
    }

    /// Handle a decoded request
    pub fn handle(&mut self, request: Request) -> Response {
        debug!(request = request.name(), "Handling request");

        match request {
            Request::Ping => Response::Pong(self.config.ping_reply.clone()),
            Request::GetSettings => Response::Settings(self.store.current()),
            Request::UpdateVolume(raw) => {
                self.commit(|store| store.update_volume(&raw));
                Response::Ack
            }
            Request::UpdatePan(raw) => {
                self.commit(|store| store.update_pan(&raw));
                Response::Ack
            }
            Request::UpdateSpeed(raw) => {
                self.commit(|store| store.update_speed(&raw));
                Response::Ack
            }
        }
    }

    fn unknown_request(&self, name: String) -> Result<Option<Value>> {
        match self.config.unknown_requests {
            UnknownRequestPolicy::Ignore => {
                debug!(request = %name, "Ignoring unknown request");
                Ok(None)
            }
            UnknownRequestPolicy::Reject => {
                warn!(request = %name, "Rejecting unknown request");
                Err(EngineError::UnsupportedRequest(name))
            }
        }
    }

    /// Scan, update, apply, notify
    fn commit(&mut self, update: impl FnOnce(&mut StateStore) -> bool) -> bool {
        self.sync_elements();
        let committed = update(&mut self.store);
        self.graph.apply_settings(&self.store.current());
        self.flush_notifications();
        committed
    }

    /// Attach every element currently in the document
    ///
    /// Returns the number of newly attached elements; they already carry
    /// the last applied settings.
    pub fn sync_elements(&mut self) -> usize {
        let elements = self.registry.scan();
        let attached = self.graph.attach_all(&elements);
        if attached > 0 {
            info!(
                attached,
                tracked = self.graph.tracked_count(),
                "Attached new media elements"
            );
        }
        attached
    }

    /// Attach new elements and re-apply the current settings everywhere
    ///
    /// For hosts that want to pick up new elements without waiting for the
    /// next controller request.
    pub fn refresh(&mut self) -> usize {
        let attached = self.sync_elements();
        self.graph.apply_settings(&self.store.current());
        attached
    }

    /// Restore default settings (adapter "activate")
    pub fn reset_settings(&mut self) -> bool {
        self.commit(|store| store.reset())
    }

    /// Move the volume by `steps` adjustment steps (adapter "adjust")
    ///
    /// Positive is louder. The result is clamped like any other update.
    pub fn adjust_volume(&mut self, steps: f64) -> bool {
        let delta = steps * self.config.adjust_step;
        self.commit(|store| {
            let target = store.current().volume() + delta;
            store.apply_patch(&SettingsPatch::volume(target))
        })
    }

    /// Start a UI adapter against this engine's store
    pub fn run_adapter(&mut self, adapter: &mut dyn UiAdapter, controls: AdapterControls) {
        info!(adapter = adapter.name(), "Starting UI adapter");
        adapter.run(&mut self.store, controls);
    }

    fn flush_notifications(&mut self) {
        loop {
            let next = self.outbox.borrow_mut().pop_front();
            let Some(notification) = next else {
                break;
            };

            debug!(?notification, "Broadcasting notification");
            if let Some(notifier) = self.notifier.as_mut() {
                notifier(&notification);
            }
        }
    }
}

impl<S, C> MixerEndpoint<S, C>
where
    S: DocumentScope + Clone + 'static,
    C: ProcessingContext<Element = S::Element> + 'static,
{
    /// Adapter controls that drive a shared engine
    ///
    /// The closures hold a weak reference: once the engine is dropped they
    /// do nothing. An interaction that arrives while the engine is busy is
    /// dropped and logged.
    pub fn adapter_controls(engine: &Rc<RefCell<Self>>) -> AdapterControls {
        let on_activate = {
            let weak = Rc::downgrade(engine);
            move || {
                if let Some(engine) = weak.upgrade() {
                    match engine.try_borrow_mut() {
                        Ok(mut engine) => {
                            engine.reset_settings();
                        }
                        Err(_) => warn!("Engine busy, dropping activate"),
                    }
                }
            }
        };

        let on_adjust = {
            let weak = Rc::downgrade(engine);
            move |steps: f64| {
                if let Some(engine) = weak.upgrade() {
                    match engine.try_borrow_mut() {
                        Ok(mut engine) => {
                            engine.adjust_volume(steps);
                        }
                        Err(_) => warn!("Engine busy, dropping adjust"),
                    }
                }
            }
        };

        AdapterControls::new(on_activate, on_adjust)
    }
}
