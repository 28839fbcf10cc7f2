//! Shared settings store
//!
//! Holds the single authoritative [`Settings`] value of a document scope.
//! It is mutated only through validated updates; every committed change is
//! published to subscribers, an unchanged candidate is dropped silently.
//!
//! Subscribers are plain callbacks keyed by event kind and invoked
//! synchronously in registration order. The store knows nothing about who
//! listens.

use mediamix_core::{Settings, SettingsPatch};
use serde_json::Value;
use tracing::{debug, trace};

/// Change published by the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreEvent {
    VolumeChanged(f64),
    PanChanged(f64),
    SpeedChanged(f64),
    /// Aggregate event, emitted once per commit after the per-field events
    StateChanged(Settings),
}

impl StoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::VolumeChanged(_) => EventKind::Volume,
            StoreEvent::PanChanged(_) => EventKind::Pan,
            StoreEvent::SpeedChanged(_) => EventKind::Speed,
            StoreEvent::StateChanged(_) => EventKind::State,
        }
    }
}

/// Event name a subscriber listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Volume,
    Pan,
    Speed,
    State,
}

/// Handle returned by [`StateStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    callback: Subscriber,
}

/// Owner of the current settings of one document scope
pub struct StateStore {
    current: Settings,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl StateStore {
    /// Create a store holding the default settings
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(initial: Settings) -> Self {
        Self {
            current: initial,
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Last committed settings
    pub fn current(&self) -> Settings {
        self.current
    }

    /// Register a callback for one event kind
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&StoreEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription, returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Update the volume from an untrusted value
    ///
    /// Returns true if a change was committed. A value that does not parse
    /// as a number leaves the volume unchanged.
    pub fn update_volume(&mut self, raw: &Value) -> bool {
        self.apply_patch(&SettingsPatch::from_raw(raw, &Value::Null, &Value::Null))
    }

    /// Update the pan from an untrusted value
    pub fn update_pan(&mut self, raw: &Value) -> bool {
        self.apply_patch(&SettingsPatch::from_raw(&Value::Null, raw, &Value::Null))
    }

    /// Update the speed from an untrusted value
    pub fn update_speed(&mut self, raw: &Value) -> bool {
        self.apply_patch(&SettingsPatch::from_raw(&Value::Null, &Value::Null, raw))
    }

    /// Restore the default settings
    pub fn reset(&mut self) -> bool {
        self.apply_patch(&SettingsPatch::reset())
    }

    /// Validate, compare and commit a partial update
    ///
    /// No-op candidates produce no mutation and no events. A commit emits
    /// one per-field event for each changed field (volume, pan, speed
    /// order), then one aggregate event.
    pub fn apply_patch(&mut self, patch: &SettingsPatch) -> bool {
        let candidate = self.current.with_patch(patch);
        if candidate == self.current {
            trace!(?patch, "Settings unchanged, skipping commit");
            return false;
        }

        let previous = std::mem::replace(&mut self.current, candidate);
        debug!(?previous, current = ?candidate, "Committed settings");

        if previous.volume() != candidate.volume() {
            self.emit(&StoreEvent::VolumeChanged(candidate.volume()));
        }
        if previous.pan() != candidate.pan() {
            self.emit(&StoreEvent::PanChanged(candidate.pan()));
        }
        if previous.speed() != candidate.speed() {
            self.emit(&StoreEvent::SpeedChanged(candidate.speed()));
        }
        self.emit(&StoreEvent::StateChanged(candidate));

        true
    }

    fn emit(&mut self, event: &StoreEvent) {
        let kind = event.kind();
        for subscription in self
            .subscriptions
            .iter_mut()
            .filter(|subscription| subscription.kind == kind)
        {
            (subscription.callback)(event);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
