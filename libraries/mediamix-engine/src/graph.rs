//! Audio graph management
//!
//! One shared processing context per document, created lazily on first use.
//! Every tracked element gets exactly one route through it:
//!
//! ```text
//! element source tap -> gain stage -> pan stage -> destination
//! ```
//!
//! A media element can only be tapped once for the lifetime of a context,
//! so attachment is guarded by an identity-keyed membership map. Elements the
//! context refused to route are remembered and never retried.

use crate::element::{ElementId, MediaElement};
use crate::error::{EngineError, Result};
use mediamix_core::Settings;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Shared audio-routing runtime of one document scope
pub trait ProcessingContext {
    type Element: MediaElement;

    /// Per-element routing handle (source tap + gain + pan)
    type Route;

    /// Tap the element and chain it through fresh gain and pan stages to the
    /// output
    ///
    /// Calling this twice for the same element is an error in the
    /// underlying primitive; [`AudioGraph`] never does.
    fn connect(&mut self, element: &Self::Element) -> Result<Self::Route>;

    fn set_gain(&mut self, route: &Self::Route, gain: f32);

    fn set_pan(&mut self, route: &Self::Route, pan: f32);
}

/// Routing of one tracked element
#[derive(Debug)]
pub struct GraphNode<E, R> {
    element: E,
    route: R,
}

impl<E: MediaElement, R> GraphNode<E, R> {
    pub fn id(&self) -> ElementId {
        self.element.id()
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn route(&self) -> &R {
        &self.route
    }
}

/// Lazily invoked constructor of the processing context
pub type ContextFactory<C> = Box<dyn FnMut() -> Result<C>>;

/// Owns the processing context and the per-element routes
pub struct AudioGraph<C: ProcessingContext> {
    factory: ContextFactory<C>,
    context: Option<C>,
    nodes: Vec<GraphNode<C::Element, C::Route>>,
    members: HashMap<ElementId, usize>,
    refused: HashSet<ElementId>,
    last_applied: Option<Settings>,
}

impl<C: ProcessingContext> AudioGraph<C> {
    /// Create a graph whose context is built on the first attach
    pub fn new(factory: impl FnMut() -> Result<C> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            context: None,
            nodes: Vec::new(),
            members: HashMap::new(),
            refused: HashSet::new(),
            last_applied: None,
        }
    }

    /// Whether the processing context has been created yet
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// The processing context, if created
    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    fn context_mut(&mut self) -> Result<&mut C> {
        if self.context.is_none() {
            let context = (self.factory)()?;
            info!("Created shared processing context");
            self.context = Some(context);
        }

        self.context
            .as_mut()
            .ok_or_else(|| EngineError::context_unavailable("context was not stored"))
    }

    /// Route an element through the graph, at most once
    ///
    /// If the element is already tracked its existing node is returned and
    /// the graph is left untouched. A newly attached element immediately
    /// receives the most recently applied settings.
    ///
    /// An element whose routing failed may already hold a source tap, so it
    /// is not connected again.
    pub fn ensure_attached(
        &mut self,
        element: &C::Element,
    ) -> Result<&GraphNode<C::Element, C::Route>> {
        let id = element.id();
        if let Some(index) = self.members.get(&id).copied() {
            return Ok(&self.nodes[index]);
        }
        if self.refused.contains(&id) {
            return Err(EngineError::graph(format!(
                "element {id} was refused by the processing context"
            )));
        }

        let last_applied = self.last_applied;
        let context = self.context_mut()?;
        let route = match context.connect(element) {
            Ok(route) => route,
            Err(e) => {
                if matches!(e, EngineError::Graph(_)) {
                    self.refused.insert(id);
                }
                return Err(e);
            }
        };

        if let Some(settings) = last_applied {
            context.set_gain(&route, settings.volume() as f32);
            context.set_pan(&route, settings.pan() as f32);
            element.set_playback_rate(settings.speed());
        }

        let index = self.nodes.len();
        self.nodes.push(GraphNode {
            element: element.clone(),
            route,
        });
        self.members.insert(id, index);

        debug!(element = %id, kind = ?element.kind(), "Attached media element");
        Ok(&self.nodes[index])
    }

    /// Attach every element, skipping (and logging) the ones that fail
    ///
    /// Returns the number of newly attached elements.
    pub fn attach_all(&mut self, elements: &[C::Element]) -> usize {
        let before = self.nodes.len();

        for element in elements {
            if self.refused.contains(&element.id()) {
                continue;
            }
            if let Err(e) = self.ensure_attached(element) {
                warn!(element = %element.id(), error = %e, "Failed to attach media element");
                if matches!(e, EngineError::ContextUnavailable(_)) {
                    // Every further attach would fail the same way
                    break;
                }
            }
        }

        self.nodes.len() - before
    }

    /// Push settings to every tracked element
    ///
    /// Gain and pan go to each route; speed goes to each element's native
    /// playback rate.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.last_applied = Some(*settings);

        let Some(context) = self.context.as_mut() else {
            return;
        };

        let gain = settings.volume() as f32;
        let pan = settings.pan() as f32;

        for node in &self.nodes {
            context.set_gain(&node.route, gain);
            context.set_pan(&node.route, pan);
            node.element.set_playback_rate(settings.speed());
        }

        debug!(
            elements = self.nodes.len(),
            volume = settings.volume(),
            pan = settings.pan(),
            speed = settings.speed(),
            "Applied settings to audio graph"
        );
    }

    /// Settings most recently pushed by [`Self::apply_settings`]
    pub fn last_applied(&self) -> Option<Settings> {
        self.last_applied
    }

    pub fn is_tracked(&self, id: ElementId) -> bool {
        self.members.contains_key(&id)
    }

    /// Whether the context refused to route this element
    pub fn is_refused(&self, id: ElementId) -> bool {
        self.refused.contains(&id)
    }

    pub fn tracked_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: ElementId) -> Option<&GraphNode<C::Element, C::Route>> {
        self.members.get(&id).map(|&index| &self.nodes[index])
    }

    /// Tracked nodes in attach order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode<C::Element, C::Route>> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::MediaKind;
    use crate::headless::{HeadlessContext, HeadlessDocument};

    fn graph() -> AudioGraph<HeadlessContext> {
        AudioGraph::new(|| Ok(HeadlessContext::new()))
    }

    #[test]
    fn context_created_lazily() {
        let document = HeadlessDocument::new();
        let element = document.add_element(MediaKind::Audio);
        let mut graph = graph();

        assert!(!graph.has_context());
        graph.ensure_attached(&element).unwrap();
        assert!(graph.has_context());
    }

    #[test]
    fn ensure_attached_is_idempotent() {
        let document = HeadlessDocument::new();
        let element = document.add_element(MediaKind::Video);
        let mut graph = graph();

        let first = graph.ensure_attached(&element).unwrap().id();
        let second = graph.ensure_attached(&element).unwrap().id();

        assert_eq!(first, second);
        assert_eq!(graph.tracked_count(), 1);
        assert_eq!(element.source_taps(), 1);
    }

    #[test]
    fn attach_all_dedups_repeated_handles() {
        let document = HeadlessDocument::new();
        let a = document.add_element(MediaKind::Audio);
        let b = document.add_element(MediaKind::Video);
        let mut graph = graph();

        let attached = graph.attach_all(&[a.clone(), b.clone(), a.clone()]);

        assert_eq!(attached, 2);
        assert_eq!(a.source_taps(), 1);
        assert_eq!(b.source_taps(), 1);
        assert_eq!(graph.attach_all(&[a, b]), 0);
    }

    #[test]
    fn apply_settings_reaches_every_element() {
        let document = HeadlessDocument::new();
        let a = document.add_element(MediaKind::Audio);
        let b = document.add_element(MediaKind::Video);
        let mut graph = graph();
        graph.attach_all(&[a.clone(), b.clone()]);

        graph.apply_settings(&Settings::new(0.5, -0.5, 2.0));

        for element in [&a, &b] {
            assert_eq!(element.gain(), Some(0.5));
            assert_eq!(element.pan(), Some(-0.5));
            assert_eq!(element.playback_rate(), 2.0);
        }
    }

    #[test]
    fn late_element_receives_last_applied_settings() {
        let document = HeadlessDocument::new();
        let early = document.add_element(MediaKind::Audio);
        let mut graph = graph();
        graph.ensure_attached(&early).unwrap();
        graph.apply_settings(&Settings::new(0.25, 1.0, 1.5));

        let late = document.add_element(MediaKind::Video);
        graph.ensure_attached(&late).unwrap();

        assert_eq!(late.gain(), Some(0.25));
        assert_eq!(late.pan(), Some(1.0));
        assert_eq!(late.playback_rate(), 1.5);
    }

    #[test]
    fn failing_factory_reports_context_unavailable() {
        let document = HeadlessDocument::new();
        let element = document.add_element(MediaKind::Audio);
        let mut graph: AudioGraph<HeadlessContext> =
            AudioGraph::new(|| Err(EngineError::context_unavailable("no audio hardware")));

        let result = graph.ensure_attached(&element);
        assert!(matches!(result, Err(EngineError::ContextUnavailable(_))));
        assert_eq!(graph.tracked_count(), 0);
        assert_eq!(graph.attach_all(&[element]), 0);
    }

    #[test]
    fn refused_element_is_not_connected_again() {
        let document = HeadlessDocument::new();
        let tapped = document.add_element(MediaKind::Audio);
        let fresh = document.add_element(MediaKind::Video);
        HeadlessContext::new().connect(&tapped).unwrap();
        let mut graph = graph();

        assert_eq!(graph.attach_all(&[tapped.clone(), fresh.clone()]), 1);
        assert_eq!(graph.attach_all(&[tapped.clone(), fresh]), 0);

        assert!(graph.is_refused(tapped.id()));
        assert!(!graph.is_tracked(tapped.id()));
        assert!(matches!(
            graph.ensure_attached(&tapped),
            Err(EngineError::Graph(_))
        ));
        assert_eq!(graph.context().map(HeadlessContext::refused_count), Some(1));
        assert_eq!(tapped.source_taps(), 1);
    }

    #[test]
    fn failed_context_does_not_refuse_elements() {
        let document = HeadlessDocument::new();
        let element = document.add_element(MediaKind::Audio);
        let mut graph: AudioGraph<HeadlessContext> =
            AudioGraph::new(|| Err(EngineError::context_unavailable("suspended")));

        graph.attach_all(&[element.clone()]);
        assert!(!graph.is_refused(element.id()));
    }
}
