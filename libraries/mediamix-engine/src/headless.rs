//! In-memory host document and processing context
//!
//! Lets the engine run without a browser: the simulator application drives
//! it, and tests use it to observe gain, pan, playback rate and source taps
//! per element.

use crate::element::{DocumentScope, ElementId, MediaElement, MediaKind};
use crate::error::{EngineError, Result};
use crate::graph::ProcessingContext;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug)]
struct ElementState {
    playback_rate: f64,
    source_taps: u32,
    gain: Option<f32>,
    pan: Option<f32>,
    in_document: bool,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            playback_rate: 1.0,
            source_taps: 0,
            gain: None,
            pan: None,
            in_document: true,
        }
    }
}

/// In-memory media element
///
/// Clones are handles to the same element.
#[derive(Debug, Clone)]
pub struct HeadlessElement {
    id: ElementId,
    kind: MediaKind,
    state: Rc<RefCell<ElementState>>,
}

impl HeadlessElement {
    /// Number of source taps created for this element
    pub fn source_taps(&self) -> u32 {
        self.state.borrow().source_taps
    }

    /// Gain of the element's route, `None` while unrouted
    pub fn gain(&self) -> Option<f32> {
        self.state.borrow().gain
    }

    /// Pan of the element's route, `None` while unrouted
    pub fn pan(&self) -> Option<f32> {
        self.state.borrow().pan
    }

    /// Whether the element is still part of its document
    pub fn in_document(&self) -> bool {
        self.state.borrow().in_document
    }
}

impl MediaElement for HeadlessElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn playback_rate(&self) -> f64 {
        self.state.borrow().playback_rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.borrow_mut().playback_rate = rate;
    }
}

#[derive(Debug)]
struct DocumentInner {
    next_id: Rc<Cell<u64>>,
    elements: RefCell<Vec<HeadlessElement>>,
    frames: RefCell<Vec<HeadlessDocument>>,
    cross_origin: bool,
}

/// In-memory document
///
/// Clones are handles to the same document. Frames share the id sequence of
/// their parent so element ids stay unique across a whole page.
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    inner: Rc<DocumentInner>,
}

impl HeadlessDocument {
    /// Create an empty top-level document
    pub fn new() -> Self {
        Self::with_sequence(Rc::new(Cell::new(1)), false)
    }

    fn with_sequence(next_id: Rc<Cell<u64>>, cross_origin: bool) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                next_id,
                elements: RefCell::new(Vec::new()),
                frames: RefCell::new(Vec::new()),
                cross_origin,
            }),
        }
    }

    /// Insert a new media element at the end of the document
    pub fn add_element(&self, kind: MediaKind) -> HeadlessElement {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let element = HeadlessElement {
            id: ElementId(id),
            kind,
            state: Rc::new(RefCell::new(ElementState::default())),
        };
        self.inner.elements.borrow_mut().push(element.clone());
        element
    }

    /// Remove an element from this document (frames are not searched)
    ///
    /// The element keeps any routing it already has.
    pub fn remove_element(&self, id: ElementId) -> Option<HeadlessElement> {
        let mut elements = self.inner.elements.borrow_mut();
        let index = elements.iter().position(|element| element.id == id)?;
        let element = elements.remove(index);
        element.state.borrow_mut().in_document = false;
        Some(element)
    }

    /// Embed a same-origin frame and return its document
    pub fn add_frame(&self) -> HeadlessDocument {
        let frame = Self::with_sequence(Rc::clone(&self.inner.next_id), false);
        self.inner.frames.borrow_mut().push(frame.clone());
        frame
    }

    /// Embed a frame whose document cannot be entered
    pub fn add_cross_origin_frame(&self) -> HeadlessDocument {
        let frame = Self::with_sequence(Rc::clone(&self.inner.next_id), true);
        self.inner.frames.borrow_mut().push(frame.clone());
        frame
    }

    /// Elements of this document in insertion order
    pub fn elements(&self) -> Vec<HeadlessElement> {
        self.inner.elements.borrow().clone()
    }

    /// Find an element in this document or any frame
    pub fn find(&self, id: ElementId) -> Option<HeadlessElement> {
        if let Some(element) = self.inner.elements.borrow().iter().find(|e| e.id == id) {
            return Some(element.clone());
        }

        self.inner
            .frames
            .borrow()
            .iter()
            .find_map(|frame| frame.find(id))
    }
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentScope for HeadlessDocument {
    type Element = HeadlessElement;

    fn media_elements(&self) -> Vec<HeadlessElement> {
        let elements = self.inner.elements.borrow();
        let audio = elements.iter().filter(|e| e.kind == MediaKind::Audio);
        let video = elements.iter().filter(|e| e.kind == MediaKind::Video);
        audio.chain(video).cloned().collect()
    }

    fn embedded_scopes(&self) -> Vec<HeadlessDocument> {
        self.inner
            .frames
            .borrow()
            .iter()
            .filter(|frame| !frame.inner.cross_origin)
            .cloned()
            .collect()
    }
}

/// Route of one element through the in-memory graph
#[derive(Debug)]
pub struct HeadlessRoute {
    state: Rc<RefCell<ElementState>>,
}

/// In-memory processing context
#[derive(Debug, Default)]
pub struct HeadlessContext {
    routes: usize,
    refused: usize,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of routes created through this context
    pub fn route_count(&self) -> usize {
        self.routes
    }

    /// Number of connect calls that failed
    pub fn refused_count(&self) -> usize {
        self.refused
    }
}

impl ProcessingContext for HeadlessContext {
    type Element = HeadlessElement;
    type Route = HeadlessRoute;

    fn connect(&mut self, element: &HeadlessElement) -> Result<HeadlessRoute> {
        let mut state = element.state.borrow_mut();

        // Same failure a media element source node raises on a second tap
        if state.source_taps > 0 {
            self.refused += 1;
            return Err(EngineError::graph(format!(
                "element {} is already connected to a source node",
                element.id
            )));
        }

        state.source_taps += 1;
        state.gain = Some(1.0);
        state.pan = Some(0.0);
        drop(state);

        self.routes += 1;
        Ok(HeadlessRoute {
            state: Rc::clone(&element.state),
        })
    }

    fn set_gain(&mut self, route: &HeadlessRoute, gain: f32) {
        route.state.borrow_mut().gain = Some(gain);
    }

    fn set_pan(&mut self, route: &HeadlessRoute, pan: f32) {
        route.state.borrow_mut().pan = Some(pan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_elements_lists_audio_before_video() {
        let document = HeadlessDocument::new();
        let v1 = document.add_element(MediaKind::Video);
        let a1 = document.add_element(MediaKind::Audio);
        let v2 = document.add_element(MediaKind::Video);

        let ids: Vec<_> = document.media_elements().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![a1.id(), v1.id(), v2.id()]);
    }

    #[test]
    fn frames_share_the_id_sequence() {
        let document = HeadlessDocument::new();
        let a = document.add_element(MediaKind::Audio);
        let frame = document.add_frame();
        let b = frame.add_element(MediaKind::Audio);

        assert_ne!(a.id(), b.id());
        assert_eq!(document.find(b.id()).map(|e| e.id()), Some(b.id()));
    }

    #[test]
    fn cross_origin_frames_are_not_embedded_scopes() {
        let document = HeadlessDocument::new();
        document.add_frame();
        document.add_cross_origin_frame();

        assert_eq!(document.embedded_scopes().len(), 1);
    }

    #[test]
    fn second_tap_is_rejected_by_the_context() {
        let document = HeadlessDocument::new();
        let element = document.add_element(MediaKind::Audio);
        let mut context = HeadlessContext::new();

        context.connect(&element).unwrap();
        assert!(matches!(
            context.connect(&element),
            Err(EngineError::Graph(_))
        ));
        assert_eq!(element.source_taps(), 1);
        assert_eq!(context.route_count(), 1);
    }

    #[test]
    fn removed_element_keeps_routing() {
        let document = HeadlessDocument::new();
        let element = document.add_element(MediaKind::Video);
        let mut context = HeadlessContext::new();
        let route = context.connect(&element).unwrap();

        document.remove_element(element.id()).unwrap();
        context.set_gain(&route, 0.3);

        assert!(!element.in_document());
        assert_eq!(element.gain(), Some(0.3));
        assert!(document.media_elements().is_empty());
    }
}
