//! Browser document access

use crate::element::{DocumentScope, ElementId, MediaElement, MediaKind};
use js_sys::{Object, WeakMap};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlIFrameElement, HtmlMediaElement};

/// Assigns stable ids to DOM objects without writing to the page
///
/// Ids live in a `WeakMap`, so a removed element's entry goes away with it.
#[derive(Clone)]
pub struct IdentityMap {
    ids: WeakMap,
    next: Rc<Cell<u64>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self {
            ids: WeakMap::new(),
            next: Rc::new(Cell::new(1)),
        }
    }

    /// Id of `object`, assigning a fresh one on first sight
    pub fn id_of(&self, object: &Object) -> ElementId {
        if let Some(id) = self.ids.get(object).as_f64() {
            return ElementId(id as u64);
        }

        let id = self.next.get();
        self.next.set(id + 1);
        self.ids.set(object, &JsValue::from_f64(id as f64));
        ElementId(id)
    }
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self::new()
    }
}

/// `<audio>` or `<video>` element of the page
#[derive(Clone)]
pub struct DomElement {
    element: HtmlMediaElement,
    id: ElementId,
    kind: MediaKind,
}

impl DomElement {
    pub fn media(&self) -> &HtmlMediaElement {
        &self.element
    }
}

impl MediaElement for DomElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn playback_rate(&self) -> f64 {
        self.element.playback_rate()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.element.set_playback_rate(rate);
    }
}

/// Page document (or the document of a same-origin frame)
#[derive(Clone)]
pub struct DomDocument {
    document: Document,
    identities: IdentityMap,
}

impl DomDocument {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            identities: IdentityMap::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl DocumentScope for DomDocument {
    type Element = DomElement;

    fn media_elements(&self) -> Vec<DomElement> {
        let mut elements = Vec::new();

        for kind in [MediaKind::Audio, MediaKind::Video] {
            let collection = self.document.get_elements_by_tag_name(kind.tag_name());
            for index in 0..collection.length() {
                let Some(media) = collection
                    .item(index)
                    .and_then(|element| element.dyn_into::<HtmlMediaElement>().ok())
                else {
                    continue;
                };

                let object: &Object = media.as_ref();
                let id = self.identities.id_of(object);
                elements.push(DomElement {
                    element: media,
                    id,
                    kind,
                });
            }
        }

        elements
    }

    fn embedded_scopes(&self) -> Vec<DomDocument> {
        let frames = self.document.get_elements_by_tag_name("iframe");

        (0..frames.length())
            .filter_map(|index| frames.item(index))
            .filter_map(|element| element.dyn_into::<HtmlIFrameElement>().ok())
            // Cross-origin frames expose no content document
            .filter_map(|frame| frame.content_document())
            .map(|document| DomDocument {
                document,
                identities: self.identities.clone(),
            })
            .collect()
    }
}
