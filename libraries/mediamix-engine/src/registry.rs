//! Element discovery
//!
//! The registry has no change notifications of its own: it re-queries the
//! host document every time it is asked. Callers scan before every
//! state-affecting operation, which keeps late-added elements in sync
//! without a mutation observer.

use crate::element::DocumentScope;
use tracing::debug;

/// Collect the media elements of several scopes
///
/// Results are concatenated in scope order. Duplicates across scopes are
/// kept; deduplication happens in the audio graph, keyed on identity.
pub fn collect_media_elements<S: DocumentScope>(scopes: &[S]) -> Vec<S::Element> {
    scopes
        .iter()
        .flat_map(|scope| scope.media_elements())
        .collect()
}

/// Discovers the media elements of one document scope
pub struct ElementRegistry<S: DocumentScope> {
    root: S,
    include_subdocuments: bool,
}

impl<S: DocumentScope> ElementRegistry<S> {
    /// Create a registry over a root document
    ///
    /// # Arguments
    /// * `root` - The document the engine lives in
    /// * `include_subdocuments` - Also scan embedded sub-documents
    pub fn new(root: S, include_subdocuments: bool) -> Self {
        Self {
            root,
            include_subdocuments,
        }
    }

    /// The root document
    pub fn root(&self) -> &S {
        &self.root
    }

    /// Whether embedded sub-documents are scanned
    pub fn includes_subdocuments(&self) -> bool {
        self.include_subdocuments
    }

    /// All scopes to query: the root, then embedded scopes depth-first
    pub fn scopes(&self) -> Vec<S>
    where
        S: Clone,
    {
        let mut scopes = vec![self.root.clone()];
        if self.include_subdocuments {
            push_embedded(&self.root, &mut scopes);
        }
        scopes
    }

    /// Fresh query of every media element currently present
    pub fn scan(&self) -> Vec<S::Element>
    where
        S: Clone,
    {
        let scopes = self.scopes();
        let elements = collect_media_elements(&scopes);
        debug!(
            scopes = scopes.len(),
            elements = elements.len(),
            "Scanned document for media elements"
        );
        elements
    }
}

/// Frames nested deeper than this are not scanned
const MAX_SCOPE_DEPTH: usize = 16;

fn push_embedded<S: DocumentScope>(scope: &S, out: &mut Vec<S>) {
    for child in scope.embedded_scopes() {
        collect_tree(child, 1, out);
    }
}

fn collect_tree<S: DocumentScope>(scope: S, depth: usize, out: &mut Vec<S>) {
    let children = if depth < MAX_SCOPE_DEPTH {
        scope.embedded_scopes()
    } else {
        Vec::new()
    };
    out.push(scope);
    for child in children {
        collect_tree(child, depth + 1, out);
    }
}
