//! Per-capture state shared by the serialization passes

use std::collections::HashMap;

use super::resource::Resource;
use super::uid::UidGenerator;
use crate::dom::{Document, NodeId};
use crate::SerializeOptions;

/// An insertion-ordered set of messages.
#[derive(Debug, Default, Clone)]
pub(crate) struct Diagnostics(Vec<String>);

impl Diagnostics {
    /// Record `msg` unless it is already present. Returns whether it was new.
    pub fn insert(&mut self, msg: String) -> bool {
        if self.0.contains(&msg) {
            return false;
        }
        self.0.push(msg);
        true
    }

    pub fn extend(&mut self, msgs: impl IntoIterator<Item = String>) {
        for msg in msgs {
            self.insert(msg);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// URLs a frame capture takes over from the document embedding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Embedder {
    /// URL of the top-level document, against which resources are resolved
    pub document_url: String,
    /// Base URI of the embedding document
    pub base_uri: String,
}

/// Everything one capture reads from and accumulates into.
///
/// `live` is never modified. `clone` is the tree that is emitted. The pairing
/// of live nodes to their clone counterparts is held here rather than in the
/// markup, so passes can look up clone nodes directly.
pub(crate) struct SerializationContext<'a> {
    pub live: &'a Document,
    pub clone: Document,
    pub options: &'a SerializeOptions,
    /// URL extracted resources are resolved against
    pub document_url: String,
    /// Base URI written into the clone's `<base href>`
    pub base_uri: String,
    pub resources: Vec<Resource>,
    pub warnings: Diagnostics,
    pub hints: Diagnostics,
    /// Resource URL per adopted stylesheet, keyed by sheet identity
    pub cache: HashMap<usize, String>,
    pub uids: &'a mut UidGenerator,
    pub(super) marks: HashMap<NodeId, String>,
    pairs: HashMap<NodeId, NodeId>,
}

impl<'a> SerializationContext<'a> {
    pub fn new(live: &'a Document, options: &'a SerializeOptions, uids: &'a mut UidGenerator) -> Self {
        let mut clone = Document::new(live.url());
        clone.capabilities = live.capabilities;
        Self {
            live,
            clone,
            options,
            document_url: live.url().to_string(),
            base_uri: live.base_uri(),
            resources: Vec::new(),
            warnings: Diagnostics::default(),
            hints: Diagnostics::default(),
            cache: HashMap::new(),
            uids,
            marks: HashMap::new(),
            pairs: HashMap::new(),
        }
    }

    /// Resolve resources against the top-level document. A document without
    /// a usable base of its own (such as `about:blank`) takes the embedder's.
    pub fn inherit(&mut self, embedder: &Embedder) {
        self.document_url = embedder.document_url.clone();
        if !has_host(&self.base_uri) {
            self.base_uri = embedder.base_uri.clone();
        }
    }

    /// What a frame captured from this context inherits.
    pub fn embedder(&self) -> Embedder {
        Embedder {
            document_url: self.document_url.clone(),
            base_uri: self.base_uri.clone(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.warnings.insert(msg.clone()) {
            log::warn!("{}", msg);
        }
    }

    pub fn hint(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.hints.insert(msg.clone()) {
            log::info!("hint: {}", msg);
        }
    }

    /// The clone counterpart of a live node, if it is still part of the clone.
    pub fn clone_of(&self, live: NodeId) -> Option<NodeId> {
        self.pairs.get(&live).copied()
    }

    pub fn pair(&mut self, live: NodeId, clone: NodeId) {
        self.pairs.insert(live, clone);
    }

    /// Drop the pairing of a live node whose clone was removed.
    pub fn forget(&mut self, live: NodeId) {
        self.pairs.remove(&live);
    }

    /// The element id assigned to a live node while cloning.
    pub fn mark_of(&self, live: NodeId) -> Option<&str> {
        self.marks.get(&live).map(String::as_str)
    }

    /// `data-rfox-element-id="<id>"`, the prefix used by per-element warnings.
    pub fn element_label(&self, live: NodeId) -> String {
        format!(
            "{}=\"{}\"",
            super::clone::ELEMENT_ID_ATTR,
            self.mark_of(live).unwrap_or_default()
        )
    }
}

pub(crate) fn has_host(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| u.host_str().is_some())
}
