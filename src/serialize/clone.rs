//! Marking of stateful elements and deep cloning of the live tree

use super::context::SerializationContext;
use crate::dom::{NodeData, NodeId};
use crate::{Error, Result};

/// Attribute carrying the id that links a clone element to its live source.
pub const ELEMENT_ID_ATTR: &str = "data-rfox-element-id";

/// Attribute flagging clone elements whose live source hosts a shadow root.
pub const SHADOW_HOST_ATTR: &str = "data-rfox-shadow-host";

/// Elements whose live state is not reflected in their markup.
const STATEFUL_TAGS: &[&str] = &["input", "textarea", "select", "iframe", "canvas", "video", "style"];

/// Elements dropped from the clone.
const IGNORED_TAGS: &[&str] = &["noscript"];

/// Elements whose `loading` attribute is dropped so the renderer loads them eagerly.
const LAZY_TAGS: &[&str] = &["img", "iframe"];

impl SerializationContext<'_> {
    /// Assign an element id to a live node that needs state recovery.
    ///
    /// Stateful elements and (unless shadow capture is disabled) shadow hosts
    /// are marked. Marking is idempotent; an id already present as a live
    /// attribute is reused unless another element already holds it.
    pub(crate) fn mark(&mut self, node: NodeId) -> Option<String> {
        let live = self.live;
        let el = live.element(node)?;
        let stateful = STATEFUL_TAGS.contains(&el.name());
        if !stateful && !self.is_shadow_host(node) {
            return None;
        }
        if let Some(id) = self.marks.get(&node) {
            return Some(id.clone());
        }
        let id = match el.attr(ELEMENT_ID_ATTR).filter(|v| !v.is_empty()) {
            Some(existing) if self.uids.claim(existing) => existing.to_string(),
            _ => self.uids.next_uid(),
        };
        self.marks.insert(node, id.clone());
        Some(id)
    }

    pub(crate) fn is_shadow_host(&self, node: NodeId) -> bool {
        !self.options.disable_shadow_dom && self.live.shadow_root(node).is_some()
    }
}

/// Handles into a freshly cloned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneTree {
    pub root: NodeId,
    pub head: Option<NodeId>,
    pub body: Option<NodeId>,
}

/// Clone the live document element (and its shadow trees) into the clone document.
pub(crate) fn clone_document(ctx: &mut SerializationContext<'_>) -> Result<CloneTree> {
    let root = ctx.live.document_element().ok_or(Error::MissingRootElement)?;
    let target = ctx.clone.root();
    let root = clone_node(ctx, root, target).ok_or(Error::MissingRootElement)?;
    Ok(CloneTree {
        root,
        head: ctx.clone.head(),
        body: ctx.clone.body(),
    })
}

fn clone_node(ctx: &mut SerializationContext<'_>, node: NodeId, parent: NodeId) -> Option<NodeId> {
    let live = ctx.live;
    let copy = match live.node(node).data() {
        NodeData::Element(el) => {
            if IGNORED_TAGS.contains(&el.name()) {
                return None;
            }
            let id = ctx.mark(node);
            let mut copy = el.shallow_copy();
            if let Some(id) = id {
                copy.set_attr(ELEMENT_ID_ATTR, id);
            }
            if ctx.is_shadow_host(node) {
                copy.set_attr(SHADOW_HOST_ATTR, "");
            }
            if LAZY_TAGS.contains(&el.name()) {
                copy.remove_attr("loading");
            }
            ctx.clone.adopt_element(copy)
        }
        NodeData::Text(text) => ctx.clone.create_text(text.as_str()),
        NodeData::Comment(text) => ctx.clone.create_comment(text.as_str()),
        NodeData::Document | NodeData::Doctype(_) | NodeData::ShadowRoot { .. } => return None,
    };
    ctx.clone.append_child(parent, copy);
    ctx.pair(node, copy);

    if ctx.is_shadow_host(node) {
        if let Some(live_root) = live.shadow_root(node) {
            let mode = live.shadow_root_mode(live_root).unwrap_or_default();
            if let Some(clone_root) = ctx.clone.attach_shadow(copy, mode) {
                ctx.pair(live_root, clone_root);
                clone_children(ctx, live_root, clone_root);
            }
        }
    }
    clone_children(ctx, node, copy);
    Some(copy)
}

fn clone_children(ctx: &mut SerializationContext<'_>, live_parent: NodeId, clone_parent: NodeId) {
    let live = ctx.live;
    for &child in live.children(live_parent) {
        clone_node(ctx, child, clone_parent);
    }
}
