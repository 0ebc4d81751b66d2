//! Snapshot capture pipeline
//!
//! A capture clones the live document, recovers live state onto the clone
//! pass by pass, then emits the clone as markup:
//!
//! 1. clone the tree, marking stateful elements and shadow hosts
//! 2. recover form, frame, media and stylesheet state (recursing into shadow roots)
//! 3. inject `<base href>` and run the transformation hook
//! 4. inject the shadow DOM helper script and fix up nodes outside `<body>`
//! 5. emit doctype and markup

pub mod clone;
mod context;
mod frames;
pub mod html;
mod inputs;
pub mod media;
pub mod resource;
pub mod styles;
pub mod uid;

use log::{debug, error};

use crate::dom::{Document, NodeId};
use crate::{DomTransformation, Result, SerializeOptions, Serialized, Snapshot};
use context::{has_host, Embedder, SerializationContext};
use uid::UidGenerator;

/// Id of the injected shadow DOM helper script.
pub const SHADOW_HELPER_ID: &str = "__rfox_shadowdom_helper";

/// Marker set on elements the capture adds to the document.
pub const INJECTED_MARKER: &str = "data-rfox-injected";

const SHADOW_HOST_MISSING_ROOT: &str = "data-rfox-shadow-host does not have shadowRoot";
const ELEMENTS_OUTSIDE_BODY: &str = "DOM elements found outside </body>";

/// Attaches declarative `<template shadowroot>` contents on runtimes that do
/// not do it while parsing, then recurses into hosts found in new roots.
const SHADOW_HELPER_SCRIPT: &str = "(function(){function a(r){r.querySelectorAll('template[shadowroot]').forEach(function(t){var p=t.parentNode;if(!p||p.shadowRoot)return;var m=t.getAttribute('shadowroot');var s=p.attachShadow({mode:m});s.appendChild(t.content);t.remove();a(s)});r.querySelectorAll('[data-rfox-shadow-host]').forEach(function(h){if(h.shadowRoot)a(h.shadowRoot)})}a(document)})();";

/// Capture `document` as a [`Snapshot`].
///
/// Fails only when the document has no root element; per-element problems
/// are reported in [`Snapshot::warnings`].
pub fn serialize_dom(document: &Document, options: &SerializeOptions) -> Result<Snapshot> {
    let mut uids = UidGenerator::new(document.url());
    capture(document, options, &mut uids, None)
}

/// Capture `document`, encoding the snapshot as JSON when
/// [`SerializeOptions::stringify_response`] is set.
pub fn serialize(document: &Document, options: &SerializeOptions) -> Result<Serialized> {
    let snapshot = serialize_dom(document, options)?;
    if options.stringify_response {
        Ok(Serialized::Json(snapshot.to_json()?))
    } else {
        Ok(Serialized::Snapshot(snapshot))
    }
}

/// One capture, sharing `uids` with any nested frame captures. Frame
/// captures pass the `embedder` they inherit URLs from.
pub(crate) fn capture(
    live: &Document,
    options: &SerializeOptions,
    uids: &mut UidGenerator,
    embedder: Option<&Embedder>,
) -> Result<Snapshot> {
    debug!("capturing {}", live.url());
    let mut ctx = SerializationContext::new(live, options, uids);
    if let Some(embedder) = embedder {
        ctx.inherit(embedder);
    }

    let tree = clone::clone_document(&mut ctx)?;
    let root = tree.root;
    let clone_root = ctx.clone.root();
    serialize_elements(&mut ctx, live.root(), clone_root);

    inject_base_uri(&mut ctx.clone, &ctx.base_uri);
    apply_transformation(&mut ctx, root);

    if !options.disable_shadow_dom {
        inject_shadow_helper(&mut ctx.clone);
    }
    if let Some(body) = ctx.clone.body() {
        if options.reshuffle_invalid_tags {
            while let Some(stray) = ctx.clone.next_sibling(body) {
                ctx.clone.append_child(body, stray);
            }
        } else if ctx.clone.next_sibling(body).is_some() {
            ctx.hint(ELEMENTS_OUTSIDE_BODY);
        }
    }

    let html = html::emit_document(&mut ctx.clone, root, live.doctype());
    debug!(
        "captured {} ({} bytes, {} resources, {} warnings)",
        live.url(),
        html.len(),
        ctx.resources.len(),
        ctx.warnings.len()
    );
    Ok(Snapshot {
        html,
        warnings: ctx.warnings.into_vec(),
        resources: ctx.resources,
        hints: ctx.hints.into_vec(),
    })
}

/// Run every state-recovery pass over one tree, then recurse into the shadow
/// roots hosted in it.
fn serialize_elements(ctx: &mut SerializationContext<'_>, scope: NodeId, clone_scope: NodeId) {
    inputs::serialize_inputs(ctx, scope);
    frames::serialize_frames(ctx, scope);
    media::serialize_videos(ctx, scope);
    if !ctx.options.enable_javascript {
        styles::serialize_cssom(ctx, scope, clone_scope);
        media::serialize_canvas(ctx, scope);
    }

    let live = ctx.live;
    for host in live.descendants(scope) {
        if !ctx.is_shadow_host(host) {
            continue;
        }
        let Some(live_root) = live.shadow_root(host) else {
            continue;
        };
        let clone_root = ctx
            .clone_of(host)
            .and_then(|target| ctx.clone.shadow_root(target));
        match clone_root {
            Some(clone_root) => serialize_elements(ctx, live_root, clone_root),
            None => ctx.warn(SHADOW_HOST_MISSING_ROOT),
        }
    }
}

/// Prepend `<base href>` to the head of `doc` unless the URL has no host or
/// the head already starts with the same base.
pub(crate) fn inject_base_uri(doc: &mut Document, base: &str) {
    if !has_host(base) {
        return;
    }
    let Some(head) = doc.head() else {
        return;
    };
    let first = doc
        .children(head)
        .iter()
        .copied()
        .find(|id| doc.element(*id).is_some());
    if let Some(first) = first {
        if doc.tag_name(first) == Some("base") && doc.attr(first, "href") == Some(base) {
            return;
        }
    }
    let element = doc.create_element("base");
    doc.set_attr(element, "href", base);
    doc.prepend(head, element);
}

fn apply_transformation(ctx: &mut SerializationContext<'_>, root: NodeId) {
    let options = ctx.options;
    let Some(transformation) = options.dom_transformation.as_ref() else {
        return;
    };
    let result = match transformation {
        DomTransformation::Hook(hook) => hook(&mut ctx.clone, root),
        DomTransformation::Source(_) => Err(anyhow::anyhow!(
            "transformations given as source text are not evaluated"
        )),
    };
    if let Err(e) = result {
        error!("dom transformation failed: {:#}", e);
        ctx.warn(format!("Could not transform the dom: {}", e));
    }
}

fn inject_shadow_helper(doc: &mut Document) {
    let Some(head) = doc.head() else {
        return;
    };
    let script = doc.create_element("script");
    doc.set_attr(script, "id", SHADOW_HELPER_ID);
    doc.set_attr(script, INJECTED_MARKER, "true");
    doc.set_text_content(script, SHADOW_HELPER_SCRIPT);
    doc.prepend(head, script);
}
