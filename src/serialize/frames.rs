//! Recursive capture of embedded frames

use url::Url;

use super::context::{has_host, SerializationContext};
use super::{capture, inject_base_uri};
use crate::dom::{Document, NodeId};
use crate::{DomTransformation, SerializeOptions};

/// Capture each iframe in `scope`.
///
/// Frames inside `<head>` are dropped. Frames with accessible content are
/// captured recursively and inlined as `srcdoc`, unless they were built by
/// script and scripts will run at render time, or they have not finished
/// loading. Script-built frames that cannot be captured are dropped when
/// scripts will not run, since nothing would rebuild them.
pub(crate) fn serialize_frames(ctx: &mut SerializationContext<'_>, scope: NodeId) {
    let live = ctx.live;
    for frame in live.elements_by_tag(scope, "iframe") {
        let Some(target) = ctx.clone_of(frame) else {
            continue;
        };
        let in_head = ctx
            .clone
            .head()
            .is_some_and(|head| ctx.clone.contains(head, target));
        if in_head {
            drop_frame(ctx, frame, target);
            continue;
        }

        let built_with_js = is_built_with_js(live, frame);
        let state = live.frame(frame);
        let content = state
            .and_then(|s| s.content.as_deref())
            .filter(|doc| doc.document_element().is_some());

        match content {
            Some(content) => {
                let loaded = state.is_some_and(|s| s.loaded);
                if built_with_js && ctx.options.enable_javascript {
                    continue;
                }
                if !built_with_js && !loaded {
                    continue;
                }
                inline_frame(ctx, frame, target, content);
            }
            None if built_with_js && !ctx.options.enable_javascript => drop_frame(ctx, frame, target),
            None => {}
        }
    }
}

fn inline_frame(ctx: &mut SerializationContext<'_>, frame: NodeId, target: NodeId, content: &Document) {
    let embedder = ctx.embedder();
    let own_base = content.base_uri();
    let base = if has_host(&own_base) { own_base } else { embedder.base_uri.clone() };
    let options = SerializeOptions {
        enable_javascript: ctx.options.enable_javascript,
        disable_shadow_dom: ctx.options.disable_shadow_dom,
        dom_transformation: Some(DomTransformation::new(move |doc, _root| {
            inject_base_uri(doc, &base);
            Ok(())
        })),
        ..Default::default()
    };

    match capture(content, &options, &mut *ctx.uids, Some(&embedder)) {
        Ok(snapshot) => {
            ctx.warnings.extend(snapshot.warnings);
            ctx.hints.extend(snapshot.hints);
            ctx.resources.extend(snapshot.resources);
            ctx.clone.set_attr(target, "srcdoc", snapshot.html);
            ctx.clone.remove_attr(target, "src");
        }
        Err(e) => {
            let msg = format!("{} : {}", ctx.element_label(frame), e);
            ctx.warn(msg);
        }
    }
}

fn drop_frame(ctx: &mut SerializationContext<'_>, frame: NodeId, target: NodeId) {
    log::debug!("dropping frame {}", ctx.element_label(frame));
    ctx.clone.remove(target);
    ctx.forget(frame);
}

/// A frame is script-built when it has no `srcdoc` and its `src` is empty or
/// a `javascript:` URL.
fn is_built_with_js(live: &Document, frame: NodeId) -> bool {
    if live.attr(frame, "srcdoc").is_some_and(|s| !s.is_empty()) {
        return false;
    }
    let src = live.attr(frame, "src").unwrap_or_default().trim();
    if src.is_empty() {
        return true;
    }
    Url::parse(src).is_ok_and(|u| u.scheme() == "javascript")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::FrameState;
    use crate::serialize::clone::clone_document;
    use crate::serialize::uid::UidGenerator;

    fn child(url: &str, text: &str) -> Document {
        let mut doc = Document::new(url);
        let root = doc.root();
        let html = doc.append_element(root, "html", &[]);
        doc.append_element(html, "head", &[]);
        let body = doc.append_element(html, "body", &[]);
        doc.append_text(body, text);
        doc
    }

    fn page(frame_attrs: &[(&str, &str)], state: Option<FrameState>) -> (Document, NodeId) {
        let mut doc = Document::new("https://example.com/");
        let root = doc.root();
        let html = doc.append_element(root, "html", &[]);
        doc.append_element(html, "head", &[]);
        let body = doc.append_element(html, "body", &[]);
        let frame = doc.append_element(body, "iframe", frame_attrs);
        if let Some(state) = state {
            doc.set_frame(frame, state);
        }
        (doc, frame)
    }

    fn run(doc: &Document, frame: NodeId, enable_javascript: bool) -> (Document, Option<NodeId>) {
        let opts = SerializeOptions {
            enable_javascript,
            ..Default::default()
        };
        let mut uids = UidGenerator::new(doc.url());
        let mut ctx = SerializationContext::new(doc, &opts, &mut uids);
        clone_document(&mut ctx).unwrap();
        serialize_frames(&mut ctx, doc.root());
        let target = ctx.clone_of(frame);
        (ctx.clone, target)
    }

    #[test]
    fn script_built_detection() {
        let (doc, frame) = page(&[], None);
        assert!(is_built_with_js(&doc, frame));
        let (doc, frame) = page(&[("src", "javascript:void(0)")], None);
        assert!(is_built_with_js(&doc, frame));
        let (doc, frame) = page(&[("src", "about:blank")], None);
        assert!(!is_built_with_js(&doc, frame));
        let (doc, frame) = page(&[("srcdoc", "<p>x</p>")], None);
        assert!(!is_built_with_js(&doc, frame));
    }

    #[test]
    fn loaded_frame_is_inlined() {
        let content = child("https://example.com/inner.html", "inside");
        let (doc, frame) = page(&[("src", "inner.html")], Some(FrameState::loaded(content)));
        let (clone, target) = run(&doc, frame, false);
        let target = target.unwrap();
        let srcdoc = clone.attr(target, "srcdoc").unwrap();
        assert!(srcdoc.starts_with("<!DOCTYPE html>"));
        assert!(srcdoc.contains("inside"));
        assert!(srcdoc.contains("<base href=\"https://example.com/inner.html\">"));
        assert_eq!(clone.attr(target, "src"), None);
    }

    #[test]
    fn loading_frame_is_untouched() {
        let content = child("about:blank", "");
        let (doc, frame) = page(&[("src", "about:blank")], Some(FrameState::loading(content)));
        let (clone, target) = run(&doc, frame, false);
        let target = target.unwrap();
        assert_eq!(clone.attr(target, "src"), Some("about:blank"));
        assert_eq!(clone.attr(target, "srcdoc"), None);
    }

    #[test]
    fn inaccessible_script_built_frame_is_dropped_without_js() {
        let (doc, frame) = page(&[], Some(FrameState::inaccessible()));
        let (clone, target) = run(&doc, frame, false);
        assert!(target.is_none());
        assert!(clone.elements_by_tag(clone.root(), "iframe").is_empty());
    }

    #[test]
    fn script_built_frame_is_left_for_scripts() {
        let content = child("about:blank", "built");
        let (doc, frame) = page(&[], Some(FrameState::loaded(content)));
        let (clone, target) = run(&doc, frame, true);
        assert_eq!(clone.attr(target.unwrap(), "srcdoc"), None);
    }

    #[test]
    fn frames_in_head_are_dropped() {
        let mut doc = Document::new("https://example.com/");
        let root = doc.root();
        let html = doc.append_element(root, "html", &[]);
        let head = doc.append_element(html, "head", &[]);
        doc.append_element(html, "body", &[]);
        let frame = doc.append_element(head, "iframe", &[("src", "https://ads.example.com/")]);
        let (clone, target) = run(&doc, frame, false);
        assert!(target.is_none());
        assert!(clone.elements_by_tag(clone.root(), "iframe").is_empty());
    }
}
