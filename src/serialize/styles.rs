//! Stylesheet capture: diverged CSSOM, `blob:` sheets and adopted sheets

use std::sync::Arc;

use super::clone::ELEMENT_ID_ATTR;
use super::context::SerializationContext;
use super::resource::Resource;
use crate::dom::{Document, NodeData, NodeId, StyleSheet};

pub const CSSOM_MARKER: &str = "data-rfox-cssom-serialized";
pub const BLOB_MARKER: &str = "data-rfox-blob-stylesheets-serialized";
pub const ADOPTED_MARKER: &str = "data-rfox-adopted-stylesheets-serialized";

/// Placeholder for `href` on injected links, renamed back when emitting.
pub const HREF_PLACEHOLDER: &str = "data-rfox-serialized-attribute-href";

const ADOPTED_UNSUPPORTED: &str = "Skipping `adoptedStyleSheets` as it is not supported.";

/// Capture stylesheets owned by `scope` (a document or shadow root) into the
/// clone subtree rooted at `clone_scope`.
pub(crate) fn serialize_cssom(ctx: &mut SerializationContext<'_>, scope: NodeId, clone_scope: NodeId) {
    let live = ctx.live;
    for (owner, sheet) in live.style_sheets(scope) {
        if is_inline_sheet(live, owner, &sheet) {
            replace_diverged_style(ctx, owner, &sheet);
        } else if sheet.href().is_some_and(|h| h.starts_with("blob:")) {
            let uid = ctx.uids.next_uid();
            match Resource::from_text(&uid, "text/css", &sheet.css_text(), &ctx.document_url) {
                Ok(resource) => {
                    inject_link(ctx, clone_scope, BLOB_MARKER, &resource.url);
                    ctx.resources.push(resource);
                }
                Err(e) => ctx.warn(format!("Could not serialize blob stylesheet: {}", e)),
            }
        }
    }

    if !live.capabilities.adopted_style_sheets {
        ctx.warn(ADOPTED_UNSUPPORTED);
        return;
    }
    for sheet in live.adopted_style_sheets(scope) {
        let key = Arc::as_ptr(sheet) as usize;
        let url = match ctx.cache.get(&key) {
            Some(url) => url.clone(),
            None => {
                let uid = ctx.uids.next_uid();
                match Resource::from_text(&uid, "text/css", &sheet.css_text(), &ctx.document_url) {
                    Ok(resource) => {
                        let url = resource.url.clone();
                        ctx.cache.insert(key, url.clone());
                        ctx.resources.push(resource);
                        url
                    }
                    Err(e) => {
                        ctx.warn(format!("Could not serialize adopted stylesheet: {}", e));
                        continue;
                    }
                }
            }
        };
        inject_link(ctx, clone_scope, ADOPTED_MARKER, &url);
    }
}

fn is_inline_sheet(live: &Document, owner: NodeId, sheet: &StyleSheet) -> bool {
    sheet.href().is_none() && live.tag_name(owner) == Some("style")
}

/// Swap the clone of a `<style>` element for one carrying the live rules,
/// when the live rule list no longer matches the element's text.
fn replace_diverged_style(ctx: &mut SerializationContext<'_>, owner: NodeId, sheet: &StyleSheet) {
    let Some(target) = ctx.clone_of(owner) else {
        return;
    };
    let written = StyleSheet::parse(&ctx.clone.text_content(target));
    if sheet.rules_match(&written) {
        return;
    }

    let style = ctx.clone.create_element("style");
    ctx.clone.set_attr(style, "type", "text/css");
    if let Some(id) = ctx.mark_of(owner).map(str::to_string) {
        ctx.clone.set_attr(style, ELEMENT_ID_ATTR, id);
    }
    ctx.clone.set_attr(style, CSSOM_MARKER, "true");
    ctx.clone.set_text_content(style, &sheet.css_text());

    if let Some(parent) = ctx.clone.parent(target) {
        let next = ctx.clone.next_sibling(target);
        ctx.clone.insert_before(parent, style, next);
    }
    ctx.clone.remove(target);
    ctx.pair(owner, style);
}

/// Prepend `<link rel="stylesheet">` to the body (document scope) or to the
/// shadow root itself.
fn inject_link(ctx: &mut SerializationContext<'_>, clone_scope: NodeId, marker: &str, url: &str) {
    let Some(target) = link_target(&ctx.clone, clone_scope) else {
        return;
    };
    let link = ctx.clone.create_element("link");
    ctx.clone.set_attr(link, "rel", "stylesheet");
    ctx.clone.set_attr(link, marker, "true");
    ctx.clone.set_attr(link, HREF_PLACEHOLDER, url);
    ctx.clone.prepend(target, link);
}

fn link_target(clone: &Document, clone_scope: NodeId) -> Option<NodeId> {
    match clone.node(clone_scope).data() {
        NodeData::Document => clone.body().or_else(|| clone.document_element()),
        _ => Some(clone_scope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Capabilities;
    use crate::serialize::clone::clone_document;
    use crate::serialize::uid::UidGenerator;
    use crate::SerializeOptions;

    fn page() -> Document {
        let mut doc = Document::new("https://example.com/");
        let root = doc.root();
        let html = doc.append_element(root, "html", &[]);
        let head = doc.append_element(html, "head", &[]);
        let style = doc.append_element(head, "style", &[]);
        doc.append_text(style, "body { color: red; }");
        doc.append_element(html, "body", &[]);
        doc.init_style_sheets();
        doc
    }

    fn run(doc: &Document) -> (Document, Vec<Resource>, Vec<String>) {
        let opts = SerializeOptions::default();
        let mut uids = UidGenerator::new(doc.url());
        let mut ctx = SerializationContext::new(doc, &opts, &mut uids);
        clone_document(&mut ctx).unwrap();
        let clone_root = ctx.clone.root();
        serialize_cssom(&mut ctx, doc.root(), clone_root);
        (ctx.clone, ctx.resources, ctx.warnings.into_vec())
    }

    #[test]
    fn unchanged_style_is_left_alone() {
        let doc = page();
        let (clone, resources, _) = run(&doc);
        let styles = clone.elements_by_tag(clone.root(), "style");
        assert_eq!(styles.len(), 1);
        assert_eq!(clone.attr(styles[0], CSSOM_MARKER), None);
        assert!(resources.is_empty());
    }

    #[test]
    fn diverged_style_is_replaced_in_place() {
        let mut doc = page();
        let style = doc.elements_by_tag(doc.root(), "style")[0];
        let mut sheet = (**doc.style_sheet(style).unwrap()).clone();
        sheet.insert_rule("p { margin: 0; }", 1);
        doc.set_style_sheet(style, Arc::new(sheet));

        let (clone, _, _) = run(&doc);
        let styles = clone.elements_by_tag(clone.root(), "style");
        assert_eq!(styles.len(), 1);
        let replaced = styles[0];
        assert_eq!(clone.attr(replaced, CSSOM_MARKER), Some("true"));
        assert_eq!(clone.attr(replaced, "type"), Some("text/css"));
        assert!(clone.attr(replaced, ELEMENT_ID_ATTR).is_some());
        assert_eq!(
            clone.text_content(replaced),
            "body { color: red; }\np { margin: 0; }"
        );
        assert_eq!(clone.tag_name(clone.parent(replaced).unwrap()), Some("head"));
    }

    #[test]
    fn shared_adopted_sheet_is_extracted_once() {
        let mut doc = page();
        let shared = Arc::new(StyleSheet::new([".a { color: blue; }"]));
        let root = doc.root();
        doc.set_adopted_style_sheets(root, vec![Arc::clone(&shared), Arc::clone(&shared)]);

        let (clone, resources, _) = run(&doc);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].mimetype, "text/css");
        let body = clone.body().unwrap();
        let links: Vec<_> = clone
            .elements_by_tag(body, "link")
            .into_iter()
            .filter(|l| clone.attr(*l, ADOPTED_MARKER).is_some())
            .collect();
        assert_eq!(links.len(), 2);
        for link in links {
            assert_eq!(clone.attr(link, HREF_PLACEHOLDER), Some(resources[0].url.as_str()));
        }
    }

    #[test]
    fn blob_sheets_become_resources() {
        let mut doc = page();
        let head = doc.head().unwrap();
        let link = doc.append_element(head, "link", &[("rel", "stylesheet"), ("href", "blob:https://example.com/1")]);
        doc.set_style_sheet(link, Arc::new(StyleSheet::with_href("blob:https://example.com/1", ["a{}"])));

        let (clone, resources, _) = run(&doc);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].content, "a{}");
        let body = clone.body().unwrap();
        let first = clone.first_child(body).unwrap();
        assert_eq!(clone.attr(first, BLOB_MARKER), Some("true"));
    }

    #[test]
    fn missing_adopted_support_warns() {
        let mut doc = page();
        doc.capabilities = Capabilities {
            adopted_style_sheets: false,
            ..Capabilities::default()
        };
        let (_, _, warnings) = run(&doc);
        assert_eq!(warnings, vec![ADOPTED_UNSUPPORTED.to_string()]);
    }
}
