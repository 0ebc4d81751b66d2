//! Markup emission for the clone tree

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{Doctype, Document, NodeData, NodeId};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_TAGS: &[&str] = &["style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript"];

/// `<!DOCTYPE ...>` for the given declaration, or the HTML5 default.
pub fn doctype_markup(doctype: Option<&Doctype>) -> String {
    let Some(d) = doctype else {
        return "<!DOCTYPE html>".to_string();
    };
    let name = if d.name.is_empty() { "html" } else { d.name.as_str() };
    let mut out = format!("<!DOCTYPE {}", name);
    if !d.public_id.is_empty() {
        out.push_str(&format!(" PUBLIC \"{}\"", d.public_id));
    }
    if !d.system_id.is_empty() {
        if d.public_id.is_empty() {
            out.push_str(" SYSTEM");
        }
        out.push_str(&format!(" \"{}\"", d.system_id));
    }
    out.push('>');
    out
}

/// Emit the full document: doctype, then the root element with shadow trees
/// as declarative templates when the runtime supports them.
///
/// Declarative output is produced in two steps: the inner markup including
/// shadow trees, then the root's own tags with its children cleared, the
/// inner markup being spliced back before the last closing tag.
pub(crate) fn emit_document(clone: &mut Document, root: NodeId, doctype: Option<&Doctype>) -> String {
    let mut html = doctype_markup(doctype);
    if clone.capabilities.declarative_shadow_dom {
        let mut inner = String::new();
        for &child in clone.children(root) {
            write_node(clone, child, true, false, &mut inner);
        }
        clone.clear_children(root);
        let mut shell = String::new();
        write_node(clone, root, false, false, &mut shell);
        html.push_str(&splice(&shell, &inner, clone.tag_name(root).unwrap_or("html")));
    } else {
        write_node(clone, root, false, false, &mut html);
    }
    restore_placeholder_attributes(&html)
}

fn splice(shell: &str, inner: &str, name: &str) -> String {
    let close = format!("</{}>", name);
    match shell.rfind(&close) {
        Some(pos) => {
            let mut out = String::with_capacity(shell.len() + inner.len());
            out.push_str(&shell[..pos]);
            out.push_str(inner);
            out.push_str(&shell[pos..]);
            out
        }
        None => format!("{}{}", shell, inner),
    }
}

/// Markup of a single node and its subtree.
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, false, false, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, shadow: bool, raw_text: bool, out: &mut String) {
    match doc.node(node).data() {
        NodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(el.name());
            for (name, value) in el.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&el.name()) {
                return;
            }
            if shadow {
                if let Some(root) = el.shadow_root() {
                    let mode = doc.shadow_root_mode(root).unwrap_or_default();
                    out.push_str("<template shadowroot=\"");
                    out.push_str(mode.as_str());
                    out.push_str("\">");
                    for &child in doc.children(root) {
                        write_node(doc, child, shadow, false, out);
                    }
                    out.push_str("</template>");
                }
            }
            let raw = RAW_TEXT_TAGS.contains(&el.name());
            for &child in doc.children(node) {
                write_node(doc, child, shadow, raw, out);
            }
            out.push_str("</");
            out.push_str(el.name());
            out.push('>');
        }
        NodeData::Document | NodeData::ShadowRoot { .. } => {
            for &child in doc.children(node) {
                write_node(doc, child, shadow, false, out);
            }
        }
        NodeData::Doctype(d) => out.push_str(&doctype_markup(Some(d))),
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i) data-rfox-serialized-attribute-(\w+?)=").expect("placeholder pattern is valid")
    })
}

/// Rename ` data-rfox-serialized-attribute-<name>=` back to ` <name>=`.
pub fn restore_placeholder_attributes(html: &str) -> String {
    placeholder_pattern().replace_all(html, " ${1}=").into_owned()
}
