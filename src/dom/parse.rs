//! HTML import through `scraper`

use super::{Doctype, Document, Element};
use scraper::{Html, Node};

impl Document {
    /// Parse an HTML document located at `url`.
    ///
    /// Live state starts out as the markup describes it: form controls report
    /// their attribute defaults and every `<style>` element gets a stylesheet
    /// parsed from its text. Frames, surfaces and adopted stylesheets are left
    /// for the engine to attach.
    ///
    /// Attributes are imported sorted by name so that repeated parses of the
    /// same markup produce identical trees.
    pub fn parse(html: &str, url: &str) -> Document {
        let parsed = Html::parse_document(html);
        let mut doc = Document::new(url);

        let root = doc.root();
        let mut stack = vec![(parsed.tree.root(), root)];
        while let Some((node, parent)) = stack.pop() {
            let target = match node.value() {
                Node::Document | Node::Fragment => parent,
                Node::Doctype(d) => {
                    doc.set_doctype(Doctype {
                        name: d.name().to_string(),
                        public_id: d.public_id().to_string(),
                        system_id: d.system_id().to_string(),
                    });
                    continue;
                }
                Node::Comment(c) => {
                    let id = doc.create_comment((**c).to_string());
                    doc.append_child(parent, id);
                    continue;
                }
                Node::Text(t) => {
                    doc.append_text(parent, (**t).to_string());
                    continue;
                }
                Node::Element(e) => {
                    let mut el = Element::new(e.name());
                    let mut attrs: Vec<(&str, &str)> = e.attrs().collect();
                    attrs.sort_by(|a, b| a.0.cmp(b.0));
                    for (k, v) in attrs {
                        el.set_attr(k, v);
                    }
                    let id = doc.adopt_element(el);
                    doc.append_child(parent, id);
                    id
                }
                _ => continue,
            };

            let children: Vec<_> = node.children().collect();
            for child in children.into_iter().rev() {
                stack.push((child, target));
            }
        }

        doc.init_style_sheets();
        doc
    }

    /// Parse a document whose body is the given fragment.
    pub fn parse_body(fragment: &str, url: &str) -> Document {
        Document::parse(
            &format!("<!DOCTYPE html><html><head></head><body>{}</body></html>", fragment),
            url,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structure_and_doctype() {
        let doc = Document::parse(
            "<!DOCTYPE html><html lang=\"en\"><head><title>T</title></head><body><p id=\"x\">Hi</p><!-- c --></body></html>",
            "https://example.com/",
        );
        assert_eq!(doc.doctype().unwrap().name, "html");
        let html = doc.document_element().unwrap();
        assert_eq!(doc.attr(html, "lang"), Some("en"));
        let p = doc.get_element_by_id("x").unwrap();
        assert_eq!(doc.text_content(p), "Hi");
        assert!(doc.body().is_some());
    }

    #[test]
    fn style_elements_get_sheets() {
        let doc = Document::parse(
            "<html><head><style>a { color: red } b { color: blue }</style></head><body></body></html>",
            "https://example.com/",
        );
        let style = doc.elements_by_tag(doc.root(), "style")[0];
        let sheet = doc.style_sheet(style).expect("sheet");
        assert_eq!(sheet.rules().len(), 2);
        assert!(sheet.href().is_none());
    }

    #[test]
    fn form_defaults_are_read_from_markup() {
        let doc = Document::parse_body(
            "<input type=\"checkbox\" checked><select><option>a</option><option selected>b</option></select>",
            "https://example.com/",
        );
        let input = doc.elements_by_tag(doc.root(), "input")[0];
        let select = doc.elements_by_tag(doc.root(), "select")[0];
        assert!(doc.checked(input));
        assert_eq!(doc.selected_index(select), Some(1));
    }
}
