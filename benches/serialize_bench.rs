use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use rfsnapshot::dom::{Document, ShadowRootMode, StyleSheet};
use rfsnapshot::platform::StaticSurface;
use rfsnapshot::{serialize_dom, SerializeOptions};

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

// A form-heavy page with a few shadow hosts, canvases and a shared adopted sheet.
fn build_page(rows: usize) -> Document {
    let mut doc = Document::new("https://example.com/bench");
    let root = doc.root();
    let html = doc.append_element(root, "html", &[("lang", "en")]);
    let head = doc.append_element(html, "head", &[]);
    let style = doc.append_element(head, "style", &[]);
    doc.append_text(style, "table { border: 0; } td { padding: 2px; }");
    let body = doc.append_element(html, "body", &[]);
    let table = doc.append_element(body, "table", &[]);

    for i in 0..rows {
        let tr = doc.append_element(table, "tr", &[]);
        let td = doc.append_element(tr, "td", &[("class", "label")]);
        doc.append_text(td, format!("row {}", i));
        let td = doc.append_element(tr, "td", &[]);
        let input = doc.append_element(td, "input", &[("type", "text")]);
        doc.set_value(input, format!("value {}", i));
        if i % 10 == 0 {
            let canvas = doc.append_element(td, "canvas", &[("width", "10"), ("height", "10")]);
            doc.set_surface(canvas, Arc::new(StaticSurface::new(PIXEL)));
            let host = doc.append_element(td, "x-badge", &[]);
            let shadow = doc.attach_shadow(host, ShadowRootMode::Open).unwrap();
            let span = doc.append_element(shadow, "span", &[]);
            doc.append_text(span, "new");
        }
    }

    doc.init_style_sheets();
    let shared = Arc::new(StyleSheet::new([":root { color: #111; }"]));
    doc.set_adopted_style_sheets(root, vec![shared]);
    doc
}

fn bench_serialize(c: &mut Criterion) {
    let small = build_page(20);
    let large = build_page(500);
    let opts = SerializeOptions::default();

    c.bench_function("serialize_dom_small", |b| {
        b.iter(|| serialize_dom(&small, &opts).unwrap())
    });
    c.bench_function("serialize_dom_large", |b| {
        b.iter(|| serialize_dom(&large, &opts).unwrap())
    });
}

#[cfg(feature = "parser")]
fn bench_parse_and_serialize(c: &mut Criterion) {
    let mut markup = String::from("<!DOCTYPE html><html><head><title>Bench</title></head><body>");
    for i in 0..200 {
        markup.push_str(&format!(
            "<div class=\"card\"><h2>Item {i}</h2><input name=\"q{i}\" value=\"{i}\"><select><option>a</option><option selected>b</option></select></div>"
        ));
    }
    markup.push_str("</body></html>");
    let opts = SerializeOptions::default();

    c.bench_function("parse_and_serialize", |b| {
        b.iter(|| {
            let doc = Document::parse(&markup, "https://example.com/");
            serialize_dom(&doc, &opts).unwrap()
        })
    });
}

#[cfg(not(feature = "parser"))]
fn bench_parse_and_serialize(_c: &mut Criterion) {}

criterion_group!(benches, bench_serialize, bench_parse_and_serialize);
criterion_main!(benches);
