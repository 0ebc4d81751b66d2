//! Canvas and video capture

use super::context::SerializationContext;
use super::resource::Resource;
use crate::dom::NodeId;
use crate::platform::BLANK_DATA_URL;

/// Marker set on images that replace a canvas.
pub const CANVAS_MARKER: &str = "data-rfox-canvas-serialized";

/// Give each video in `scope` a poster of its current frame.
///
/// Sources are always stripped from the clone so the renderer shows a still
/// image. Videos that already declare a poster keep it.
pub(crate) fn serialize_videos(ctx: &mut SerializationContext<'_>, scope: NodeId) {
    let live = ctx.live;
    for video in live.elements_by_tag(scope, "video") {
        let Some(target) = ctx.clone_of(video) else {
            continue;
        };
        ctx.clone.remove_attr(target, "src");
        for source in ctx.clone.elements_by_tag(target, "source") {
            ctx.clone.remove(source);
        }

        if live.attr(video, "poster").is_some_and(|p| !p.is_empty()) {
            continue;
        }
        let data_url = match live.surface(video).map(|s| s.to_data_url()) {
            None => continue,
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                let msg = format!("{} : {}", ctx.element_label(video), e);
                ctx.warn(msg);
                continue;
            }
        };
        if data_url == BLANK_DATA_URL {
            continue;
        }

        let uid = ctx.mark_of(video).unwrap_or_default().to_string();
        match Resource::from_data_url(&uid, &data_url, &ctx.document_url) {
            Ok(resource) => {
                ctx.clone.set_attr(target, "poster", resource.url.as_str());
                ctx.resources.push(resource);
            }
            Err(e) => {
                let msg = format!("{} : {}", ctx.element_label(video), e);
                ctx.warn(msg);
            }
        }
    }
}

/// Replace each drawable canvas in `scope` with an `<img>` of its pixels.
///
/// Empty canvases stay as they are. A canvas that cannot be read back is kept
/// and reported as a warning.
pub(crate) fn serialize_canvas(ctx: &mut SerializationContext<'_>, scope: NodeId) {
    let live = ctx.live;
    for canvas in live.elements_by_tag(scope, "canvas") {
        let data_url = match live.surface(canvas).map(|s| s.to_data_url()) {
            None => continue,
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                let msg = format!("{} : {}", ctx.element_label(canvas), e);
                ctx.warn(msg);
                continue;
            }
        };
        if data_url == BLANK_DATA_URL {
            continue;
        }
        let Some(target) = ctx.clone_of(canvas) else {
            continue;
        };
        let Some(parent) = ctx.clone.parent(target) else {
            continue;
        };

        let attrs: Vec<(String, String)> = ctx
            .clone
            .element(target)
            .map(|el| el.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect())
            .unwrap_or_default();

        let img = ctx.clone.create_element("img");
        ctx.clone.set_attr(img, "src", data_url);
        for (name, value) in attrs {
            ctx.clone.set_attr(img, &name, value);
        }
        ctx.clone.set_attr(img, CANVAS_MARKER, "true");
        let style = ctx.clone.attr(img, "style").unwrap_or_default();
        if !has_declaration(style, "max-width") {
            let style = append_declaration(style, "max-width: 100%");
            ctx.clone.set_attr(img, "style", style);
        }

        ctx.clone.insert_before(parent, img, Some(target));
        ctx.clone.remove(target);
        ctx.forget(canvas);
    }
}

fn has_declaration(style: &str, property: &str) -> bool {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .any(|(name, _)| name.trim().eq_ignore_ascii_case(property))
}

fn append_declaration(style: &str, declaration: &str) -> String {
    let style = style.trim().trim_end_matches(';').trim_end();
    if style.is_empty() {
        format!("{};", declaration)
    } else {
        format!("{}; {};", style, declaration)
    }
}
