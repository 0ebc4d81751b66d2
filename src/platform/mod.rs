//! Platform surface: runtime capabilities and rasterizable media
//!
//! The embedding engine describes what its runtime supports through
//! [`Capabilities`] and exposes canvas/video pixels through the [`Surface`]
//! trait. Serializers only ever read from these types.

pub mod media;

pub use media::{Bitmap, RasterError, StaticSurface, Surface, TaintedSurface, BLANK_DATA_URL};

/// Optional runtime features the serializer can take advantage of.
///
/// Missing capabilities degrade the snapshot instead of failing it: adopted
/// stylesheets are skipped with a warning and shadow roots are emitted without
/// their declarative markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether documents and shadow roots expose `adoptedStyleSheets`
    pub adopted_style_sheets: bool,
    /// Whether shadow roots can be serialized as declarative `<template>` markup
    pub declarative_shadow_dom: bool,
}

impl Capabilities {
    /// Capabilities of a runtime that supports neither adopted stylesheets
    /// nor declarative shadow markup.
    pub fn legacy() -> Self {
        Self {
            adopted_style_sheets: false,
            declarative_shadow_dom: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            adopted_style_sheets: true,
            declarative_shadow_dom: true,
        }
    }
}
