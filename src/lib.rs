//! RFox DOM Snapshots
//!
//! Captures a live document (form state, frames, canvases, videos, in-memory
//! stylesheets and shadow roots included) as a deterministic, self-contained
//! HTML string plus the binary and text resources it references, ready to be
//! re-rendered by a remote service for visual-regression comparison.
//!
//! # Features
//!
//! - **State recovery**: live values, checkedness and selections become attributes
//! - **Frames**: accessible frames are captured recursively into `srcdoc`
//! - **Media**: canvases become images and videos get a poster of their current frame
//! - **Shadow DOM**: shadow roots are emitted as declarative `<template>` markup
//!
//! # Example
//!
//! ```
//! use rfsnapshot::{dom::Document, serialize_dom, SerializeOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = Document::parse_body("<input id=\"name\">", "https://example.com/");
//! let input = doc.get_element_by_id("name").unwrap();
//! doc.set_value(input, "typed by a user");
//!
//! let snapshot = serialize_dom(&doc, &SerializeOptions::default())?;
//! assert!(snapshot.html.starts_with("<!DOCTYPE html>"));
//! assert!(snapshot.html.contains("value=\"typed by a user\""));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

pub mod error;
pub use error::{Error, Result};

// Live document model (arena tree + live state)
pub mod dom;

// Platform surface (capabilities, rasterizable media)
pub mod platform;

// Capture pipeline
pub mod serialize;

pub use dom::{Document, NodeId};
pub use serialize::resource::Resource;
pub use serialize::{serialize, serialize_dom};

/// Signature of a post-clone transformation hook.
///
/// The hook receives the clone document and its root element. Returning an
/// error records a warning on the snapshot; it never aborts the capture.
pub type TransformFn = dyn Fn(&mut Document, NodeId) -> anyhow::Result<()> + Send + Sync;

/// A transformation applied to the clone before it is emitted.
#[derive(Clone)]
pub enum DomTransformation {
    /// A typed hook over the clone tree
    Hook(Arc<TransformFn>),
    /// Transformation source text, as found in JSON configuration. It is
    /// never evaluated; applying it records a warning.
    Source(String),
}

impl DomTransformation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Document, NodeId) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        DomTransformation::Hook(Arc::new(f))
    }
}

impl fmt::Debug for DomTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomTransformation::Hook(_) => f.write_str("DomTransformation::Hook(..)"),
            DomTransformation::Source(src) => f.debug_tuple("DomTransformation::Source").field(src).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for DomTransformation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(DomTransformation::Source)
    }
}

/// Options for a capture
///
/// Both `snake_case` and `camelCase` keys are accepted when deserializing, so
/// configuration written for either convention can be passed through as-is.
///
/// # Examples
///
/// ```
/// let opts = rfsnapshot::SerializeOptions::from_json(r#"{"enableJavaScript": true}"#).unwrap();
/// assert!(opts.enable_javascript);
/// assert!(!opts.disable_shadow_dom);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Whether JavaScript will run when the snapshot is rendered. When it
    /// will not, canvases and in-memory stylesheets are captured statically.
    #[serde(alias = "enableJavaScript")]
    pub enable_javascript: bool,
    /// Transformation applied to the clone after state recovery
    #[serde(alias = "domTransformation")]
    pub dom_transformation: Option<DomTransformation>,
    /// Return the snapshot pre-serialized as JSON (see [`serialize()`])
    #[serde(alias = "stringifyResponse")]
    pub stringify_response: bool,
    /// Skip shadow roots entirely
    #[serde(alias = "disableShadowDOM")]
    pub disable_shadow_dom: bool,
    /// Move nodes found after `<body>` into it instead of reporting a hint
    #[serde(alias = "reshuffleInvalidTags")]
    pub reshuffle_invalid_tags: bool,
}

impl SerializeOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))
    }

    pub fn with_transformation<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Document, NodeId) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.dom_transformation = Some(DomTransformation::new(f));
        self
    }
}

/// The result of a capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Full markup, starting with the document type declaration
    pub html: String,
    /// Non-fatal capture limitations, in the order they were found
    pub warnings: Vec<String>,
    /// Extracted resources referenced by URL from `html`
    pub resources: Vec<Resource>,
    /// Structural observations about the source document
    pub hints: Vec<String>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A snapshot, optionally already encoded as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Serialized {
    Snapshot(Snapshot),
    Json(String),
}

impl Serialized {
    /// Decode into a [`Snapshot`] regardless of representation.
    pub fn into_snapshot(self) -> Result<Snapshot> {
        match self {
            Serialized::Snapshot(s) => Ok(s),
            Serialized::Json(json) => Ok(serde_json::from_str(&json)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SerializeOptions::default();
        assert!(!opts.enable_javascript);
        assert!(!opts.stringify_response);
        assert!(!opts.disable_shadow_dom);
        assert!(!opts.reshuffle_invalid_tags);
        assert!(opts.dom_transformation.is_none());
    }

    #[test]
    fn test_options_accept_both_conventions() {
        let camel = SerializeOptions::from_json(
            r#"{"enableJavaScript": true, "disableShadowDOM": true, "stringifyResponse": true, "reshuffleInvalidTags": true}"#,
        )
        .unwrap();
        let snake = SerializeOptions::from_json(
            r#"{"enable_javascript": true, "disable_shadow_dom": true, "stringify_response": true, "reshuffle_invalid_tags": true}"#,
        )
        .unwrap();
        for opts in [camel, snake] {
            assert!(opts.enable_javascript);
            assert!(opts.disable_shadow_dom);
            assert!(opts.stringify_response);
            assert!(opts.reshuffle_invalid_tags);
        }
    }

    #[test]
    fn test_transformation_source_is_kept_as_text() {
        let opts = SerializeOptions::from_json(r#"{"dom_transformation": "(dom) => dom"}"#).unwrap();
        match opts.dom_transformation {
            Some(DomTransformation::Source(src)) => assert_eq!(src, "(dom) => dom"),
            other => panic!("unexpected transformation: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_options_are_config_errors() {
        let err = SerializeOptions::from_json(r#"{"enableJavaScript": "yes"}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
