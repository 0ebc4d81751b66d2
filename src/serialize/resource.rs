//! Extracted resources and the URLs they are served under

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Path prefix under which extracted resources are served.
pub const SERIALIZED_PATH: &str = "/__serialized__/";

/// Host that replaces `localhost` in resource URLs, since the rendering
/// service cannot reach the capturing machine.
pub const RENDER_HOST: &str = "render.rfox.local";

/// A binary or text payload pulled out of the document.
///
/// `content` is base64 for binary payloads (canvas and video frames) and raw
/// text for stylesheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub url: String,
    pub content: String,
    pub mimetype: String,
}

impl Resource {
    /// Build a resource from a `data:<mimetype>;base64,<payload>` URL.
    pub fn from_data_url(uid: &str, data_url: &str, document_url: &str) -> Result<Self> {
        let (mimetype, content) = split_data_url(data_url)?;
        Ok(Self {
            url: serialized_url(uid, &mimetype, document_url)?,
            content,
            mimetype,
        })
    }

    /// Build a resource from text content such as a stylesheet.
    pub fn from_text(uid: &str, mimetype: &str, text: &str, document_url: &str) -> Result<Self> {
        Ok(Self {
            url: serialized_url(uid, mimetype, document_url)?,
            content: text.to_string(),
            mimetype: mimetype.to_string(),
        })
    }
}

fn split_data_url(data_url: &str) -> Result<(String, String)> {
    let invalid = || Error::InvalidDataUrl(truncate(data_url));

    let rest = data_url
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &data_url[5..])
        .ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mimetype = header.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if !mimetype.contains('/') {
        return Err(invalid());
    }
    Ok((mimetype, payload.to_string()))
}

fn truncate(s: &str) -> String {
    s.chars().take(32).collect()
}

/// `<document origin>/__serialized__/<uid>.<subtype>`, with localhost rewritten.
fn serialized_url(uid: &str, mimetype: &str, document_url: &str) -> Result<String> {
    let ext = mimetype
        .split_once('/')
        .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype))
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| Error::InvalidDataUrl(mimetype.to_string()))?;
    let path = format!("{}{}.{}", SERIALIZED_PATH, uid, ext);
    let url = Url::parse(document_url)?.join(&path)?;
    Ok(rewrite_localhost_url(url.as_str()))
}

/// Point `http(s)://localhost[:port]` URLs at the render host, dropping the port.
/// Any other URL is returned unchanged.
pub fn rewrite_localhost_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let is_http = matches!(parsed.scheme(), "http" | "https");
    if is_http
        && parsed.host_str() == Some("localhost")
        && parsed.set_port(None).is_ok()
        && parsed.set_host(Some(RENDER_HOST)).is_ok()
    {
        return parsed.to_string();
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_becomes_resource() {
        let r = Resource::from_data_url("_abc", "data:image/png;base64,AAAA", "https://example.com/a/b.html")
            .unwrap();
        assert_eq!(r.url, "https://example.com/__serialized__/_abc.png");
        assert_eq!(r.mimetype, "image/png");
        assert_eq!(r.content, "AAAA");
    }

    #[test]
    fn localhost_is_rewritten() {
        let r = Resource::from_data_url("_x", "data:image/png;base64,AA", "http://localhost:3000/page").unwrap();
        assert_eq!(r.url, "http://render.rfox.local/__serialized__/_x.png");
    }

    #[test]
    fn other_hosts_keep_their_port() {
        assert_eq!(
            rewrite_localhost_url("http://example.com:8080/x"),
            "http://example.com:8080/x"
        );
        assert_eq!(rewrite_localhost_url("not a url"), "not a url");
    }

    #[test]
    fn text_resources_keep_raw_content() {
        let r = Resource::from_text("_s", "text/css", "a{color:red}", "https://example.com/").unwrap();
        assert_eq!(r.url, "https://example.com/__serialized__/_s.css");
        assert_eq!(r.content, "a{color:red}");
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        for bad in ["image/png;base64,AA", "data:image/png;base64", "data:,", "data:;base64,AA"] {
            let err = Resource::from_data_url("_x", bad, "https://example.com/").unwrap_err();
            assert!(matches!(err, Error::InvalidDataUrl(_)), "{}", bad);
        }
    }

    #[test]
    fn opaque_document_urls_fail() {
        let err = Resource::from_data_url("_x", "data:image/png;base64,AA", "about:blank").unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }
}
