//! Request and response model shared by the manager and the network layer.
//!
//! ### URL Resolution
//! - Trim whitespace; reject empty input
//! - Resolve relative paths against the site origin
//! - Only `http`/`https` are interceptable
//! - Lowercase host, remove fragments, keep the query string as-is

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// What the requesting page intends to do with the response.
///
/// Only `Document` is a navigation; every other destination is a subresource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Style,
    Script,
    Font,
    Image,
    #[default]
    Other,
}

impl Destination {
    pub fn is_navigation(self) -> bool {
        matches!(self, Destination::Document)
    }
}

/// An outgoing request dispatched by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub destination: Destination,
}

impl Request {
    /// A plain `GET` for a subresource.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, headers: Vec::new(), destination: Destination::Other }
    }

    /// A full-page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { destination: Destination::Document, ..Self::get(url) }
    }

    pub fn is_navigation(&self) -> bool {
        self.destination.is_navigation()
    }
}

/// A response as returned by the network or replayed from a cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Resolve a request identifier against the site origin.
///
/// Absolute URLs (cross-origin included) are kept; paths such as `/styles.css`
/// are joined onto `origin`.
pub fn resolve_url(origin: &Url, input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let mut parsed = if trimmed.contains("://") {
        Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?
    } else {
        origin
            .join(trimmed)
            .map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://portfolio.example").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve_url(&origin(), "/styles.css").unwrap();
        assert_eq!(url.as_str(), "https://portfolio.example/styles.css");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve_url(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "https://portfolio.example/");
    }

    #[test]
    fn test_resolve_cross_origin_keeps_query() {
        let url = resolve_url(&origin(), "https://fonts.googleapis.com/css2?family=Inter&display=swap").unwrap();
        assert_eq!(url.host_str(), Some("fonts.googleapis.com"));
        assert_eq!(url.query(), Some("family=Inter&display=swap"));
    }

    #[test]
    fn test_resolve_lowercase_host_and_strip_fragment() {
        let url = resolve_url(&origin(), "https://CDNJS.Cloudflare.com/all.min.css#top").unwrap();
        assert_eq!(url.as_str(), "https://cdnjs.cloudflare.com/all.min.css");
    }

    #[test]
    fn test_resolve_empty() {
        let result = resolve_url(&origin(), "   ");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve_url(&origin(), "ftp://files.example/a.txt");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_destination_navigation() {
        assert!(Destination::Document.is_navigation());
        assert!(!Destination::Style.is_navigation());
        assert!(Request::navigate(origin()).is_navigation());
        assert!(!Request::get(origin()).is_navigation());
    }

    #[test]
    fn test_destination_serialization() {
        let json = serde_json::to_string(&Destination::Document).unwrap();
        assert_eq!(json, "\"document\"");
        let parsed: Destination = serde_json::from_str("\"font\"").unwrap();
        assert_eq!(parsed, Destination::Font);
    }

    #[test]
    fn test_response_header_lookup() {
        let response = Response {
            url: "https://portfolio.example/".into(),
            status: 200,
            headers: vec![("Content-Type".into(), "text/html".into())],
            body: Vec::new(),
        };
        assert!(response.ok());
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("etag"), None);
    }
}
