//! sw_fetch tool implementation.
//!
//! Dispatches one request through the manager exactly as an intercepted page
//! request would be answered.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offcache_core::{CacheDb, Destination, Error, Network, OfflineCacheManager, Request, ServeSource, resolve_url};

use super::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL or origin-relative path to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination; "document" marks a full-page navigation.
    #[serde(default)]
    pub destination: Destination,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// Resolved request URL.
    pub url: String,
    /// Where the response came from.
    pub source: ServeSource,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body as UTF-8 text, if it decodes.
    pub body_text: Option<String>,
    pub body_bytes: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<N: Network + 'static>(
    manager: &OfflineCacheManager<CacheDb, N>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve_url(&manager.config().origin, &params.url)?;
    let request = Request {
        method: params.method.to_uppercase(),
        url,
        headers: params.headers.into_iter().collect(),
        destination: params.destination,
    };

    let served = manager.serve(&request).await?;
    let body_bytes = served.response.body.len();
    let content_type = served.response.header("content-type").map(str::to_string);

    let output = SwFetchOutput {
        url: request.url.to_string(),
        source: served.source,
        status: served.response.status,
        content_type,
        headers: served.response.headers,
        body_text: String::from_utf8(served.response.body).ok(),
        body_bytes,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{PagesNetwork, SITE, manager, output};
    use std::sync::Arc;

    fn params(url: &str, destination: Destination) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: default_method(), destination, headers: BTreeMap::new() }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (_db, manager) = manager("site-v1", Arc::new(PagesNetwork::new(SITE))).await;
        let result = fetch_impl(&manager, params("  ", Destination::Other)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_offline_from_cache() {
        let network = Arc::new(PagesNetwork::new(SITE));
        let (_db, manager) = manager("site-v1", Arc::clone(&network)).await;
        manager.register().await.unwrap();
        network.go_offline();

        let result = fetch_impl(&manager, params("/styles.css", Destination::Style)).await.unwrap();
        let out: SwFetchOutput = output(&result);
        assert_eq!(out.source, ServeSource::Cache);
        assert_eq!(out.body_text.as_deref(), Some("body{}"));
        assert_eq!(out.content_type.as_deref(), Some("text/plain"));
        assert_eq!(out.url, "https://site.example/styles.css");
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_fallback() {
        let network = Arc::new(PagesNetwork::new(SITE));
        let (_db, manager) = manager("site-v1", Arc::clone(&network)).await;
        manager.register().await.unwrap();
        network.go_offline();

        let result = fetch_impl(&manager, params("/projects", Destination::Document)).await.unwrap();
        let out: SwFetchOutput = output(&result);
        assert_eq!(out.source, ServeSource::Fallback);
        assert_eq!(out.body_text.as_deref(), Some("<h1>home</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_offline_subresource_fails() {
        let network = Arc::new(PagesNetwork::new(SITE));
        let (_db, manager) = manager("site-v1", Arc::clone(&network)).await;
        manager.register().await.unwrap();
        network.go_offline();

        let err = fetch_impl(&manager, params("/unknown.js", Destination::Script)).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }

    #[test]
    fn test_params_defaults() {
        let params: SwFetchParams = serde_json::from_str(r#"{"url": "/"}"#).unwrap();
        assert_eq!(params.method, "GET");
        assert_eq!(params.destination, Destination::Other);
        assert!(params.headers.is_empty());
    }
}
