//! cache_match tool implementation.
//!
//! Looks up a stored entry by URL without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offcache_core::{CacheDb, CacheStorage, Error, Network, OfflineCacheManager, resolve_url};

use crate::tools::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// URL or origin-relative path of the entry.
    pub url: String,

    /// Generation to search (default: the current generation).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub generation: String,
    pub url: String,
    pub method: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub stored_at: String,
    pub body_bytes: usize,
}

/// Implementation of the cache_match tool.
pub async fn match_impl<N: Network + 'static>(
    manager: &OfflineCacheManager<CacheDb, N>, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    let generation = params
        .generation
        .unwrap_or_else(|| manager.config().cache_name.clone());
    let url = resolve_url(&manager.config().origin, &params.url)?;

    if !manager.storage().has(&generation).await? {
        return Err(Error::CacheMiss(format!("no cache generation named {generation}")).into());
    }

    let entry = manager
        .storage()
        .match_url(&generation, &url)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{url} not in {generation}")))?;

    let output = CacheMatchOutput {
        generation,
        body_bytes: entry.body.len(),
        url: entry.url,
        method: entry.method,
        status_code: entry.status_code,
        headers: entry.headers,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}
