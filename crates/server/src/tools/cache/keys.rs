//! cache_keys tool implementation.
//!
//! Lists every cache generation in storage.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offcache_core::{CacheDb, CacheStorage, Network, OfflineCacheManager};

use crate::tools::json_result;

/// One generation in storage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationSummary {
    pub name: String,
    pub entries: u64,
    /// Whether this is the generation the running manager serves from.
    pub current: bool,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Generations, oldest first.
    pub generations: Vec<GenerationSummary>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl<N: Network + 'static>(
    manager: &OfflineCacheManager<CacheDb, N>,
) -> Result<CallToolResult, McpError> {
    let storage = manager.storage();
    let current = &manager.config().cache_name;

    let mut generations = Vec::new();
    for name in storage.keys().await? {
        let entries = storage.entry_count(&name).await?;
        generations.push(GenerationSummary { current: &name == current, name, entries });
    }

    json_result(&CacheKeysOutput { generations })
}
