//! sw_install, sw_activate and sw_status tool implementations.
//!
//! Drive the manager through its lifecycle and report where it stands.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offcache_core::{CacheDb, CacheStorage, Network, OfflineCacheManager, ReclaimReport, WorkerState};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Generation that was provisioned.
    pub generation: String,
    /// Number of manifest entries stored.
    pub entries: usize,
    /// Lifecycle state after installing.
    pub state: WorkerState,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    /// Generation that survived reclamation.
    pub generation: String,
    /// Lifecycle state after activating.
    pub state: WorkerState,
    /// Stale generations deleted or left behind.
    pub reclaimed: ReclaimReport,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub state: WorkerState,
    /// Current generation name.
    pub generation: String,
    /// Whether the current generation exists in storage.
    pub provisioned: bool,
    /// Entries held by the current generation.
    pub entries: u64,
    /// Generation persisted by the last activation, if any.
    pub active_generation: Option<String>,
    /// Number of assets in the manifest.
    pub manifest_len: usize,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<N: Network + 'static>(
    manager: &OfflineCacheManager<CacheDb, N>,
) -> Result<CallToolResult, McpError> {
    let entries = manager.install().await?;
    let output = InstallOutput {
        generation: manager.config().cache_name.clone(),
        entries,
        state: manager.state().await,
    };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<N: Network + 'static>(
    manager: &OfflineCacheManager<CacheDb, N>,
) -> Result<CallToolResult, McpError> {
    let reclaimed = manager.activate().await?;
    let output = ActivateOutput {
        generation: manager.config().cache_name.clone(),
        state: manager.state().await,
        reclaimed,
    };
    json_result(&output)
}

/// Implementation of the sw_status tool.
pub async fn status_impl<N: Network + 'static>(
    manager: &OfflineCacheManager<CacheDb, N>,
) -> Result<CallToolResult, McpError> {
    let generation = manager.config().cache_name.clone();
    let storage = manager.storage();
    let provisioned = storage.has(&generation).await?;
    let entries = storage.entry_count(&generation).await?;
    let active_generation = storage.active().await?;

    let output = StatusOutput {
        state: manager.state().await,
        provisioned,
        entries,
        active_generation,
        manifest_len: manager.config().manifest.len(),
        generation,
    };
    json_result(&output)
}
