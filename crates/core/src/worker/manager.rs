//! The offline cache manager state machine.
//!
//! Three phases, strictly sequenced:
//!
//! - **install** provisions the current generation from the manifest
//! - **activate** reclaims every other generation
//! - **serve** answers requests from the current generation or the network
//!
//! A phase's state transition happens only after the phase's future has
//! settled, so install and activate never interleave for one instance.
//!
//! Activation is persisted in storage. A restarted process whose generation is
//! already active and complete resumes it without provisioning again, and an
//! instance that is not active serves from whichever generation the last
//! activation left in control.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use super::manifest::Manifest;
use super::state::WorkerState;
use crate::Error;
use crate::cache::{CacheEntry, CacheStorage};
use crate::network::Network;
use crate::request::{Request, Response, resolve_url};

/// Static inputs the manager was built with.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Name of the generation this build provisions and keeps.
    pub cache_name: String,
    pub manifest: Manifest,
    /// Origin that relative manifest entries resolve against.
    pub origin: Url,
    /// Document served when a navigation fails offline.
    pub fallback_document: String,
    /// Maximum concurrent manifest fetches during provisioning.
    pub provision_concurrency: usize,
}

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServeSource {
    Cache,
    Network,
    Fallback,
}

/// A response together with where it came from.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ServeSource,
}

/// Outcome of reclaiming stale generations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReclaimReport {
    /// Generations deleted by this run.
    pub deleted: Vec<String>,
    /// Generations whose deletion failed; they remain for the next activation.
    pub failed: Vec<String>,
}

/// Offline cache manager over an injected storage handle and network.
pub struct OfflineCacheManager<S, N> {
    storage: S,
    network: Arc<N>,
    config: ManagerConfig,
    state: RwLock<WorkerState>,
}

impl<S, N> OfflineCacheManager<S, N>
where
    S: CacheStorage,
    N: Network + 'static,
{
    pub fn new(storage: S, network: Arc<N>, config: ManagerConfig) -> Self {
        Self { storage, network, config, state: RwLock::new(WorkerState::Unregistered) }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Resume the persisted generation, or install then activate.
    ///
    /// Returns the state reached. An install failure leaves the instance
    /// `Redundant` and is returned as an error; requests keep being answered
    /// from the previously active generation.
    pub async fn register(&self) -> Result<WorkerState, Error> {
        if !self.restore().await {
            self.install().await?;
            self.activate().await?;
        }
        Ok(self.state().await)
    }

    /// Jump straight to `Active` if this build's generation already is.
    ///
    /// Only from `Unregistered`, and only when the persisted active generation
    /// is the configured one and holds every manifest entry. Storage errors
    /// are logged and mean a fresh install.
    pub async fn restore(&self) -> bool {
        let generation = &self.config.cache_name;
        match self.storage.active().await {
            Ok(Some(active)) if &active == generation => {}
            Ok(_) => return false,
            Err(err) => {
                tracing::warn!(error = %err, "could not read active generation");
                return false;
            }
        }

        let Ok(urls) = self.config.manifest.resolve(&self.config.origin) else {
            return false;
        };
        let expected = urls.iter().map(Url::as_str).collect::<HashSet<_>>().len() as u64;
        let stored = match self.storage.entry_count(generation).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(generation = %generation, error = %err, "could not count active generation");
                return false;
            }
        };
        if stored != expected {
            tracing::warn!(generation = %generation, stored, expected, "active generation incomplete, provisioning again");
            return false;
        }

        let mut state = self.state.write().await;
        if *state != WorkerState::Unregistered {
            return false;
        }
        *state = WorkerState::Active;
        tracing::info!(generation = %generation, entries = stored, "resumed active cache generation");
        true
    }

    /// Provision the configured generation and move to `Installed`.
    ///
    /// On failure the instance becomes `Redundant`; any previously active
    /// instance is unaffected and keeps serving its own generation.
    pub async fn install(&self) -> Result<usize, Error> {
        self.transition(WorkerState::can_install, WorkerState::Installing, "install")
            .await?;

        match self.provision(&self.config.manifest, &self.config.cache_name).await {
            Ok(stored) => {
                *self.state.write().await = WorkerState::Installed;
                tracing::info!(generation = %self.config.cache_name, entries = stored, "installed");
                Ok(stored)
            }
            Err(err) => {
                *self.state.write().await = WorkerState::Redundant;
                tracing::error!(generation = %self.config.cache_name, error = %err, "install failed");
                Err(err)
            }
        }
    }

    /// Reclaim stale generations, persist this generation as active and move
    /// to `Active`.
    pub async fn activate(&self) -> Result<ReclaimReport, Error> {
        self.transition(
            |state| matches!(state, WorkerState::Installed),
            WorkerState::Activating,
            "activate",
        )
        .await?;

        let generation = &self.config.cache_name;
        let outcome = async {
            let report = self.reclaim_generations(generation).await?;
            self.storage.set_active(generation).await?;
            Ok::<_, Error>(report)
        }
        .await;

        match outcome {
            Ok(report) => {
                *self.state.write().await = WorkerState::Active;
                tracing::info!(
                    generation = %self.config.cache_name,
                    deleted = report.deleted.len(),
                    failed = report.failed.len(),
                    "activated"
                );
                Ok(report)
            }
            Err(err) => {
                *self.state.write().await = WorkerState::Installed;
                tracing::error!(generation = %self.config.cache_name, error = %err, "activation failed");
                Err(err)
            }
        }
    }

    async fn transition(
        &self, allowed: impl Fn(WorkerState) -> bool, next: WorkerState, operation: &str,
    ) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !allowed(*state) {
            return Err(Error::InvalidState(format!("cannot {operation} while {}", *state)));
        }
        tracing::debug!(from = %*state, to = %next, "lifecycle transition");
        *state = next;
        Ok(())
    }

    /// Populate `generation` with every manifest entry.
    ///
    /// The generation is opened (created if absent) first. All entries are
    /// fetched before anything is written; a transport failure or a
    /// non-success status on any entry aborts the whole batch and the
    /// generation keeps whatever it held before. Returns the number of
    /// entries stored.
    pub async fn provision(&self, manifest: &Manifest, generation: &str) -> Result<usize, Error> {
        let failed = |reason: String| Error::ProvisionFailed { generation: generation.to_string(), reason };

        let urls = manifest.resolve(&self.config.origin).map_err(|e| failed(e.to_string()))?;
        if manifest.is_empty() {
            tracing::warn!(generation, "manifest is empty, nothing will be available offline");
        }
        let created = self.storage.open(generation).await?;
        tracing::info!(generation, created, assets = urls.len(), "provisioning cache generation");

        let semaphore = Arc::new(Semaphore::new(self.config.provision_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let total = urls.len();

        for (index, url) in urls.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| failed(e.to_string()))?;
            let network = Arc::clone(&self.network);

            join_set.spawn(async move {
                // NOTE: Hold permit for task duration to enforce concurrency limit
                let _permit = permit;
                let request = Request::get(url);
                let result = network.fetch(&request).await;
                (index, request, result)
            });
        }

        let mut fetched: Vec<Option<CacheEntry>> = vec![None; total];

        while let Some(joined) = join_set.join_next().await {
            let (index, request, result) = joined.map_err(|e| failed(e.to_string()))?;

            let reason = match result {
                Ok(response) if response.ok() => {
                    tracing::debug!(url = %request.url, bytes = response.body.len(), "fetched manifest entry");
                    fetched[index] = Some(CacheEntry::from_response(&request, response));
                    continue;
                }
                Ok(response) => format!("{}: status {}", request.url, response.status),
                Err(err) => format!("{}: {err}", request.url),
            };

            join_set.shutdown().await;
            return Err(failed(reason));
        }

        let entries: Vec<CacheEntry> = fetched.into_iter().flatten().collect();
        self.storage.put_all(generation, entries).await
    }

    /// Delete every generation except `current`.
    ///
    /// A failed deletion is logged and recorded in the report; the remaining
    /// generations are still attempted. Only failing to enumerate the
    /// generations is an error.
    pub async fn reclaim_generations(&self, current: &str) -> Result<ReclaimReport, Error> {
        let mut report = ReclaimReport::default();

        for name in self.storage.keys().await? {
            if name == current {
                continue;
            }
            match self.storage.delete(&name).await {
                Ok(_) => {
                    tracing::info!(generation = %name, "deleted stale cache generation");
                    report.deleted.push(name);
                }
                Err(err) => {
                    tracing::warn!(generation = %name, error = %err, "failed to delete stale cache generation");
                    report.failed.push(name);
                }
            }
        }

        Ok(report)
    }

    /// Answer one intercepted request.
    ///
    /// Cache hits never touch the network. Misses are forwarded once and the
    /// response is returned without being stored. If the network cannot be
    /// reached for a navigation, the cached fallback document is returned
    /// instead.
    pub async fn serve(&self, request: &Request) -> Result<Served, Error> {
        let Some(generation) = self.serving_generation().await else {
            let response = self.network.fetch(request).await?;
            return Ok(Served { response, source: ServeSource::Network });
        };

        match self.storage.match_url(&generation, &request.url).await {
            Ok(Some(entry)) => {
                tracing::debug!(url = %request.url, "cache hit");
                return Ok(Served { response: entry.into_response(), source: ServeSource::Cache });
            }
            Ok(None) => tracing::debug!(url = %request.url, "cache miss"),
            Err(err) => tracing::warn!(url = %request.url, error = %err, "cache lookup failed; treating as miss"),
        }

        match self.network.fetch(request).await {
            Ok(response) => Ok(Served { response, source: ServeSource::Network }),
            Err(err) if request.is_navigation() && err.is_network_failure() => {
                self.navigation_fallback(&generation, request, err).await
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network failure, no fallback");
                Err(err)
            }
        }
    }

    /// Generation requests are answered from, if any.
    ///
    /// An active instance serves its own generation. Otherwise the generation
    /// persisted by the last activation stays in control; with none, requests
    /// go straight to the network.
    async fn serving_generation(&self) -> Option<String> {
        if self.state().await.intercepts_requests() {
            return Some(self.config.cache_name.clone());
        }
        match self.storage.active().await {
            Ok(active) => active,
            Err(err) => {
                tracing::warn!(error = %err, "could not read active generation, passing request through");
                None
            }
        }
    }

    async fn navigation_fallback(&self, generation: &str, request: &Request, err: Error) -> Result<Served, Error> {
        let fallback = match resolve_url(&self.config.origin, &self.config.fallback_document) {
            Ok(url) => url,
            Err(resolve_err) => {
                tracing::warn!(error = %resolve_err, "fallback document does not resolve");
                return Err(err);
            }
        };

        match self.storage.match_url(generation, &fallback).await {
            Ok(Some(entry)) => {
                tracing::info!(url = %request.url, fallback = %fallback, error = %err, "serving offline fallback");
                Ok(Served { response: entry.into_response(), source: ServeSource::Fallback })
            }
            Ok(None) => {
                tracing::warn!(url = %request.url, fallback = %fallback, "navigation failed and no fallback cached");
                Err(err)
            }
            Err(lookup_err) => {
                tracing::warn!(url = %request.url, error = %lookup_err, "fallback lookup failed");
                Err(err)
            }
        }
    }
}
