//! Offline cache manager: lifecycle state machine, manifest and naming.

pub mod manager;
pub mod manifest;
pub mod state;

pub use manager::{ManagerConfig, OfflineCacheManager, ReclaimReport, ServeSource, Served};
pub use manifest::{DEFAULT_CACHE_NAME, DEFAULT_FALLBACK_DOCUMENT, DEFAULT_MANIFEST, Manifest};
pub use state::WorkerState;
