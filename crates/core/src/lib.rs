//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - The offline cache manager (install / activate / serve)
//! - Cache generation storage with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod network;
pub mod request;
pub mod worker;

pub use cache::{CacheDb, CacheEntry, CacheStorage};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use network::Network;
pub use request::{Destination, Request, Response, resolve_url};
pub use worker::{ManagerConfig, Manifest, OfflineCacheManager, ReclaimReport, ServeSource, Served, WorkerState};
