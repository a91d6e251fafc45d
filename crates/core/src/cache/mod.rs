//! SQLite-backed storage for cache generations.
//!
//! This module provides persistent, named cache generations using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Generations created on demand and deleted wholesale
//! - Atomic batch writes, so a generation is never half-provisioned
//! - URL-keyed lookups using SHA-256 cache keys
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::CacheEntry;
pub use storage::CacheStorage;
