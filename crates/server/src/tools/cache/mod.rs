//! Cache-related MCP tools.
//!
//! This module provides read-only tools for inspecting cache generations.

pub mod get;
pub mod keys;

pub use get::{CacheMatchParams, match_impl};
pub use keys::keys_impl;
