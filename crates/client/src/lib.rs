//! Client code for offcache.
//!
//! This crate provides the HTTP side of the offline cache manager: the
//! `Network` implementation that provisioning fetches and forwarded requests
//! go through.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
