//! Network seam used by the manager.

use async_trait::async_trait;

use crate::Error;
use crate::request::{Request, Response};

/// Forwards a request to the network.
///
/// Any HTTP status counts as a completed round trip and comes back as `Ok`.
/// `Err` means no response was obtained at all (offline, DNS failure,
/// timeout); the manager treats every `Err` as a network failure.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
