//! Cache key generation.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request identity.
///
/// Keys depend on the URL alone; method and vary headers never take part in
/// the match.
pub fn compute_cache_key(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key(&url("https://example.com/styles.css"));
        let hash2 = compute_cache_key(&url("https://example.com/styles.css"));
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_paths() {
        let root = compute_cache_key(&url("https://example.com/"));
        let index = compute_cache_key(&url("https://example.com/index.html"));
        assert_ne!(root, index);
    }

    #[test]
    fn test_hash_different_origins() {
        let a = compute_cache_key(&url("https://example.com/all.css"));
        let b = compute_cache_key(&url("https://cdn.example.com/all.css"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key(&url("https://example.com"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
