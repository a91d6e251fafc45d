//! Generation naming and the asset manifest.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::request::resolve_url;

/// Generation the running build provisions. Bump to invalidate every asset.
pub const DEFAULT_CACHE_NAME: &str = "valerian-portfolio-v1.0.0";

/// Page served when a navigation fails offline.
pub const DEFAULT_FALLBACK_DOCUMENT: &str = "/index.html";

/// Assets every generation must hold before it serves traffic.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/scripts.js",
    "/assets/fonts/Inter-Regular.woff2",
    "/assets/fonts/SpaceGrotesk-Bold.woff2",
    "/assets/fonts/JetBrainsMono-Regular.woff2",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&family=Space+Grotesk:wght@400;500;600;700&family=JetBrains+Mono:wght@400;500&display=swap",
];

/// Ordered list of request identifiers a generation is provisioned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<String>,
}

impl Manifest {
    pub fn new<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self { entries: entries.into_iter().map(Into::into).collect() }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry against the site origin, preserving order.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<Url>, Error> {
        self.entries.iter().map(|entry| resolve_url(origin, entry)).collect()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST.iter().copied())
    }
}

/// Split a `<project>-v<version>` generation name.
///
/// The version must be one or more dot-separated numeric components
/// (`site-v1`, `portfolio-v1.0.0`). Returns `None` for names outside the
/// convention.
pub fn split_generation_name(name: &str) -> Option<(&str, &str)> {
    let (project, version) = name.rsplit_once("-v")?;
    if project.is_empty() || version.is_empty() {
        return None;
    }
    let numeric = version
        .split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    numeric.then_some((project, version))
}
