//! Rendered-page cache with time-based revalidation.
//!
//! Rendering a page costs one repository round trip, so the server keeps
//! every rendered article page in memory keyed by slug, and serves it until
//! it goes stale.
//!
//! # Design
//!
//! Each entry holds the loaded [`Article`] (needed again when a comment
//! post re-renders the page with a different form state), the rendered HTML,
//! an ETag, and the instant it was generated.
//!
//! ## Freshness
//!
//! An entry is **fresh** while `now - generated_at < revalidate`, and
//! **stale** afterwards. Stale entries are still served; the request that
//! finds one kicks off a single background regeneration. Only approved
//! comments added since the last generation are affected by staleness, so a
//! slightly old page is always acceptable.
//!
//! ## Refresh de-duplication
//!
//! A slug is marked as refreshing while its regeneration runs; concurrent
//! requests for the same stale slug serve the stale copy without starting
//! another regeneration.
//!
//! ## ETags
//!
//! The ETag is the SHA-256 of the rendered HTML, so regenerating an
//! unchanged article yields the same tag and conditional requests keep
//! answering `304 Not Modified`.

use crate::types::Article;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A rendered article page.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub article: Arc<Article>,
    pub html: Arc<str>,
    pub etag: String,
    pub generated_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

impl CachedPage {
    pub fn new(article: Article, html: String, generated_at: Instant) -> Self {
        let etag = hash_html(&html);
        Self {
            article: Arc::new(article),
            html: html.into(),
            etag,
            generated_at,
        }
    }

    pub fn freshness(&self, now: Instant, revalidate: Duration) -> Freshness {
        if now.saturating_duration_since(self.generated_at) < revalidate {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }
}

/// Quoted SHA-256 of the page HTML, ready for an `ETag` header.
pub fn hash_html(html: &str) -> String {
    let digest = Sha256::digest(html.as_bytes());
    format!("\"{:x}\"", digest)
}

/// In-memory page store shared by all request handlers.
#[derive(Debug, Default)]
pub struct PageCache {
    entries: RwLock<HashMap<String, CachedPage>>,
    refreshing: Mutex<HashSet<String>>,
    stats: Mutex<CacheStats>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, slug: &str) -> Option<CachedPage> {
        self.entries.read().await.get(slug).cloned()
    }

    pub async fn insert(&self, slug: &str, page: CachedPage) {
        self.entries.write().await.insert(slug.to_string(), page);
    }

    pub async fn remove(&self, slug: &str) {
        self.entries.write().await.remove(slug);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Claim the refresh slot for a slug. Returns `false` if a refresh is
    /// already running.
    pub fn try_begin_refresh(&self, slug: &str) -> bool {
        match self.refreshing.lock() {
            Ok(mut set) => set.insert(slug.to_string()),
            Err(_) => false,
        }
    }

    pub fn end_refresh(&self, slug: &str) {
        if let Ok(mut set) = self.refreshing.lock() {
            set.remove(slug);
        }
    }

    pub fn record(&self, lookup: Lookup) {
        if let Ok(mut stats) = self.stats.lock() {
            match lookup {
                Lookup::Hit => stats.hits += 1,
                Lookup::Stale => stats.stale += 1,
                Lookup::Miss => stats.misses += 1,
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// How a page request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Stale,
    Miss,
}

/// Summary of cache behavior since startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub stale: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.stale + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fresh, {} stale, {} generated ({} total)",
            self.hits,
            self.stale,
            self.misses,
            self.total()
        )
    }
}
