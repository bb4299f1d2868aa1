//! Route discovery.
//!
//! Asks the repository for every post's `{_id, title, slug}` and turns the
//! result into one [`PathParams`] per routable post. Used once per static
//! build and once at server start when pre-rendering.
//!
//! Slugs unknown at enumeration time are not errors: with
//! [`Fallback::Blocking`] the server renders them on first request and caches
//! the result like any pre-rendered page.

use crate::repository::{ContentRepository, Query, RepositoryError};
use serde::Deserialize;

/// Route parameters for one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParams {
    pub slug: String,
}

/// What to do for a slug that was not enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Render on first request, then cache.
    Blocking,
}

#[derive(Debug, Clone)]
pub struct StaticPaths {
    pub paths: Vec<PathParams>,
    pub fallback: Fallback,
}

#[derive(Debug, Deserialize)]
struct PostSlug {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    slug: Option<SlugField>,
}

#[derive(Debug, Deserialize)]
struct SlugField {
    #[serde(default)]
    current: Option<String>,
}

/// Enumerate all renderable article paths, in repository order.
pub async fn enumerate_paths(
    repo: &dyn ContentRepository,
) -> Result<StaticPaths, RepositoryError> {
    let result = repo.fetch(&Query::AllSlugs).await?;
    let posts: Vec<PostSlug> = if result.is_null() {
        Vec::new()
    } else {
        serde_json::from_value(result)?
    };

    let mut paths = Vec::with_capacity(posts.len());
    for post in posts {
        match post.slug.and_then(|s| s.current).filter(|s| !s.is_empty()) {
            Some(slug) => paths.push(PathParams { slug }),
            None => tracing::warn!(post_id = %post.id, "post has no slug, skipping route"),
        }
    }

    tracing::debug!(count = paths.len(), "enumerated article paths");
    Ok(StaticPaths {
        paths,
        fallback: Fallback::Blocking,
    })
}
