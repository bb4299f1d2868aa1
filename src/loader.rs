//! Article loading.
//!
//! One query per page: the post matching the slug, its author, and its
//! approved comments. The approval filter lives in the query itself (see
//! [`POST_BY_SLUG_GROQ`](crate::repository::POST_BY_SLUG_GROQ)); loaded
//! comments are never filtered again here.

use crate::repository::{ContentRepository, Query, RepositoryError};
use crate::types::Article;
use std::time::Duration;

/// Outcome of loading one article page.
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// The composed article and how long its rendered page stays fresh.
    Found {
        article: Box<Article>,
        revalidate: Duration,
    },
    /// No post has this slug; the page layer must answer not-found.
    NotFound,
}

impl LoadResult {
    pub fn article(&self) -> Option<&Article> {
        match self {
            LoadResult::Found { article, .. } => Some(article),
            LoadResult::NotFound => None,
        }
    }
}

pub async fn load_article(
    repo: &dyn ContentRepository,
    slug: &str,
    revalidate: Duration,
) -> Result<LoadResult, RepositoryError> {
    let result = repo
        .fetch(&Query::PostBySlug {
            slug: slug.to_string(),
        })
        .await?;

    if result.is_null() {
        tracing::debug!(slug, "no article for slug");
        return Ok(LoadResult::NotFound);
    }

    let article: Article = serde_json::from_value(result)?;
    tracing::debug!(
        slug,
        article_id = %article.id,
        comments = article.comments.len(),
        "loaded article"
    );
    Ok(LoadResult::Found {
        article: Box::new(article),
        revalidate,
    })
}
