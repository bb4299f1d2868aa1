//! Content repository access.
//!
//! The [`ContentRepository`] trait is the single seam between page logic and
//! the external document store: it answers a [`Query`] with raw JSON, and the
//! callers ([`paths`](crate::paths), [`loader`](crate::loader)) deserialize
//! into typed documents.
//!
//! | Implementation | Source |
//! |---|---|
//! | [`HttpRepository`] | Hosted query API over HTTPS, GROQ queries |
//! | [`FixtureRepository`] | NDJSON dataset export on disk, queries evaluated in process |
//!
//! Both implementations answer the same two queries with the same response
//! shapes, so an offline build from an export renders identically to a build
//! against the live API.

pub mod fixture;
pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use fixture::FixtureRepository;
pub use http::HttpRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Repository returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Invalid query URL: {0}")]
    Url(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid dataset export line {line}: {message}")]
    Export { line: usize, message: String },
}

/// The queries the page issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `{_id, title, slug}` of every post.
    AllSlugs,
    /// One post by slug with its author and approved comments, or `null`.
    PostBySlug { slug: String },
}

/// Projection for [`Query::AllSlugs`].
pub const ALL_SLUGS_GROQ: &str = r#"*[_type == "post"]{
  _id,
  title,
  slug {
    current
  }
}"#;

/// Projection for [`Query::PostBySlug`]. Approval filtering happens here.
pub const POST_BY_SLUG_GROQ: &str = r#"*[_type == "post" && slug.current == $slug][0]{
  _id,
  _createdAt,
  title,
  author -> {
    name,
    image
  },
  'comments': *[
    _type == "comment" &&
    post._ref == ^._id &&
    approved == true
  ]{
    _id,
    name,
    comment,
    approved
  },
  description,
  mainImage,
  slug,
  body
}"#;

impl Query {
    pub fn groq(&self) -> &'static str {
        match self {
            Query::AllSlugs => ALL_SLUGS_GROQ,
            Query::PostBySlug { .. } => POST_BY_SLUG_GROQ,
        }
    }

    /// Query parameters as `(name, JSON value)` pairs, without the `$` sigil.
    pub fn params(&self) -> Vec<(&'static str, Value)> {
        match self {
            Query::AllSlugs => Vec::new(),
            Query::PostBySlug { slug } => vec![("slug", Value::String(slug.clone()))],
        }
    }
}

/// A document store that can answer page queries.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Run a query and return the raw `result` value.
    async fn fetch(&self, query: &Query) -> Result<Value, RepositoryError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Repository returning canned responses and recording every query.
    #[derive(Default)]
    pub struct MockRepository {
        pub responses: Mutex<Vec<Result<Value, String>>>,
        pub queries: Mutex<Vec<Query>>,
    }

    impl MockRepository {
        pub fn with_responses(responses: Vec<Value>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                responses: Mutex::new(vec![Err(message.to_string())]),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn get_queries(&self) -> Vec<Query> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentRepository for MockRepository {
        async fn fetch(&self, query: &Query) -> Result<Value, RepositoryError> {
            self.queries.lock().unwrap().push(query.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(Value::Null);
            }
            responses.remove(0).map_err(|message| RepositoryError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: message,
            })
        }
    }

    #[test]
    fn post_query_filters_approved_comments() {
        let groq = Query::PostBySlug { slug: "x".into() }.groq();
        assert!(groq.contains("approved == true"));
        assert!(groq.contains("post._ref == ^._id"));
        assert!(groq.contains("slug.current == $slug"));
    }

    #[test]
    fn slug_is_the_only_parameter() {
        let params = Query::PostBySlug {
            slug: "my-post".into(),
        }
        .params();
        assert_eq!(params, vec![("slug", Value::String("my-post".into()))]);
        assert!(Query::AllSlugs.params().is_empty());
    }

    #[test]
    fn all_slugs_projection_is_minimal() {
        let groq = Query::AllSlugs.groq();
        assert!(groq.contains("_id"));
        assert!(groq.contains("current"));
        assert!(!groq.contains("body"));
    }
}
