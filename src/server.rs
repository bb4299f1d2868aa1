//! On-demand page server.
//!
//! ## Routes
//!
//! | Route | Behavior |
//! |---|---|
//! | `GET /<prefix>/:slug` | Cached page; stale pages trigger a background regeneration; unknown slugs render on first request |
//! | `POST /<prefix>/:slug` | Comment form submission, relayed to the submission endpoint |
//! | `GET /health` | Liveness plus cache counters |
//!
//! Anything else gets the not-found page.
//!
//! ## Failure handling
//!
//! - Slug without an article: `404` with the not-found page, never a partial page.
//! - Repository unreachable: the stale copy if one exists, else `502`.
//! - Comment transport failure: the form again, `200`, nothing else shown.

use crate::cache::{CachedPage, Freshness, Lookup, PageCache};
use crate::comments::{CommentForm, CommentSink, FormInput, SubmitOutcome};
use crate::loader::{LoadResult, load_article};
use crate::paths::enumerate_paths;
use crate::render::{RenderContext, render_not_found, render_post_page, render_unavailable};
use crate::repository::{ContentRepository, RepositoryError};
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tower_http::trace::TraceLayer;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Shared state behind every handler.
pub struct AppState {
    repo: Arc<dyn ContentRepository>,
    sink: Arc<dyn CommentSink>,
    cache: PageCache,
    ctx: RenderContext,
    revalidate: Duration,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        sink: Arc<dyn CommentSink>,
        ctx: RenderContext,
        revalidate: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            repo,
            sink,
            cache: PageCache::new(),
            ctx,
            revalidate,
        })
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Load and render a page, replacing any cached copy. `None` when the
    /// slug has no article; the stale entry, if any, is dropped.
    pub async fn generate(&self, slug: &str) -> Result<Option<CachedPage>, RepositoryError> {
        match load_article(self.repo.as_ref(), slug, self.revalidate).await? {
            LoadResult::Found { article, .. } => {
                let html = render_post_page(&article, &CommentForm::new(), &self.ctx).into_string();
                let page = CachedPage::new(*article, html, Instant::now());
                self.cache.insert(slug, page.clone()).await;
                tracing::debug!(slug, "generated page");
                Ok(Some(page))
            }
            LoadResult::NotFound => {
                self.cache.remove(slug).await;
                Ok(None)
            }
        }
    }

    /// Cached page for a slug, generating it on a miss and scheduling a
    /// background regeneration when it is stale.
    pub async fn page(self: &Arc<Self>, slug: &str) -> Result<Option<CachedPage>, RepositoryError> {
        if let Some(page) = self.cache.get(slug).await {
            match page.freshness(Instant::now(), self.revalidate) {
                Freshness::Fresh => self.cache.record(Lookup::Hit),
                Freshness::Stale => {
                    self.cache.record(Lookup::Stale);
                    self.spawn_refresh(slug);
                }
            }
            return Ok(Some(page));
        }

        self.cache.record(Lookup::Miss);
        self.generate(slug).await
    }

    fn spawn_refresh(self: &Arc<Self>, slug: &str) {
        if !self.cache.try_begin_refresh(slug) {
            return;
        }
        let state = Arc::clone(self);
        let slug = slug.to_string();
        tokio::spawn(async move {
            if let Err(e) = state.generate(&slug).await {
                tracing::warn!(slug = %slug, error = %e, "regeneration failed, keeping stale page");
            }
            state.cache.end_refresh(&slug);
        });
    }

    /// Generate every enumerated path up front.
    pub async fn prerender(&self) -> Result<usize, RepositoryError> {
        let static_paths = enumerate_paths(self.repo.as_ref()).await?;
        let mut generated = 0;
        for params in &static_paths.paths {
            match self.generate(&params.slug).await? {
                Some(_) => generated += 1,
                None => tracing::warn!(slug = %params.slug, "enumerated slug has no article"),
            }
        }
        Ok(generated)
    }
}

/// Build the router. `prefix` is the first path segment of article routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let post_route = format!("/{}/:slug", state.ctx.route_prefix);
    Router::new()
        .route("/health", get(health_handler))
        .route(&post_route, get(get_post).post(post_comment))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, port: u16, prerender: bool) -> Result<(), ServeError> {
    if prerender {
        let count = state.prerender().await?;
        tracing::info!(pages = count, "pre-rendered article pages");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    match state.page(&slug).await {
        Ok(Some(page)) => {
            let cache_control = format!(
                "s-maxage={}, stale-while-revalidate",
                state.revalidate.as_secs()
            );
            let etag_matches = headers
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| if_none_match(v, &page.etag));

            let mut response = if etag_matches {
                StatusCode::NOT_MODIFIED.into_response()
            } else {
                Html(page.html.to_string()).into_response()
            };
            let response_headers = response.headers_mut();
            if let Ok(v) = HeaderValue::from_str(&page.etag) {
                response_headers.insert(header::ETAG, v);
            }
            if let Ok(v) = HeaderValue::from_str(&cache_control) {
                response_headers.insert(header::CACHE_CONTROL, v);
            }
            response
        }
        Ok(None) => not_found(&state),
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "failed to load article");
            unavailable(&state)
        }
    }
}

async fn post_comment(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Form(mut input): Form<FormInput>,
) -> Response {
    let page = match state.page(&slug).await {
        Ok(Some(page)) => page,
        Ok(None) => return not_found(&state),
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "failed to load article for comment");
            return unavailable(&state);
        }
    };

    // The route decides the target article, whatever the hidden field says
    if input.id != page.article.id {
        if !input.id.is_empty() {
            tracing::debug!(slug = %slug, submitted_id = %input.id, "replacing mismatched _id");
        }
        input.id = page.article.id.clone();
    }

    let mut form = CommentForm::new();
    let outcome = form.submit(input, state.sink.as_ref()).await;
    let status = match outcome {
        SubmitOutcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitOutcome::Submitted | SubmitOutcome::TransportFailed => StatusCode::OK,
    };

    let html = render_post_page(&page.article, &form, &state.ctx).into_string();
    (status, [(header::CACHE_CONTROL, "no-store")], Html(html)).into_response()
}

/// Weak comparison of an `If-None-Match` header against a strong ETag.
/// Accepts `*`, comma-separated lists and `W/` prefixes.
fn if_none_match(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cached_pages: usize,
    cache: String,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cached_pages: state.cache.len().await,
        cache: state.cache.stats().to_string(),
    })
}

async fn not_found_handler(State(state): State<Arc<AppState>>) -> Response {
    not_found(&state)
}

fn not_found(state: &AppState) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(render_not_found(&state.ctx).into_string()),
    )
        .into_response()
}

fn unavailable(state: &AppState) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Html(render_unavailable(&state.ctx).into_string()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::tests::MockSink;
    use crate::repository::tests::MockRepository;
    use crate::test_helpers::{fixture_repository, test_context};

    fn state_with(repo: impl ContentRepository + 'static, revalidate: Duration) -> Arc<AppState> {
        AppState::new(
            Arc::new(repo),
            Arc::new(MockSink::accepting()),
            test_context(),
            revalidate,
        )
    }

    #[tokio::test]
    async fn miss_generates_and_caches() {
        let state = state_with(fixture_repository(), Duration::from_secs(60));
        let page = state.page("hello-rust").await.unwrap().unwrap();
        assert!(page.html.contains("Hello Rust"));
        assert_eq!(state.cache().len().await, 1);

        state.page("hello-rust").await.unwrap();
        let stats = state.cache().stats();
        assert_eq!((stats.misses, stats.hits), (1, 1));
    }

    #[tokio::test]
    async fn unknown_slug_is_not_cached() {
        let state = state_with(fixture_repository(), Duration::from_secs(60));
        assert!(state.page("nope").await.unwrap().is_none());
        assert!(state.cache().is_empty().await);
    }

    #[tokio::test]
    async fn prerender_generates_every_path() {
        let state = state_with(fixture_repository(), Duration::from_secs(60));
        let count = state.prerender().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(state.cache().len().await, 2);
    }

    #[tokio::test]
    async fn stale_page_is_served_while_refreshing() {
        let state = state_with(fixture_repository(), Duration::from_millis(1));
        let first = state.page("hello-rust").await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let second = state.page("hello-rust").await.unwrap().unwrap();
        assert_eq!(second.generated_at, first.generated_at);
        assert_eq!(state.cache().stats().stale, 1);
    }

    #[test]
    fn if_none_match_forms() {
        let etag = "\"abc\"";
        assert!(if_none_match("\"abc\"", etag));
        assert!(if_none_match("W/\"abc\"", etag));
        assert!(if_none_match("\"zzz\", W/\"abc\"", etag));
        assert!(if_none_match("*", etag));
        assert!(!if_none_match("\"zzz\"", etag));
        assert!(!if_none_match("abc", etag));
        assert!(!if_none_match("", etag));
    }

    #[tokio::test]
    async fn repository_failure_surfaces_error() {
        let state = state_with(MockRepository::failing("down"), Duration::from_secs(60));
        assert!(state.page("hello-rust").await.is_err());
    }
}
