//! # Quillpost
//!
//! Article pages for a blog whose content lives in a headless document
//! store. Posts, authors and comments are fetched with two queries, rendered
//! to HTML with Maud, and served (or written to disk) at `/post/<slug>`.
//! Visitors leave comments through a form on each page; comments are relayed
//! to a submission endpoint and only appear once a moderator approves them.
//!
//! # Request Flow
//!
//! ```text
//! paths      repository  →  [slug]          (every routable article)
//! loader     slug        →  Article         (post + author + approved comments)
//! render     Article     →  HTML            (byline, body, comment area)
//! cache      HTML        →  served page     (regenerated after revalidate_secs)
//! comments   form POST   →  endpoint        (Awaiting → Acknowledged)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`repository`] | `ContentRepository` trait; hosted API and dataset-export implementations |
//! | [`paths`] | Route discovery from the all-slugs query |
//! | [`loader`] | Single-article query and typed composition |
//! | [`types`] | Repository documents (`Article`, `Author`, `Comment`) |
//! | [`portable_text`] | Rich-text body model and rendering |
//! | [`image_url`] | Image asset reference → CDN URL |
//! | [`render`] | Page, not-found and error page markup |
//! | [`comments`] | Form validation, submission state machine, endpoint client |
//! | [`cache`] | Rendered-page cache with freshness and ETags |
//! | [`server`] | axum routes: pages, comment posts, health |
//! | [`generate`] | Static build of every article to disk |
//! | [`config`] | `config.toml` loading, environment overrides, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Approval Lives in the Query
//!
//! Only approved comments are ever fetched. The filter is part of the page
//! query, so no code path can render an unapproved comment by forgetting to
//! filter.
//!
//! ## Server-Side Form
//!
//! The comment form posts back to the article URL and the server answers with
//! the re-rendered page: inline errors with the entered values kept, or the
//! thank-you banner. No client script is needed.
//!
//! ## Stale-While-Revalidate
//!
//! Pages are regenerated at most once per `revalidate_secs`. A request that
//! finds a stale page gets it immediately and triggers one background
//! regeneration; a failed regeneration keeps the stale page.

pub mod cache;
pub mod comments;
pub mod config;
pub mod generate;
pub mod image_url;
pub mod loader;
pub mod output;
pub mod paths;
pub mod portable_text;
pub mod render;
pub mod repository;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
