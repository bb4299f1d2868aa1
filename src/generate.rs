//! Static site generation.
//!
//! Renders every enumerated article to disk so the site can be served from
//! any file server. Comment submission still needs the running server (or
//! another handler at the same route), since the form posts back to the
//! article URL.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── 404.html                   # Not-found page
//! └── post/                      # pages.route_prefix
//!     ├── hello-rust/
//!     │   └── index.html
//!     └── second-post/
//!         └── index.html
//! ```
//!
//! Slugs that would escape their directory (`..`, path separators) are
//! skipped with a warning, as are enumerated slugs whose article disappeared
//! between enumeration and loading.

use crate::comments::CommentForm;
use crate::config::SiteConfig;
use crate::loader::{LoadResult, load_article};
use crate::paths::enumerate_paths;
use crate::render::{RenderContext, render_not_found, render_post_page};
use crate::repository::{ContentRepository, RepositoryError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One article page written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub slug: String,
    pub title: String,
    /// Path relative to the output directory.
    pub path: PathBuf,
    /// Approved comments rendered on the page.
    pub comments: usize,
}

/// Why an enumerated slug produced no page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsafeSlug,
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub pages: Vec<GeneratedPage>,
    pub skipped: Vec<(String, SkipReason)>,
}

pub async fn generate(
    repo: &dyn ContentRepository,
    config: &SiteConfig,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let ctx = RenderContext::from_config(config);
    let revalidate = config.pages.revalidate();
    let static_paths = enumerate_paths(repo).await?;

    fs::create_dir_all(output_dir)?;
    let mut report = GenerateReport::default();

    for params in &static_paths.paths {
        let slug = params.slug.as_str();
        if !is_safe_slug(slug) {
            tracing::warn!(slug, "slug is not a safe path segment, skipping");
            report
                .skipped
                .push((slug.to_string(), SkipReason::UnsafeSlug));
            continue;
        }

        let article = match load_article(repo, slug, revalidate).await? {
            LoadResult::Found { article, .. } => article,
            LoadResult::NotFound => {
                tracing::warn!(slug, "enumerated slug has no article, skipping");
                report.skipped.push((slug.to_string(), SkipReason::NotFound));
                continue;
            }
        };

        let rel_path = Path::new(ctx.route_prefix.as_str())
            .join(slug)
            .join("index.html");
        let page_path = output_dir.join(&rel_path);
        if let Some(parent) = page_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let html = render_post_page(&article, &CommentForm::new(), &ctx);
        fs::write(&page_path, html.into_string())?;
        tracing::debug!(path = %page_path.display(), "wrote article page");

        report.pages.push(GeneratedPage {
            slug: slug.to_string(),
            title: article.title.clone(),
            path: rel_path,
            comments: article.comments.len(),
        });
    }

    fs::write(
        output_dir.join("404.html"),
        render_not_found(&ctx).into_string(),
    )?;

    Ok(report)
}

/// A slug is written as a single directory name, so it must be one.
fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\'])
        && !slug.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FixtureRepository;
    use crate::test_helpers::{fixture_repository, test_config};
    use tempfile::TempDir;

    #[test]
    fn slug_safety() {
        assert!(is_safe_slug("hello-rust"));
        assert!(is_safe_slug("ünïcode"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("a/b"));
        assert!(!is_safe_slug("a\\b"));
    }

    #[tokio::test]
    async fn writes_one_page_per_article() {
        let tmp = TempDir::new().unwrap();
        let report = generate(&fixture_repository(), &test_config(), tmp.path())
            .await
            .unwrap();

        let slugs: Vec<&str> = report.pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["hello-rust", "second-post"]);
        assert!(report.skipped.is_empty());

        let page = tmp.path().join("post/hello-rust/index.html");
        let html = fs::read_to_string(page).unwrap();
        assert!(html.contains("Hello Rust"));
        assert!(html.contains("comment-form"));
        assert!(tmp.path().join("404.html").exists());
    }

    #[tokio::test]
    async fn report_counts_approved_comments_only() {
        let tmp = TempDir::new().unwrap();
        let report = generate(&fixture_repository(), &test_config(), tmp.path())
            .await
            .unwrap();
        let hello = &report.pages[0];
        assert_eq!(hello.path, PathBuf::from("post/hello-rust/index.html"));
        assert_eq!(hello.comments, 2);

        let html = fs::read_to_string(tmp.path().join(&hello.path)).unwrap();
        assert!(!html.contains("Buy cheap watches"));
    }

    #[tokio::test]
    async fn unsafe_slugs_are_skipped() {
        let repo = FixtureRepository::from_ndjson(
            r#"
{"_id":"p1","_type":"post","_createdAt":"2022-01-01T00:00:00Z","title":"Bad","slug":{"current":"../escape"}}
{"_id":"p2","_type":"post","_createdAt":"2022-01-01T00:00:00Z","title":"Good","slug":{"current":"good"}}
"#,
        )
        .unwrap();
        let tmp = TempDir::new().unwrap();
        let report = generate(&repo, &test_config(), tmp.path()).await.unwrap();

        assert_eq!(report.pages.len(), 1);
        assert_eq!(
            report.skipped,
            vec![("../escape".to_string(), SkipReason::UnsafeSlug)]
        );
        assert!(!tmp.path().join("escape").exists());
    }

    #[tokio::test]
    async fn empty_repository_still_writes_not_found_page() {
        let repo = FixtureRepository::new(Vec::new());
        let tmp = TempDir::new().unwrap();
        let report = generate(&repo, &test_config(), tmp.path()).await.unwrap();
        assert!(report.pages.is_empty());
        assert!(tmp.path().join("404.html").exists());
    }

    #[tokio::test]
    async fn custom_route_prefix() {
        let mut config = test_config();
        config.pages.route_prefix = "/articles/".into();
        let tmp = TempDir::new().unwrap();
        generate(&fixture_repository(), &config, tmp.path())
            .await
            .unwrap();
        let html =
            fs::read_to_string(tmp.path().join("articles/second-post/index.html")).unwrap();
        assert!(html.contains(r#"action="/articles/second-post""#));
    }
}
