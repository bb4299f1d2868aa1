//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let repo = fixture_repository();
//! let html = render_post_page(&sample_article(), &CommentForm::new(), &test_context());
//! ```

use serde_json::json;
use std::path::Path;

use crate::config::SiteConfig;
use crate::image_url::ImageUrlBuilder;
use crate::render::RenderContext;
use crate::repository::FixtureRepository;
use crate::types::Article;

// =========================================================================
// Fixture setup
// =========================================================================

/// Repository over `fixtures/dataset.ndjson`.
///
/// Published posts `hello-rust` (two approved comments, one rejected, one
/// pending) and `second-post` (no comments), plus a draft that must stay
/// invisible.
pub fn fixture_repository() -> FixtureRepository {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/dataset.ndjson");
    FixtureRepository::load(&path).unwrap()
}

/// Valid config pointing at a fake project.
pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.repository.project_id = "proj".into();
    config.repository.dataset = "production".into();
    config.site.title = "Test Blog".into();
    config
}

pub fn test_context() -> RenderContext {
    RenderContext {
        site_title: "Test Blog".into(),
        route_prefix: "post".into(),
        images: ImageUrlBuilder::new("proj", "production"),
        css: String::new(),
    }
}

// =========================================================================
// Sample documents
// =========================================================================

/// A fully populated article, shaped like a page query result.
pub fn sample_article() -> Article {
    serde_json::from_value(json!({
        "_id": "post-1",
        "_createdAt": "2022-03-01T10:15:00Z",
        "title": "Hello Rust",
        "description": "A first look at ownership",
        "mainImage": { "asset": { "_ref": "image-hero-1600x900-jpg" } },
        "slug": { "current": "hello-rust" },
        "author": {
            "name": "Ada",
            "image": { "asset": { "_ref": "image-ada-200x200-png" } }
        },
        "body": [
            {
                "_type": "block",
                "_key": "b1",
                "style": "normal",
                "markDefs": [],
                "children": [{ "_type": "span", "text": "Borrowing is simple.", "marks": [] }]
            }
        ],
        "comments": [
            { "_id": "c1", "name": "Bob", "comment": "Great intro, thanks!", "approved": true },
            { "_id": "c2", "name": "Cleo", "comment": "Bookmarked for later.", "approved": true }
        ]
    }))
    .unwrap()
}
