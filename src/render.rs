//! Article page rendering.
//!
//! Pure functions from a loaded [`Article`] and the comment form state to
//! Maud markup. Nothing here touches the network or the environment; the
//! repository identifiers needed for image URLs arrive in the
//! [`RenderContext`].
//!
//! ## Page Layout
//!
//! ```text
//! header            site title
//! hero image        mainImage, full width
//! article           h1 title, h2 description, byline, rich-text body
//! ─────
//! comment area      form (Awaiting) XOR thank-you banner (Acknowledged)
//! comments          approved comments in loader order
//! ```

use crate::comments::{CommentForm, Field};
use crate::config::{self, SiteConfig};
use crate::image_url::{ImageOptions, ImageUrlBuilder};
use crate::portable_text::render_body;
use crate::types::{Article, Comment};
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, html};

const CSS_STATIC: &str = include_str!("../static/style.css");

const HERO_WIDTH: u32 = 1600;
const AVATAR_SIZE: u32 = 80;

/// Everything rendering needs besides the article itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub site_title: String,
    pub route_prefix: String,
    pub images: ImageUrlBuilder,
    pub css: String,
}

impl RenderContext {
    pub fn from_config(config: &SiteConfig) -> Self {
        let chrome_css = config::generate_chrome_css(&config.site);
        Self {
            site_title: config.site.title.clone(),
            route_prefix: config.pages.prefix().to_string(),
            images: ImageUrlBuilder::from_config(&config.repository),
            css: format!("{}\n\n{}", chrome_css, CSS_STATIC),
        }
    }
}

/// Human-readable publication time, e.g. `3/1/2022, 10:15:00 AM` (UTC).
pub fn format_published(created_at: &DateTime<Utc>) -> String {
    created_at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(site_title: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site_title) }
        }
    }
}

fn byline(article: &Article, images: &ImageUrlBuilder) -> Markup {
    let avatar = article
        .author
        .as_ref()
        .and_then(|a| a.image.as_ref())
        .and_then(|img| images.url(img, ImageOptions::square(AVATAR_SIZE)));
    let author_name = article
        .author
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or("Unknown author");

    html! {
        div.byline {
            @if let Some(src) = avatar {
                img.avatar src=(src) alt="";
            }
            p.byline-text {
                "Blog Post by "
                span.author-name { (author_name) }
                " - Published at "
                time datetime=(article.created_at.to_rfc3339()) {
                    (format_published(&article.created_at))
                }
            }
        }
    }
}

/// The comment form, or the thank-you banner once submitted.
pub fn comment_area(article: &Article, form: &CommentForm, action: &str) -> Markup {
    if form.submitted() {
        return html! {
            div.comment-thanks {
                h3 { "Thank you for submitting your comment!" }
                p { "Once it has been approved, it will appear below!" }
            }
        };
    }

    let draft = form.draft();
    html! {
        form.comment-form method="post" action=(action) {
            h3.form-kicker { "Enjoyed this article?" }
            h4.form-title { "Leave a comment below" }
            hr;
            input type="hidden" name="_id" value=(article.id);
            label {
                span { "Name" }
                input type="text" name="name" placeholder="John Appleseed" value=(draft.name);
            }
            label {
                span { "Email" }
                input type="email" name="email" placeholder="john@example.com" value=(draft.email);
            }
            label {
                span { "Comment" }
                textarea name="comment" placeholder="Leave a Comment" rows="8" { (draft.comment) }
            }
            @if !form.errors().is_empty() {
                div.form-errors {
                    @for field in form.errors() {
                        (field_error(*field))
                    }
                }
            }
            input.submit type="submit" value="Submit";
        }
    }
}

fn field_error(field: Field) -> Markup {
    html! {
        span.field-error data-field=(field.label().to_lowercase()) { (field.required_message()) }
    }
}

/// Approved comments, in the order given.
pub fn comment_list(comments: &[Comment]) -> Markup {
    html! {
        section.comments {
            h3 { "Comments" }
            hr;
            @for comment in comments {
                div.comment id={ "comment-" (comment.id) } {
                    p {
                        span.comment-author { (comment.name) ":" }
                        "  "
                        (comment.comment)
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders a full article page.
pub fn render_post_page(article: &Article, form: &CommentForm, ctx: &RenderContext) -> Markup {
    let hero = article
        .main_image
        .as_ref()
        .and_then(|img| ctx.images.url(img, ImageOptions::width(HERO_WIDTH)));
    let action = config::post_path(&ctx.route_prefix, &article.slug.current);

    let content = html! {
        (site_header(&ctx.site_title))
        main.post-page {
            @if let Some(src) = hero {
                img.hero src=(src) alt="";
            }
            article.post {
                h1.post-title { (article.title) }
                @if let Some(desc) = &article.description {
                    h2.post-description { (desc) }
                }
                (byline(article, &ctx.images))
                (render_body(&article.body, &ctx.images))
            }
            hr.divider;
            (comment_area(article, form, &action))
            (comment_list(&article.comments))
        }
    };

    let title = format!("{} | {}", article.title, ctx.site_title);
    base_document(&title, &ctx.css, content)
}

/// Standard not-found page.
pub fn render_not_found(ctx: &RenderContext) -> Markup {
    let content = html! {
        (site_header(&ctx.site_title))
        main.status-page {
            h1 { "404" }
            p { "This page could not be found." }
        }
    };
    base_document(&format!("404 | {}", ctx.site_title), &ctx.css, content)
}

/// Shown when the repository cannot be reached and nothing is cached.
pub fn render_unavailable(ctx: &RenderContext) -> Markup {
    let content = html! {
        (site_header(&ctx.site_title))
        main.status-page {
            h1 { "502" }
            p { "The article could not be loaded. Please try again shortly." }
        }
    };
    base_document(&format!("Error | {}", ctx.site_title), &ctx.css, content)
}
