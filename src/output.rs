//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Paths
//!
//! ```text
//! Articles
//! 001 hello-rust → /post/hello-rust
//! 002 second-post → /post/second-post
//! Fallback: blocking (unlisted slugs render on first request)
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Hello Rust → post/hello-rust/index.html
//!     Comments: 2
//! 002 Second Post → post/second-post/index.html
//!     Comments: 0
//! Not found → 404.html
//!
//! Skipped
//!     ../escape (unsafe slug)
//!
//! Generated 2 article pages
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::config::{PagesConfig, post_path};
use crate::generate::{GenerateReport, SkipReason};
use crate::paths::{Fallback, StaticPaths};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

// ============================================================================
// Paths
// ============================================================================

pub fn format_paths_output(paths: &StaticPaths, pages: &PagesConfig) -> Vec<String> {
    let mut lines = vec!["Articles".to_string()];
    for (i, params) in paths.paths.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            params.slug,
            post_path(pages.prefix(), &params.slug)
        ));
    }
    if paths.paths.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    let fallback = match paths.fallback {
        Fallback::Blocking => "blocking (unlisted slugs render on first request)",
    };
    lines.push(format!("Fallback: {}", fallback));
    lines
}

pub fn print_paths_output(paths: &StaticPaths, pages: &PagesConfig) {
    for line in format_paths_output(paths, pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, page) in report.pages.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            page.title,
            page.path.display()
        ));
        lines.push(format!("{}Comments: {}", indent(1), page.comments));
    }
    lines.push("Not found \u{2192} 404.html".to_string());

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (slug, reason) in &report.skipped {
            let why = match reason {
                SkipReason::UnsafeSlug => "unsafe slug",
                SkipReason::NotFound => "no article",
            };
            lines.push(format!("{}{} ({})", indent(1), slug, why));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}",
        plural(report.pages.len(), "article page", "article pages")
    ));
    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}
