//! Image asset URL construction.
//!
//! Image fields store a reference such as
//! `image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg`: the asset id, the original
//! dimensions, and the file format. The CDN serves that asset at
//!
//! ```text
//! https://cdn.sanity.io/images/<project>/<dataset>/Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000.jpg
//! ```
//!
//! with optional resize parameters in the query string. A reference that does
//! not follow the pattern yields no URL; callers render nothing in its place.

use crate::config::RepositoryConfig;
use crate::types::ImageRef;

const CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Parsed asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetId<'a> {
    pub id: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: &'a str,
}

/// Parse an `image-<id>-<w>x<h>-<ext>` reference.
pub fn parse_asset_ref(reference: &str) -> Option<AssetId<'_>> {
    let rest = reference.strip_prefix("image-")?;
    let mut parts = rest.rsplitn(3, '-');
    let format = parts.next()?;
    let dims = parts.next()?;
    let id = parts.next()?;
    let (w, h) = dims.split_once('x')?;
    let width = w.parse().ok()?;
    let height = h.parse().ok()?;
    if id.is_empty() || format.is_empty() {
        return None;
    }
    Some(AssetId {
        id,
        width,
        height,
        format,
    })
}

/// Resize hints appended to the CDN URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Crop to fill the requested box instead of fitting inside it.
    pub crop: bool,
}

impl ImageOptions {
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    pub fn square(size: u32) -> Self {
        Self {
            width: Some(size),
            height: Some(size),
            crop: true,
        }
    }
}

/// Builds CDN URLs for one project/dataset pair.
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(&config.project_id, &config.dataset)
    }

    /// CDN URL for an image field, or `None` if its reference is malformed.
    pub fn url(&self, image: &ImageRef, options: ImageOptions) -> Option<String> {
        let asset = parse_asset_ref(&image.asset.reference)?;
        let mut url = format!(
            "{}/{}/{}/{}-{}x{}.{}",
            CDN_BASE,
            self.project_id,
            self.dataset,
            asset.id,
            asset.width,
            asset.height,
            asset.format
        );

        let mut query = Vec::new();
        if let Some(w) = options.width {
            query.push(format!("w={w}"));
        }
        if let Some(h) = options.height {
            query.push(format!("h={h}"));
        }
        if options.crop {
            query.push("fit=crop".to_string());
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Some(url)
    }
}
