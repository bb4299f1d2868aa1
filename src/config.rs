//! Site configuration module.
//!
//! Handles loading, validating, and overriding `config.toml`. The effective
//! configuration is layered: stock defaults, then the user's `config.toml`,
//! then environment variables for the repository identifiers.
//!
//! ## Config File Location
//!
//! `config.toml` is read from the config directory (`--config-dir`, default
//! the current directory). A `.env` file in the working directory is loaded
//! before the environment overrides are applied.
//!
//! ## Configuration Options
//!
//! ```toml
//! [repository]
//! project_id = ""              # Required (or SANITY_PROJECT_ID)
//! dataset = ""                 # Required (or SANITY_DATASET)
//! api_version = "2021-10-21"
//! use_cdn = true
//! # token = "..."              # Optional (or SANITY_API_TOKEN)
//!
//! [submission]
//! endpoint = "http://localhost:3000/api/createComments"
//!
//! [pages]
//! revalidate_secs = 60
//! route_prefix = "post"
//!
//! [site]
//! title = "Medium Blog"
//! accent = "#eab308"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `repository.project_id`.
pub const ENV_PROJECT_ID: &str = "SANITY_PROJECT_ID";
/// Environment variable overriding `repository.dataset`.
pub const ENV_DATASET: &str = "SANITY_DATASET";
/// Environment variable overriding `repository.token`.
pub const ENV_TOKEN: &str = "SANITY_API_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing required setting {key} (set it in config.toml or via {env})")]
    Missing { key: &'static str, env: &'static str },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Content repository connection settings.
    pub repository: RepositoryConfig,
    /// Where new comments are relayed.
    pub submission: SubmissionConfig,
    /// Page generation and caching.
    pub pages: PagesConfig,
    /// Site chrome (title, accent color).
    pub site: SiteChrome,
}

impl SiteConfig {
    /// Validate config values. Missing repository identifiers are reported
    /// before anything else since nothing can render without them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.project_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "repository.project_id",
                env: ENV_PROJECT_ID,
            });
        }
        if self.repository.dataset.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "repository.dataset",
                env: ENV_DATASET,
            });
        }
        if self.pages.revalidate_secs == 0 {
            return Err(ConfigError::Validation(
                "pages.revalidate_secs must be greater than zero".into(),
            ));
        }
        if self.pages.route_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "pages.route_prefix must not be empty".into(),
            ));
        }
        if reqwest::Url::parse(&self.submission.endpoint).is_err() {
            return Err(ConfigError::Validation(format!(
                "submission.endpoint is not an absolute URL: {}",
                self.submission.endpoint
            )));
        }
        Ok(())
    }

    /// Apply environment overrides for the repository identifiers.
    ///
    /// `lookup` abstracts `std::env::var` so tests don't touch process state.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PROJECT_ID).filter(|v| !v.is_empty()) {
            self.repository.project_id = v;
        }
        if let Some(v) = lookup(ENV_DATASET).filter(|v| !v.is_empty()) {
            self.repository.dataset = v;
        }
        if let Some(v) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.repository.token = Some(v);
        }
    }
}

/// Content repository connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Project identifier (first label of the API host).
    pub project_id: String,
    /// Dataset name, e.g. `production`.
    pub dataset: String,
    /// Dated API version, without the leading `v`.
    pub api_version: String,
    /// Query the edge-cached API host instead of the live one.
    pub use_cdn: bool,
    /// Bearer token for private datasets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: String::new(),
            api_version: "2021-10-21".to_string(),
            use_cdn: true,
            token: None,
        }
    }
}

/// Comment submission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmissionConfig {
    /// Absolute URL that accepts `POST {_id, name, email, comment}`.
    pub endpoint: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/createComments".to_string(),
        }
    }
}

/// Page generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Seconds after which a generated page is stale.
    pub revalidate_secs: u64,
    /// First path segment of article routes (`/post/<slug>`).
    pub route_prefix: String,
}

impl PagesConfig {
    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }

    /// Route prefix without surrounding slashes.
    pub fn prefix(&self) -> &str {
        self.route_prefix.trim_matches('/')
    }
}

/// Public URL path of an article page. The slug is percent-encoded so it
/// stays a single path segment.
pub fn post_path(prefix: &str, slug: &str) -> String {
    format!(
        "/{}/{}",
        prefix.trim_matches('/'),
        urlencoding::encode(slug)
    )
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            revalidate_secs: 60,
            route_prefix: "post".to_string(),
        }
    }
}

/// Site chrome settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteChrome {
    /// Shown in the header and the document title.
    pub title: String,
    /// Accent color for links, dividers and the thank-you banner.
    pub accent: String,
}

impl Default for SiteChrome {
    fn default() -> Self {
        Self {
            title: "Medium Blog".to_string(),
            accent: "#eab308".to_string(),
        }
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Load a `config.toml` from a directory.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML or unknown keys.
pub fn load_raw_config(dir: &Path) -> Result<Option<SiteConfig>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    Ok(Some(config))
}

/// Load config from `config.toml` in the given directory, apply environment
/// overrides and validate the result.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let _ = dotenvy::dotenv();
    let mut config = load_raw_config(dir)?.unwrap_or_default();
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# quillpost Configuration
# =======================
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content repository
# ---------------------------------------------------------------------------
[repository]
# Project identifier. Required; SANITY_PROJECT_ID overrides it.
project_id = ""

# Dataset name. Required; SANITY_DATASET overrides it.
dataset = ""

# Dated API version.
api_version = "2021-10-21"

# Query the cached API host (faster, may lag behind writes by a few seconds).
use_cdn = true

# Token for private datasets. SANITY_API_TOKEN overrides it.
# token = ""

# ---------------------------------------------------------------------------
# Comment submission
# ---------------------------------------------------------------------------
[submission]
# Absolute URL receiving POST {_id, name, email, comment} as JSON.
endpoint = "http://localhost:3000/api/createComments"

# ---------------------------------------------------------------------------
# Pages
# ---------------------------------------------------------------------------
[pages]
# Seconds before a rendered page is regenerated on the next request.
revalidate_secs = 60

# Article routes live under /<route_prefix>/<slug>.
route_prefix = "post"

# ---------------------------------------------------------------------------
# Site chrome
# ---------------------------------------------------------------------------
[site]
title = "Medium Blog"
accent = "#eab308"
"##
}

/// Generate CSS custom properties from the site chrome settings.
pub fn generate_chrome_css(site: &SiteChrome) -> String {
    format!(
        r#":root {{
    --color-accent: {accent};
}}"#,
        accent = site.accent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.repository.project_id = "abc123".into();
        config.repository.dataset = "production".into();
        config
    }

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.pages.revalidate_secs, 60);
        assert_eq!(config.pages.route_prefix, "post");
        assert_eq!(config.repository.api_version, "2021-10-21");
        assert!(config.repository.use_cdn);
        assert!(config.repository.token.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[repository]
project_id = "p1"
dataset = "staging"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository.project_id, "p1");
        assert_eq!(config.repository.dataset, "staging");
        // Defaults preserved
        assert_eq!(config.pages.revalidate_secs, 60);
        assert_eq!(config.site.title, "Medium Blog");
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = r#"
[pages]
revalidate = 30
"#;
        assert!(toml::from_str::<SiteConfig>(toml).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = r#"
[cache]
ttl = 30
"#;
        assert!(toml::from_str::<SiteConfig>(toml).is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_missing_project_id() {
        let mut config = valid_config();
        config.repository.project_id = String::new();
        match config.validate() {
            Err(ConfigError::Missing { key, env }) => {
                assert_eq!(key, "repository.project_id");
                assert_eq!(env, ENV_PROJECT_ID);
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn validate_missing_dataset() {
        let mut config = valid_config();
        config.repository.dataset = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                key: "repository.dataset",
                ..
            })
        ));
    }

    #[test]
    fn validate_zero_revalidate() {
        let mut config = valid_config();
        config.pages.revalidate_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_relative_endpoint() {
        let mut config = valid_config();
        config.submission.endpoint = "/api/createComments".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_prefix() {
        let mut config = valid_config();
        config.pages.route_prefix = "/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_complete_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    // =========================================================================
    // Environment overrides
    // =========================================================================

    #[test]
    fn env_overrides_repository_identifiers() {
        let mut config = SiteConfig::default();
        config.apply_env(|key| match key {
            ENV_PROJECT_ID => Some("from-env".into()),
            ENV_DATASET => Some("dev".into()),
            ENV_TOKEN => Some("sk-secret".into()),
            _ => None,
        });
        assert_eq!(config.repository.project_id, "from-env");
        assert_eq!(config.repository.dataset, "dev");
        assert_eq!(config.repository.token.as_deref(), Some("sk-secret"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = valid_config();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.repository.project_id, "abc123");
        assert_eq!(config.repository.dataset, "production");
    }

    // =========================================================================
    // File loading
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_raw_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn load_raw_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[pages]
revalidate_secs = 10
route_prefix = "articles"
"#,
        )
        .unwrap();

        let config = load_raw_config(tmp.path()).unwrap().unwrap();
        assert_eq!(config.pages.revalidate_secs, 10);
        assert_eq!(post_path(config.pages.prefix(), "hello"), "/articles/hello");
    }

    #[test]
    fn load_raw_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "not = [valid").unwrap();
        assert!(matches!(
            load_raw_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.pages.revalidate_secs, defaults.pages.revalidate_secs);
        assert_eq!(config.submission.endpoint, defaults.submission.endpoint);
        assert_eq!(config.site.accent, defaults.site.accent);
        assert_eq!(config.repository.api_version, defaults.repository.api_version);
    }

    #[test]
    fn post_path_trims_slashes() {
        let mut pages = PagesConfig::default();
        pages.route_prefix = "/blog/".into();
        assert_eq!(post_path(pages.prefix(), "x"), "/blog/x");
        assert_eq!(post_path("/blog/", "x"), "/blog/x");
    }

    #[test]
    fn post_path_encodes_slug() {
        assert_eq!(post_path("post", "a b#c"), "/post/a%20b%23c");
        assert_eq!(post_path("post", "x/y"), "/post/x%2Fy");
        assert_eq!(post_path("post", "hello-rust_2.0~"), "/post/hello-rust_2.0~");
    }

    #[test]
    fn chrome_css_uses_accent() {
        let mut site = SiteChrome::default();
        site.accent = "#123456".into();
        assert!(generate_chrome_css(&site).contains("--color-accent: #123456"));
    }
}
