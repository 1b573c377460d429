//! Site configuration module.
//!
//! Handles loading and validating the optional `mdsite.toml` placed in the
//! source root. The file is never walked, copied, or watched.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000               # Overridden by --port
//! debounce_ms = 100         # Coalescing window for watch events (0 = off)
//!
//! [build]
//! keep_going = false        # Continue past failing files (also --keep-going)
//!
//! [cdn]
//! katex_css = "https://cdn.jsdelivr.net/npm/katex@0.11.1/dist/katex.min.css"
//! katex_css_integrity = "sha384-..."
//! katex_js = "https://cdn.jsdelivr.net/npm/katex@0.11.1/dist/katex.min.js"
//! highlight_styles = "https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@9.18.1/build/styles"
//! highlight_theme = "default"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [server]
//! port = 8080
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the site configuration, relative to the source root.
pub const CONFIG_FILE: &str = "mdsite.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `mdsite.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Dev server settings.
    pub server: ServerConfig,
    /// Build pass behaviour.
    pub build: BuildConfig,
    /// CDN locations for math and highlight stylesheets.
    pub cdn: CdnConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("cdn.katex_css", &self.cdn.katex_css),
            ("cdn.katex_js", &self.cdn.katex_js),
            ("cdn.highlight_styles", &self.cdn.highlight_styles),
            ("cdn.highlight_theme", &self.cdn.highlight_theme),
            ("server.host", &self.server.host),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Dev server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Events for the same path arriving within this window trigger a single
    /// rebuild. Zero rebuilds on every event.
    pub debounce_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            debounce_ms: 100,
        }
    }
}

/// Build pass settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Record failing files and keep building instead of stopping at the
    /// first error.
    pub keep_going: bool,
}

/// Stylesheet and script locations linked from generated pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdnConfig {
    /// KaTeX stylesheet, linked when a page sets `math = yes`.
    pub katex_css: String,
    /// Subresource integrity hash for `katex_css`. Empty omits the attribute.
    pub katex_css_integrity: String,
    /// KaTeX script used to typeset the math markup in the browser.
    pub katex_js: String,
    /// Base URL of the highlight.js theme stylesheets.
    pub highlight_styles: String,
    /// Theme used when a page enables code highlighting without naming one.
    pub highlight_theme: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            katex_css: "https://cdn.jsdelivr.net/npm/katex@0.11.1/dist/katex.min.css".to_string(),
            katex_css_integrity:
                "sha384-zB1R0rpPzHqg7Kpt0Aljp8JPLqbXI3bhnPWROx27a9N0Ll6ZP/+DiW/UqRcLbRjq"
                    .to_string(),
            katex_js: "https://cdn.jsdelivr.net/npm/katex@0.11.1/dist/katex.min.js".to_string(),
            highlight_styles:
                "https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@9.18.1/build/styles"
                    .to_string(),
            highlight_theme: "default".to_string(),
        }
    }
}

impl CdnConfig {
    /// URL of the stylesheet for a highlight theme.
    pub fn highlight_theme_url(&self, theme: &str) -> String {
        format!(
            "{}/{}.min.css",
            self.highlight_styles.trim_end_matches('/'),
            theme
        )
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Load `mdsite.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Deserialize an optional user overlay on top of the defaults and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = match overlay {
        Some(value) => value.try_into()?,
        None => SiteConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Load config from `mdsite.toml` in the given directory.
///
/// Missing file means stock defaults. Unknown keys and invalid values are
/// errors.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(root)?)
}
