//! Runtime configuration for the documentation cache.
//!
//! Every field has a compiled-in default so the server works without a config
//! file. A JSON file may override any subset of fields, e.g. to follow markup
//! changes on the documentation site without a rebuild:
//!
//! ```json
//! { "content_selectors": [".markdown-section", "article"], "ttl_secs": 600 }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://wproxy.org/whistle/";
pub const DEFAULT_CACHE_SUBDIR: &str = "whistle-docs-cache";
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocsConfig {
    /// Root of the documentation site. Also the index page that gets crawled.
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub ttl_secs: u64,
    /// Path prefix stripped from section URLs when deriving ids.
    pub path_prefix: String,
    /// Page extension stripped from section URLs when deriving ids.
    pub page_extension: String,
    /// Navigation selectors, tried in order; the first one with links wins.
    pub index_selectors: Vec<String>,
    /// Content container selectors, tried in order; the first non-empty one wins.
    pub content_selectors: Vec<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: std::env::temp_dir().join(DEFAULT_CACHE_SUBDIR),
            ttl_secs: DEFAULT_TTL_SECS,
            path_prefix: "/whistle/".to_string(),
            page_extension: ".html".to_string(),
            index_selectors: [
                ".sidebar a",
                ".summary a",
                "nav a",
                ".menu a",
                ".toc a",
            ]
            .map(String::from)
            .to_vec(),
            content_selectors: [
                ".markdown-section",
                ".page-inner",
                "article",
                "main",
                ".content",
                "#content",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl DocsConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Parses `base_url`, adding the trailing slash `Url::join` needs to
    /// resolve relative links below it.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }
}
