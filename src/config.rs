use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::theme::{Theme, ThemeCatalog, default_code_themes, default_page_themes};

/// Server configuration, optionally loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page stylesheets offered in the toolbar; the first is the default
    #[serde(default = "default_page_themes")]
    pub page_themes: Vec<Theme>,

    /// Code-highlight stylesheets offered in the toolbar; the first is the default
    #[serde(default = "default_code_themes")]
    pub code_themes: Vec<Theme>,

    /// Upper bound on handling a single request (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long in-flight requests may run after a shutdown signal (in seconds)
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_themes: default_page_themes(),
            code_themes: default_code_themes(),
            request_timeout_secs: default_request_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn page_catalog(&self) -> Result<ThemeCatalog, ConfigError> {
        ThemeCatalog::new("page_themes", self.page_themes.clone())
    }

    pub fn code_catalog(&self) -> Result<ThemeCatalog, ConfigError> {
        ThemeCatalog::new("code_themes", self.code_themes.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
