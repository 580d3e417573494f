//! Local file server that renders Markdown as themed HTML.
//!
//! The request pipeline is: authentication ([`auth`]), path resolution
//! ([`paths`]), mode selection ([`handlers`]), and response rendering
//! ([`render`]), with theme selection handled by [`theme`].

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod markdown;
pub mod paths;
pub mod render;
pub mod routes;
pub mod theme;
pub mod tls;

use std::path::PathBuf;
use std::sync::Arc;

pub use auth::Credentials;
pub use config::Config;
pub use error::{ConfigError, ServerError};
pub use theme::{Theme, ThemeCatalog};

/// Application state shared across handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Canonical root directory to serve files from
    pub root_dir: PathBuf,
    /// Basic-auth credentials; disabled when both halves are unset
    pub credentials: Arc<Credentials>,
    pub page_themes: Arc<ThemeCatalog>,
    pub code_themes: Arc<ThemeCatalog>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the state, canonicalizing `root_dir` and validating the theme catalogs.
    pub fn new(
        root_dir: PathBuf,
        credentials: Credentials,
        config: Config,
    ) -> Result<Self, ConfigError> {
        let canonical = root_dir
            .canonicalize()
            .map_err(|source| ConfigError::Root {
                path: root_dir.clone(),
                source,
            })?;

        if !canonical.is_dir() {
            return Err(ConfigError::RootNotADirectory(canonical));
        }

        Ok(Self {
            root_dir: canonical,
            credentials: Arc::new(credentials),
            page_themes: Arc::new(config.page_catalog()?),
            code_themes: Arc::new(config.code_catalog()?),
            config: Arc::new(config),
        })
    }
}
