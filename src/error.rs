use std::path::PathBuf;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Challenge sent with every 401 so browsers re-prompt for credentials.
pub const BASIC_CHALLENGE: &str = r#"Basic realm="mdserve", charset="UTF-8""#;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Missing or invalid credentials")]
    Unauthorized,

    #[error("Path is outside root directory: {path}")]
    Traversal { path: String },

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("IO error during {op} on {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ServerError {
    /// Classify an I/O failure: a missing entry is a 404, anything else a 500.
    pub fn from_io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if matches!(
            source.kind(),
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
        ) {
            ServerError::NotFound { path }
        } else {
            ServerError::Io { op, path, source }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Traversal { .. } => StatusCode::FORBIDDEN,
            ServerError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-visible body. Never includes filesystem paths.
    fn public_message(&self) -> &'static str {
        match self {
            ServerError::Unauthorized => "Unauthorized",
            ServerError::Traversal { .. } => "Forbidden",
            ServerError::NotFound { .. } => "File not found",
            ServerError::Io { .. } => "Internal Server Error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Unauthorized => warn!("Rejected request: {}", self),
            ServerError::Traversal { .. } => warn!("Blocked traversal attempt: {}", self),
            ServerError::NotFound { .. } => debug!("{}", self),
            ServerError::Io { .. } => error!("{}", self),
        }

        let status = self.status_code();
        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.public_message(),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_CHALLENGE),
            );
        }

        response
    }
}

/// Errors raised while loading or validating configuration at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot open root directory {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("root path is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    #[error("theme catalog '{0}' must contain at least one theme")]
    EmptyCatalog(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = ServerError::from_io(
            "read",
            "/srv/missing.md",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, ServerError::NotFound { .. }));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_permission_denied_maps_to_internal() {
        let err = ServerError::from_io(
            "read",
            "/srv/locked.md",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ServerError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            BASIC_CHALLENGE
        );
    }

    #[test]
    fn test_forbidden_does_not_carry_challenge() {
        let response = ServerError::Traversal {
            path: "/../etc/passwd".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
