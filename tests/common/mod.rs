//! Test utilities and common setup.

use std::fs;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tempfile::TempDir;
use tower::ServiceExt;

use mdserve::{AppState, Config, Credentials, routes};

/// Populate a served tree:
///
/// ```text
/// a.md
/// notes.txt
/// sub/x.md
/// sub/y/
/// site/index.html
/// site/readme.md
/// ```
fn seed(root: &std::path::Path) {
    fs::write(root.join("a.md"), "# Hi\n\nSome `code` here.\n").unwrap();
    fs::write(root.join("notes.txt"), "just text").unwrap();
    fs::create_dir_all(root.join("sub/y")).unwrap();
    fs::write(root.join("sub/x.md"), "x").unwrap();
    fs::create_dir_all(root.join("site")).unwrap();
    fs::write(root.join("site/index.html"), "<p>home page</p>").unwrap();
    fs::write(root.join("site/readme.md"), "readme").unwrap();
}

/// Create a test application serving a fresh temp directory.
///
/// The returned `TempDir` must be kept alive for as long as the router is used.
pub fn test_app_with(credentials: Credentials) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    let state = AppState::new(temp_dir.path().to_path_buf(), credentials, Config::default())
        .unwrap();
    (routes::build_router(state), temp_dir)
}

/// Create a test application with authentication disabled.
pub fn test_app() -> (Router, TempDir) {
    test_app_with(Credentials::default())
}

/// `Authorization` header value for the given pair.
pub fn basic_auth(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

/// Send a GET for `uri` and return the response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
