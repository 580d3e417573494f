use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tokio::fs;
use tracing::debug;

use crate::AppState;
use crate::error::ServerError;
use crate::paths::{self, ResolvedPath};
use crate::render::{self, RequestMode};
use crate::theme::{self, CODE_THEME_ROUTE_PREFIX, ThemeSelection};

/// Query parameters understood by the dispatcher.
///
/// `raw` and `dl` are presence flags: any value, including none, turns them on.
#[derive(Debug, Default)]
pub struct ViewQuery {
    pub page_theme: Option<String>,
    pub code_theme: Option<String>,
    pub raw: bool,
    pub dl: bool,
}

impl ViewQuery {
    fn from_params(mut params: HashMap<String, String>) -> Self {
        Self {
            page_theme: params.remove("page_theme"),
            code_theme: params.remove("code_theme"),
            raw: params.contains_key("raw"),
            dl: params.contains_key("dl"),
        }
    }
}

/// GET /{*path} - Serve a directory, a file, or a rendered Markdown page
pub async fn dispatch(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ServerError> {
    let request_path = uri.path();
    let query = ViewQuery::from_params(params);

    // Only bundled slugs are intercepted; anything else under the prefix is a regular path.
    if let Some(response) = request_path
        .strip_prefix(CODE_THEME_ROUTE_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(code_theme_stylesheet)
    {
        return Ok(response);
    }

    let resolved = paths::resolve(&state.root_dir, request_path)?;
    let metadata = fs::metadata(resolved.as_path())
        .await
        .map_err(|e| ServerError::from_io("stat", resolved.as_path(), e))?;

    let themes = ThemeSelection::select(
        &state.page_themes,
        &state.code_themes,
        query.page_theme.as_deref(),
        query.code_theme.as_deref(),
    );

    let mode = if metadata.is_dir() {
        RequestMode::DirectoryListing
    } else {
        RequestMode::for_file(query.raw, query.dl)
    };
    debug!("{} -> {:?} ({})", request_path, mode, resolved.as_path().display());

    match mode {
        RequestMode::DirectoryListing => serve_directory(&state, &uri, &resolved, &themes).await,
        RequestMode::Raw => render::raw_markdown(&resolved).await,
        RequestMode::Download => render::download(&resolved).await,
        RequestMode::Render if resolved.is_markdown() => {
            render::markdown_page(&resolved, &themes).await
        }
        RequestMode::Render => render::static_file(resolved.as_path()).await,
    }
}

/// Redirect to the slash form, then prefer `index.html` over a generated listing.
async fn serve_directory(
    state: &AppState,
    uri: &Uri,
    dir: &ResolvedPath,
    themes: &ThemeSelection<'_>,
) -> Result<Response, ServerError> {
    let request_path = uri.path();
    if !request_path.ends_with('/') {
        // Collapse leading slashes so `//host/..` can't become a protocol-relative URL.
        let target = format!("/{}/", request_path.trim_start_matches('/'));
        let location = match uri.query() {
            Some(q) => format!("{}?{}", target, q),
            None => target,
        };
        return Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response());
    }

    let index = paths::resolve_child(&state.root_dir, dir, "index.html")?;
    if fs::metadata(index.as_path())
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        debug!("Serving index: {}", index.as_path().display());
        return render::static_file(index.as_path()).await;
    }

    let display_path = paths::decode_request_path(request_path);
    render::directory_listing(dir, &display_path, themes).await
}

/// GET /_mdserve/code-themes/{slug}.css - Class-based CSS for a bundled syntect theme
fn code_theme_stylesheet(file: &str) -> Option<Response> {
    let css = file.strip_suffix(".css").and_then(theme::code_theme_css)?;

    Some((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        css,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_view_query_flags_are_presence_only() {
        let query = ViewQuery::from_params(params(&[("raw", ""), ("dl", "0")]));
        assert!(query.raw);
        assert!(query.dl);

        let query = ViewQuery::from_params(params(&[("page_theme", "/x.css")]));
        assert!(!query.raw);
        assert!(!query.dl);
        assert_eq!(query.page_theme.as_deref(), Some("/x.css"));
        assert_eq!(query.code_theme, None);
    }

    #[test]
    fn test_code_theme_stylesheet() {
        let response = code_theme_stylesheet("inspiredgithub.css").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );

        assert!(code_theme_stylesheet("inspiredgithub").is_none());
        assert!(code_theme_stylesheet("nope.css").is_none());
    }
}
