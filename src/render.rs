//! Response bodies for each request mode.
//!
//! Every function here takes a [`ResolvedPath`] (or a path derived from one by
//! joining a fixed child name), reads the whole file into memory, and builds
//! the finished response.

use std::path::Path;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::fs;
use tracing::debug;

use crate::error::ServerError;
use crate::markdown::{self, html_escape};
use crate::paths::ResolvedPath;
use crate::theme::{Theme, ThemeCatalog, ThemeSelection};

const HTML: &str = "text/html; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// How a request for an existing entry should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Render,
    Raw,
    Download,
    DirectoryListing,
}

impl RequestMode {
    /// Mode for a regular file. `raw` wins over `dl` when both are present.
    pub fn for_file(raw: bool, dl: bool) -> Self {
        if raw {
            RequestMode::Raw
        } else if dl {
            RequestMode::Download
        } else {
            RequestMode::Render
        }
    }
}

/// Serve the bytes of a Markdown file as plain text.
pub async fn raw_markdown(path: &ResolvedPath) -> Result<Response, ServerError> {
    if !path.is_markdown() {
        return Err(ServerError::NotFound {
            path: path.as_path().to_path_buf(),
        });
    }

    let bytes = read_file(path.as_path()).await?;
    Ok(ok_response(PLAIN, bytes))
}

/// Serve the bytes of any file as an attachment.
pub async fn download(path: &ResolvedPath) -> Result<Response, ServerError> {
    let bytes = read_file(path.as_path()).await?;
    let file_name = path.file_name().unwrap_or_else(|| "download".to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, OCTET_STREAM.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", disposition_filename(&file_name)),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Serve a file as-is, with a content type guessed from its extension.
pub async fn static_file(path: &Path) -> Result<Response, ServerError> {
    let bytes = read_file(path).await?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = if mime.type_() == mime_guess::mime::TEXT {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    };

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Render a Markdown file into the themed document shell.
pub async fn markdown_page(
    path: &ResolvedPath,
    themes: &ThemeSelection<'_>,
) -> Result<Response, ServerError> {
    let bytes = read_file(path.as_path()).await?;
    let source = String::from_utf8_lossy(&bytes).into_owned();

    debug!("Rendering markdown: {}", path.as_path().display());

    // comrak/syntect are CPU bound
    let fragment = tokio::task::spawn_blocking(move || markdown::render(&source))
        .await
        .map_err(|e| ServerError::Io {
            op: "render markdown",
            path: path.as_path().to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    let title = path.file_name().unwrap_or_default();
    let page = document(&title, themes, true, &fragment);
    Ok(ok_response(HTML, page))
}

/// List the immediate children of a directory as links.
///
/// `display_path` is the decoded URL path of the directory, used for the heading.
pub async fn directory_listing(
    dir: &ResolvedPath,
    display_path: &str,
    themes: &ThemeSelection<'_>,
) -> Result<Response, ServerError> {
    let mut entries = fs::read_dir(dir.as_path())
        .await
        .map_err(|e| ServerError::from_io("read_dir", dir.as_path(), e))?;

    let mut children: Vec<(String, bool)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ServerError::from_io("read_dir", dir.as_path(), e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follow symlinks so a linked directory still gets its trailing slash.
        let is_dir = fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        children.push((name, is_dir));
    }
    children.sort_by_key(|(name, _)| name.to_lowercase());

    let theme_query = format!("?page_theme={}", urlencoding::encode(&themes.page.url));
    let mut body = String::new();
    let heading = html_escape(&format!("Directory listing for {}", display_path));
    body.push_str(&format!("<h1>{}</h1>\n<hr>\n<ul>\n", heading));
    for (name, is_dir) in &children {
        let suffix = if *is_dir { "/" } else { "" };
        let href = format!("{}{}{}", urlencoding::encode(name), suffix, theme_query);
        body.push_str(&format!(
            "<li><a href=\"{}\">{}{}</a></li>\n",
            html_escape(&href),
            html_escape(name),
            suffix
        ));
    }
    body.push_str("</ul>\n<hr>\n");

    let page = document(
        &format!("Directory listing for {}", display_path),
        themes,
        false,
        &body,
    );
    Ok(ok_response(HTML, page))
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ServerError> {
    fs::read(path)
        .await
        .map_err(|e| ServerError::from_io("read", path, e))
}

fn ok_response(content_type: &'static str, body: impl IntoResponse) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Bare filename when it is a plain token, otherwise a quoted string.
fn disposition_filename(name: &str) -> String {
    let is_token = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if is_token {
        name.to_string()
    } else {
        let safe: String = name
            .chars()
            .map(|c| if c == '"' || c.is_control() { '\'' } else { c })
            .collect();
        format!("\"{}\"", safe)
    }
}

/// Append a cache-busting timestamp so theme switches always refetch.
fn stamped(url: &str, stamp: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, sep, stamp)
}

fn theme_options(catalog: &ThemeCatalog, selected: &Theme) -> String {
    let mut out = String::new();
    for theme in catalog.themes() {
        let marker = if theme.url == selected.url {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            html_escape(&theme.url),
            marker,
            html_escape(&theme.name)
        ));
    }
    out
}

fn toolbar(themes: &ThemeSelection<'_>, with_code: bool) -> String {
    let mut out = String::from("<nav id=\"mdserve-toolbar\">\n");
    out.push_str(&format!(
        "<label><input type=\"checkbox\" id=\"page-theme-enabled\" checked> Page theme</label>\n\
         <select id=\"page-theme-select\">{}</select>\n",
        theme_options(themes.page_catalog, themes.page)
    ));
    if with_code {
        out.push_str(&format!(
            "<label><input type=\"checkbox\" id=\"code-theme-enabled\" checked> Code theme</label>\n\
             <select id=\"code-theme-select\">{}</select>\n",
            theme_options(themes.code_catalog, themes.code)
        ));
    }
    out.push_str("</nav>\n");
    out
}

/// Wrap `content` in the full HTML document: stylesheets, toolbar, container.
fn document(title: &str, themes: &ThemeSelection<'_>, with_code: bool, content: &str) -> String {
    let stamp = chrono::Utc::now().timestamp_millis();

    let mut page = String::with_capacity(content.len() + 4096);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    page.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    page.push_str(&format!(
        "<link rel=\"stylesheet\" id=\"page-theme\" href=\"{}\">\n",
        html_escape(&stamped(&themes.page.url, stamp))
    ));
    if with_code {
        page.push_str(&format!(
            "<link rel=\"stylesheet\" id=\"code-theme\" href=\"{}\">\n",
            html_escape(&stamped(&themes.code.url, stamp))
        ));
    }
    page.push_str(TOOLBAR_STYLE);
    page.push_str("</head>\n<body>\n");
    page.push_str(&toolbar(themes, with_code));
    page.push_str("<article class=\"markdown-body\">\n");
    page.push_str(content);
    page.push_str("</article>\n");
    page.push_str(TOOLBAR_SCRIPT);
    page.push_str("</body>\n</html>\n");
    page
}

const TOOLBAR_STYLE: &str = r#"<style>
#mdserve-toolbar { display: flex; gap: 0.5em; align-items: center; flex-wrap: wrap;
  padding: 0.4em 0.8em; font: 13px system-ui, sans-serif; border-bottom: 1px solid #8884; }
#mdserve-toolbar select { font: inherit; }
.markdown-body { box-sizing: border-box; max-width: 980px; margin: 0 auto; padding: 32px; }
</style>
"#;

const TOOLBAR_SCRIPT: &str = r#"<script>
(function () {
  function stamped(url) {
    return url + (url.indexOf('?') === -1 ? '?' : '&') + 't=' + Date.now();
  }
  function setParam(name, value) {
    var here = new URL(window.location.href);
    here.searchParams.set(name, value);
    window.history.replaceState(null, '', here.toString());
  }
  function carryPageTheme(url) {
    var anchors = document.querySelectorAll('a[href]');
    for (var i = 0; i < anchors.length; i++) {
      var target = new URL(anchors[i].getAttribute('href'), window.location.href);
      if (target.origin !== window.location.origin) { continue; }
      target.searchParams.set('page_theme', url);
      anchors[i].setAttribute('href', target.toString());
    }
  }
  function bind(kind, onSelect) {
    var link = document.getElementById(kind + '-theme');
    var select = document.getElementById(kind + '-theme-select');
    var toggle = document.getElementById(kind + '-theme-enabled');
    if (!link || !select || !toggle) { return; }
    toggle.addEventListener('change', function () {
      link.disabled = !toggle.checked;
    });
    select.addEventListener('change', function () {
      link.href = stamped(select.value);
      setParam(kind + '_theme', select.value);
      if (onSelect) { onSelect(select.value); }
    });
  }
  bind('page', carryPageTheme);
  bind('code', null);
})();
</script>
"#;
