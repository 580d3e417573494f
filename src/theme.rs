//! Page and code-highlight theme catalogs.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use syntect::highlighting::ThemeSet;

use crate::error::ConfigError;

/// URL prefix under which the built-in code-theme stylesheets are served.
pub const CODE_THEME_ROUTE_PREFIX: &str = "/_mdserve/code-themes";

pub static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub url: String,
}

impl Theme {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// An ordered, non-empty allow-list of themes. The first entry is the default.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    pub fn new(label: &'static str, themes: Vec<Theme>) -> Result<Self, ConfigError> {
        if themes.is_empty() {
            return Err(ConfigError::EmptyCatalog(label));
        }
        Ok(Self { themes })
    }

    pub fn default_theme(&self) -> &Theme {
        &self.themes[0]
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// Pick the theme whose URL matches `selected` exactly, else the default.
    pub fn resolve(&self, selected: Option<&str>) -> &Theme {
        selected
            .and_then(|url| self.themes.iter().find(|theme| theme.url == url))
            .unwrap_or_else(|| self.default_theme())
    }
}

/// Themes chosen for one response, together with the catalogs offered in the toolbar.
#[derive(Debug, Clone, Copy)]
pub struct ThemeSelection<'a> {
    pub page_catalog: &'a ThemeCatalog,
    pub code_catalog: &'a ThemeCatalog,
    pub page: &'a Theme,
    pub code: &'a Theme,
}

impl<'a> ThemeSelection<'a> {
    /// Resolve the `page_theme` and `code_theme` query values independently.
    pub fn select(
        page_catalog: &'a ThemeCatalog,
        code_catalog: &'a ThemeCatalog,
        page_theme: Option<&str>,
        code_theme: Option<&str>,
    ) -> Self {
        Self {
            page_catalog,
            code_catalog,
            page: page_catalog.resolve(page_theme),
            code: code_catalog.resolve(code_theme),
        }
    }
}

pub fn default_page_themes() -> Vec<Theme> {
    vec![
        Theme::new(
            "GitHub Light",
            "https://cdn.jsdelivr.net/npm/github-markdown-css@5/github-markdown-light.css",
        ),
        Theme::new(
            "GitHub Dark",
            "https://cdn.jsdelivr.net/npm/github-markdown-css@5/github-markdown-dark.css",
        ),
        Theme::new(
            "GitHub Auto",
            "https://cdn.jsdelivr.net/npm/github-markdown-css@5/github-markdown.css",
        ),
        Theme::new("Water Light", "https://cdn.jsdelivr.net/npm/water.css@2/out/light.css"),
        Theme::new("Water Dark", "https://cdn.jsdelivr.net/npm/water.css@2/out/dark.css"),
        Theme::new("Sakura", "https://cdn.jsdelivr.net/npm/sakura.css/css/sakura.css"),
        Theme::new(
            "Sakura Dark",
            "https://cdn.jsdelivr.net/npm/sakura.css/css/sakura-dark.css",
        ),
    ]
}

/// Code themes backed by syntect's bundled theme set, served locally.
pub fn default_code_themes() -> Vec<Theme> {
    [
        ("InspiredGitHub", "InspiredGitHub"),
        ("Base16 Ocean Dark", "base16-ocean.dark"),
        ("Base16 Ocean Light", "base16-ocean.light"),
        ("Base16 Eighties Dark", "base16-eighties.dark"),
        ("Base16 Mocha Dark", "base16-mocha.dark"),
        ("Solarized Dark", "Solarized (dark)"),
        ("Solarized Light", "Solarized (light)"),
    ]
    .into_iter()
    .map(|(name, key)| Theme::new(name, code_theme_url(key)))
    .collect()
}

pub fn code_theme_url(syntect_name: &str) -> String {
    format!("{}/{}.css", CODE_THEME_ROUTE_PREFIX, slugify(syntect_name))
}

/// Lowercase alphanumerics, everything else collapsed to single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Look up a bundled syntect theme by slug and render it as class-based CSS.
pub fn code_theme_css(slug: &str) -> Option<String> {
    let theme = THEME_SET
        .themes
        .iter()
        .find(|(name, _)| slugify(name) == slug)
        .map(|(_, theme)| theme)?;

    syntect::html::css_for_theme_with_class_style(theme, syntect::html::ClassStyle::Spaced).ok()
}
