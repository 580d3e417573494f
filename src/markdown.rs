//! Markdown to HTML conversion.
//!
//! Uses comrak for CommonMark + GFM parsing and syntect for code blocks.
//! Code is emitted with CSS classes rather than inline colours so the
//! code-theme stylesheet chosen in the toolbar decides how it looks.

use comrak::plugins::syntect::SyntectAdapter;
use comrak::options::Plugins;
use comrak::{Options, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;

// `None` selects class-based output instead of a baked-in theme.
static SYNTECT_ADAPTER: Lazy<SyntectAdapter> = Lazy::new(|| SyntectAdapter::new(None));

/// Render a Markdown document to an HTML fragment.
pub fn render(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.parse.smart = true;
    options.render.r#unsafe = true; // Raw HTML passes through

    let mut plugins = Plugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&*SYNTECT_ADAPTER);

    markdown_to_html_with_plugins(markdown, &options, &plugins)
}

/// Escape HTML entities
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading() {
        assert_eq!(render("# Hi").trim(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_table() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let html = render("<div class=\"note\">kept</div>\n");
        assert!(html.contains("<div class=\"note\">kept</div>"));
    }

    #[test]
    fn test_autolink() {
        let html = render("see https://example.com now");
        assert!(html.contains("<a href=\"https://example.com\">"));
    }

    #[test]
    fn test_smart_punctuation() {
        let html = render("\"quoted\" -- dash");
        assert!(html.contains('\u{201c}'));
        assert!(html.contains('\u{2013}'));
    }

    #[test]
    fn test_code_block_uses_classes() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre"));
        assert!(html.contains("class="));
        assert!(!html.contains("style=\"color"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }
}
