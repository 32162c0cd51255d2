//! HTML extraction rules
//!
//! One module per page type. Each rule takes an already validated
//! [`scraper::Html`] document and returns owned records, so documents never
//! outlive the synchronous extraction step.

pub mod branches;
pub mod changelog;
pub mod releases;
pub mod roadmap;

use scraper::{ElementRef, Selector};
use url::Url;

/// Parse a selector literal
///
/// All selectors in this crate are static strings; an invalid one falls back
/// to a selector that matches nothing.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css)
        .or_else(|_| Selector::parse("*:not(*)"))
        .expect("fallback selector is valid")
}

/// Whitespace-collapsed text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `href` against `base`, keeping already absolute http(s) links
pub(crate) fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<p>  Ruby \n  <b>3.3.0</b>\t released </p>");
        let p = html.select(&selector("p")).next().unwrap();
        assert_eq!(element_text(p), "Ruby 3.3.0 released");
    }

    #[test]
    fn test_resolve_link() {
        let base = "https://www.ruby-lang.org";
        assert_eq!(
            resolve_link(base, "/en/news/2023/12/25/ruby-3-3-0-released/"),
            Some("https://www.ruby-lang.org/en/news/2023/12/25/ruby-3-3-0-released/".to_string())
        );
        assert_eq!(
            resolve_link(base, "https://cache.ruby-lang.org/pub/ruby/3.3/ruby-3.3.0.tar.gz"),
            Some("https://cache.ruby-lang.org/pub/ruby/3.3/ruby-3.3.0.tar.gz".to_string())
        );
        assert_eq!(resolve_link(base, "#top"), None);
        assert_eq!(resolve_link(base, "  "), None);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let html = Html::parse_fragment("<p>text</p>");
        assert_eq!(html.select(&selector("p[")).count(), 0);
    }
}
