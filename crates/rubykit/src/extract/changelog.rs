//! Changelog and release-notes extraction
//!
//! Extraction runs as an ordered pipeline:
//!
//! 1. pick the first content container that yields text, primary site
//!    containers before generic fallbacks;
//! 2. render it to text, skipping navigation and other page chrome;
//! 3. [`clean_text`]: strip boilerplate phrases, commit hashes and trailing
//!    issue references, filter short and author-attribution lines, collapse
//!    blank runs and truncate.
//!
//! [`clean_text`] is also applied to plain-text sources such as release
//! bodies fetched from a source-forge API.

use super::selector;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Node, Selector};

/// Maximum length of cleaned content, in characters
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Appended when content was truncated
pub const TRUNCATION_MARKER: &str = "...";

/// Lines shorter than this are dropped
const MIN_LINE_CHARS: usize = 10;

/// Content containers, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    "#content .post",
    "#content",
    ".markdown-body",
    "article",
    "main",
    ".content",
    "body",
];

/// Page chrome removed from the selected container
const CHROME_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "template",
    "svg",
    "button",
    "form",
    ".sidebar",
    "#sidebar",
    ".navigation",
    ".breadcrumb",
    ".toc",
    ".post-info",
    ".share",
    "#footer",
    "#header",
];

/// Elements rendered on their own line
const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "section",
    "article",
    "main",
    "br",
    "li",
    "ul",
    "ol",
    "dl",
    "dt",
    "dd",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "tr",
    "table",
    "pre",
    "blockquote",
    "hr",
];

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)sign in to (?:view|see|comment|change)[^\n]*",
        r"(?i)you must be (?:logged|signed) in[^\n]*",
        r"(?i)you signed (?:in|out) (?:with|in) another tab or window\.?[^\n]*",
        r"(?i)reload to refresh your session\.?",
        r"(?i)uh oh!?\s*there was an error while loading\.?",
        r"(?i)please reload this page\.?",
        r"(?i)you can'?t perform that action at this time\.?",
        r"(?i)\bloading(?:\.\.\.|…)",
        r"(?i)skip to content",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static HEX_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9a-f]{7,40}\b").expect("valid regex"));

static TRAILING_ISSUE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]*\(?#\d+\)?[ \t]*$").expect("valid regex"));

static PERSONAL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+(?: [A-Z][a-z]+){1,2}$").expect("valid regex"));

static TRAILING_BOILERPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:No changes\.?|Guides)$").expect("valid regex"));

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){3,}").expect("valid regex"));

/// Extract cleaned changelog text from a page, if any container yields it
pub fn extract(document: &Html) -> Option<String> {
    let chrome: Vec<Selector> = CHROME_SELECTORS.iter().map(|css| selector(css)).collect();

    CONTENT_SELECTORS.iter().find_map(|css| {
        let container = document.select(&selector(css)).next()?;
        let mut raw = String::new();
        render_text(container, &chrome, &mut raw);
        clean_text(&raw)
    })
}

/// Render an element to text, one line per block element
fn render_text(element: ElementRef<'_>, chrome: &[Selector], out: &mut String) {
    if chrome.iter().any(|s| s.matches(&element)) {
        return;
    }

    let name = element.value().name();
    let is_block = BLOCK_ELEMENTS.contains(&name);
    let preformatted = name == "pre";

    if is_block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            render_text(child_element, chrome, out);
        } else if let Node::Text(text) = child.value() {
            if preformatted {
                out.push_str(text);
            } else {
                push_collapsed(out, text);
            }
        }
    }
    if is_block {
        out.push('\n');
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    let mut last_space = out.ends_with(' ') || out.ends_with('\n') || out.is_empty();
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }
}

/// Clean raw changelog text; `None` when nothing useful remains
pub fn clean_text(raw: &str) -> Option<String> {
    let mut text = raw.replace("\r\n", "\n");

    for pattern in BOILERPLATE.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }

    text = HEX_TOKEN
        .replace_all(&text, |caps: &Captures<'_>| {
            let token = &caps[0];
            let has_digit = token.chars().any(|c| c.is_ascii_digit());
            let has_letter = token.chars().any(|c| c.is_ascii_alphabetic());
            if has_digit && has_letter {
                String::new()
            } else {
                token.to_string()
            }
        })
        .into_owned();

    text = TRAILING_ISSUE_REF.replace_all(&text, "").into_owned();

    let lines = filter_lines(&text);
    let joined = lines.join("\n");
    let collapsed = BLANK_RUNS.replace_all(&joined, "\n\n");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        return None;
    }
    Some(truncate(trimmed, MAX_CONTENT_CHARS))
}

fn filter_lines(text: &str) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        let content = line.trim();

        if content.is_empty() {
            kept.push(String::new());
            continue;
        }
        if content.chars().count() < MIN_LINE_CHARS {
            continue;
        }
        if PERSONAL_NAME.is_match(content) {
            let previous = kept.iter().rev().find(|l| !l.trim().is_empty());
            let is_attribution = match previous {
                None => true,
                Some(prev) => prev.trim_end().ends_with(['.', '!', '?']),
            };
            if is_attribution {
                continue;
            }
        }
        kept.push(line.to_string());
    }

    while let Some(last) = kept.last() {
        let last = last.trim();
        if last.is_empty() || TRAILING_BOILERPLATE.is_match(last) {
            kept.pop();
        } else {
            break;
        }
    }

    kept
}

/// Truncate to `max_chars`, preferring the last paragraph boundary
pub fn truncate(text: &str, max_chars: usize) -> String {
    let byte_limit = match text.char_indices().nth(max_chars) {
        None => return text.to_string(),
        Some((idx, _)) => idx,
    };

    let head = &text[..byte_limit];
    let cut = match head.rfind("\n\n") {
        Some(idx) if idx > 0 => &head[..idx],
        _ => head,
    };

    let mut truncated = cut.trim_end().to_string();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!(
            "<!DOCTYPE html><html><body>{}</body></html>",
            body
        ))
    }

    #[test]
    fn test_extract_prefers_primary_container() {
        let document = page(
            r#"<div id="header">Ruby Programming Language Home</div>
<div id="content">
  <div class="post">
    <h2>Ruby 3.3.0 Released</h2>
    <p>We are pleased to announce the release of Ruby 3.3.0.</p>
    <p class="post-info">Posted by naruse on 25 Dec 2023</p>
  </div>
</div>
<div id="sidebar">Recent news and other sidebar links</div>"#,
        );
        let text = extract(&document).unwrap();
        assert!(text.contains("Ruby 3.3.0 Released"));
        assert!(text.contains("We are pleased to announce the release of Ruby 3.3.0."));
        assert!(!text.contains("Posted by"));
        assert!(!text.contains("sidebar"));
        assert!(!text.contains("Programming Language Home"));
    }

    #[test]
    fn test_extract_falls_back_to_generic_container() {
        let document = page(
            r#"<nav>Home | Docs | Blog | Community</nav>
<main><h1>Changelog for version 2.0</h1><ul><li>Added a brand new parser</li></ul></main>
<footer>Copyright footer text here</footer>"#,
        );
        let text = extract(&document).unwrap();
        assert!(text.contains("Changelog for version 2.0"));
        assert!(text.contains("Added a brand new parser"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Community"));
    }

    #[test]
    fn test_extract_none_when_only_chrome() {
        let document = page("<nav>Only navigation</nav><footer>And a footer</footer>");
        assert_eq!(extract(&document), None);
    }

    #[test]
    fn test_clean_strips_boilerplate_and_hashes() {
        let raw = "Fixed a memory leak in the parser 1a2b3c4d5e6f\n\
                   Sign in to view the full diff\n\
                   Improved error messages for users (#1234)\n\
                   Bumped dependency versions deadbeef\n";
        let text = clean_text(raw).unwrap();
        assert!(text.contains("Fixed a memory leak in the parser"));
        assert!(!text.contains("1a2b3c4d5e6f"));
        assert!(!text.contains("Sign in"));
        assert!(text.contains("Improved error messages for users"));
        assert!(!text.contains("#1234"));
        // Pure-letter hex words are not commit hashes
        assert!(text.contains("deadbeef"));
    }

    #[test]
    fn test_clean_drops_short_lines() {
        let raw = "Features\nAdded support for pattern matching everywhere\nFix\n";
        let text = clean_text(raw).unwrap();
        assert_eq!(text, "Added support for pattern matching everywhere");
    }

    #[test]
    fn test_clean_drops_author_attribution() {
        let raw = "Yukihiro Matsumoto\n\
                   Improved the garbage collector significantly.\n\
                   Koichi Sasada\n\
                   Another change without final punctuation\n\
                   Samuel Williams\n";
        let text = clean_text(raw).unwrap();
        assert!(!text.contains("Yukihiro Matsumoto"));
        assert!(!text.contains("Koichi Sasada"));
        // Preceding line has no sentence-ending punctuation
        assert!(text.contains("Samuel Williams"));
    }

    #[test]
    fn test_clean_drops_trailing_boilerplate() {
        let raw = "Action Pack improvements for routing\n\nNo changes.\n\n";
        let text = clean_text(raw).unwrap();
        assert_eq!(text, "Action Pack improvements for routing");
    }

    #[test]
    fn test_clean_collapses_blank_runs() {
        let raw = "First paragraph of the notes\n\n\n\n\n\nSecond paragraph of the notes";
        let text = clean_text(raw).unwrap();
        assert_eq!(
            text,
            "First paragraph of the notes\n\nSecond paragraph of the notes"
        );
    }

    #[test]
    fn test_clean_empty_is_none() {
        assert_eq!(clean_text(""), None);
        assert_eq!(clean_text("short\ntiny\n"), None);
    }

    #[test]
    fn test_truncate_at_paragraph_boundary() {
        let paragraph = "x".repeat(4_000);
        let text = format!("{p}\n\n{p}\n\n{p}", p = paragraph);
        let truncated = truncate(&text, MAX_CONTENT_CHARS);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncated.chars().count(), 8_002 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_truncate_hard_cut() {
        let text = "y".repeat(12_000);
        let truncated = truncate(&text, MAX_CONTENT_CHARS);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS + 3);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_no_marker_without_truncation() {
        let text = "z".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate(&text, MAX_CONTENT_CHARS), text);
    }

    #[test]
    fn test_clean_text_length_bound() {
        let line = "A reasonably long changelog line describing a change.";
        let raw = vec![line; 400].join("\n");
        let text = clean_text(&raw).unwrap();
        assert!(text.chars().count() <= MAX_CONTENT_CHARS + 3);
        assert!(text.ends_with(TRUNCATION_MARKER));
    }
}
