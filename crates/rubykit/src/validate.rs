//! Response integrity checks
//!
//! Raw bodies are inspected for crawler-protection interstitials and other
//! corruption before a format-specific parser sees them. Every rejection is
//! a [`FetchError::CorruptedData`] carrying the body size.

use crate::error::FetchError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde_json::Value;
use tracing::warn;

/// Minimum amount of visible text an HTML page must carry
pub const MIN_HTML_TEXT_LEN: usize = 50;

static JSON_BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cloudflare|ddos protection|access denied|blocked|captcha")
        .expect("valid regex")
});

static HTML_BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cloudflare|ddos protection|access denied|blocked|captcha|rate limit")
        .expect("valid regex")
});

static HTML_MARKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype|<html").expect("valid regex"));

static ERROR_PAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)error 404|page not found|access denied|forbidden|internal server error")
        .expect("valid regex")
});

/// Top-level JSON shape an endpoint requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

/// Parse a JSON body, rejecting interstitials and non-container values
pub fn parse_json(body: &[u8], url: &str) -> Result<Value, FetchError> {
    let size = body.len();
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim_start();

    if trimmed.starts_with('<') && JSON_BLOCK_PATTERN.is_match(&text) {
        warn!(url = %url, "Crawler protection page instead of JSON");
        return Err(FetchError::corrupted(
            format!("Received crawler protection page from {}", url),
            size,
        ));
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            let head = trimmed.get(..trimmed.len().min(16)).unwrap_or("").to_lowercase();
            if head.starts_with("<!doctype") || head.starts_with("<html") {
                return Err(FetchError::corrupted_with(
                    format!("Received HTML instead of JSON from {}", url),
                    size,
                    e,
                ));
            }
            return Err(FetchError::corrupted_with(
                format!("Invalid JSON from {}: {}", url, e),
                size,
                e,
            ));
        }
    };

    if !value.is_object() && !value.is_array() {
        return Err(FetchError::corrupted(
            format!(
                "Unexpected JSON type from {}: expected object or array, got {}",
                url,
                json_type_name(&value)
            ),
            size,
        ));
    }

    Ok(value)
}

/// Parse a JSON body and require a specific top-level shape
pub fn parse_json_shaped(body: &[u8], url: &str, shape: JsonShape) -> Result<Value, FetchError> {
    let value = parse_json(body, url)?;
    let matches = match shape {
        JsonShape::Object => value.is_object(),
        JsonShape::Array => value.is_array(),
    };
    if !matches {
        let expected = match shape {
            JsonShape::Object => "object",
            JsonShape::Array => "array",
        };
        return Err(FetchError::corrupted(
            format!(
                "Unexpected JSON type from {}: expected {}, got {}",
                url,
                expected,
                json_type_name(&value)
            ),
            body.len(),
        ));
    }
    Ok(value)
}

/// Parse an HTML body into a document after integrity checks
pub fn parse_html(body: &[u8], url: &str) -> Result<Html, FetchError> {
    let size = body.len();
    let decoded = String::from_utf8_lossy(body);
    let text = decoded.as_ref();

    if HTML_BLOCK_PATTERN.is_match(text) {
        warn!(url = %url, "Crawler protection page detected");
        return Err(FetchError::corrupted(
            format!("Received crawler protection page from {}", url),
            size,
        ));
    }

    if !HTML_MARKER_PATTERN.is_match(text) {
        return Err(FetchError::corrupted(
            format!("Response from {} does not appear to be HTML", url),
            size,
        ));
    }

    let document = Html::parse_document(text);

    let visible = document_text(&document);
    if visible.chars().count() < MIN_HTML_TEXT_LEN {
        return Err(FetchError::corrupted(
            format!("HTML content from {} is empty or too short", url),
            size,
        ));
    }

    if ERROR_PAGE_PATTERN.is_match(&visible) {
        return Err(FetchError::corrupted(
            format!("Received error page from {}", url),
            size,
        ));
    }

    Ok(document)
}

/// Visible text of a document, whitespace-collapsed, without scripts and styles
pub fn document_text(document: &Html) -> String {
    let mut out = String::new();
    collect_visible_text(document.root_element(), &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    if matches!(
        element.value().name(),
        "script" | "style" | "noscript" | "template"
    ) {
        return;
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_visible_text(child_element, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
