//! Maintenance branches page: a `Ruby X.Y` heading followed by a paragraph
//! of labeled fields.

use super::{element_text, selector};
use crate::normalize::parse_date;
use crate::types::{MaintenanceRecord, MaintenanceStatus, Milestone};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

static BRANCH_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Ruby\s+(\d+\.\d+)\b").expect("valid regex"));

static STATUS_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*status:\s*(.+?)\s*$").expect("valid regex"));

static RELEASE_DATE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*release date:\s*(.+?)\s*$").expect("valid regex"));

static NORMAL_UNTIL_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*normal maintenance until:\s*(.+?)\s*$").expect("valid regex")
});

static EOL_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*eol:\s*(.+?)\s*$").expect("valid regex"));

/// Extract one record per maintenance branch
pub fn parse(document: &Html) -> Vec<MaintenanceRecord> {
    let heading_selector = selector("h1, h2, h3, h4, h5");

    document
        .select(&heading_selector)
        .filter_map(|heading| {
            let title = element_text(heading);
            let version = BRANCH_HEADING.captures(&title)?.get(1)?.as_str().to_string();
            let paragraph = next_element(heading).filter(|el| el.value().name() == "p")?;
            Some(parse_fields(version, &paragraph_lines(paragraph)))
        })
        .collect()
}

fn parse_fields(version: String, text: &str) -> MaintenanceRecord {
    let field = |pattern: &Regex| {
        pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    let status = field(&STATUS_FIELD)
        .map(|s| MaintenanceStatus::classify(&s))
        .unwrap_or(MaintenanceStatus::Unknown);

    MaintenanceRecord {
        version,
        status,
        release_date: field(&RELEASE_DATE_FIELD).and_then(|d| parse_date(&d)),
        normal_maintenance_until: field(&NORMAL_UNTIL_FIELD).and_then(|v| parse_milestone(&v)),
        eol: field(&EOL_FIELD).and_then(|v| parse_milestone(&v)),
    }
}

/// Parse `TBD`, a date, or a date with a parenthetical note
fn parse_milestone(raw: &str) -> Option<Milestone> {
    let value = match raw.find('(') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
    .trim();
    if value.eq_ignore_ascii_case("tbd") {
        return Some(Milestone::Tbd);
    }
    parse_date(value).map(Milestone::Date)
}

fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Paragraph text with `<br>` turned into line breaks
fn paragraph_lines(paragraph: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in paragraph.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}
