//! Issue-tracker roadmap: the version listing and per-version detail pages

use super::{element_text, resolve_link, selector};
use crate::normalize::parse_date;
use crate::types::{RoadmapDetail, RoadmapIssue, RoadmapVersion};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

static VERSION_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/versions/(\d+)").expect("valid regex"));

static ISSUE_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"/issues/(\d+)").expect("valid regex"));

static ISSUE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+issues?\s*\(([^)]*)\)").expect("valid regex"));

static CLOSED_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+closed").expect("valid regex"));

static OPEN_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s+open").expect("valid regex"));

/// `Feature #20000: ` style prefix in front of an issue subject
static ISSUE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^#:]*#\d+\s*(?:\([^)]*\))?\s*:\s*").expect("valid regex"));

const HEADINGS: &str = "h1, h2, h3, h4";

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".version-overview .wiki",
    "#roadmap .wiki",
    "#content .wiki",
    ".wiki",
];

/// Extract the roadmap listing, one entry per distinct version link
pub fn parse_listing(document: &Html, site_origin: &str) -> Vec<RoadmapVersion> {
    let heading_selector = selector(HEADINGS);
    let link_selector = selector(r#"a[href*="/versions/"]"#);
    let mut seen = HashSet::new();
    let mut versions = Vec::new();

    for heading in document.select(&heading_selector) {
        let Some(link) = heading.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(version_id) = VERSION_HREF
            .captures(href)
            .and_then(|c| c[1].parse::<u64>().ok())
        else {
            continue;
        };
        let Some(url) = resolve_link(site_origin, href) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let name = element_text(link);
        let due_date = link.value().attr("title").and_then(parse_date);
        let counts = issue_counts(&nearby_text(heading));

        versions.push(RoadmapVersion {
            name: if name.is_empty() {
                element_text(heading)
            } else {
                name
            },
            version_id,
            url,
            due_date,
            issue_count: counts.map(|c| c.0),
            closed_count: counts.and_then(|c| c.1),
            open_count: counts.and_then(|c| c.2),
        });
    }

    versions
}

/// Text belonging to a heading's section
///
/// The enclosing `article` when there is one, otherwise the sibling elements
/// up to the next heading.
fn nearby_text(heading: ElementRef<'_>) -> String {
    let article = heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "article");
    if let Some(article) = article {
        return element_text(article);
    }

    let mut parts = Vec::new();
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if matches!(sibling.value().name(), "h1" | "h2" | "h3" | "h4") {
            break;
        }
        parts.push(element_text(sibling));
    }
    parts.join(" ")
}

/// `(total, closed, open)` from text like `12 issues (8 closed - 4 open)`
fn issue_counts(text: &str) -> Option<(u64, Option<u64>, Option<u64>)> {
    let caps = ISSUE_COUNT.captures(text)?;
    let total = caps[1].parse().ok()?;
    let detail = caps.get(2).map_or("", |m| m.as_str());
    let count = |pattern: &Regex| {
        pattern
            .captures(detail)
            .and_then(|c| c[1].parse::<u64>().ok())
    };
    Some((total, count(&CLOSED_COUNT), count(&OPEN_COUNT)))
}

/// Extract a version detail page
pub fn parse_detail(
    document: &Html,
    version_id: u64,
    url: &str,
    site_origin: &str,
) -> RoadmapDetail {
    let name = document
        .select(&selector("#content h2, h2"))
        .map(element_text)
        .find(|text| !text.is_empty());

    let description = DESCRIPTION_SELECTORS.iter().find_map(|css| {
        let block = document.select(&selector(css)).next()?;
        let text = block_text(block);
        (!text.is_empty()).then_some(text)
    });

    RoadmapDetail {
        version_id,
        name,
        url: url.to_string(),
        description,
        issues: parse_issues(document, site_origin),
    }
}

/// Rows of the issues table; rows without an issue link are skipped
fn parse_issues(document: &Html, site_origin: &str) -> Vec<RoadmapIssue> {
    let row_selector = selector("table tr");
    let cell_selector = selector("td");
    let link_selector = selector(r#"a[href*="/issues/"]"#);
    let status_selector = selector("td.status");
    let subject_selector = selector("td.subject");

    document
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_selector).map(element_text).collect();
            if cells.iter().all(|c| c.is_empty()) {
                return None;
            }

            let (id, href) = row.select(&link_selector).find_map(|link| {
                let href = link.value().attr("href")?;
                let id = ISSUE_HREF.captures(href)?[1].parse::<u64>().ok()?;
                Some((id, href))
            })?;

            let subject_text = row
                .select(&subject_selector)
                .next()
                .map(element_text)
                .or_else(|| cells.iter().find(|c| !c.is_empty()).cloned())
                .unwrap_or_default();
            let subject = ISSUE_PREFIX.replace(&subject_text, "").trim().to_string();

            Some(RoadmapIssue {
                id,
                subject,
                status: row
                    .select(&status_selector)
                    .next()
                    .map(element_text)
                    .filter(|s| !s.is_empty()),
                url: resolve_link(site_origin, href)
                    .unwrap_or_else(|| format!("{}/issues/{}", site_origin, id)),
            })
        })
        .collect()
}

/// Block text keeping paragraph breaks
fn block_text(element: ElementRef<'_>) -> String {
    let paragraphs: Vec<String> = element
        .select(&selector("p, li, pre, h1, h2, h3, h4"))
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        element_text(element)
    } else {
        paragraphs.join("\n\n")
    }
}
