//! Release index page: one table row per Ruby release

use super::{element_text, resolve_link, selector};
use crate::normalize::parse_date;
use crate::types::LanguageVersionRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// `Ruby 3.3.0`, `3.3.0-preview1`, ...
static VERSION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Ruby\s+)?(\d+\.\d+\.\d+\S*)").expect("valid regex"));

/// Extract every release row
///
/// Expected columns: version label, release date, download link, release
/// notes link. Rows whose first column is not a version are skipped.
pub fn parse(document: &Html, site_origin: &str) -> Vec<LanguageVersionRecord> {
    let row_selector = selector("tr");
    let cell_selector = selector("td");
    let link_selector = selector("a[href]");

    document
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
            let label = element_text(*cells.first()?);
            let version = VERSION_LABEL.captures(&label)?.get(1)?.as_str().to_string();

            Some(LanguageVersionRecord {
                version,
                release_date: cells.get(1).and_then(|c| parse_date(&element_text(*c))),
                download_url: link_in(cells.get(2), &link_selector, site_origin),
                release_notes_url: link_in(cells.get(3), &link_selector, site_origin),
            })
        })
        .collect()
}

fn link_in(cell: Option<&ElementRef<'_>>, links: &Selector, site_origin: &str) -> Option<String> {
    let anchor = cell?.select(links).next()?;
    resolve_link(site_origin, anchor.value().attr("href")?)
}
