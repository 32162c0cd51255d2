//! Mapping of registry JSON responses onto record types
//!
//! Upstream payloads are deserialized into lenient raw structs (every field
//! optional) and then converted, filling defaults for absent fields. Entries
//! whose version is not a strict `major.minor.patch` are dropped.

use crate::error::FetchError;
use crate::types::{Dependency, DownloadStats, PackageInfo, VersionRecord, GENERIC_PLATFORM};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

static STRICT_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

/// True if `version` is a strict `major.minor.patch` string
pub fn is_strict_version(version: &str) -> bool {
    STRICT_VERSION.is_match(version)
}

/// Parse an upstream date into a calendar date
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD` optionally followed by a time
/// part, and `YYYY-MM` (first of month). Anything else is absent.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Some(date);
    }
    debug!(raw = %raw, "Unparseable date dropped");
    None
}

fn parse_optional_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_date)
}

/// Deserialize a validated JSON value into a raw upstream type
fn decode<T: DeserializeOwned>(value: Value, url: &str, size: usize) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| {
        FetchError::corrupted_with(
            format!("Unexpected JSON structure from {}: {}", url, e),
            size,
            e,
        )
    })
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    number: Option<String>,
    created_at: Option<String>,
    built_at: Option<String>,
    #[serde(default)]
    licenses: Option<Vec<String>>,
    #[serde(default)]
    prerelease: Option<bool>,
    platform: Option<String>,
    downloads_count: Option<u64>,
    sha: Option<String>,
    spec_sha: Option<String>,
    ruby_version: Option<String>,
    rubygems_version: Option<String>,
    #[serde(default)]
    metadata: Option<BTreeMap<String, Value>>,
}

impl RawVersion {
    fn into_record(self) -> Option<VersionRecord> {
        let version = self.number.filter(|v| is_strict_version(v))?;

        let mut requirements = Vec::new();
        if let Some(ruby) = self.ruby_version.filter(|r| !r.is_empty()) {
            requirements.push(format!("ruby {}", ruby));
        }
        if let Some(rubygems) = self.rubygems_version.filter(|r| !r.is_empty()) {
            requirements.push(format!("rubygems {}", rubygems));
        }

        Some(VersionRecord {
            version,
            release_date: parse_optional_date(self.created_at.as_deref()),
            built_at: parse_optional_date(self.built_at.as_deref()),
            license: self
                .licenses
                .filter(|l| !l.is_empty())
                .map(|l| l.join(", ")),
            prerelease: self.prerelease.unwrap_or(false),
            platform: self
                .platform
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| GENERIC_PLATFORM.to_string()),
            downloads_count: self.downloads_count,
            sha: self.sha,
            spec_sha: self.spec_sha,
            requirements,
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

/// Normalize a version listing
pub fn versions(value: Value, url: &str, size: usize) -> Result<Vec<VersionRecord>, FetchError> {
    let raw: Vec<RawVersion> = decode(value, url, size)?;
    let total = raw.len();
    let records: Vec<VersionRecord> = raw.into_iter().filter_map(RawVersion::into_record).collect();
    if records.len() < total {
        debug!(
            url = %url,
            dropped = total - records.len(),
            "Dropped non-semantic versions"
        );
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    name: Option<String>,
    requirements: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGem {
    name: Option<String>,
    version: Option<String>,
    number: Option<String>,
    summary: Option<String>,
    info: Option<String>,
    description: Option<String>,
    homepage_uri: Option<String>,
    source_code_uri: Option<String>,
    documentation_uri: Option<String>,
    #[serde(default)]
    licenses: Option<Vec<String>>,
    authors: Option<String>,
    downloads: Option<u64>,
    version_downloads: Option<u64>,
    #[serde(default)]
    yanked: Option<bool>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, Vec<RawDependency>>>,
    changelog_uri: Option<String>,
    funding_uri: Option<String>,
    platform: Option<String>,
    sha: Option<String>,
    spec_sha: Option<String>,
    #[serde(default)]
    metadata: Option<BTreeMap<String, Value>>,
}

impl RawGem {
    fn into_info(self, fallback_name: &str) -> PackageInfo {
        let metadata = self.metadata.unwrap_or_default();
        let from_metadata = |key: &str| {
            metadata
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let changelog_url = self
            .changelog_uri
            .filter(|s| !s.is_empty())
            .or_else(|| from_metadata("changelog_uri"));
        let funding_url = self
            .funding_uri
            .filter(|s| !s.is_empty())
            .or_else(|| from_metadata("funding_uri"));

        let dependencies = self
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .map(|(group, deps)| {
                let deps = deps
                    .into_iter()
                    .filter_map(|d| {
                        Some(Dependency {
                            name: d.name?,
                            requirements: d.requirements.unwrap_or_else(|| ">= 0".to_string()),
                        })
                    })
                    .collect();
                (group, deps)
            })
            .collect();

        let description = self.description.or_else(|| self.info.clone());

        PackageInfo {
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            version: self.version.or(self.number),
            summary: self.summary.or(self.info),
            description,
            homepage: self.homepage_uri.filter(|s| !s.is_empty()),
            source_repo_url: self.source_code_uri.filter(|s| !s.is_empty()),
            documentation_url: self.documentation_uri.filter(|s| !s.is_empty()),
            licenses: self.licenses.unwrap_or_default(),
            authors: self.authors,
            downloads: self.downloads,
            version_downloads: self.version_downloads,
            yanked: self.yanked.unwrap_or(false),
            dependencies,
            changelog_url,
            funding_url,
            platform: self.platform,
            sha: self.sha,
            spec_sha: self.spec_sha,
            metadata,
        }
    }
}

/// Normalize a single gem object
pub fn gem_info(value: Value, name: &str, url: &str, size: usize) -> Result<PackageInfo, FetchError> {
    let raw: RawGem = decode(value, url, size)?;
    Ok(raw.into_info(name))
}

/// Normalize an array of gem objects (search results, activity feeds)
pub fn gem_list(value: Value, url: &str, size: usize) -> Result<Vec<PackageInfo>, FetchError> {
    let raw: Vec<RawGem> = decode(value, url, size)?;
    Ok(raw
        .into_iter()
        .filter(|gem| gem.name.is_some())
        .map(|gem| gem.into_info(""))
        .collect())
}

/// Normalize a reverse-dependency listing (array of gem names)
pub fn name_list(value: Value, url: &str, size: usize) -> Result<Vec<String>, FetchError> {
    decode(value, url, size)
}

#[derive(Debug, Deserialize)]
struct RawLatest {
    version: Option<String>,
}

/// Extract the version from a `latest.json` response
///
/// The registry answers `"unknown"` for gems without releases; that maps to
/// `None`.
pub fn latest_version(value: Value, url: &str, size: usize) -> Result<Option<String>, FetchError> {
    let raw: RawLatest = decode(value, url, size)?;
    Ok(raw.version.filter(|v| !v.is_empty() && v != "unknown"))
}

#[derive(Debug, Deserialize)]
struct RawDownloads {
    total_downloads: Option<u64>,
    version_downloads: Option<u64>,
}

/// Normalize a per-version downloads response
pub fn downloads(
    value: Value,
    name: &str,
    version: &str,
    url: &str,
    size: usize,
) -> Result<DownloadStats, FetchError> {
    let raw: RawDownloads = decode(value, url, size)?;
    Ok(DownloadStats {
        name: name.to_string(),
        version: version.to_string(),
        version_downloads: raw.version_downloads.unwrap_or(0),
        total_downloads: raw.total_downloads.unwrap_or(0),
    })
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    body: Option<String>,
    html_url: Option<String>,
}

/// Body and page URL of a source-forge release
pub fn release_body(
    value: Value,
    url: &str,
    size: usize,
) -> Result<(Option<String>, Option<String>), FetchError> {
    let raw: RawRelease = decode(value, url, size)?;
    Ok((raw.body.filter(|b| !b.trim().is_empty()), raw.html_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://rubygems.org/api/v1/versions/demo.json";

    #[test]
    fn test_strict_version() {
        assert!(is_strict_version("1.0.0"));
        assert!(is_strict_version("10.20.30"));
        assert!(!is_strict_version("1.0"));
        assert!(!is_strict_version("1.0.0.rc1"));
        assert!(!is_strict_version("v1.0.0"));
        assert!(!is_strict_version("bad"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 1);
        assert_eq!(parse_date("2020-01-01"), expected);
        assert_eq!(parse_date("2020-01-01T10:20:30.000Z"), expected);
        assert_eq!(parse_date("2020-01-01 10:20:30 UTC"), expected);
        assert_eq!(parse_date("2020-01"), expected);
        assert_eq!(parse_date("sometime"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_versions_drop_invalid_entries() {
        let value = json!([
            {"number": "1.0.0", "created_at": "2020-01-01"},
            {"number": "bad", "created_at": "2020-01-02"}
        ]);
        let records = versions(value, URL, 0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, "1.0.0");
        assert_eq!(records[0].release_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert!(!records[0].prerelease);
        assert_eq!(records[0].platform, "generic");
    }

    #[test]
    fn test_versions_map_all_fields() {
        let value = json!([{
            "number": "7.1.3",
            "created_at": "2024-01-16T22:00:00.000Z",
            "built_at": "2024-01-16T00:00:00.000Z",
            "licenses": ["MIT"],
            "prerelease": false,
            "platform": "java",
            "downloads_count": 12345,
            "sha": "abc",
            "spec_sha": "def",
            "ruby_version": ">= 2.7.0",
            "metadata": {"changelog_uri": "https://example.com/CHANGELOG.md"}
        }]);
        let records = versions(value, URL, 0).unwrap();
        let record = &records[0];
        assert_eq!(record.license.as_deref(), Some("MIT"));
        assert_eq!(record.platform, "java");
        assert_eq!(record.downloads_count, Some(12345));
        assert_eq!(record.built_at, NaiveDate::from_ymd_opt(2024, 1, 16));
        assert_eq!(record.requirements, vec!["ruby >= 2.7.0".to_string()]);
        assert!(record.metadata.contains_key("changelog_uri"));
    }

    #[test]
    fn test_unparseable_date_degrades_to_absent() {
        let value = json!([{"number": "1.0.0", "created_at": "yesterday"}]);
        let records = versions(value, URL, 0).unwrap();
        assert_eq!(records[0].release_date, None);
    }

    #[test]
    fn test_versions_wrong_structure_is_corrupted() {
        let value = json!([{"number": 5}]);
        let err = versions(value, URL, 10).unwrap_err();
        assert!(matches!(err, FetchError::CorruptedData { size: 10, .. }));
    }

    #[test]
    fn test_gem_info_defaults() {
        let info = gem_info(json!({"name": "demo"}), "demo", URL, 0).unwrap();
        assert_eq!(info.name, "demo");
        assert!(info.licenses.is_empty());
        assert!(info.dependencies.is_empty());
        assert!(info.metadata.is_empty());
        assert!(!info.yanked);
    }

    #[test]
    fn test_gem_info_mapping() {
        let value = json!({
            "name": "rails",
            "version": "7.1.3",
            "info": "Ruby on Rails is a full-stack web framework.",
            "homepage_uri": "https://rubyonrails.org",
            "source_code_uri": "https://github.com/rails/rails",
            "documentation_uri": "",
            "licenses": ["MIT"],
            "authors": "David Heinemeier Hansson",
            "downloads": 100,
            "version_downloads": 10,
            "dependencies": {
                "development": [],
                "runtime": [{"name": "actionpack", "requirements": "= 7.1.3"}]
            },
            "metadata": {"changelog_uri": "https://github.com/rails/rails/releases/tag/v7.1.3"}
        });
        let info = gem_info(value, "rails", URL, 0).unwrap();
        assert_eq!(info.version.as_deref(), Some("7.1.3"));
        assert_eq!(
            info.summary.as_deref(),
            Some("Ruby on Rails is a full-stack web framework.")
        );
        assert_eq!(info.documentation_url, None);
        assert_eq!(
            info.changelog_url.as_deref(),
            Some("https://github.com/rails/rails/releases/tag/v7.1.3")
        );
        assert_eq!(info.dependencies["runtime"][0].name, "actionpack");
        assert!(info.dependencies["development"].is_empty());
    }

    #[test]
    fn test_latest_version_unknown() {
        assert_eq!(
            latest_version(json!({"version": "unknown"}), URL, 0).unwrap(),
            None
        );
        assert_eq!(
            latest_version(json!({"version": "2.0.0"}), URL, 0).unwrap(),
            Some("2.0.0".to_string())
        );
    }

    #[test]
    fn test_downloads() {
        let stats = downloads(
            json!({"total_downloads": 50, "version_downloads": 5}),
            "demo",
            "1.0.0",
            URL,
            0,
        )
        .unwrap();
        assert_eq!(stats.total_downloads, 50);
        assert_eq!(stats.version_downloads, 5);
    }

    #[test]
    fn test_gem_list_skips_nameless_entries() {
        let value = json!([{"name": "a"}, {"version": "1.0.0"}]);
        let list = gem_list(value, URL, 0).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "a");
    }
}
