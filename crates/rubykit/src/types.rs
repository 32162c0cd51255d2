//! Normalized record types returned by the client

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Default platform for gem versions without one
pub const GENERIC_PLATFORM: &str = "generic";

fn generic_platform() -> String {
    GENERIC_PLATFORM.to_string()
}

/// A single published version of a gem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Strict `major.minor.patch` version
    pub version: String,
    pub release_date: Option<NaiveDate>,
    pub built_at: Option<NaiveDate>,
    pub license: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default = "generic_platform")]
    pub platform: String,
    pub downloads_count: Option<u64>,
    pub sha: Option<String>,
    pub spec_sha: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl VersionRecord {
    /// Create a record with defaults for every optional field
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            release_date: None,
            built_at: None,
            license: None,
            prerelease: false,
            platform: generic_platform(),
            downloads_count: None,
            sha: None,
            spec_sha: None,
            requirements: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// A declared dependency of a gem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub requirements: String,
}

/// Gem metadata as published by the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub source_repo_url: Option<String>,
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    pub authors: Option<String>,
    pub downloads: Option<u64>,
    pub version_downloads: Option<u64>,
    #[serde(default)]
    pub yanked: bool,
    /// Dependency group (`runtime`, `development`) to dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<Dependency>>,
    pub changelog_url: Option<String>,
    pub funding_url: Option<String>,
    pub platform: Option<String>,
    pub sha: Option<String>,
    pub spec_sha: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Latest published version of one gem in a batch lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestVersion {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Download counters for a gem version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStats {
    pub name: String,
    pub version: String,
    pub version_downloads: u64,
    pub total_downloads: u64,
}

/// A Ruby release listed on the language site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageVersionRecord {
    pub version: String,
    pub release_date: Option<NaiveDate>,
    pub download_url: Option<String>,
    pub release_notes_url: Option<String>,
}

/// Support phase of a Ruby branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    #[serde(rename = "preview")]
    Preview,
    #[serde(rename = "normal maintenance")]
    NormalMaintenance,
    #[serde(rename = "security maintenance")]
    SecurityMaintenance,
    #[serde(rename = "eol")]
    Eol,
    #[serde(rename = "unknown")]
    Unknown,
}

impl MaintenanceStatus {
    /// Classify free status text, first match wins
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("preview") {
            MaintenanceStatus::Preview
        } else if text.contains("eol") || text.contains("end-of-life") {
            MaintenanceStatus::Eol
        } else if text.contains("security") {
            MaintenanceStatus::SecurityMaintenance
        } else if text.contains("normal") {
            MaintenanceStatus::NormalMaintenance
        } else {
            MaintenanceStatus::Unknown
        }
    }
}

/// A calendar date or a "to be decided" placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Date(NaiveDate),
    Tbd,
}

impl Serialize for Milestone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Milestone::Date(date) => date.serialize(serializer),
            Milestone::Tbd => serializer.serialize_str("TBD"),
        }
    }
}

impl<'de> Deserialize<'de> for Milestone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value.eq_ignore_ascii_case("tbd") {
            return Ok(Milestone::Tbd);
        }
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map(Milestone::Date)
            .map_err(serde::de::Error::custom)
    }
}

/// Maintenance state of a Ruby `major.minor` branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub version: String,
    pub status: MaintenanceStatus,
    pub release_date: Option<NaiveDate>,
    pub normal_maintenance_until: Option<Milestone>,
    pub eol: Option<Milestone>,
}

/// Cleaned changelog or release notes text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogResult {
    pub subject_name: String,
    pub version: Option<String>,
    pub source_url: Option<String>,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangelogResult {
    /// Result reporting that no content could be produced
    pub fn failure(
        subject_name: impl Into<String>,
        version: Option<String>,
        source_url: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            version,
            source_url,
            content: None,
            error: Some(error.into()),
        }
    }
}

/// A version listed on the issue tracker roadmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapVersion {
    pub name: String,
    pub version_id: u64,
    pub url: String,
    pub due_date: Option<NaiveDate>,
    pub issue_count: Option<u64>,
    pub closed_count: Option<u64>,
    pub open_count: Option<u64>,
}

/// An issue targeted at a roadmap version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapIssue {
    pub id: u64,
    pub subject: String,
    pub status: Option<String>,
    pub url: String,
}

/// Detail page of a single roadmap version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapDetail {
    pub version_id: u64,
    pub name: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub issues: Vec<RoadmapIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification_priority() {
        assert_eq!(
            MaintenanceStatus::classify("preview"),
            MaintenanceStatus::Preview
        );
        assert_eq!(MaintenanceStatus::classify("eol"), MaintenanceStatus::Eol);
        assert_eq!(
            MaintenanceStatus::classify("End-of-life"),
            MaintenanceStatus::Eol
        );
        assert_eq!(
            MaintenanceStatus::classify("security maintenance"),
            MaintenanceStatus::SecurityMaintenance
        );
        assert_eq!(
            MaintenanceStatus::classify("normal maintenance"),
            MaintenanceStatus::NormalMaintenance
        );
        assert_eq!(
            MaintenanceStatus::classify("something else"),
            MaintenanceStatus::Unknown
        );
    }

    #[test]
    fn test_milestone_serialization() {
        let date = NaiveDate::from_ymd_opt(2027, 3, 31).unwrap();
        assert_eq!(
            serde_json::to_string(&Milestone::Date(date)).unwrap(),
            "\"2027-03-31\""
        );
        assert_eq!(serde_json::to_string(&Milestone::Tbd).unwrap(), "\"TBD\"");

        let parsed: Milestone = serde_json::from_str("\"TBD\"").unwrap();
        assert_eq!(parsed, Milestone::Tbd);
    }

    #[test]
    fn test_version_record_defaults() {
        let record = VersionRecord::new("1.0.0");
        assert!(!record.prerelease);
        assert_eq!(record.platform, "generic");
        assert!(record.requirements.is_empty());
        assert!(record.metadata.is_empty());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["release_date"], serde_json::Value::Null);
    }

    #[test]
    fn test_maintenance_status_serialization() {
        assert_eq!(
            serde_json::to_string(&MaintenanceStatus::SecurityMaintenance).unwrap(),
            "\"security maintenance\""
        );
    }
}
