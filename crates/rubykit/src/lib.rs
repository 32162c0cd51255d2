//! Rubykit - gem registry and Ruby language metadata client
//!
//! This crate provides a library API for querying the RubyGems registry and
//! the Ruby language sites (release index, maintenance branches, release
//! notes, issue tracker roadmap), returning normalized records.
//!
//! ## Pipeline
//!
//! Every operation of [`RubyClient`] runs the same steps:
//!
//! 1. arguments are validated before any request;
//! 2. the [`TtlCache`] is consulted;
//! 3. on a miss the [`HttpFetcher`] retrieves the body under fixed timeouts
//!    and a size ceiling;
//! 4. [`validate`] rejects crawler-protection pages and malformed bodies;
//! 5. [`normalize`] (JSON) or [`extract`] (HTML) produce records;
//! 6. records are cached and post-processed by a [`Query`].
//!
//! The [`Tool`] type wraps the client for RPC adapters: it lists every
//! operation with a JSON schema and dispatches calls by name.

pub mod cache;
pub mod client;
mod error;
pub mod extract;
pub mod http;
pub mod normalize;
pub mod query;
mod tool;
mod types;
pub mod validate;

pub use cache::{SharedCache, TtlCache};
pub use client::{ClientOptions, Endpoints, RubyClient, DEFAULT_CACHE_TTL, POPULAR_GEMS};
pub use error::FetchError;
pub use http::{HttpFetcher, ResponseKind, MAX_RESPONSE_SIZE};
pub use query::{select_fields, Query, SortOrder};
pub use tool::{
    ResourceDefinition, Tool, ToolBuilder, ToolDefinition, MAINTENANCE_URI, POPULAR_GEMS_URI,
};
pub use types::{
    ChangelogResult, Dependency, DownloadStats, LanguageVersionRecord, LatestVersion,
    MaintenanceRecord, MaintenanceStatus, Milestone, PackageInfo, RoadmapDetail, RoadmapIssue,
    RoadmapVersion, VersionRecord,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("rubykit/", env!("CARGO_PKG_VERSION"));

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Queries RubyGems and ruby-lang.org for gem and Ruby release metadata.

- Gem versions, metadata, dependencies, downloads and changelogs
- Ruby releases, maintenance status and release notes
- Ruby issue tracker roadmap
- Pagination, sorting and field selection on lists"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# Rubykit Tool

Queries the RubyGems registry and the Ruby language sites and returns
normalized JSON records.

## Gem tools
- `list_versions` {name, limit?, offset?, sort?, fields?}: strict major.minor.patch versions
- `latest_versions` {names, limit?, offset?, fields?}: latest version per gem, errors reported per gem
- `popular_gems` {limit?, offset?, fields?}: latest versions of widely used gems
- `gem_info` {name, fields?}: metadata of the latest version
- `gem_version_info` {name, version, fields?}: metadata of one version
- `reverse_dependencies` {name, limit?, offset?}: gems depending on a gem
- `download_stats` {name, version?}: download counts
- `search` {query, page?, limit?, offset?, fields?}: registry search
- `latest_gems` / `just_updated_gems` {limit?, offset?, fields?}: activity feeds
- `gem_changelog` {name, version?}: changelog text from the gem's changelog URL

## Ruby tools
- `ruby_versions` {limit?, offset?, sort?, fields?}: releases with dates and links
- `ruby_maintenance_status` {version?, limit?, offset?, fields?}: branch status and end-of-life dates
- `ruby_version_changelog` {version}: release notes, GitHub release as fallback
- `github_release_notes` {version}: release notes from the GitHub release
- `ruby_roadmap` {limit?, offset?, sort?, fields?}: issue tracker roadmap versions
- `roadmap_version` {version}: description and issues of a roadmap version
- `clear_cache` {}: drop cached data

## Options
- `limit`: 1-1000
- `offset`: 0 or more; past the end yields an empty list
- `sort`: version_desc (default), version_asc, date_desc, date_asc
- `fields`: keep only these keys per record; unknown names are ignored

## Errors
Changelog tools answer `{"error": "..."}` when a version or a changelog source
does not exist. Other failures (not found, upstream errors, crawler
protection pages, oversized responses) are reported as tool errors.

## Examples

### Three newest Rails versions
```json
{"name": "rails", "limit": 3, "fields": ["version", "release_date"]}
```

### Maintenance status of Ruby 3.3
```json
{"version": "3.3"}
```
"#;
