//! Client facade for the gem registry and the Ruby language sites
//!
//! Every operation follows the same flow: validate arguments, look up the
//! cache, fetch on a miss, validate the body, normalize or extract records,
//! store them, then post-process with a [`Query`]. The cache always holds
//! the complete normalized list so different pagination and sort options
//! share one entry.

use crate::cache::{SharedCache, TtlCache};
use crate::error::FetchError;
use crate::extract::{branches, changelog, releases, roadmap};
use crate::http::{HttpFetcher, ResponseKind, MAX_RESPONSE_SIZE};
use crate::normalize;
use crate::query::Query;
use crate::types::{
    ChangelogResult, DownloadStats, LanguageVersionRecord, LatestVersion, MaintenanceRecord,
    PackageInfo, RoadmapDetail, RoadmapVersion, VersionRecord,
};
use crate::validate::{self, JsonShape};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default cache lifetime of fetched data
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Gems reported by [`RubyClient::popular_gems`]
pub const POPULAR_GEMS: &[&str] = &[
    "rails",
    "rake",
    "bundler",
    "rspec",
    "puma",
    "sidekiq",
    "devise",
    "nokogiri",
    "rack",
    "rubocop",
    "pry",
    "faraday",
    "jwt",
    "sinatra",
    "activerecord",
    "pg",
    "redis",
    "thor",
    "minitest",
    "json",
];

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(\.[0-9A-Za-z]+)*(-[0-9A-Za-z.]+)?$").expect("valid regex")
});

static MAJOR_MINOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.\d+)").expect("valid regex"));

/// Upstream base URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Gem registry API
    pub rubygems: String,
    /// Ruby language site
    pub ruby_lang: String,
    /// Issue tracker hosting the roadmap
    pub bug_tracker: String,
    /// Source-forge API used for release notes
    pub github_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rubygems: "https://rubygems.org".to_string(),
            ruby_lang: "https://www.ruby-lang.org".to_string(),
            bug_tracker: "https://bugs.ruby-lang.org".to_string(),
            github_api: "https://api.github.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one base URL
    pub fn all(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            rubygems: base.clone(),
            ruby_lang: base.clone(),
            bug_tracker: base.clone(),
            github_api: base,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Store normalized responses in the cache
    pub cache_enabled: bool,
    /// Lifetime of cached entries
    pub cache_ttl: Duration,
    /// Response body ceiling in bytes
    pub max_response_size: u64,
    pub endpoints: Endpoints,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_response_size: MAX_RESPONSE_SIZE,
            endpoints: Endpoints::default(),
        }
    }
}

/// Facade over every upstream operation
#[derive(Debug, Clone)]
pub struct RubyClient {
    options: ClientOptions,
    fetcher: HttpFetcher,
    cache: Option<SharedCache>,
}

impl Default for RubyClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl RubyClient {
    /// Create a client with its own cache (when enabled)
    pub fn new(options: ClientOptions) -> Self {
        let cache = options
            .cache_enabled
            .then(|| Arc::new(TtlCache::new()) as SharedCache);
        Self::build(options, cache)
    }

    /// Create a client that shares `cache` with other clients
    pub fn with_cache(options: ClientOptions, cache: SharedCache) -> Self {
        let cache = options.cache_enabled.then_some(cache);
        Self::build(options, cache)
    }

    fn build(options: ClientOptions, cache: Option<SharedCache>) -> Self {
        let fetcher = HttpFetcher::new(options.user_agent.clone(), options.max_response_size);
        Self {
            options,
            fetcher,
            cache,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&SharedCache> {
        self.cache.as_ref()
    }

    /// Drop every cached entry
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            debug!("Cache cleared");
        }
    }

    /// All strict `major.minor.patch` versions of a gem
    pub async fn list_versions(
        &self,
        name: &str,
        query: &Query,
    ) -> Result<Vec<VersionRecord>, FetchError> {
        let name = check_name("gem name", name)?;
        let records = self.all_versions(name).await?;
        Ok(query.apply(records))
    }

    async fn all_versions(&self, name: &str) -> Result<Vec<VersionRecord>, FetchError> {
        let url = format!("{}/api/v1/versions/{}.json", self.options.endpoints.rubygems, name);
        self.cached(format!("versions:{}", name), || async {
            let (value, size) = self.fetch_json(&url, JsonShape::Array).await?;
            normalize::versions(value, &url, size)
        })
        .await
    }

    /// Latest version of each named gem
    ///
    /// Corrupted or oversized responses become an inline `error` for that
    /// gem; other failures abort the whole batch.
    pub async fn latest_versions<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<LatestVersion>, FetchError> {
        if names.is_empty() {
            return Err(FetchError::Validation(
                "at least one gem name is required".to_string(),
            ));
        }
        let names = names
            .iter()
            .map(|n| check_name("gem name", n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let entry = match self.latest_version(name).await {
                Ok(Some(version)) => LatestVersion {
                    name: name.to_string(),
                    version: Some(version),
                    error: None,
                },
                Ok(None) => LatestVersion {
                    name: name.to_string(),
                    version: None,
                    error: Some("No published version".to_string()),
                },
                Err(e) if e.is_data_integrity() => {
                    warn!(gem = %name, error = %e, "Reporting latest version error inline");
                    LatestVersion {
                        name: name.to_string(),
                        version: None,
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => return Err(e),
            };
            results.push(entry);
        }
        Ok(results)
    }

    async fn latest_version(&self, name: &str) -> Result<Option<String>, FetchError> {
        let url = format!(
            "{}/api/v1/versions/{}/latest.json",
            self.options.endpoints.rubygems, name
        );
        self.cached(format!("latest:{}", name), || async {
            let (value, size) = self.fetch_json(&url, JsonShape::Object).await?;
            normalize::latest_version(value, &url, size)
        })
        .await
    }

    /// Latest versions of a fixed list of widely used gems
    pub async fn popular_gems(&self) -> Result<Vec<LatestVersion>, FetchError> {
        self.latest_versions(POPULAR_GEMS).await
    }

    /// Metadata of the latest version of a gem
    pub async fn gem_info(&self, name: &str) -> Result<PackageInfo, FetchError> {
        let name = check_name("gem name", name)?;
        let url = format!("{}/api/v1/gems/{}.json", self.options.endpoints.rubygems, name);
        self.cached(format!("gem:{}", name), || async {
            let (value, size) = self.fetch_json(&url, JsonShape::Object).await?;
            normalize::gem_info(value, name, &url, size)
        })
        .await
    }

    /// Metadata of one specific version of a gem
    pub async fn gem_version_info(
        &self,
        name: &str,
        version: &str,
    ) -> Result<PackageInfo, FetchError> {
        let name = check_name("gem name", name)?;
        let version = check_version(version)?;
        let url = format!(
            "{}/api/v2/rubygems/{}/versions/{}.json",
            self.options.endpoints.rubygems, name, version
        );
        self.cached(format!("gem:{}:{}", name, version), || async {
            let (value, size) = self.fetch_json(&url, JsonShape::Object).await?;
            normalize::gem_info(value, name, &url, size)
        })
        .await
    }

    /// Names of gems depending on `name`
    pub async fn reverse_dependencies(
        &self,
        name: &str,
        query: &Query,
    ) -> Result<Vec<String>, FetchError> {
        let name = check_name("gem name", name)?;
        let url = format!(
            "{}/api/v1/gems/{}/reverse_dependencies.json",
            self.options.endpoints.rubygems, name
        );
        let names = self
            .cached(format!("reverse_dependencies:{}", name), || async {
                let (value, size) = self.fetch_json(&url, JsonShape::Array).await?;
                normalize::name_list(value, &url, size)
            })
            .await?;
        Ok(query.paginate(names))
    }

    /// Download counts for a version, or for the latest version when absent
    pub async fn download_stats(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<DownloadStats, FetchError> {
        let name = check_name("gem name", name)?;
        let Some(version) = version else {
            let info = self.gem_info(name).await?;
            return Ok(DownloadStats {
                name: info.name,
                version: info.version.unwrap_or_default(),
                version_downloads: info.version_downloads.unwrap_or(0),
                total_downloads: info.downloads.unwrap_or(0),
            });
        };

        let version = check_version(version)?;
        let url = format!(
            "{}/api/v1/downloads/{}-{}.json",
            self.options.endpoints.rubygems, name, version
        );
        self.cached(format!("downloads:{}:{}", name, version), || async {
            let (value, size) = self.fetch_json(&url, JsonShape::Object).await?;
            normalize::downloads(value, name, version, &url, size)
        })
        .await
    }

    /// Full-text gem search; `page` is the registry's own 1-based page
    pub async fn search(
        &self,
        text: &str,
        page: Option<u32>,
        query: &Query,
    ) -> Result<Vec<PackageInfo>, FetchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FetchError::Validation(
                "search query must not be empty".to_string(),
            ));
        }
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(FetchError::Validation("page must be at least 1".to_string()));
        }

        let base = format!("{}/api/v1/search.json", self.options.endpoints.rubygems);
        let page_param = page.to_string();
        let url = Url::parse_with_params(&base, &[("query", text), ("page", page_param.as_str())])
            .map_err(|e| FetchError::Validation(format!("invalid search URL: {}", e)))?
            .to_string();

        let gems = self
            .cached(format!("search:{}:{}", text, page), || async {
                let (value, size) = self.fetch_json(&url, JsonShape::Array).await?;
                normalize::gem_list(value, &url, size)
            })
            .await?;
        Ok(query.paginate(gems))
    }

    /// Most recently published gems
    pub async fn latest_gems(&self, query: &Query) -> Result<Vec<PackageInfo>, FetchError> {
        self.activity("latest", query).await
    }

    /// Most recently updated gems
    pub async fn just_updated_gems(&self, query: &Query) -> Result<Vec<PackageInfo>, FetchError> {
        self.activity("just_updated", query).await
    }

    async fn activity(&self, feed: &str, query: &Query) -> Result<Vec<PackageInfo>, FetchError> {
        let url = format!(
            "{}/api/v1/activity/{}.json",
            self.options.endpoints.rubygems, feed
        );
        let gems = self
            .cached(format!("activity:{}", feed), || async {
                let (value, size) = self.fetch_json(&url, JsonShape::Array).await?;
                normalize::gem_list(value, &url, size)
            })
            .await?;
        Ok(query.paginate(gems))
    }

    /// Changelog of a gem, located through its `changelog_uri` metadata
    pub async fn gem_changelog(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<ChangelogResult, FetchError> {
        let name = check_name("gem name", name)?;
        let version = version.map(check_version).transpose()?;

        let info = match version {
            Some(version) => match self.gem_version_info(name, version).await {
                Ok(info) => info,
                Err(FetchError::NotFound { .. }) => {
                    return Ok(ChangelogResult::failure(
                        name,
                        Some(version.to_string()),
                        None,
                        format!("Version {} not found for gem {}", version, name),
                    ));
                }
                Err(e) => return Err(e),
            },
            None => self.gem_info(name).await?,
        };

        let version = version.map(str::to_string).or(info.version);
        let Some(changelog_url) = info.changelog_url else {
            return Ok(ChangelogResult::failure(
                name,
                version,
                None,
                format!("No changelog URL published for gem {}", name),
            ));
        };

        let content = self.changelog_page(&changelog_url).await?;
        Ok(match content {
            Some(content) => ChangelogResult {
                subject_name: name.to_string(),
                version,
                source_url: Some(changelog_url),
                content: Some(content),
                error: None,
            },
            None => ChangelogResult::failure(
                name,
                version,
                Some(changelog_url),
                "No changelog content could be extracted",
            ),
        })
    }

    async fn changelog_page(&self, url: &str) -> Result<Option<String>, FetchError> {
        self.cached(format!("changelog:{}", url), || {
            self.scrape(url, changelog::extract)
        })
        .await
    }

    /// Released Ruby versions from the release index
    pub async fn ruby_versions(
        &self,
        query: &Query,
    ) -> Result<Vec<LanguageVersionRecord>, FetchError> {
        let records = self.ruby_releases().await?;
        Ok(query.apply(records))
    }

    async fn ruby_releases(&self) -> Result<Vec<LanguageVersionRecord>, FetchError> {
        let origin = self.options.endpoints.ruby_lang.as_str();
        let url = format!("{}/en/downloads/releases/", origin);
        self.cached("ruby:releases".to_string(), || {
            self.scrape(&url, |document| releases::parse(document, origin))
        })
        .await
    }

    /// Maintenance status of every branch, or of the branch of `version`
    pub async fn ruby_maintenance_status(
        &self,
        version: Option<&str>,
    ) -> Result<Vec<MaintenanceRecord>, FetchError> {
        let branch = match version {
            Some(version) => {
                let version = check_version(version)?;
                let branch = MAJOR_MINOR
                    .captures(version)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .ok_or_else(|| {
                        FetchError::Validation(format!(
                            "version '{}' has no major.minor part",
                            version
                        ))
                    })?;
                Some(branch)
            }
            None => None,
        };

        let url = format!("{}/en/downloads/branches/", self.options.endpoints.ruby_lang);
        let records = self
            .cached("ruby:branches".to_string(), || {
                self.scrape(&url, branches::parse)
            })
            .await?;

        Ok(match branch {
            Some(branch) => records
                .into_iter()
                .filter(|record| record.version == branch)
                .collect(),
            None => records,
        })
    }

    /// Release notes of a Ruby version
    ///
    /// Reads the release-notes page linked from the release index and falls
    /// back to the source-forge release when the page has no usable content.
    pub async fn ruby_version_changelog(
        &self,
        version: &str,
    ) -> Result<ChangelogResult, FetchError> {
        let version = check_version(version)?;
        let releases = self.ruby_releases().await?;

        let Some(release) = releases.into_iter().find(|r| r.version == version) else {
            return Ok(ChangelogResult::failure(
                "ruby",
                Some(version.to_string()),
                None,
                format!("Ruby version {} not found in the release index", version),
            ));
        };

        if let Some(notes_url) = release.release_notes_url {
            match self.changelog_page(&notes_url).await {
                Ok(Some(content)) => {
                    return Ok(ChangelogResult {
                        subject_name: "ruby".to_string(),
                        version: Some(version.to_string()),
                        source_url: Some(notes_url),
                        content: Some(content),
                        error: None,
                    });
                }
                Ok(None) => {
                    debug!(url = %notes_url, "Release notes page has no content, trying GitHub");
                }
                Err(e @ FetchError::CorruptedData { .. }) => {
                    warn!(url = %notes_url, error = %e, "Release notes page rejected, trying GitHub");
                }
                Err(e) => return Err(e),
            }
        }

        let fallback = self.github_release_notes(version).await?;
        if fallback.content.is_some() {
            return Ok(fallback);
        }
        Ok(ChangelogResult::failure(
            "ruby",
            Some(version.to_string()),
            fallback.source_url,
            format!("No release notes found for Ruby {}", version),
        ))
    }

    /// Release notes from the source-forge release tagged for `version`
    pub async fn github_release_notes(&self, version: &str) -> Result<ChangelogResult, FetchError> {
        let version = check_version(version)?;
        let tag = release_tag(version);
        let url = format!(
            "{}/repos/ruby/ruby/releases/tags/{}",
            self.options.endpoints.github_api, tag
        );

        let release = self
            .cached(format!("github:release:{}", tag), || async {
                let (value, size) = self.fetch_json(&url, JsonShape::Object).await?;
                normalize::release_body(value, &url, size)
            })
            .await;

        let (body, html_url) = match release {
            Ok(release) => release,
            Err(FetchError::NotFound { .. }) => {
                return Ok(ChangelogResult::failure(
                    "ruby",
                    Some(version.to_string()),
                    Some(url),
                    format!("No GitHub release tagged {}", tag),
                ));
            }
            Err(e) => return Err(e),
        };

        let source_url = Some(html_url.unwrap_or(url));
        Ok(match body.as_deref().and_then(changelog::clean_text) {
            Some(content) => ChangelogResult {
                subject_name: "ruby".to_string(),
                version: Some(version.to_string()),
                source_url,
                content: Some(content),
                error: None,
            },
            None => ChangelogResult::failure(
                "ruby",
                Some(version.to_string()),
                source_url,
                format!("GitHub release {} has no notes", tag),
            ),
        })
    }

    /// Versions on the issue-tracker roadmap
    pub async fn ruby_roadmap(&self, query: &Query) -> Result<Vec<RoadmapVersion>, FetchError> {
        let versions = self.roadmap_listing().await?;
        Ok(query.apply(versions))
    }

    fn roadmap_url(&self) -> String {
        format!(
            "{}/projects/ruby-master/roadmap",
            self.options.endpoints.bug_tracker
        )
    }

    async fn roadmap_listing(&self) -> Result<Vec<RoadmapVersion>, FetchError> {
        let origin = self.options.endpoints.bug_tracker.as_str();
        let url = self.roadmap_url();
        self.cached("roadmap:versions".to_string(), || {
            self.scrape(&url, |document| roadmap::parse_listing(document, origin))
        })
        .await
    }

    /// Detail page of a roadmap version, by numeric id or by name
    pub async fn roadmap_version(&self, version: &str) -> Result<RoadmapDetail, FetchError> {
        let version = version.trim();
        if version.is_empty() {
            return Err(FetchError::Validation(
                "roadmap version must not be empty".to_string(),
            ));
        }

        let version_id = match version.parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                check_version(version)?;
                let listing = self.roadmap_listing().await?;
                listing
                    .iter()
                    .find(|v| v.name == version)
                    .map(|v| v.version_id)
                    .ok_or_else(|| FetchError::NotFound {
                        status: 404,
                        url: self.roadmap_url(),
                        body: format!("No roadmap version named {}", version),
                    })?
            }
        };

        let origin = self.options.endpoints.bug_tracker.as_str();
        let url = format!("{}/versions/{}", origin, version_id);
        self.cached(format!("roadmap:version:{}", version_id), || {
            self.scrape(&url, |document| {
                roadmap::parse_detail(document, version_id, &url, origin)
            })
        })
        .await
    }

    /// Return the cached value for `key` or load and store it
    ///
    /// Errors are never cached.
    async fn cached<T, F, Fut>(&self, key: String, load: F) -> Result<T, FetchError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get_as::<T>(&key) {
                debug!(key = %key, "Cache hit");
                return Ok(hit);
            }
            debug!(key = %key, "Cache miss");
        }

        let value = load().await?;

        if let Some(cache) = &self.cache {
            cache.set_as(key, value.clone(), self.options.cache_ttl);
        }
        Ok(value)
    }

    async fn fetch_json(&self, url: &str, shape: JsonShape) -> Result<(Value, usize), FetchError> {
        let body = self.fetcher.get(url, ResponseKind::Json).await?;
        let value = validate::parse_json_shaped(&body, url, shape)?;
        Ok((value, body.len()))
    }

    /// Fetch an HTML page and run a synchronous extraction over it
    async fn scrape<T, F>(&self, url: &str, extract: F) -> Result<T, FetchError>
    where
        F: FnOnce(&Html) -> T,
    {
        let body = self.fetcher.get(url, ResponseKind::Html).await?;
        let document = validate::parse_html(&body, url)?;
        Ok(extract(&document))
    }
}

fn check_name<'a>(what: &str, value: &'a str) -> Result<&'a str, FetchError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FetchError::Validation(format!("{} must not be empty", what)));
    }
    if !NAME_PATTERN.is_match(value) {
        return Err(FetchError::Validation(format!(
            "{} '{}' contains invalid characters",
            what, value
        )));
    }
    Ok(value)
}

fn check_version(value: &str) -> Result<&str, FetchError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FetchError::Validation("version must not be empty".to_string()));
    }
    if !VERSION_PATTERN.is_match(value) {
        return Err(FetchError::Validation(format!(
            "'{}' is not a valid version",
            value
        )));
    }
    Ok(value)
}

/// Source-forge tag of a Ruby release: `3.3.0` -> `v3_3_0`
fn release_tag(version: &str) -> String {
    format!("v{}", version.replace(['.', '-'], "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert_eq!(check_name("gem name", " rails ").unwrap(), "rails");
        assert!(check_name("gem name", "active_support-ext.v2").is_ok());
        assert!(matches!(
            check_name("gem name", "   "),
            Err(FetchError::Validation(_))
        ));
        assert!(check_name("gem name", "../etc/passwd").is_err());
        assert!(check_name("gem name", "rails?x=1").is_err());
    }

    #[test]
    fn test_check_version() {
        assert!(check_version("3.3.0").is_ok());
        assert!(check_version("3.4").is_ok());
        assert!(check_version("7.1.0.beta1").is_ok());
        assert!(check_version("3.3.0-preview1").is_ok());
        assert!(check_version("").is_err());
        assert!(check_version("latest").is_err());
        assert!(check_version("1.0/../..").is_err());
    }

    #[test]
    fn test_release_tag() {
        assert_eq!(release_tag("3.3.0"), "v3_3_0");
        assert_eq!(release_tag("3.4.0-preview1"), "v3_4_0_preview1");
    }

    #[test]
    fn test_options_default() {
        let options = ClientOptions::default();
        assert!(options.cache_enabled);
        assert_eq!(options.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(options.max_response_size, MAX_RESPONSE_SIZE);
        assert_eq!(options.endpoints.rubygems, "https://rubygems.org");
        assert!(options.user_agent.starts_with("rubykit/"));
    }

    #[test]
    fn test_disabled_cache() {
        let options = ClientOptions {
            cache_enabled: false,
            ..Default::default()
        };
        let client = RubyClient::with_cache(options, Arc::new(TtlCache::new()));
        assert!(client.cache().is_none());
    }

    #[test]
    fn test_endpoints_all() {
        let endpoints = Endpoints::all("http://127.0.0.1:9999/");
        assert_eq!(endpoints.rubygems, "http://127.0.0.1:9999");
        assert_eq!(endpoints.github_api, "http://127.0.0.1:9999");
    }

    #[tokio::test]
    async fn test_validation_before_network() {
        // Unroutable endpoints: a network attempt would fail differently
        let options = ClientOptions {
            endpoints: Endpoints::all("http://invalid.invalid"),
            ..Default::default()
        };
        let client = RubyClient::new(options);

        let result = client.list_versions("", &Query::default()).await;
        assert!(matches!(result, Err(FetchError::Validation(_))));

        let result = client.gem_version_info("rails", "not a version").await;
        assert!(matches!(result, Err(FetchError::Validation(_))));

        let empty: [&str; 0] = [];
        let result = client.latest_versions(&empty).await;
        assert!(matches!(result, Err(FetchError::Validation(_))));
    }
}
