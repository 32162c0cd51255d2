//! Tool builder and contract for Rubykit
//!
//! A [`Tool`] exposes every client operation by name with a JSON input
//! schema, so an RPC adapter can list and dispatch them without knowing the
//! operations themselves.

use crate::cache::SharedCache;
use crate::client::{ClientOptions, Endpoints, RubyClient};
use crate::error::FetchError;
use crate::query::{select_fields, Query};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Resource URI of the popular-gems aggregate
pub const POPULAR_GEMS_URI: &str = "rubygems://popular";

/// Resource URI of the Ruby maintenance status
pub const MAINTENANCE_URI: &str = "ruby://maintenance";

/// Pagination, sort and projection options shared by list tools
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct QueryArgs {
    /// Maximum number of results (1-1000)
    pub limit: Option<i64>,
    /// Number of results to skip
    pub offset: Option<i64>,
    /// One of version_desc, version_asc, date_desc, date_asc
    pub sort: Option<String>,
    /// Only return these fields of each result
    pub fields: Option<Vec<String>>,
}

impl QueryArgs {
    fn query(&self) -> Result<Query, FetchError> {
        Query::new(self.limit, self.offset, self.sort.as_deref())
    }
}

/// Pagination and projection options for lists kept in upstream order
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PageArgs {
    /// Maximum number of results (1-1000)
    pub limit: Option<i64>,
    /// Number of results to skip
    pub offset: Option<i64>,
    /// Only return these fields of each result
    pub fields: Option<Vec<String>>,
}

impl PageArgs {
    fn query(&self) -> Result<Query, FetchError> {
        Query::new(self.limit, self.offset, None)
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GemArgs {
    /// Gem name
    pub name: String,
    /// Only return these fields
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GemQueryArgs {
    /// Gem name
    pub name: String,
    #[serde(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GemPageArgs {
    /// Gem name
    pub name: String,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GemNamesArgs {
    /// Gem names
    pub names: Vec<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GemVersionArgs {
    /// Gem name
    pub name: String,
    /// Exact version
    pub version: String,
    /// Only return these fields
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GemOptionalVersionArgs {
    /// Gem name
    pub name: String,
    /// Version; the latest version when omitted
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Search text
    pub query: String,
    /// Registry result page, starting at 1
    pub page: Option<u32>,
    #[serde(flatten)]
    pub options: PageArgs,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VersionArgs {
    /// Ruby version, e.g. 3.3.0
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct OptionalVersionArgs {
    /// Ruby version or branch, e.g. 3.3; every branch when omitted
    pub version: Option<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RoadmapVersionArgs {
    /// Numeric roadmap version id or version name, e.g. 3.4
    pub version: String,
}

/// Name, description and input schema of one tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A read-only resource served by [`Tool::read_resource`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

fn definition<T: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let schema = schema_for!(T);
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"})),
    }
}

/// Builder for configuring the Rubykit tool
#[derive(Debug, Clone, Default)]
pub struct ToolBuilder {
    options: ClientOptions,
    cache: Option<SharedCache>,
}

impl ToolBuilder {
    /// Create a new tool builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = ua.into();
        self
    }

    /// Enable or disable response caching
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.options.cache_enabled = enabled;
        self
    }

    /// Set lifetime of cached entries
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.options.cache_ttl = ttl;
        self
    }

    /// Share an existing cache
    pub fn cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set response body ceiling in bytes
    pub fn max_response_size(mut self, bytes: u64) -> Self {
        self.options.max_response_size = bytes;
        self
    }

    /// Override upstream base URLs
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.options.endpoints = endpoints;
        self
    }

    /// Build the tool
    pub fn build(self) -> Tool {
        let client = match self.cache {
            Some(cache) => RubyClient::with_cache(self.options, cache),
            None => RubyClient::new(self.options),
        };
        Tool { client }
    }
}

/// Configured Rubykit tool
#[derive(Debug, Clone, Default)]
pub struct Tool {
    client: RubyClient,
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Underlying client
    pub fn client(&self) -> &RubyClient {
        &self.client
    }

    /// Every tool with its input schema
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            definition::<GemQueryArgs>(
                "list_versions",
                "List published versions of a gem with release dates, platforms and requirements",
            ),
            definition::<GemNamesArgs>(
                "latest_versions",
                "Get the latest version of one or more gems",
            ),
            definition::<PageArgs>(
                "popular_gems",
                "Get the latest versions of widely used gems",
            ),
            definition::<GemArgs>(
                "gem_info",
                "Get metadata of a gem: summary, licenses, links, dependencies",
            ),
            definition::<GemVersionArgs>(
                "gem_version_info",
                "Get metadata of one specific version of a gem",
            ),
            definition::<GemPageArgs>(
                "reverse_dependencies",
                "List gems that depend on a gem",
            ),
            definition::<GemOptionalVersionArgs>(
                "download_stats",
                "Get download counts of a gem version",
            ),
            definition::<SearchArgs>("search", "Search gems by name and description"),
            definition::<PageArgs>("latest_gems", "List the most recently published gems"),
            definition::<PageArgs>(
                "just_updated_gems",
                "List the most recently updated gems",
            ),
            definition::<GemOptionalVersionArgs>(
                "gem_changelog",
                "Get the changelog of a gem from its published changelog URL",
            ),
            definition::<QueryArgs>(
                "ruby_versions",
                "List Ruby releases with release dates and download links",
            ),
            definition::<OptionalVersionArgs>(
                "ruby_maintenance_status",
                "Get the maintenance status and end-of-life dates of Ruby branches",
            ),
            definition::<VersionArgs>(
                "ruby_version_changelog",
                "Get the release notes of a Ruby version",
            ),
            definition::<VersionArgs>(
                "github_release_notes",
                "Get the release notes of a Ruby version from its GitHub release",
            ),
            definition::<QueryArgs>(
                "ruby_roadmap",
                "List versions on the Ruby issue tracker roadmap",
            ),
            definition::<RoadmapVersionArgs>(
                "roadmap_version",
                "Get the description and issues of a Ruby roadmap version",
            ),
            definition::<NoArgs>("clear_cache", "Drop all cached upstream data"),
        ]
    }

    /// True if `name` is a known tool
    pub fn has_tool(&self, name: &str) -> bool {
        self.definitions().iter().any(|d| d.name == name)
    }

    /// Execute a tool by name
    ///
    /// Malformed arguments and unknown tools are reported as
    /// [`FetchError::Validation`].
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, FetchError> {
        debug!(tool = %name, "Executing tool");
        let client = &self.client;

        match name {
            "list_versions" => {
                let args: GemQueryArgs = parse_args(arguments)?;
                let query = args.query.query()?;
                let records = client.list_versions(&args.name, &query).await?;
                render(records, args.query.fields.as_deref())
            }
            "latest_versions" => {
                let args: GemNamesArgs = parse_args(arguments)?;
                let query = args.page.query()?;
                let latest = client.latest_versions(args.names.as_slice()).await?;
                render(query.paginate(latest), args.page.fields.as_deref())
            }
            "popular_gems" => {
                let args: PageArgs = parse_args(arguments)?;
                let query = args.query()?;
                let latest = client.popular_gems().await?;
                render(query.paginate(latest), args.fields.as_deref())
            }
            "gem_info" => {
                let args: GemArgs = parse_args(arguments)?;
                render(client.gem_info(&args.name).await?, args.fields.as_deref())
            }
            "gem_version_info" => {
                let args: GemVersionArgs = parse_args(arguments)?;
                let info = client.gem_version_info(&args.name, &args.version).await?;
                render(info, args.fields.as_deref())
            }
            "reverse_dependencies" => {
                let args: GemPageArgs = parse_args(arguments)?;
                let query = args.page.query()?;
                render(client.reverse_dependencies(&args.name, &query).await?, None)
            }
            "download_stats" => {
                let args: GemOptionalVersionArgs = parse_args(arguments)?;
                let stats = client
                    .download_stats(&args.name, args.version.as_deref())
                    .await?;
                render(stats, None)
            }
            "search" => {
                let args: SearchArgs = parse_args(arguments)?;
                let query = args.options.query()?;
                let gems = client.search(&args.query, args.page, &query).await?;
                render(gems, args.options.fields.as_deref())
            }
            "latest_gems" | "just_updated_gems" => {
                let args: PageArgs = parse_args(arguments)?;
                let query = args.query()?;
                let gems = if name == "latest_gems" {
                    client.latest_gems(&query).await?
                } else {
                    client.just_updated_gems(&query).await?
                };
                render(gems, args.fields.as_deref())
            }
            "gem_changelog" => {
                let args: GemOptionalVersionArgs = parse_args(arguments)?;
                let result = client
                    .gem_changelog(&args.name, args.version.as_deref())
                    .await?;
                render(result, None)
            }
            "ruby_versions" => {
                let args: QueryArgs = parse_args(arguments)?;
                let query = args.query()?;
                render(client.ruby_versions(&query).await?, args.fields.as_deref())
            }
            "ruby_maintenance_status" => {
                let args: OptionalVersionArgs = parse_args(arguments)?;
                let query = args.page.query()?;
                let records = client
                    .ruby_maintenance_status(args.version.as_deref())
                    .await?;
                render(query.paginate(records), args.page.fields.as_deref())
            }
            "ruby_version_changelog" => {
                let args: VersionArgs = parse_args(arguments)?;
                render(client.ruby_version_changelog(&args.version).await?, None)
            }
            "github_release_notes" => {
                let args: VersionArgs = parse_args(arguments)?;
                render(client.github_release_notes(&args.version).await?, None)
            }
            "ruby_roadmap" => {
                let args: QueryArgs = parse_args(arguments)?;
                let query = args.query()?;
                render(client.ruby_roadmap(&query).await?, args.fields.as_deref())
            }
            "roadmap_version" => {
                let args: RoadmapVersionArgs = parse_args(arguments)?;
                render(client.roadmap_version(&args.version).await?, None)
            }
            "clear_cache" => {
                client.clear_cache();
                Ok(json!({"cleared": true}))
            }
            other => Err(FetchError::Validation(format!("Unknown tool: {}", other))),
        }
    }

    /// Read-only resources
    pub fn resources(&self) -> Vec<ResourceDefinition> {
        vec![
            ResourceDefinition {
                uri: POPULAR_GEMS_URI.to_string(),
                name: "Popular gems".to_string(),
                description: "Latest versions of widely used gems".to_string(),
                mime_type: "application/json".to_string(),
            },
            ResourceDefinition {
                uri: MAINTENANCE_URI.to_string(),
                name: "Ruby maintenance status".to_string(),
                description: "Maintenance status of every Ruby branch".to_string(),
                mime_type: "application/json".to_string(),
            },
        ]
    }

    /// Read a resource by URI
    pub async fn read_resource(&self, uri: &str) -> Result<Value, FetchError> {
        match uri {
            POPULAR_GEMS_URI => render(self.client.popular_gems().await?, None),
            MAINTENANCE_URI => render(self.client.ruby_maintenance_status(None).await?, None),
            other => Err(FetchError::Validation(format!("Unknown resource: {}", other))),
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, FetchError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| FetchError::Validation(format!("invalid arguments: {}", e)))
}

fn render<T: Serialize>(result: T, fields: Option<&[String]>) -> Result<Value, FetchError> {
    let value = serde_json::to_value(result).map_err(|e| {
        FetchError::corrupted_with(format!("Failed to serialize result: {}", e), 0, e)
    })?;
    Ok(select_fields(value, fields.unwrap_or_default()))
}
