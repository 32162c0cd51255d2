//! Rubykit CLI - gem and Ruby metadata from the command line

mod mcp;

use clap::{Parser, Subcommand, ValueEnum};
use rubykit::{Tool, ToolBuilder, TOOL_LLMTXT};
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Output format for the call subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Single-line JSON
    Compact,
}

/// Rubykit - RubyGems and ruby-lang.org metadata tool
#[derive(Parser, Debug)]
#[command(name = "rubykit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    /// Custom User-Agent
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Disable the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Cache lifetime in seconds
    #[arg(long, global = true, value_name = "SECS")]
    cache_ttl: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Call one tool and print its JSON result
    Call {
        /// Tool name, e.g. list_versions
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, short, default_value = "{}")]
        args: String,

        /// Output format
        #[arg(long, short, default_value = "pretty")]
        output: OutputFormat,
    },
    /// List available tools
    Tools,
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    let tool = build_tool(cli.user_agent.clone(), cli.no_cache, cli.cache_ttl);

    match cli.command {
        Some(Commands::Mcp) => {
            mcp::run_server(tool).await;
        }
        Some(Commands::Call { tool: name, args, output }) => {
            run_call(&tool, &name, &args, output).await;
        }
        Some(Commands::Tools) => {
            for definition in tool.definitions() {
                writeln_safe(&format!("{:<26} {}", definition.name, definition.description));
            }
        }
        None => {
            eprintln!("Usage: rubykit call <TOOL> --args '<JSON>'");
            eprintln!("   or: rubykit tools");
            eprintln!("   or: rubykit mcp");
            eprintln!("   or: rubykit --help");
            std::process::exit(1);
        }
    }
}

/// Log to stderr; stdout carries tool output and the RPC stream
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_tool(user_agent: Option<String>, no_cache: bool, cache_ttl: Option<u64>) -> Tool {
    let mut builder = ToolBuilder::new().cache_enabled(!no_cache);

    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(secs) = cache_ttl {
        builder = builder.cache_ttl(Duration::from_secs(secs));
    }

    builder.build()
}

async fn run_call(tool: &Tool, name: &str, args: &str, output: OutputFormat) {
    let arguments = match parse_arguments(args) {
        Ok(arguments) => arguments,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(2);
        }
    };

    match tool.execute(name, arguments).await {
        Ok(result) => writeln_safe(&format_output(&result, output)),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Parse `--args`; must be a JSON object
fn parse_arguments(args: &str) -> Result<Value, String> {
    let value: Value =
        serde_json::from_str(args).map_err(|e| format!("--args is not valid JSON: {}", e))?;
    if !value.is_object() {
        return Err("--args must be a JSON object".to_string());
    }
    Ok(value)
}

fn format_output(value: &Value, output: OutputFormat) -> String {
    let rendered = match output {
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
        OutputFormat::Compact => serde_json::to_string(value),
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
