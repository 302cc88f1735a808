//! CLI argument definitions using clap derive

use crate::client::{Filter, RequestOptions};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

/// Restify - cache-aware REST client
///
/// Issues requests against a configured endpoint and reconciles every
/// response with a local TTL cache.
#[derive(Parser, Debug)]
#[command(name = "restify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RESTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured endpoint
    #[arg(long, global = true, env = "RESTIFY_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET a path
    Get(ReadArgs),

    /// POST a JSON payload to a path
    Post(WriteArgs),

    /// PUT a JSON payload to a path
    Put(WriteArgs),

    /// DELETE a path (always over the network)
    Delete(ReadArgs),

    /// Query a collection with filter predicates
    Find(FindArgs),

    /// Manage stored cache entries
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Per-request cache and network flags
#[derive(Args, Debug, Clone, Default)]
pub struct RequestFlags {
    /// Emit a stored entry before (or instead of) the network
    #[arg(long)]
    pub use_cache: bool,

    /// Skip the cache read and go straight to the network
    #[arg(long, conflicts_with = "use_cache")]
    pub network: bool,

    /// Do not persist the network response
    #[arg(long)]
    pub no_save: bool,

    /// Seconds the stored entry stays fresh
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Explicit cache key
    #[arg(long)]
    pub key: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    pub format: OutputFormat,
}

impl RequestFlags {
    /// Translate the flags into request options
    pub fn to_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().with_save_network(!self.no_save);
        if self.use_cache {
            options = options.with_use_cache(true);
        }
        if self.network {
            options = options.with_use_network(true);
        }
        if let Some(ttl) = self.ttl {
            options = options.with_time_to_live(ttl);
        }
        if let Some(ref key) = self.key {
            options = options.with_key(key.clone());
        }
        options
    }
}

/// Arguments for get and delete
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Path relative to the endpoint
    pub path: String,

    #[command(flatten)]
    pub flags: RequestFlags,
}

/// Arguments for post and put
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// Path relative to the endpoint
    pub path: String,

    /// JSON request body
    #[arg(short, long, value_parser = parse_json, default_value = "{}")]
    pub data: Value,

    #[command(flatten)]
    pub flags: RequestFlags,
}

/// Arguments for the find command
#[derive(Parser, Debug)]
pub struct FindArgs {
    /// Query path (defaults to "find")
    #[arg(short, long, default_value = "")]
    pub path: String,

    /// Return a single record (posts to "find-one" by default)
    #[arg(long)]
    pub one: bool,

    /// Filter predicate as field:operator:value (repeatable)
    #[arg(short = 'w', long = "where", value_parser = parse_filter)]
    pub filters: Vec<Filter>,

    #[command(flatten)]
    pub flags: RequestFlags,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show a stored entry
    Show {
        /// Resolved cache key
        key: String,
    },

    /// Remove one stored entry
    Remove {
        /// Resolved cache key
        key: String,
    },

    /// Remove every stored entry
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., client.endpoint)
        key: String,
        /// Value to set
        value: String,
    },
}

/// How emissions are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Origin header followed by indented JSON
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Parse `field:operator:value`; the value is JSON when it parses as JSON
fn parse_filter(s: &str) -> Result<Filter, String> {
    let mut parts = s.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(operator), Some(raw)) if !field.is_empty() && !operator.is_empty() => {
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.into()));
            Ok(Filter::new(field, operator, value))
        }
        _ => Err(format!("invalid filter '{s}': expected field:operator:value")),
    }
}
