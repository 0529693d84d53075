//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fulfil", author, version, about = "Query a Fulfil tenant from the shell")]
pub struct Cli {
    /// Path to config.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Tenant subdomain, overriding config and FULFIL_SUBDOMAIN
    #[arg(long, global = true)]
    pub subdomain: Option<String>,

    /// Directory for fulfil.log
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Also print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List records through the REST listing endpoint
    Find {
        /// Dotted model name, e.g. sale.sale
        model: String,
        /// Domain as JSON
        #[arg(long, default_value = "[]")]
        filter: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
        /// Field to return; repeat for several
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Order as JSON, e.g. '[["create_date","DESC"]]'
        #[arg(long)]
        order: Option<String>,
    },
    /// Fetch one record by id
    Get { model: String, id: i64 },
    /// Call a remote method with a JSON array of positional arguments
    Call {
        model: String,
        method: String,
        #[arg(default_value = "[]")]
        args: String,
    },
    /// Stream every matching record, page by page
    SearchReadAll {
        model: String,
        #[arg(long, default_value = "[]")]
        domain: String,
        #[arg(long = "field")]
        fields: Vec<String>,
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Check whether the configured API key is accepted
    AuthStatus,
    /// Print an OAuth authorization URL and its state
    AuthorizeUrl {
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        client_secret: String,
        #[arg(long)]
        redirect_uri: String,
        /// Scope to request; repeat for several
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
    },
    /// Exchange an OAuth authorization code for an access token
    Token {
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        client_secret: String,
        #[arg(long)]
        redirect_uri: String,
        #[arg(long)]
        code: String,
    },
}

impl Command {
    /// Subcommand name, safe to log (arguments may hold secrets).
    pub fn name(&self) -> &'static str {
        match self {
            Command::Find { .. } => "find",
            Command::Get { .. } => "get",
            Command::Call { .. } => "call",
            Command::SearchReadAll { .. } => "search-read-all",
            Command::AuthStatus => "auth-status",
            Command::AuthorizeUrl { .. } => "authorize-url",
            Command::Token { .. } => "token",
        }
    }

    /// Whether the command needs an API client (as opposed to OAuth only).
    pub fn needs_client(&self) -> bool {
        !matches!(self, Command::AuthorizeUrl { .. } | Command::Token { .. })
    }
}
