//! CLI parse: clap types for pagetype. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pagetype CLI - inspect and drive the page types of a site
#[derive(Parser)]
#[command(name = "pagetype")]
#[command(about = "Page type registry, page tree and request dispatch for a CMS site")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Site root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered page types
    Types {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List pages of one type
    List {
        /// Page type name
        page_type: String,
        /// Maximum number of pages to show
        #[arg(long)]
        limit: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a page below an existing parent
    Create {
        /// Page type name
        page_type: String,
        /// Page title
        #[arg(long)]
        title: String,
        /// Slug of the parent page
        #[arg(long, default_value = "/")]
        parent: String,
        /// Explicit slug (default: derived from parent and title)
        #[arg(long)]
        slug: Option<String>,
        /// Schema field value as key=value (repeatable)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Route a request path and print the outcome
    Serve {
        /// URL path
        path: String,
        /// Serve as an editor (installs context menus)
        #[arg(long)]
        editor: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the search texts indexed for a page
    Index {
        /// Page slug
        slug: String,
    },
    /// Show the diff lines produced for a page
    Diff {
        /// Page slug
        slug: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    /// Command name used in log events
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Types { .. } => "types",
            Commands::List { .. } => "list",
            Commands::Create { .. } => "create",
            Commands::Serve { .. } => "serve",
            Commands::Index { .. } => "index",
            Commands::Diff { .. } => "diff",
            Commands::Config => "config",
        }
    }
}
