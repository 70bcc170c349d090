//! CLI argument definitions

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plctl")]
#[command(about = "PromptLoom Template Control Tool")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Template store file path
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Template management operations
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Render a template into a final instruction string
    Render {
        /// Template id; the language default is used when omitted
        #[arg(short, long)]
        template_id: Option<String>,
        /// Language whose default template to use
        #[arg(short, long)]
        language: Option<String>,
        /// Schema file (JSON: {"schema": "...", "triplet": [...]})
        #[arg(short = 'S', long)]
        schema: PathBuf,
        /// Input text
        #[arg(short = 'x', long, conflicts_with = "text_file")]
        text: Option<String>,
        /// Read the input text from a file
        #[arg(short = 'F', long)]
        text_file: Option<PathBuf>,
    },
    /// Evaluate a template against test texts
    Eval {
        /// Template id to evaluate
        #[arg(short, long, conflicts_with = "content_file")]
        template_id: Option<String>,
        /// Evaluate raw template content from a file instead
        #[arg(short = 'C', long)]
        content_file: Option<PathBuf>,
        /// Label used in the report when --content-file is given
        #[arg(short, long)]
        name: Option<String>,
        /// Schema file (JSON: {"schema": "...", "triplet": [...]})
        #[arg(short = 'S', long)]
        schema: PathBuf,
        /// Test texts: a JSON array file (.json) or one text per line
        #[arg(short = 'T', long)]
        texts: PathBuf,
        /// Metrics to compute (defaults to all four)
        #[arg(short, long = "metric")]
        metrics: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Create a new template
    Create {
        /// Template name
        #[arg(short, long)]
        name: String,
        /// Template description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Language tag (e.g. en, zh)
        #[arg(short, long)]
        language: String,
        /// Template content
        #[arg(short = 'x', long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read template content from a file
        #[arg(short = 'F', long)]
        content_file: Option<PathBuf>,
        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
        /// Mark as the default template for its language
        #[arg(long)]
        default: bool,
    },
    /// Show a template
    Get {
        /// Template id
        template_id: String,
    },
    /// Update fields of a template
    Update {
        /// Template id
        template_id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New content
        #[arg(short = 'x', long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read new content from a file
        #[arg(short = 'F', long)]
        content_file: Option<PathBuf>,
        /// Replace tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Replace metadata with a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
        /// Set the version label
        #[arg(short = 'V', long)]
        version: Option<String>,
    },
    /// Delete a template
    Delete {
        /// Template id
        template_id: String,
    },
    /// Duplicate a template under a new name
    Duplicate {
        /// Source template id
        template_id: String,
        /// Name for the copy
        #[arg(short, long)]
        name: String,
    },
    /// List templates
    List {
        /// Filter by language (exact match)
        #[arg(short, long)]
        language: Option<String>,
        /// Filter by tags (match any, repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Keyword filter against name and description
        #[arg(short, long)]
        keyword: Option<String>,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Page size
        #[arg(long, default_value = "20")]
        page_size: usize,
    },
    /// Show store statistics
    Stats,
    /// Install the built-in default templates into an empty store
    Seed,
}

#[derive(clap::ValueEnum, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
