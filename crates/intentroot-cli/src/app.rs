//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intentroot")]
#[command(
    author,
    version,
    about = "Hybrid intent resolution over rules, vector similarity and LLM signals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to INTENTROOT_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect configuration
    Config(ConfigArgs),

    /// Manage vector collections
    Collection(CollectionArgs),

    /// Train and list intents
    Intent(IntentArgs),

    /// Score a JSON array of candidates offline
    Score(ScoreArgs),

    /// Run only the rule matcher
    Rules(QueryArgs),

    /// Resolve a query with every configured classifier
    Resolve(ResolveArgs),

    /// Episodic memory
    Memory(MemoryArgs),

    /// Show index status
    Status,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Load and validate the configuration
    Check,
    /// Print the effective configuration
    Show,
}

#[derive(Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub action: CollectionAction,
}

#[derive(Subcommand)]
pub enum CollectionAction {
    /// Create a collection
    Create {
        name: String,
        /// Vector dimensions
        #[arg(long)]
        dims: usize,
        /// Named facet (repeatable; defaults to "content")
        #[arg(long = "facet")]
        facets: Vec<String>,
    },
    /// List all collections
    List,
    /// Remove a collection and its points
    #[command(alias = "rm")]
    Remove { name: String },
}

#[derive(Args)]
pub struct IntentArgs {
    #[command(subcommand)]
    pub action: IntentAction,
}

#[derive(Subcommand)]
pub enum IntentAction {
    /// Embed a YAML catalog and upsert its intents
    Train {
        catalog: PathBuf,
        #[arg(long)]
        agent: Option<String>,
    },
    /// List trained intents
    List {
        #[arg(long)]
        agent: Option<String>,
    },
}

#[derive(Args)]
pub struct ScoreArgs {
    /// JSON file with an array of candidates ("-" reads stdin)
    pub candidates: PathBuf,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Query text
    #[arg(required = true)]
    pub query: Vec<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Query text
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Session identifier
    #[arg(long, default_value = "cli")]
    pub session: String,

    /// Agent or domain used for routing
    #[arg(long)]
    pub agent: Option<String>,

    /// Assistant response; when given, the turn is written to memory
    #[arg(long)]
    pub response: Option<String>,
}

#[derive(Args)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub action: MemoryAction,
}

#[derive(Subcommand)]
pub enum MemoryAction {
    /// Recall past turns of a session similar to the query
    Recall {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long)]
        session: String,
        /// Number of entries
        #[arg(short = 'n', default_value = "5")]
        limit: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
