//! Intentroot CLI
//!
//! Operator surface for hybrid intent resolution.

use anyhow::Result;
use clap::Parser;
use intentroot_core::error::exit_codes;
use intentroot_core::{Config, Database, IntentRootError, SqliteVectorIndex};
use std::path::PathBuf;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

/// Shared handles every command may need
pub struct Context {
    pub config: Config,
    pub format: app::OutputFormat,
    db_path: PathBuf,
}

impl Context {
    pub fn open_index(&self) -> Result<SqliteVectorIndex> {
        Ok(SqliteVectorIndex::open(&self.db_path)?)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Open database (use INTENTROOT_DB env var if set, otherwise use default)
    let db_path = std::env::var("INTENTROOT_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Database::default_path());

    let ctx = Context {
        config,
        format: cli.format,
        db_path,
    };

    match cli.command {
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Collection(args) => commands::collection::run(args, &ctx).await,
        Commands::Intent(args) => commands::intent::run(args, &ctx).await,
        Commands::Score(args) => commands::score::run(args, &ctx).await,
        Commands::Rules(args) => commands::rules::run(args, &ctx).await,
        Commands::Resolve(args) => commands::resolve::run(args, &ctx).await,
        Commands::Memory(args) => commands::memory::run(args, &ctx).await,
        Commands::Status => commands::status::run(&ctx).await,
    }
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<IntentRootError>())
        .map(IntentRootError::exit_code)
        .unwrap_or(exit_codes::GENERAL_ERROR)
}
