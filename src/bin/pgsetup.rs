#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pgsetup::*;
use tracing::{error, warn, Level};

mod commands;

use commands::Backend;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.pgsetup/pgsetup.toml is used if present
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// TOML manifest with the tables to provision instead of the built-in set
    #[clap(short, long, global = true)]
    tables: Option<PathBuf>,

    /// Provision a local SQLite database file instead of the PostgreSQL server.
    /// The built-in tables use PostgreSQL DDL, so pair this with --tables
    #[clap(long, global = true)]
    sqlite: Option<PathBuf>,

    /// Output format: table (default), markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and create every missing table (default)
    Run,

    /// Report which tables exist without changing anything
    Status,

    /// List the tables that would be provisioned
    Tables,

    /// Show the resolved connection settings
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match ConnectionConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let tables = match &cli.tables {
        Some(path) => match load_manifest(path) {
            Ok(t) => t,
            Err(e) => {
                error!("{:#}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            if cli.sqlite.is_some() {
                warn!("built-in table definitions are PostgreSQL DDL; use --tables with a SQLite manifest");
            }
            TableDefinitions::table_set()
        }
    };

    let backend = Backend::new(&config, cli.sqlite.as_deref());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&backend, &config, &tables, cli.format),
        Commands::Status => commands::status::run(&backend, &config, &tables, cli.format),
        Commands::Tables => commands::tables::run(&tables, cli.format),
        Commands::Config => commands::config::run(&backend, &config, &tables, cli.format),
    }
}
