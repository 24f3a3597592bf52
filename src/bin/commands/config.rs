use std::path::Path;
use std::process::ExitCode;

use pgsetup::{ConnectionConfig, ConnectionInfo, OutputFormat, TableSet};
use serde::Serialize;

use super::{print_json, Backend};

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    config_file_exists: bool,
    target: String,
    connection: ConnectionInfo,
    tables: usize,
}

pub fn run(
    backend: &Backend,
    config: &ConnectionConfig,
    tables: &TableSet,
    output_format: OutputFormat,
) -> ExitCode {
    let config_file = ConnectionConfig::config_file_path();
    let info = ConfigInfo {
        config_file_exists: Path::new(&config_file).exists(),
        config_file,
        target: backend.target(),
        connection: config.info(),
        tables: tables.len(),
    };

    if output_format.is_json() {
        print_json(output_format, &info);
        return ExitCode::SUCCESS;
    }

    println!("pgsetup Configuration:");
    println!();
    println!(
        "  Config file:        {}{}",
        info.config_file,
        if info.config_file_exists {
            ""
        } else {
            " (not found)"
        }
    );
    println!("  Target:             {}", info.target);
    println!("  Tables:             {}", info.tables);
    println!();
    for line in config.summary().lines() {
        println!("  {}", line);
    }

    ExitCode::SUCCESS
}
