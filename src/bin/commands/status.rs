use std::process::ExitCode;

use pgsetup::{ConnectionConfig, OutputFormat, TableSet, TableStatus, TracingObserver};
use serde::Serialize;
use tabled::Tabled;

use super::{print_json, Backend};

#[derive(Tabled)]
struct StatusRow {
    table: String,
    state: &'static str,
    error: String,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    target: String,
    tables: &'a [TableStatus],
}

pub fn run(
    backend: &Backend,
    config: &ConnectionConfig,
    tables: &TableSet,
    output_format: OutputFormat,
) -> ExitCode {
    let statuses = match backend.status(&config.retry_policy(), tables, &TracingObserver) {
        Ok(s) => s,
        Err(_) => return ExitCode::FAILURE,
    };

    if output_format.is_json() {
        print_json(
            output_format,
            &StatusOutput {
                target: backend.target(),
                tables: &statuses,
            },
        );
        return ExitCode::SUCCESS;
    }

    let rows: Vec<StatusRow> = statuses
        .iter()
        .map(|s| StatusRow {
            table: s.name.clone(),
            state: match s.exists {
                Some(true) => "present",
                Some(false) => "missing",
                None => "unknown",
            },
            error: s.error.clone().unwrap_or_default(),
        })
        .collect();
    let missing = statuses.iter().filter(|s| s.exists == Some(false)).count();

    println!("{}", output_format.render_rows(rows));
    println!("{}: {} table(s) missing", backend.target(), missing);

    ExitCode::SUCCESS
}
