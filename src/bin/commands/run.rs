use std::process::ExitCode;

use pgsetup::{ConnectionConfig, OutputFormat, ProvisionReport, TableSet, TracingObserver};
use tabled::Tabled;

use super::{print_json, Backend};

#[derive(Tabled)]
struct ReportRow {
    table: String,
    action: String,
    error: String,
}

pub fn run(
    backend: &Backend,
    config: &ConnectionConfig,
    tables: &TableSet,
    output_format: OutputFormat,
) -> ExitCode {
    // failures are already logged by the observer
    let report = match backend.provision(&config.retry_policy(), tables, &TracingObserver) {
        Ok(r) => r,
        Err(_) => return ExitCode::FAILURE,
    };

    print_report(&report, output_format);
    ExitCode::SUCCESS
}

fn print_report(report: &ProvisionReport, output_format: OutputFormat) {
    if output_format.is_json() {
        print_json(output_format, report);
        return;
    }

    let rows: Vec<ReportRow> = report
        .tables
        .iter()
        .map(|t| ReportRow {
            table: t.name.clone(),
            action: t.action.to_string(),
            error: t.error.clone().unwrap_or_default(),
        })
        .collect();

    println!("{}", output_format.render_rows(rows));
    println!(
        "{}: {} created, {} already present, {} failed",
        report.target,
        report.created(),
        report.skipped(),
        report.failed()
    );
}
