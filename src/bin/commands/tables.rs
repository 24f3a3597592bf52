use std::process::ExitCode;

use pgsetup::output::statement_preview;
use pgsetup::{OutputFormat, TableSet, TableSpec};
use tabled::Tabled;

use super::print_json;

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "#")]
    position: usize,
    table: String,
    statement: String,
}

pub fn run(tables: &TableSet, output_format: OutputFormat) -> ExitCode {
    if output_format.is_json() {
        let specs: Vec<&TableSpec> = tables.iter().collect();
        print_json(output_format, &specs);
        return ExitCode::SUCCESS;
    }

    let rows: Vec<TableRow> = tables
        .iter()
        .enumerate()
        .map(|(i, spec)| TableRow {
            position: i + 1,
            table: spec.name().to_string(),
            statement: statement_preview(spec.create_sql(), 60),
        })
        .collect();

    println!("{}", output_format.render_rows(rows));

    ExitCode::SUCCESS
}
