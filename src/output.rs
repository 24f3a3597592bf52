//! Rendering of command results
//!
//! Every command prints either rows (bordered or markdown table) or a
//! serialized document (compact or indented JSON). [`OutputFormat`] picks
//! one of the four.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a command prints its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Rows in a rounded, bordered table
    #[default]
    Table,
    /// Rows as a markdown table, for pasting into docs and tickets
    Markdown,
    /// One JSON document on a single line
    Json,
    /// One JSON document, indented
    JsonPretty,
}

/// Accepted spellings, canonical name first
const SPELLINGS: &[(&str, OutputFormat)] = &[
    ("table", OutputFormat::Table),
    ("markdown", OutputFormat::Markdown),
    ("json", OutputFormat::Json),
    ("json-pretty", OutputFormat::JsonPretty),
    ("pretty", OutputFormat::Table),
    ("md", OutputFormat::Markdown),
    ("jsonpretty", OutputFormat::JsonPretty),
];

impl OutputFormat {
    /// Canonical format names, as shown in help and error text
    pub const NAMES: &'static [&'static str] = &["table", "markdown", "json", "json-pretty"];

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
        }
    }

    /// Serialize `value` as JSON, on one line only for [`OutputFormat::Json`]
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::Json => serde_json::to_string(value),
            _ => serde_json::to_string_pretty(value),
        }
    }

    /// Render rows as a table; markdown for [`OutputFormat::Markdown`],
    /// rounded borders otherwise
    #[cfg(feature = "cli")]
    pub fn render_rows<T: tabled::Tabled>(&self, rows: Vec<T>) -> String {
        use tabled::settings::Style;

        let mut table = tabled::Table::new(rows);
        match self {
            Self::Markdown => table.with(Style::markdown()),
            _ => table.with(Style::rounded()),
        };
        table.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        SPELLINGS
            .iter()
            .find(|(spelling, _)| *spelling == wanted)
            .map(|(_, format)| *format)
            .ok_or_else(|| {
                format!(
                    "unknown output format '{}', expected one of: {}",
                    s,
                    Self::NAMES.join(", ")
                )
            })
    }
}

/// First line of a SQL statement, cut to `width` characters with a trailing
/// `...` when longer
pub fn statement_preview(sql: &str, width: usize) -> String {
    let line = sql.trim().lines().next().unwrap_or_default().trim();
    if line.chars().count() <= width {
        return line.to_string();
    }
    let kept: String = line.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_round_trip() {
        for name in OutputFormat::NAMES {
            let format: OutputFormat = name.parse().unwrap();
            assert_eq!(format.to_string(), *name);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("MD".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert_eq!("pretty".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        let err = "csv".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("json-pretty"));
    }

    #[test]
    fn test_to_json() {
        let value = serde_json::json!({"name": "scans"});
        assert_eq!(
            OutputFormat::Json.to_json(&value).unwrap(),
            r#"{"name":"scans"}"#
        );
        assert!(OutputFormat::JsonPretty.to_json(&value).unwrap().contains('\n'));
        assert!(OutputFormat::Json.is_json());
        assert!(!OutputFormat::Markdown.is_json());
    }

    #[test]
    fn test_statement_preview() {
        let sql = "\n    CREATE TABLE IF NOT EXISTS public.scans (\n        id SERIAL\n    );\n";
        assert_eq!(
            statement_preview(sql, 60),
            "CREATE TABLE IF NOT EXISTS public.scans ("
        );
        assert_eq!(statement_preview(sql, 15), "CREATE TABLE...");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_render_rows() {
        #[derive(tabled::Tabled)]
        struct Row {
            table: &'static str,
            action: &'static str,
        }

        let rows = || {
            vec![Row {
                table: "scans",
                action: "created",
            }]
        };

        let markdown = OutputFormat::Markdown.render_rows(rows());
        assert!(markdown.starts_with("| table"));
        assert!(markdown.contains("| scans"));

        let rounded = OutputFormat::Table.render_rows(rows());
        assert!(rounded.starts_with('╭'));
        assert!(rounded.contains("created"));
    }
}
