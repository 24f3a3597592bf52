//! Table definitions
//!
//! The built-in set describes the findings/scans schema used by the analysis
//! services. A TOML manifest can replace it:
//!
//! ```toml
//! [[tables]]
//! name = "scans"
//! create_sql = "CREATE TABLE scans (id SERIAL PRIMARY KEY)"
//! ```

use std::path::Path;

use anyhow::{anyhow, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;

use super::core::{TableSet, TableSpec};

/// DDL for every built-in table (PostgreSQL dialect)
pub struct TableDefinitions;

impl TableDefinitions {
    pub const FINDINGS_CWE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.findings_cwe (
            id SERIAL PRIMARY KEY,
            finding_id VARCHAR(32) UNIQUE,
            cwe_id VARCHAR(10),
            cwe_name TEXT,
            affected_line TEXT,
            partial_code TEXT,
            file_name TEXT,
            status VARCHAR(20),
            org_id VARCHAR(32),
            reason TEXT,
            remediation_action TEXT,
            scanner VARCHAR(20),
            scan_engine VARCHAR(50)
        );
    "#;

    pub const SCANS: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.scans (
            id SERIAL PRIMARY KEY,
            group_id VARCHAR(24),
            project_link TEXT,
            project VARCHAR(255),
            repository TEXT,
            scan_link TEXT,
            scan_id VARCHAR(24) UNIQUE,
            branch VARCHAR(255),
            commit VARCHAR(40),
            fp_vulnerabilities INTEGER,
            tp_vulnerabilities INTEGER,
            unverified_vulnerabilities INTEGER,
            initiator VARCHAR(255),
            findings_sast INTEGER,
            findings_sca INTEGER,
            findings_secrets INTEGER,
            findings_compliance INTEGER,
            findings_iac INTEGER,
            findings_malware INTEGER,
            findings_api INTEGER,
            findings_pii INTEGER,
            findings_container INTEGER,
            tags TEXT,
            "timestamp" TIMESTAMP WITHOUT TIME ZONE,
            total_findings INTEGER
        );
    "#;

    pub const SYNTHESIS_RESPONSE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.synthesis_response (
            id SERIAL PRIMARY KEY,
            question VARCHAR NOT NULL,
            db_response VARCHAR NOT NULL,
            model_response VARCHAR NOT NULL
        );
    "#;

    pub const SQL_USER_QUESTIONS: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.sql_user_questions (
            id SERIAL PRIMARY KEY,
            question VARCHAR NOT NULL,
            query VARCHAR NOT NULL
        );
    "#;

    pub const REPORT_PAGE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.report_page (
            id SERIAL PRIMARY KEY,
            input VARCHAR NOT NULL,
            output VARCHAR NOT NULL
        );
    "#;

    pub const QUESTIONS_RESPONSES: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.questions_responses (
            id SERIAL PRIMARY KEY,
            question VARCHAR NOT NULL,
            response VARCHAR NOT NULL
        );
    "#;

    pub const ERROR_RESPONSES: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.error_responses (
            id SERIAL PRIMARY KEY,
            question VARCHAR NOT NULL
        );
    "#;

    pub const DATASETS: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.datasets (
            source VARCHAR,
            sinc VARCHAR,
            decision VARCHAR NOT NULL,
            finding VARCHAR NOT NULL,
            scanner VARCHAR NOT NULL,
            external_id VARCHAR NOT NULL,
            id BIGINT PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY
                (INCREMENT 1 START 1 MINVALUE 1 MAXVALUE 9223372036854775807 CACHE 1)
        );
    "#;

    pub const CLASSIFICATION_RESPONSE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.classification_response (
            id SERIAL PRIMARY KEY,
            question VARCHAR NOT NULL,
            result VARCHAR NOT NULL
        );
    "#;

    pub const AGENT_RESPONSE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS public.agent_response (
            id SERIAL PRIMARY KEY,
            user_question VARCHAR NOT NULL,
            tag VARCHAR NOT NULL
        );
    "#;

    /// Built-in tables in provisioning order
    pub const ALL: &'static [(&'static str, &'static str)] = &[
        ("findings_cwe", Self::FINDINGS_CWE),
        ("scans", Self::SCANS),
        ("synthesis_response", Self::SYNTHESIS_RESPONSE),
        ("sql_user_questions", Self::SQL_USER_QUESTIONS),
        ("report_page", Self::REPORT_PAGE),
        ("questions_responses", Self::QUESTIONS_RESPONSES),
        ("error_responses", Self::ERROR_RESPONSES),
        ("datasets", Self::DATASETS),
        ("classification_response", Self::CLASSIFICATION_RESPONSE),
        ("agent_response", Self::AGENT_RESPONSE),
    ];

    /// The built-in table set
    pub fn table_set() -> TableSet {
        TableSet::from_unique(
            Self::ALL
                .iter()
                .map(|(name, sql)| TableSpec::new(*name, *sql))
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct TableManifest {
    #[serde(default)]
    tables: Vec<TableSpec>,
}

/// Load a table set from a TOML manifest
///
/// The manifest must declare at least one table and no name twice.
pub fn load_manifest(path: &Path) -> Result<TableSet> {
    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!("Failed to read table manifest '{}': {}", path.display(), e))?;

    let manifest = settings
        .try_deserialize::<TableManifest>()
        .map_err(|e| anyhow!("Invalid table manifest '{}': {}", path.display(), e))?;

    if manifest.tables.is_empty() {
        return Err(anyhow!(
            "Table manifest '{}' declares no tables",
            path.display()
        ));
    }

    TableSet::new(manifest.tables)
        .map_err(|e| anyhow!("Invalid table manifest '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn write_manifest(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let names: HashSet<_> = TableDefinitions::ALL.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), TableDefinitions::ALL.len());
    }

    #[test]
    fn test_builtin_set_order() {
        let set = TableDefinitions::table_set();
        assert_eq!(set.len(), 10);
        assert_eq!(set.names()[0], "findings_cwe");
        assert_eq!(set.names()[1], "scans");
        assert_eq!(set.names()[9], "agent_response");
    }

    #[test]
    fn test_builtin_ddl_targets_its_own_table() {
        for (name, sql) in TableDefinitions::ALL {
            assert!(
                sql.contains(&format!("public.{} (", name)),
                "DDL for {} creates a different table",
                name
            );
        }
    }

    #[test]
    fn test_load_manifest() {
        let (_dir, path) = write_manifest(
            r#"
[[tables]]
name = "scans"
create_sql = "CREATE TABLE scans (id INTEGER PRIMARY KEY)"

[[tables]]
name = "datasets"
create_sql = "CREATE TABLE datasets (id INTEGER PRIMARY KEY)"
"#,
        );

        let set = load_manifest(&path).unwrap();

        assert_eq!(set.names(), vec!["scans", "datasets"]);
        assert_eq!(
            set.get("datasets").unwrap().create_sql(),
            "CREATE TABLE datasets (id INTEGER PRIMARY KEY)"
        );
    }

    #[test]
    fn test_load_manifest_rejects_duplicates() {
        let (_dir, path) = write_manifest(
            r#"
[[tables]]
name = "scans"
create_sql = "CREATE TABLE scans (id INTEGER)"

[[tables]]
name = "scans"
create_sql = "CREATE TABLE scans (id BIGINT)"
"#,
        );

        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_load_manifest_rejects_empty() {
        let (_dir, path) = write_manifest("# nothing here\n");
        assert!(load_manifest(&path).is_err());
    }

    #[test]
    fn test_load_manifest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_manifest(&dir.path().join("absent.toml")).is_err());
    }
}
