//! Changelog document model.
//!
//! Mirrors the conventional changelog markup, nested exactly as the YAML
//! reads: a `databaseChangeLog` list of `changeSet` entries, each carrying
//! `changes`, each change wrapping its own attribute map. Writing is the
//! only concern here; parsing existing changelogs belongs to the surrounding
//! tool.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level changelog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogFile {
    #[serde(rename = "databaseChangeLog")]
    pub database_change_log: Vec<ChangeSetEntry>,
}

impl ChangeLogFile {
    pub fn new(change_sets: Vec<ChangeSet>) -> Self {
        Self {
            database_change_log: change_sets
                .into_iter()
                .map(|change_set| ChangeSetEntry { change_set })
                .collect(),
        }
    }

    /// Serialize the document to YAML at `path`, replacing any previous file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

/// Wrapper producing the `- changeSet:` nesting in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSetEntry {
    #[serde(rename = "changeSet")]
    pub change_set: ChangeSet,
}

/// One migration unit: a deterministic identifier, an author, and the
/// ordered changes it applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub id: String,
    pub author: String,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }
}

/// A single change operation.
///
/// `insert`/`insertUpdate` carry inline rows; `loadData`/`loadUpdateData`
/// reference a sibling tabular file. The `*Update` variants carry the
/// primary-key column names and are selected when upsert semantics are
/// preferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Change {
    Insert(RowChange),
    InsertUpdate(RowChange),
    LoadData(BulkLoadChange),
    LoadUpdateData(BulkLoadChange),
}

/// One inline row destined for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    /// Comma-joined primary-key column names; present on upsert variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnEntry>,
}

/// Wrapper producing the `- column:` nesting in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub column: ColumnConfig,
}

/// One column value in an inline row, typed through its value key.
///
/// Exactly one of the `value*` fields is set per column; a column with none
/// set represents NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_numeric: Option<serde_yaml::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_blob_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_clob_file: Option<String>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A bulk load of a sibling delimited data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLoadChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
    /// Path of the data file, relative to the changelog file.
    pub file: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Comma-joined primary-key column names; present on upsert variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    pub columns: Vec<LoadColumnEntry>,
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

/// Wrapper producing the `- column:` nesting under a bulk load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadColumnEntry {
    pub column: LoadDataColumnConfig,
}

/// Header-to-column mapping with the declared load type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDataColumnConfig {
    pub header: String,
    pub name: String,
    pub r#type: String,
}

/// What the orchestrator aggregates per emitted changelog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludedFile {
    /// Path of the changelog file, relative to the output directory.
    pub path: String,
    /// The table the file carries data for.
    pub table: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_row_change() -> RowChange {
        RowChange {
            catalog_name: None,
            schema_name: None,
            table_name: "ORDERS".to_string(),
            primary_key: Some("ID".to_string()),
            columns: vec![
                ColumnEntry {
                    column: ColumnConfig {
                        value_numeric: Some(serde_yaml::Number::from(1i64)),
                        ..ColumnConfig::new("ID")
                    },
                },
                ColumnEntry {
                    column: ColumnConfig {
                        value: Some("gear".to_string()),
                        ..ColumnConfig::new("NAME")
                    },
                },
            ],
        }
    }

    #[test]
    fn test_markup_changelog_round_trips() {
        let change_set = ChangeSet::new("ORDERS.DATA", "generated")
            .with_change(Change::InsertUpdate(make_test_row_change()));
        let file = ChangeLogFile::new(vec![change_set]);

        let yaml = serde_yaml::to_string(&file).unwrap();
        assert!(yaml.contains("databaseChangeLog:"));
        assert!(yaml.contains("changeSet:"));
        assert!(yaml.contains("id: ORDERS.DATA"));
        assert!(yaml.contains("author: generated"));
        assert!(yaml.contains("insertUpdate:"));
        assert!(yaml.contains("tableName: ORDERS"));
        assert!(yaml.contains("primaryKey: ID"));
        assert!(yaml.contains("valueNumeric: 1"));
        assert!(yaml.contains("value: gear"));

        let parsed: ChangeLogFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_insert_variant_omits_absent_fields() {
        let mut row = make_test_row_change();
        row.primary_key = None;
        let change_set = ChangeSet::new("ORDERS.DATA", "generated").with_change(Change::Insert(row));
        let file = ChangeLogFile::new(vec![change_set]);

        let yaml = serde_yaml::to_string(&file).unwrap();
        assert!(yaml.contains("insert:"));
        assert!(!yaml.contains("insertUpdate:"));
        assert!(!yaml.contains("primaryKey"));
        assert!(!yaml.contains("schemaName"));
        assert!(!yaml.contains("catalogName"));
    }

    #[test]
    fn test_bulk_load_changelog_shape() {
        let change = Change::LoadUpdateData(BulkLoadChange {
            catalog_name: None,
            schema_name: Some("APP".to_string()),
            table_name: "ORDERS".to_string(),
            file: "data/ORDERS.1.csv".to_string(),
            encoding: default_encoding(),
            primary_key: Some("ID".to_string()),
            columns: vec![LoadColumnEntry {
                column: LoadDataColumnConfig {
                    header: "ID".to_string(),
                    name: "ID".to_string(),
                    r#type: "NUMERIC".to_string(),
                },
            }],
        });
        let file =
            ChangeLogFile::new(vec![ChangeSet::new("ORDERS.DATA", "generated").with_change(change)]);

        let yaml = serde_yaml::to_string(&file).unwrap();
        assert!(yaml.contains("loadUpdateData:"));
        assert!(yaml.contains("schemaName: APP"));
        assert!(yaml.contains("file: data/ORDERS.1.csv"));
        assert!(yaml.contains("encoding: UTF-8"));
        assert!(yaml.contains("header: ID"));
        assert!(yaml.contains("type: NUMERIC"));

        let parsed: ChangeLogFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ORDERS.data.yaml");

        let file = ChangeLogFile::new(vec![
            ChangeSet::new("ORDERS.DATA", "generated")
                .with_change(Change::Insert(make_test_row_change())),
        ]);
        file.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("databaseChangeLog:"));
    }
}
