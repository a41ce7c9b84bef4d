//! Output control configuration for diff runs.
//!
//! Everything that used to be ambient state in this kind of tooling is an
//! explicit field here and threaded through extraction and emission: the
//! upsert preference, the redaction column set, skip lists, and per-table
//! extraction filters.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, Result};

/// Governs where diff output lands and how changesets are shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffOutputControl {
    /// Directory receiving changelog, data, and LOB files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Author recorded on every emitted changeset.
    #[serde(default = "default_author")]
    pub author: String,

    /// Include catalog names in emitted changes.
    #[serde(default)]
    pub include_catalog: bool,

    /// Include schema names in emitted changes.
    #[serde(default)]
    pub include_schema: bool,

    /// Emit insert-or-update change variants instead of plain inserts.
    #[serde(default)]
    pub prefer_upsert: bool,

    /// Column names whose numeric values are redacted before emission.
    /// Matched case-insensitively.
    #[serde(default)]
    pub sensitive_columns: Vec<String>,

    /// Object names never diffed, in addition to the engine's own
    /// bookkeeping tables. Matched case-insensitively.
    #[serde(default)]
    pub skipped_objects: Vec<String>,

    /// Per-table extraction filters keyed by upper-cased table name.
    #[serde(default)]
    pub table_filters: HashMap<String, Vec<TableFilter>>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_author() -> String {
    "generated".to_string()
}

impl Default for DiffOutputControl {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            author: default_author(),
            include_catalog: false,
            include_schema: false,
            prefer_upsert: false,
            sensitive_columns: Vec::new(),
            skipped_objects: Vec::new(),
            table_filters: HashMap::new(),
        }
    }
}

impl DiffOutputControl {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load output control from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse output control from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut control: DiffOutputControl = serde_yaml::from_str(yaml)?;
        let filters = std::mem::take(&mut control.table_filters);
        control.table_filters = filters
            .into_iter()
            .map(|(table, filters)| (table.to_uppercase(), filters))
            .collect();
        control.validate()?;
        Ok(control)
    }

    /// Validate the output control settings.
    pub fn validate(&self) -> Result<()> {
        if self.author.trim().is_empty() {
            return Err(DiffError::Config(
                "changeset author must not be empty".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(DiffError::Config(
                "data_dir must not be empty".to_string(),
            ));
        }
        if self.table_filters.keys().any(|k| k.trim().is_empty()) {
            return Err(DiffError::Config(
                "table_filters contains an empty table name".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_include_catalog(mut self, include: bool) -> Self {
        self.include_catalog = include;
        self
    }

    pub fn with_include_schema(mut self, include: bool) -> Self {
        self.include_schema = include;
        self
    }

    pub fn with_prefer_upsert(mut self, prefer: bool) -> Self {
        self.prefer_upsert = prefer;
        self
    }

    pub fn with_sensitive_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skipped_object(mut self, object: impl Into<String>) -> Self {
        self.skipped_objects.push(object.into());
        self
    }

    /// Add one extraction filter for a table.
    pub fn with_table_filter(mut self, table: impl Into<String>, filter: TableFilter) -> Self {
        self.table_filters
            .entry(table.into().to_uppercase())
            .or_default()
            .push(filter);
        self
    }

    /// Whether a column's values are subject to redaction.
    pub fn is_sensitive(&self, column: &str) -> bool {
        self.sensitive_columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(column))
    }

    /// Whether an object name is in the configured skip set.
    pub fn is_skipped(&self, name: &str) -> bool {
        self.skipped_objects
            .iter()
            .any(|o| o.eq_ignore_ascii_case(name))
    }

    /// The filters to run for a table, falling back to a single all-rows
    /// filter when none are configured.
    pub fn filters_for(&self, table: &str) -> Vec<TableFilter> {
        match self.table_filters.get(&table.to_uppercase()) {
            Some(filters) if !filters.is_empty() => filters.clone(),
            _ => vec![TableFilter::all_rows()],
        }
    }
}

/// Governs what subset of a table is extracted and where its output lands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFilter {
    /// Filter clause appended verbatim to the extraction query, `where`
    /// keyword included. May carry its own ordering clause, which suppresses
    /// the generated ORDER BY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Base name for output files; defaults to the table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Subdirectory under the output directory; defaults to its root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
}

impl TableFilter {
    /// A filter matching every row, with default naming.
    pub fn all_rows() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let control = DiffOutputControl::default();
        assert_eq!(control.data_dir, PathBuf::from("data"));
        assert_eq!(control.author, "generated");
        assert!(!control.prefer_upsert);
        assert!(!control.include_catalog);
        assert!(!control.include_schema);
        assert!(control.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_uppercases_filter_keys() {
        let yaml = r#"
data_dir: out
author: diff-bot
prefer_upsert: true
sensitive_columns:
  - password_hash
table_filters:
  orders:
    - condition: "where STATUS = 'OPEN'"
      filename: open_orders
"#;
        let control = DiffOutputControl::from_yaml(yaml).unwrap();
        assert_eq!(control.author, "diff-bot");
        assert!(control.prefer_upsert);

        let filters = control.filters_for("Orders");
        assert_eq!(filters.len(), 1);
        assert_eq!(
            filters[0].condition.as_deref(),
            Some("where STATUS = 'OPEN'")
        );
        assert_eq!(filters[0].filename.as_deref(), Some("open_orders"));
    }

    #[test]
    fn test_filters_for_defaults_to_all_rows() {
        let control = DiffOutputControl::default();
        let filters = control.filters_for("ANYTHING");
        assert_eq!(filters, vec![TableFilter::all_rows()]);
    }

    #[test]
    fn test_sensitive_and_skip_matching_ignores_case() {
        let control = DiffOutputControl::default()
            .with_sensitive_columns(["Salary", "SSN"])
            .with_skipped_object("audit_log");

        assert!(control.is_sensitive("salary"));
        assert!(control.is_sensitive("ssn"));
        assert!(!control.is_sensitive("name"));
        assert!(control.is_skipped("AUDIT_LOG"));
        assert!(!control.is_skipped("ORDERS"));
    }

    #[test]
    fn test_builder_filters_keyed_case_insensitively() {
        let control = DiffOutputControl::new("out").with_table_filter(
            "orders",
            TableFilter::all_rows().with_subdir("orders"),
        );

        let filters = control.filters_for("ORDERS");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].subdir.as_deref(), Some("orders"));
    }

    #[test]
    fn test_validate_rejects_blank_author() {
        let control = DiffOutputControl::default().with_author("  ");
        let err = control.validate().unwrap_err();
        assert!(err.to_string().contains("author"));
    }
}
