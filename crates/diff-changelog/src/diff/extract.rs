//! Data extraction and chunking for missing-table diffs.
//!
//! For one (table, filter) pair this module builds the count and selection
//! queries, decides between a single structured-markup export and a
//! sequence of windowed tabular chunks, and hands each materialized row
//! batch to the emission engine.
//!
//! Queries run strictly sequentially on the borrowed connection; chunk
//! numbering and file naming depend on that ordering.

use std::sync::Arc;

use crate::changelog::IncludedFile;
use crate::config::{DiffOutputControl, TableFilter};
use crate::core::{Dialect, Row, SqlConnection, SqlValue, Table};
use crate::diff::emit::DataEmitter;
use crate::error::Result;

/// Rows per tabular chunk file.
pub const ROWS_PER_CHUNK: i64 = 10_000;

/// Largest row count still exported as one structured-markup file.
pub const SINGLE_FILE_ROW_LIMIT: i64 = 1_000;

/// Substitute written over numeric values of sensitive columns.
const REDACTED_NUMERIC: i64 = 401;

/// Extracts reference-table rows and partitions them into changesets.
///
/// One extractor serves a whole diff run. Each [`extract`] call handles one
/// (table, filter) pair: it issues the row-count query, then either a single
/// ordered selection or one windowed query per chunk, redacts sensitive
/// values, and emits one changelog file per batch.
///
/// [`extract`]: DataExtractor::extract
pub struct DataExtractor {
    dialect: Arc<dyn Dialect>,
    control: DiffOutputControl,
}

impl DataExtractor {
    /// Create an extractor for one dialect and output configuration.
    pub fn new(dialect: Arc<dyn Dialect>, control: DiffOutputControl) -> Self {
        Self { dialect, control }
    }

    /// The output control threaded through to emission.
    pub fn control(&self) -> &DiffOutputControl {
        &self.control
    }

    /// Extract every row matching `filter` into one or more changesets.
    ///
    /// Returns one included-file descriptor per emitted changelog file, in
    /// chunk order. A zero row count short-circuits before any selection
    /// query runs and produces no files.
    pub async fn extract(
        &self,
        conn: &mut dyn SqlConnection,
        table: &Table,
        filter: &TableFilter,
    ) -> Result<Vec<IncludedFile>> {
        let escaped = self.dialect.escape_object(&table.object_ref());
        let mut selection = format!("SELECT * FROM {}", escaped);
        let mut count = format!("SELECT count(*) FROM {}", escaped);

        if let Some(condition) = filter.condition.as_deref().filter(|c| !c.is_empty()) {
            selection.push(' ');
            selection.push_str(condition);
            count.push(' ');
            count.push_str(condition);
        }
        if !has_explicit_ordering(filter.condition.as_deref()) {
            for (i, key) in table.primary_key.iter().enumerate() {
                selection.push_str(if i == 0 { " order by " } else { "," });
                selection.push_str(key);
            }
        }

        let row_count = conn.query(&count).await?.scalar_i64()?;
        if row_count == 0 {
            tracing::debug!(table = %table.full_name(), "no rows match, nothing to emit");
            return Ok(Vec::new());
        }
        tracing::info!(table = %table.full_name(), rows = row_count, "loading table data");

        let emitter = DataEmitter::new(&self.control);
        let base = filter.filename.as_deref().unwrap_or(&table.name);
        let subdir = filter.subdir.as_deref();

        if row_count <= SINGLE_FILE_ROW_LIMIT {
            let mut rows = conn.query(&selection).await?.into_rows();
            self.redact(table, &mut rows);
            let file = emitter.emit(table, &rows, subdir, base, false)?;
            return Ok(vec![file]);
        }

        let chunks = (row_count - 1) / ROWS_PER_CHUNK + 1;
        let mut included = Vec::with_capacity(chunks as usize);
        for i in 0..chunks {
            let windowed = self.dialect.row_window_query(
                &selection,
                i * ROWS_PER_CHUNK + 1,
                (i + 1) * ROWS_PER_CHUNK,
            );
            tracing::debug!(
                table = %table.full_name(),
                chunk = i + 1,
                of = chunks,
                "extracting chunk"
            );
            let mut rows = conn.query(&windowed).await?.into_rows();
            self.redact(table, &mut rows);

            // Single-chunk exports keep the unsuffixed name.
            let name = if chunks > 1 {
                format!("{}.{}", base, i + 1)
            } else {
                base.to_string()
            };
            included.push(emitter.emit(table, &rows, subdir, &name, true)?);
        }
        Ok(included)
    }

    /// Overwrite numeric values of configured sensitive columns.
    ///
    /// Non-numeric values are left untouched even when the column name
    /// matches.
    fn redact(&self, table: &Table, rows: &mut [Row]) {
        for column in &table.columns {
            if !self.control.is_sensitive(&column.name) {
                continue;
            }
            for row in rows.iter_mut() {
                let numeric = row.get(&column.name).map_or(false, SqlValue::is_numeric);
                if numeric {
                    row.set(&column.name, SqlValue::I64(REDACTED_NUMERIC));
                }
            }
        }
    }
}

/// Whether the filter condition carries its own ordering or hierarchical
/// traversal, which must not get another ORDER BY stacked on top.
fn has_explicit_ordering(condition: Option<&str>) -> bool {
    condition.map_or(false, |c| {
        let lowered = c.to_lowercase();
        lowered.contains("order by") || lowered.contains("connect by")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use async_trait::async_trait;

    use crate::changelog::{Change, ChangeLogFile};
    use crate::core::{Column, QueryResult};
    use crate::dialect::OracleDialect;
    use crate::error::DiffError;

    struct ScriptedConnection {
        responses: VecDeque<QueryResult>,
        queries: Vec<String>,
    }

    impl ScriptedConnection {
        fn new(responses: Vec<QueryResult>) -> Self {
            Self {
                responses: responses.into(),
                queries: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl SqlConnection for ScriptedConnection {
        async fn query(&mut self, sql: &str) -> Result<QueryResult> {
            self.queries.push(sql.to_string());
            self.responses
                .pop_front()
                .ok_or_else(|| DiffError::database("no scripted response left"))
        }
    }

    fn count_result(count: i64) -> QueryResult {
        QueryResult {
            columns: vec!["COUNT(*)".to_string()],
            rows: vec![vec![SqlValue::I64(count)]],
        }
    }

    fn order_rows(ids: &[i64]) -> QueryResult {
        QueryResult {
            columns: vec!["ID".to_string(), "STATUS".to_string()],
            rows: ids
                .iter()
                .map(|id| {
                    vec![
                        SqlValue::I64(*id),
                        SqlValue::text_owned("OPEN".to_string()),
                    ]
                })
                .collect(),
        }
    }

    fn make_test_column(name: &str, data_type: &str) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: true,
            is_identity: false,
        }
    }

    fn orders_table() -> Table {
        Table {
            catalog: None,
            schema: Some("APP".to_string()),
            name: "ORDERS".to_string(),
            columns: vec![
                make_test_column("ID", "NUMBER"),
                make_test_column("STATUS", "VARCHAR2"),
            ],
            primary_key: vec!["ID".to_string()],
        }
    }

    fn make_extractor(dir: &std::path::Path, control: DiffOutputControl) -> DataExtractor {
        let control = DiffOutputControl {
            data_dir: dir.to_path_buf(),
            ..control
        };
        DataExtractor::new(Arc::new(OracleDialect::new()), control)
    }

    fn read_changelog(path: &std::path::Path) -> ChangeLogFile {
        let yaml = std::fs::read_to_string(path).unwrap();
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[tokio::test]
    async fn test_empty_table_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn = ScriptedConnection::new(vec![count_result(0)]);

        let files = extractor
            .extract(&mut conn, &orders_table(), &TableFilter::all_rows())
            .await
            .unwrap();

        assert!(files.is_empty());
        assert_eq!(
            conn.queries,
            vec!["SELECT count(*) FROM \"APP\".\"ORDERS\"".to_string()]
        );
    }

    #[tokio::test]
    async fn test_small_table_is_one_ordered_markup_file() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn =
            ScriptedConnection::new(vec![count_result(3), order_rows(&[1, 2, 3])]);

        let files = extractor
            .extract(&mut conn, &orders_table(), &TableFilter::all_rows())
            .await
            .unwrap();

        assert_eq!(
            conn.queries[1],
            "SELECT * FROM \"APP\".\"ORDERS\" order by ID"
        );
        assert_eq!(
            files,
            vec![IncludedFile {
                path: "ORDERS.data.yaml".to_string(),
                table: "ORDERS".to_string(),
            }]
        );

        let changelog = read_changelog(&dir.path().join("ORDERS.data.yaml"));
        let change_set = &changelog.database_change_log[0].change_set;
        assert_eq!(change_set.id, "ORDERS.DATA");
        assert_eq!(change_set.changes.len(), 3);
        assert!(matches!(change_set.changes[0], Change::Insert(_)));
    }

    #[tokio::test]
    async fn test_condition_applies_to_both_queries() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn = ScriptedConnection::new(vec![count_result(1), order_rows(&[1])]);

        let filter = TableFilter::all_rows().with_condition("where STATUS = 'OPEN'");
        extractor
            .extract(&mut conn, &orders_table(), &filter)
            .await
            .unwrap();

        assert_eq!(
            conn.queries[0],
            "SELECT count(*) FROM \"APP\".\"ORDERS\" where STATUS = 'OPEN'"
        );
        assert_eq!(
            conn.queries[1],
            "SELECT * FROM \"APP\".\"ORDERS\" where STATUS = 'OPEN' order by ID"
        );
    }

    #[tokio::test]
    async fn test_condition_with_own_ordering_suppresses_order_by() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn = ScriptedConnection::new(vec![count_result(1), order_rows(&[1])]);

        let filter =
            TableFilter::all_rows().with_condition("where STATUS = 'OPEN' ORDER BY STATUS");
        extractor
            .extract(&mut conn, &orders_table(), &filter)
            .await
            .unwrap();

        assert_eq!(
            conn.queries[1],
            "SELECT * FROM \"APP\".\"ORDERS\" where STATUS = 'OPEN' ORDER BY STATUS"
        );
    }

    #[tokio::test]
    async fn test_large_table_is_chunked_with_numeric_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn = ScriptedConnection::new(vec![
            count_result(25_000),
            order_rows(&[1, 2]),
            order_rows(&[3, 4]),
            order_rows(&[5]),
        ]);

        let files = extractor
            .extract(&mut conn, &orders_table(), &TableFilter::all_rows())
            .await
            .unwrap();

        let dialect = OracleDialect::new();
        let ordered = "SELECT * FROM \"APP\".\"ORDERS\" order by ID";
        assert_eq!(conn.queries[1], dialect.row_window_query(ordered, 1, 10_000));
        assert_eq!(
            conn.queries[2],
            dialect.row_window_query(ordered, 10_001, 20_000)
        );
        assert_eq!(
            conn.queries[3],
            dialect.row_window_query(ordered, 20_001, 30_000)
        );

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["ORDERS.1.yaml", "ORDERS.2.yaml", "ORDERS.3.yaml"]);

        let changelog = read_changelog(&dir.path().join("ORDERS.2.yaml"));
        let Change::LoadData(load) = &changelog.database_change_log[0].change_set.changes[0]
        else {
            panic!("chunked output must be a bulk load");
        };
        assert_eq!(load.file, "ORDERS.2.csv");
        assert!(dir.path().join("ORDERS.2.csv").exists());
    }

    #[tokio::test]
    async fn test_single_chunk_keeps_unsuffixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn = ScriptedConnection::new(vec![count_result(5_000), order_rows(&[1, 2])]);

        let files = extractor
            .extract(&mut conn, &orders_table(), &TableFilter::all_rows())
            .await
            .unwrap();

        let dialect = OracleDialect::new();
        let ordered = "SELECT * FROM \"APP\".\"ORDERS\" order by ID";
        assert_eq!(conn.queries[1], dialect.row_window_query(ordered, 1, 10_000));

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "ORDERS.data.yaml");

        let changelog = read_changelog(&dir.path().join("ORDERS.data.yaml"));
        let Change::LoadData(load) = &changelog.database_change_log[0].change_set.changes[0]
        else {
            panic!("windowed output must be a bulk load");
        };
        assert_eq!(load.file, "ORDERS.csv");
    }

    #[tokio::test]
    async fn test_redaction_rewrites_numeric_sensitive_values() {
        let dir = tempfile::tempdir().unwrap();
        let control =
            DiffOutputControl::default().with_sensitive_columns(["user_id", "user_name"]);
        let extractor = make_extractor(dir.path(), control);

        let table = Table {
            catalog: None,
            schema: None,
            name: "AUDIT".to_string(),
            columns: vec![
                make_test_column("ID", "NUMBER"),
                make_test_column("USER_ID", "NUMBER"),
                make_test_column("USER_NAME", "VARCHAR2"),
            ],
            primary_key: vec!["ID".to_string()],
        };
        let result = QueryResult {
            columns: vec![
                "ID".to_string(),
                "USER_ID".to_string(),
                "USER_NAME".to_string(),
            ],
            rows: vec![vec![
                SqlValue::I64(1),
                SqlValue::I64(90125),
                SqlValue::text_owned("bob".to_string()),
            ]],
        };
        let mut conn = ScriptedConnection::new(vec![count_result(1), result]);

        extractor
            .extract(&mut conn, &table, &TableFilter::all_rows())
            .await
            .unwrap();

        let changelog = read_changelog(&dir.path().join("AUDIT.data.yaml"));
        let Change::Insert(row) = &changelog.database_change_log[0].change_set.changes[0] else {
            panic!("expected an inline insert");
        };
        let by_name = |name: &str| {
            row.columns
                .iter()
                .map(|entry| &entry.column)
                .find(|c| c.name == name)
                .unwrap()
                .clone()
        };
        assert_eq!(
            by_name("USER_ID").value_numeric,
            Some(serde_yaml::Number::from(401))
        );
        assert_eq!(by_name("USER_NAME").value, Some("bob".to_string()));
        assert_eq!(
            by_name("ID").value_numeric,
            Some(serde_yaml::Number::from(1))
        );
    }

    #[tokio::test]
    async fn test_filter_filename_and_subdir_route_output() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = make_extractor(dir.path(), DiffOutputControl::default());
        let mut conn = ScriptedConnection::new(vec![count_result(1), order_rows(&[1])]);

        let filter = TableFilter::all_rows()
            .with_filename("open_orders")
            .with_subdir("seed");
        let files = extractor
            .extract(&mut conn, &orders_table(), &filter)
            .await
            .unwrap();

        assert_eq!(files[0].path, "seed/open_orders.data.yaml");
        assert!(dir.path().join("seed/open_orders.data.yaml").exists());
    }
}
