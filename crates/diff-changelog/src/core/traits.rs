//! Core traits for dialect-sensitive SQL generation and data extraction.
//!
//! This module defines the primary abstractions used by the engine:
//!
//! - [`Dialect`]: SQL syntax strategy for different database engines
//! - [`SqlConnection`]: an already-open connection that issues plain SQL
//!   and returns fully materialized tabular results
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` provides interchangeable syntax rules consumed
//!   by the generator chain and the extraction engine
//! - **Template Method**: default trait implementations define the parts of
//!   escaping that are dialect-independent

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::object::ObjectReference;
use crate::core::value::SqlValue;
use crate::error::{DiffError, Result};

/// SQL syntax strategy for different database engines.
///
/// Provides database-specific syntax while keeping generation and extraction
/// logic database-agnostic.
pub trait Dialect: std::fmt::Debug + Send + Sync {
    /// Get the dialect identifier (e.g., "oracle", "postgres", "mssql").
    fn name(&self) -> &str;

    /// Quote an identifier (table name, column name, etc.).
    ///
    /// - oracle/postgres: `"identifier"`
    /// - mssql: `[identifier]`
    fn quote_ident(&self, name: &str) -> String;

    /// Fold an unquoted identifier per the engine's case rules.
    ///
    /// - oracle: upper-case
    /// - postgres: lower-case
    /// - mssql: preserved
    fn fold_ident(&self, name: &str) -> String;

    /// Escape a full object reference, quoting each present qualifier.
    fn escape_object(&self, object: &ObjectReference) -> String {
        object
            .parts()
            .map(|p| self.quote_ident(p))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Get a parameter placeholder for the given 1-based index.
    ///
    /// - oracle: `:1`, `:2`, etc.
    /// - postgres: `$1`, `$2`, etc.
    /// - mssql: `@P1`, `@P2`, etc.
    fn param_placeholder(&self, index: usize) -> String;

    /// Whether the engine assigns identity/auto-increment values itself.
    ///
    /// When true, identity columns are omitted from generated row
    /// statements entirely.
    fn supports_auto_increment(&self) -> bool;

    /// Whether the engine has a native single-statement upsert.
    ///
    /// Engines without one fall back to a composite update-then-insert
    /// block, see [`Dialect::conditional_insert_block`].
    fn supports_native_upsert(&self) -> bool;

    /// Wrap an ordered row-selection query so only rows in the inclusive
    /// 1-based window `[start_row, end_row]` are returned.
    ///
    /// The inner query is expected to carry its own ORDER BY; dialects whose
    /// window syntax re-orders must preserve that ordering.
    fn row_window_query(&self, inner_query: &str, start_row: i64, end_row: i64) -> String;

    /// Compose an update statement and an insert statement into the
    /// engine's "update, then insert when zero rows matched" block.
    fn conditional_insert_block(&self, update_sql: &str, insert_sql: &str) -> String;
}

/// An open database connection that issues SQL text and returns rows.
///
/// Implementations wrap a concrete driver. The engine never manages
/// connection lifecycle; it borrows the connection for the duration of a
/// diff run and issues queries strictly sequentially.
///
/// # Large objects
///
/// Implementations must fully materialize large-object columns (binary as
/// bytes, character as text) while the underlying cursor is still open;
/// some drivers invalidate LOB handles once the cursor advances.
#[async_trait]
pub trait SqlConnection: Send {
    /// Execute a query and return the materialized result set.
    async fn query(&mut self, sql: &str) -> Result<QueryResult>;
}

/// A fully materialized query result with per-column names.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Result column names, in projection order.
    pub columns: Vec<String>,

    /// Row values, parallel to `columns`.
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl QueryResult {
    /// Read the first column of the first row as an integer.
    ///
    /// Used for scalar queries such as row counts; an empty result set or a
    /// non-numeric value is a database error, not a zero.
    pub fn scalar_i64(&self) -> Result<i64> {
        let row = self
            .rows
            .first()
            .ok_or_else(|| DiffError::database("scalar query returned no rows"))?;
        row.first()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| DiffError::database("scalar query returned a non-numeric value"))
    }

    /// Convert into name-addressable rows.
    ///
    /// Extra result columns that are not in the consumer's column list (for
    /// example a window row-number) are carried along and simply ignored by
    /// name-based lookups.
    pub fn into_rows(self) -> Vec<Row> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| {
                let mut row = Row::default();
                for (name, value) in columns.iter().zip(values) {
                    row.set(name, value);
                }
                row
            })
            .collect()
    }
}

/// One extracted row, addressable by upper-cased column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, SqlValue<'static>>,
}

impl Row {
    /// Look up a value by column name, case-insensitively.
    pub fn get(&self, column: &str) -> Option<&SqlValue<'static>> {
        self.values.get(&column.to_uppercase())
    }

    /// Set a value, replacing any existing value for the column.
    pub fn set(&mut self, column: &str, value: SqlValue<'static>) {
        self.values.insert(column.to_uppercase(), value);
    }
}
