//! Parameterized row-statement assembly.
//!
//! Builders here produce [`PreparedStatementInfo`]: SQL text with positional
//! placeholders plus the bound column names and values in matching order.
//! They feed the upsert synthesis in [`super::upsert`] and stand on their own
//! for plain inserts and updates during changeset replay.

use crate::core::{Dialect, ObjectReference, SqlValue};
use crate::error::{DiffError, Result};

/// A value destined for one column of a row statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Rendered as a literal `NULL`, never bound.
    Null,
    /// A database function call (`SYSDATE`, `nextval(...)`) spliced into the
    /// SQL text verbatim, never bound.
    Function(String),
    /// Bound by position through a placeholder.
    Value(SqlValue<'static>),
}

impl ParamValue {
    pub fn function(text: impl Into<String>) -> Self {
        ParamValue::Function(text.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

impl From<SqlValue<'static>> for ParamValue {
    fn from(value: SqlValue<'static>) -> Self {
        if value.is_null() {
            ParamValue::Null
        } else {
            ParamValue::Value(value)
        }
    }
}

/// One column of a row plus the value headed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub name: String,
    pub value: ParamValue,
    pub auto_increment: bool,
}

impl ColumnValue {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            auto_increment: false,
        }
    }

    pub fn with_auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// One row destined for insert-or-update, with its table and key columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpsert {
    pub table: ObjectReference,
    pub columns: Vec<ColumnValue>,
    pub primary_key: Vec<String>,
}

impl RowUpsert {
    pub fn new(table: ObjectReference) -> Self {
        Self {
            table,
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnValue) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `name` is one of the key columns. Identifier case is ignored.
    pub fn is_key_column(&self, name: &str) -> bool {
        self.primary_key
            .iter()
            .any(|key| key.eq_ignore_ascii_case(name))
    }

    /// Columns that participate in generated SQL, in declared order.
    ///
    /// Auto-increment columns are left out when the dialect assigns their
    /// values itself, except key columns: the match predicate needs those.
    pub fn effective_columns(&self, dialect: &dyn Dialect) -> Vec<&ColumnValue> {
        self.columns
            .iter()
            .filter(|c| {
                !(c.auto_increment
                    && dialect.supports_auto_increment()
                    && !self.is_key_column(&c.name))
            })
            .collect()
    }

    /// The key columns in declared key order, paired with their row values.
    pub fn key_values(&self) -> Result<Vec<(&str, &ParamValue)>> {
        self.primary_key
            .iter()
            .map(|key| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(key))
                    .map(|c| (key.as_str(), &c.value))
                    .ok_or_else(|| missing_key_column(&self.table, key))
            })
            .collect()
    }
}

fn missing_key_column(table: &ObjectReference, key: &str) -> DiffError {
    DiffError::Unexpected {
        context: "row statement assembly".to_string(),
        source: format!(
            "primary key column {} of {} has no value in the row",
            key, table
        )
        .into(),
    }
}

/// SQL text with positional placeholders and its bound values.
///
/// `columns[i]` names the column whose value sits in `parameters[i]`; both
/// run in placeholder order. A length or order mismatch between the two is a
/// builder bug, not a recoverable condition.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatementInfo {
    pub sql: String,
    pub columns: Vec<String>,
    pub parameters: Vec<SqlValue<'static>>,
}

impl PreparedStatementInfo {
    pub fn param_count(&self) -> usize {
        self.parameters.len()
    }
}

/// Allocates placeholders and records bindings in matching order.
pub(crate) struct ParamCursor<'d> {
    dialect: &'d dyn Dialect,
    next_index: usize,
    columns: Vec<String>,
    parameters: Vec<SqlValue<'static>>,
}

impl<'d> ParamCursor<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect, start_index: usize) -> Self {
        Self {
            dialect,
            next_index: start_index,
            columns: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// SQL expression for a column value: a literal for NULL and function
    /// values, a fresh placeholder (recording the binding) otherwise.
    pub(crate) fn value_expr(&mut self, column: &ColumnValue) -> String {
        match &column.value {
            ParamValue::Null => "NULL".to_string(),
            ParamValue::Function(text) => text.clone(),
            ParamValue::Value(value) => self.bind(&column.name, value.clone()),
        }
    }

    /// Allocate the next placeholder for `value` and record the binding.
    pub(crate) fn bind(&mut self, name: &str, value: SqlValue<'static>) -> String {
        let placeholder = self.dialect.param_placeholder(self.next_index);
        self.next_index += 1;
        self.columns.push(name.to_string());
        self.parameters.push(value);
        placeholder
    }

    pub(crate) fn finish(self, sql: String) -> PreparedStatementInfo {
        PreparedStatementInfo {
            sql,
            columns: self.columns,
            parameters: self.parameters,
        }
    }
}

/// Build `INSERT INTO <table> (...) VALUES (...)` for one row.
///
/// Placeholder numbering starts at `start_index` so the statement can follow
/// another parameterized statement inside a composite.
pub fn build_insert(
    row: &RowUpsert,
    dialect: &dyn Dialect,
    start_index: usize,
) -> PreparedStatementInfo {
    let mut cursor = ParamCursor::new(dialect, start_index);
    let columns = row.effective_columns(dialect);

    let mut col_list = Vec::with_capacity(columns.len());
    let mut value_list = Vec::with_capacity(columns.len());
    for column in columns {
        col_list.push(dialect.quote_ident(&column.name));
        value_list.push(cursor.value_expr(column));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.escape_object(&row.table),
        col_list.join(", "),
        value_list.join(", ")
    );
    cursor.finish(sql)
}

/// Build `UPDATE <table> SET ... WHERE <key predicate>` for one row.
///
/// Key columns are matched, never assigned. A key column holding NULL is
/// matched with `IS NULL`; an equality comparison against NULL never holds
/// in SQL, which would silently route every such row to the insert branch
/// of a composite upsert.
pub fn build_update(
    row: &RowUpsert,
    dialect: &dyn Dialect,
    start_index: usize,
) -> Result<PreparedStatementInfo> {
    let mut cursor = ParamCursor::new(dialect, start_index);

    let mut assignments = Vec::new();
    for column in row.effective_columns(dialect) {
        if row.is_key_column(&column.name) {
            continue;
        }
        assignments.push(format!(
            "{} = {}",
            dialect.quote_ident(&column.name),
            cursor.value_expr(column)
        ));
    }
    if assignments.is_empty() {
        return Err(DiffError::Unexpected {
            context: "row statement assembly".to_string(),
            source: format!("{} has no non-key columns to update", row.table).into(),
        });
    }

    let mut predicates = Vec::new();
    for (key, value) in row.key_values()? {
        let ident = dialect.quote_ident(key);
        let predicate = match value {
            ParamValue::Null => format!("{} IS NULL", ident),
            ParamValue::Function(text) => format!("{} = {}", ident, text),
            ParamValue::Value(v) => format!("{} = {}", ident, cursor.bind(key, v.clone())),
        };
        predicates.push(predicate);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.escape_object(&row.table),
        assignments.join(", "),
        predicates.join(" AND ")
    );
    Ok(cursor.finish(sql))
}
