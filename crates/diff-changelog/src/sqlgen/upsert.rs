//! Insert-or-update synthesis.
//!
//! Three builders cover the supported engines:
//!
//! - [`MergeUpsertBuilder`]: native `MERGE` for SQL Server
//! - [`ConflictUpsertBuilder`]: native `INSERT ... ON CONFLICT` for PostgreSQL
//! - [`BlockUpsertBuilder`]: composite update-then-conditional-insert block
//!   for engines without a native upsert
//!
//! The [`UpsertRegistry`] resolves among them with the same priority and
//! dialect-exclusion rules as the statement chain. Whichever builder wins,
//! the resulting statement updates every non-key column and matches rows on
//! the key columns only, so the end state is identical across engines.

use std::fmt;
use std::sync::Arc;

use crate::core::Dialect;
use crate::error::{DiffError, Result};

use super::chain::{pick_best, ValidationErrors, PRIORITY_DEFAULT, PRIORITY_DIALECT};
use super::prepared::{
    build_insert, build_update, ParamCursor, PreparedStatementInfo, RowUpsert,
};

fn validate_row(row: &RowUpsert) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check_required_ident("tableName", &row.table.name);
    if row.columns.is_empty() {
        errors.add_error("columns is required");
    }
    if row.primary_key.is_empty() {
        errors.add_error("primaryKey is required");
    }
    for key in &row.primary_key {
        if !row.columns.iter().any(|c| c.name.eq_ignore_ascii_case(key)) {
            errors.add_error(format!("primary key column {} has no value", key));
        }
    }
    errors
}

/// Builds one atomic insert-or-update statement for a row.
pub trait UpsertBuilder: Send + Sync {
    /// Selection priority; higher wins. Defaults to [`PRIORITY_DEFAULT`].
    fn priority(&self) -> i32 {
        PRIORITY_DEFAULT
    }

    /// Whether this builder can render for the given dialect.
    fn supports(&self, _dialect: &dyn Dialect) -> bool {
        true
    }

    /// Check the row for missing required fields, collecting every problem.
    fn validate(&self, row: &RowUpsert, _dialect: &dyn Dialect) -> ValidationErrors {
        validate_row(row)
    }

    /// Render the upsert statement with its bound parameters.
    fn build(&self, row: &RowUpsert, dialect: &dyn Dialect) -> Result<PreparedStatementInfo>;
}

/// SQL Server `MERGE` with the row projected through a `USING (SELECT ...)`
/// source.
///
/// Key columns appear only in the `ON` predicate; a key column holding NULL
/// is matched with `t.<col> IS NULL` since `s.<col> = t.<col>` never holds
/// for NULL. Tables whose columns are all keys get no `WHEN MATCHED` clause.
pub struct MergeUpsertBuilder;

impl UpsertBuilder for MergeUpsertBuilder {
    fn priority(&self) -> i32 {
        PRIORITY_DIALECT
    }

    fn supports(&self, dialect: &dyn Dialect) -> bool {
        dialect.name() == "mssql"
    }

    fn build(&self, row: &RowUpsert, dialect: &dyn Dialect) -> Result<PreparedStatementInfo> {
        let mut cursor = ParamCursor::new(dialect, 1);
        let columns = row.effective_columns(dialect);

        let mut projection = Vec::with_capacity(columns.len());
        let mut insert_cols = Vec::with_capacity(columns.len());
        let mut insert_vals = Vec::with_capacity(columns.len());
        let mut assignments = Vec::new();
        for column in columns {
            let ident = dialect.quote_ident(&column.name);
            projection.push(format!("{} AS {}", cursor.value_expr(column), ident));
            insert_cols.push(ident.clone());
            insert_vals.push(format!("s.{}", ident));
            if !row.is_key_column(&column.name) {
                assignments.push(format!("t.{} = s.{}", ident, ident));
            }
        }

        let mut on_parts = Vec::new();
        for (key, value) in row.key_values()? {
            let ident = dialect.quote_ident(key);
            if value.is_null() {
                on_parts.push(format!("t.{} IS NULL", ident));
            } else {
                on_parts.push(format!("s.{} = t.{}", ident, ident));
            }
        }

        let mut sql = format!(
            "MERGE {} AS t USING (SELECT {}) AS s ON {}",
            dialect.escape_object(&row.table),
            projection.join(", "),
            on_parts.join(" AND ")
        );
        if !assignments.is_empty() {
            sql.push_str(&format!(
                " WHEN MATCHED THEN UPDATE SET {}",
                assignments.join(", ")
            ));
        }
        sql.push_str(&format!(
            " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
            insert_cols.join(", "),
            insert_vals.join(", ")
        ));
        // MSSQL MERGE requires a semicolon terminator
        sql.push(';');

        Ok(cursor.finish(sql))
    }
}

/// PostgreSQL `INSERT ... ON CONFLICT (keys) DO UPDATE`.
///
/// Tables whose columns are all keys degrade to `DO NOTHING`. Conflict
/// detection rides on the key columns' unique index, which treats NULL keys
/// as distinct, so a row with a NULL key always takes the insert branch on
/// this engine.
pub struct ConflictUpsertBuilder;

impl UpsertBuilder for ConflictUpsertBuilder {
    fn priority(&self) -> i32 {
        PRIORITY_DIALECT
    }

    fn supports(&self, dialect: &dyn Dialect) -> bool {
        dialect.name() == "postgres"
    }

    fn build(&self, row: &RowUpsert, dialect: &dyn Dialect) -> Result<PreparedStatementInfo> {
        let mut cursor = ParamCursor::new(dialect, 1);
        let columns = row.effective_columns(dialect);

        let mut col_list = Vec::with_capacity(columns.len());
        let mut value_list = Vec::with_capacity(columns.len());
        let mut assignments = Vec::new();
        for column in columns {
            let ident = dialect.quote_ident(&column.name);
            col_list.push(ident.clone());
            value_list.push(cursor.value_expr(column));
            if !row.is_key_column(&column.name) {
                assignments.push(format!("{} = EXCLUDED.{}", ident, ident));
            }
        }

        let conflict_cols = row
            .primary_key
            .iter()
            .map(|key| dialect.quote_ident(key))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO",
            dialect.escape_object(&row.table),
            col_list.join(", "),
            value_list.join(", "),
            conflict_cols
        );
        if assignments.is_empty() {
            sql.push_str(" NOTHING");
        } else {
            sql.push_str(&format!(" UPDATE SET {}", assignments.join(", ")));
        }

        Ok(cursor.finish(sql))
    }
}

/// Composite fallback: positional update, then an insert guarded on the
/// update having touched zero rows.
///
/// The two sub-statements are rendered by [`build_update`] and
/// [`build_insert`] and joined by the dialect's conditional-execution block;
/// the insert's placeholder numbering continues where the update's stopped,
/// and the combined parameter list is the update's followed by the insert's.
pub struct BlockUpsertBuilder;

impl UpsertBuilder for BlockUpsertBuilder {
    fn supports(&self, dialect: &dyn Dialect) -> bool {
        // DO blocks cannot carry bind parameters, so the composite cannot
        // run on postgres; the ON CONFLICT builder covers that engine.
        dialect.name() != "postgres"
    }

    fn validate(&self, row: &RowUpsert, dialect: &dyn Dialect) -> ValidationErrors {
        let mut errors = validate_row(row);
        let has_updatable = row
            .effective_columns(dialect)
            .into_iter()
            .any(|c| !row.is_key_column(&c.name));
        if !row.columns.is_empty() && !has_updatable {
            errors.add_error("columns must include at least one non-key column");
        }
        errors
    }

    fn build(&self, row: &RowUpsert, dialect: &dyn Dialect) -> Result<PreparedStatementInfo> {
        let update = build_update(row, dialect, 1)?;
        let insert = build_insert(row, dialect, update.param_count() + 1);

        let sql = dialect.conditional_insert_block(&update.sql, &insert.sql);
        let mut columns = update.columns;
        let mut parameters = update.parameters;
        columns.extend(insert.columns);
        parameters.extend(insert.parameters);
        Ok(PreparedStatementInfo {
            sql,
            columns,
            parameters,
        })
    }
}

/// Registry of upsert builders, resolved per dialect.
///
/// Unlike the statement registry there is no per-kind keying: every builder
/// targets the same operation and only dialect support and priority decide.
#[derive(Default)]
pub struct UpsertRegistry {
    builders: Vec<Arc<dyn UpsertBuilder>>,
}

impl UpsertRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard built-in builders registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(MergeUpsertBuilder);
        registry.register(ConflictUpsertBuilder);
        registry.register(BlockUpsertBuilder);
        registry
    }

    /// Register a builder. Registration order breaks priority ties.
    pub fn register(&mut self, builder: impl UpsertBuilder + 'static) {
        self.builders.push(Arc::new(builder));
    }

    /// Register a builder as an Arc (for sharing).
    pub fn register_arc(&mut self, builder: Arc<dyn UpsertBuilder>) {
        self.builders.push(builder);
    }

    /// All registered builders that support the dialect, in registration
    /// order.
    pub fn candidates(&self, dialect: &dyn Dialect) -> Vec<Arc<dyn UpsertBuilder>> {
        self.builders
            .iter()
            .filter(|b| b.supports(dialect))
            .cloned()
            .collect()
    }

    /// Resolve the builder that will render upserts on `dialect`, if any.
    pub fn resolve(&self, dialect: &dyn Dialect) -> Option<Arc<dyn UpsertBuilder>> {
        pick_best(self.candidates(dialect), |b| b.priority())
    }

    /// Validate and build the upsert statement for one row.
    ///
    /// # Errors
    ///
    /// - [`DiffError::NoGenerator`] when no registered builder supports the
    ///   dialect
    /// - [`DiffError::Validation`] when required fields are missing
    pub fn build(&self, row: &RowUpsert, dialect: &dyn Dialect) -> Result<PreparedStatementInfo> {
        let builder = self.resolve(dialect).ok_or_else(|| DiffError::NoGenerator {
            statement: "insertUpdate".to_string(),
            dialect: dialect.name().to_string(),
        })?;

        let errors = builder.validate(row, dialect);
        if errors.has_errors() {
            return Err(DiffError::Validation(errors));
        }

        tracing::debug!(
            table = %row.table,
            dialect = dialect.name(),
            priority = builder.priority(),
            "building upsert statement"
        );
        builder.build(row, dialect)
    }
}

impl fmt::Debug for UpsertRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpsertRegistry")
            .field("builders", &self.builders.len())
            .finish()
    }
}
