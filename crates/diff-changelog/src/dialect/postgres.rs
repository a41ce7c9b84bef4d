//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Provides PostgreSQL-specific syntax for identifier quoting, LIMIT/OFFSET
//! row windowing, and parameter placeholders.

use crate::core::traits::Dialect;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote_ident(&self, name: &str) -> String {
        // PostgreSQL uses double quotes; embedded quotes are doubled
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn fold_ident(&self, name: &str) -> String {
        // Unquoted identifiers fold to lower case
        name.to_lowercase()
    }

    fn param_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc. (1-based)
        format!("${}", index)
    }

    fn supports_auto_increment(&self) -> bool {
        true
    }

    fn supports_native_upsert(&self) -> bool {
        // INSERT ... ON CONFLICT covers row upserts directly
        true
    }

    fn row_window_query(&self, inner_query: &str, start_row: i64, end_row: i64) -> String {
        // LIMIT/OFFSET applies after the query's own ORDER BY, keeping the
        // window deterministic for ordered inner queries.
        format!(
            "{} LIMIT {} OFFSET {}",
            inner_query,
            end_row - start_row + 1,
            start_row - 1
        )
    }

    fn conditional_insert_block(&self, update_sql: &str, insert_sql: &str) -> String {
        // DO blocks cannot carry bind parameters, so the upsert chain never
        // selects the composite builder for this dialect; the block form is
        // still rendered correctly for literal-only statements.
        format!(
            "DO $$\nBEGIN\n  {};\n  IF NOT FOUND THEN\n    {};\n  END IF;\nEND\n$$;",
            update_sql, insert_sql
        )
    }
}
