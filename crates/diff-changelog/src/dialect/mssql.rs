//! MSSQL SQL dialect (Strategy pattern).
//!
//! Provides MSSQL-specific syntax for identifier quoting, OFFSET/FETCH row
//! windowing, and parameter placeholders.

use crate::core::traits::Dialect;

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn quote_ident(&self, name: &str) -> String {
        // MSSQL uses square brackets for identifier quoting
        // Handle names that contain closing brackets by doubling them
        format!("[{}]", name.replace(']', "]]"))
    }

    fn fold_ident(&self, name: &str) -> String {
        // Identifier case is preserved
        name.to_string()
    }

    fn param_placeholder(&self, index: usize) -> String {
        // MSSQL uses @P1, @P2, etc. (1-based)
        format!("@P{}", index)
    }

    fn supports_auto_increment(&self) -> bool {
        true
    }

    fn supports_native_upsert(&self) -> bool {
        // MERGE covers row upserts directly
        true
    }

    fn row_window_query(&self, inner_query: &str, start_row: i64, end_row: i64) -> String {
        // OFFSET/FETCH attaches to the inner query's ORDER BY clause; the
        // caller must supply an ordered query.
        format!(
            "{} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            inner_query,
            start_row - 1,
            end_row - start_row + 1
        )
    }

    fn conditional_insert_block(&self, update_sql: &str, insert_sql: &str) -> String {
        format!(
            "{};\nIF @@ROWCOUNT = 0\nBEGIN\n  {};\nEND",
            update_sql, insert_sql
        )
    }
}
