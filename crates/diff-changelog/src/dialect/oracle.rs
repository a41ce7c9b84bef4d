//! Oracle SQL dialect (Strategy pattern).
//!
//! Provides Oracle-specific syntax for identifier quoting, ROWNUM-based row
//! windowing, and the PL/SQL conditional-insert block used when composing
//! upserts.

use crate::core::traits::Dialect;

/// Oracle dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Create a new Oracle dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for OracleDialect {
    fn name(&self) -> &str {
        "oracle"
    }

    fn quote_ident(&self, name: &str) -> String {
        // Oracle uses double quotes; embedded quotes are doubled
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn fold_ident(&self, name: &str) -> String {
        // Unquoted identifiers fold to upper case
        name.to_uppercase()
    }

    fn param_placeholder(&self, index: usize) -> String {
        // Oracle uses :1, :2, etc. (1-based)
        format!(":{}", index)
    }

    fn supports_auto_increment(&self) -> bool {
        false
    }

    fn supports_native_upsert(&self) -> bool {
        // Row upserts are composed as a PL/SQL block, not a single MERGE
        false
    }

    fn row_window_query(&self, inner_query: &str, start_row: i64, end_row: i64) -> String {
        // Double-nested ROWNUM window: the inner filter caps the scan, the
        // outer predicate trims rows below the window start.
        format!(
            "select * from ( select /*+ FIRST_ROWS(n) */ a.*, ROWNUM rnum from ( {} ) a where ROWNUM <= {} ) where rnum >= {}",
            inner_query, end_row, start_row
        )
    }

    fn conditional_insert_block(&self, update_sql: &str, insert_sql: &str) -> String {
        format!(
            "BEGIN\n  {};\n  IF SQL%ROWCOUNT = 0 THEN\n    {};\n  END IF;\nEND;",
            update_sql, insert_sql
        )
    }
}
