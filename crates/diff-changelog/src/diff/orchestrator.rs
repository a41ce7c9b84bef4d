//! Top-level driver for missing-table data diffs.
//!
//! Given a table diagnosed as missing in the target database, the
//! orchestrator runs extraction once per configured filter and aggregates
//! the emitted file descriptors. Tables are processed one at a time; there
//! is no cross-table state beyond the shared output configuration.

use std::sync::Arc;

use crate::changelog::IncludedFile;
use crate::config::DiffOutputControl;
use crate::core::{Dialect, SqlConnection, Table};
use crate::diff::extract::DataExtractor;
use crate::error::{DiffError, Result};

/// Bookkeeping tables of the migration engine itself, never diffed.
const BOOKKEEPING_TABLES: [&str; 2] = ["DATABASECHANGELOG", "DATABASECHANGELOGLOCK"];

/// Drives extraction for tables missing in the target database.
pub struct DiffOrchestrator {
    extractor: DataExtractor,
}

impl DiffOrchestrator {
    pub fn new(dialect: Arc<dyn Dialect>, control: DiffOutputControl) -> Self {
        Self {
            extractor: DataExtractor::new(dialect, control),
        }
    }

    /// Synthesize data changesets for one missing table.
    ///
    /// Runs every filter configured for the table (a single all-rows filter
    /// when none are) and returns the emitted file descriptors in filter
    /// order. Bookkeeping tables and configured skips yield nothing without
    /// touching the connection.
    ///
    /// Any failure below this point is wrapped with the table's name so the
    /// caller sees which diff aborted; the original cause stays on the
    /// error chain.
    pub async fn fix_missing(
        &self,
        conn: &mut dyn SqlConnection,
        table: &Table,
    ) -> Result<Vec<IncludedFile>> {
        if is_bookkeeping(&table.name) || self.extractor.control().is_skipped(&table.name) {
            tracing::debug!(table = %table.name, "table excluded from diff");
            return Ok(Vec::new());
        }

        let mut included = Vec::new();
        for filter in self.extractor.control().filters_for(&table.name) {
            let files = self
                .extractor
                .extract(conn, table, &filter)
                .await
                .map_err(|source| {
                    DiffError::unexpected(format!("diff of table {}", table.full_name()), source)
                })?;
            included.extend(files);
        }
        Ok(included)
    }
}

/// Whether a table is the engine's own changelog bookkeeping.
fn is_bookkeeping(name: &str) -> bool {
    BOOKKEEPING_TABLES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(name))
}
