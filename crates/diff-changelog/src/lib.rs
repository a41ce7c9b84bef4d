//! # diff-changelog
//!
//! Dialect-aware SQL generation and diff-driven changelog synthesis.
//!
//! This library renders abstract change operations into dialect-correct SQL
//! and, given a table missing from a target database, extracts its data from
//! the reference database into replayable changeset files:
//!
//! - **Statement generation** through a priority-selected generator chain
//!   with per-dialect overrides
//! - **Upsert synthesis** as native MERGE/ON CONFLICT or a composed
//!   update-then-insert block, with positional bind parameters
//! - **Chunked extraction** using server-side row windows for large tables
//! - **Changeset emission** as YAML markup or delimited data files, with
//!   large-object values externalized to side files
//!
//! ## Example
//!
//! ```rust
//! use diff_changelog::dialect::dialect_for;
//! use diff_changelog::sqlgen::{DropProcedureStatement, GeneratorRegistry, Statement};
//!
//! fn main() -> diff_changelog::Result<()> {
//!     let dialect = dialect_for("postgres")?;
//!     let registry = GeneratorRegistry::with_builtins();
//!
//!     let statement = Statement::from(DropProcedureStatement::new("SP_REBUILD_INDEX"));
//!     let rendered = registry.render(&statement, dialect.as_ref())?;
//!     println!("{}", rendered[0].sql);
//!     Ok(())
//! }
//! ```

pub mod changelog;
pub mod config;
pub mod core;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod sqlgen;

// Re-exports for convenient access
pub use changelog::{Change, ChangeLogFile, ChangeSet, IncludedFile};
pub use config::{DiffOutputControl, TableFilter};
pub use crate::core::{Dialect, ObjectReference, QueryResult, Row, SqlConnection, SqlValue, Table};
pub use diff::{DataExtractor, DiffOrchestrator};
pub use error::{DiffError, Result};
pub use sqlgen::{GeneratorRegistry, PreparedStatementInfo, RowUpsert, UpsertRegistry};
