//! Concrete dialect implementations.
//!
//! Each submodule implements the [`Dialect`] strategy trait for one database
//! engine:
//!
//! - [`oracle`]: upper-case folding, ROWNUM windowing, PL/SQL upsert block
//! - [`postgres`]: lower-case folding, LIMIT/OFFSET windowing, ON CONFLICT
//! - [`mssql`]: case-preserving, OFFSET/FETCH windowing, MERGE
//!
//! # Adding New Engines
//!
//! 1. Create a module under `dialect/` implementing [`Dialect`]
//! 2. Map its name in [`dialect_for`]
//! 3. Register engine-specific generators in the generator registries'
//!    `with_builtins()` constructors when the engine needs special rendering

use std::sync::Arc;

use crate::core::traits::Dialect;
use crate::error::{DiffError, Result};

pub mod mssql;
pub mod oracle;
pub mod postgres;

pub use mssql::MssqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

/// Create a dialect from a database type string.
///
/// # Errors
///
/// Returns an error if the database type is not recognized.
pub fn dialect_for(db_type: &str) -> Result<Arc<dyn Dialect>> {
    match db_type.to_lowercase().as_str() {
        "oracle" | "ora" => Ok(Arc::new(OracleDialect::new())),
        "postgres" | "postgresql" | "pg" => Ok(Arc::new(PostgresDialect::new())),
        "mssql" | "sqlserver" | "sql_server" => Ok(Arc::new(MssqlDialect::new())),
        other => Err(DiffError::Config(format!(
            "Unknown database type: '{}'. Supported types: oracle, postgres, mssql",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_for_known_names() {
        assert_eq!(dialect_for("oracle").unwrap().name(), "oracle");
        assert_eq!(dialect_for("postgresql").unwrap().name(), "postgres");
        assert_eq!(dialect_for("sqlserver").unwrap().name(), "mssql");
    }

    #[test]
    fn test_dialect_for_unknown_name() {
        let err = dialect_for("db2").unwrap_err();
        assert!(matches!(err, DiffError::Config(_)));
        assert!(err.to_string().contains("db2"));
    }
}
