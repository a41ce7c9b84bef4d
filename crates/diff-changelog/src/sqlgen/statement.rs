//! Statement descriptions consumed by the generator chain.
//!
//! A [`Statement`] captures intent (drop this procedure, run this SQL) with
//! no dialect-specific text. Generators turn statements into SQL; see
//! [`super::chain`].

use std::fmt;

use crate::core::{Dialect, ObjectReference};
use crate::error::{DiffError, Result};

use super::chain::{RenderedSql, SqlGenerator, ValidationErrors};

/// Discriminant used to key generators in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    DropProcedure,
    RawSql,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::DropProcedure => "dropProcedure",
            StatementKind::RawSql => "rawSql",
        };
        write!(f, "{}", name)
    }
}

/// Intent to drop a stored procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropProcedureStatement {
    pub catalog_name: Option<String>,
    pub schema_name: Option<String>,
    pub procedure_name: String,
}

impl DropProcedureStatement {
    pub fn new(procedure_name: impl Into<String>) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            procedure_name: procedure_name.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_name = Some(catalog.into());
        self
    }

    /// The procedure as a qualified object reference.
    pub fn object_ref(&self) -> ObjectReference {
        ObjectReference {
            catalog: self.catalog_name.clone(),
            schema: self.schema_name.clone(),
            name: self.procedure_name.clone(),
        }
    }
}

/// Pre-written SQL passed through the chain unchanged.
///
/// Used for hand-maintained migration snippets that still need to flow
/// through validation and logging like generated statements do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSqlStatement {
    pub sql: String,
}

impl RawSqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

/// A statement awaiting rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    DropProcedure(DropProcedureStatement),
    RawSql(RawSqlStatement),
}

impl Statement {
    /// The registry key for this statement.
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::DropProcedure(_) => StatementKind::DropProcedure,
            Statement::RawSql(_) => StatementKind::RawSql,
        }
    }
}

impl From<DropProcedureStatement> for Statement {
    fn from(statement: DropProcedureStatement) -> Self {
        Statement::DropProcedure(statement)
    }
}

impl From<RawSqlStatement> for Statement {
    fn from(statement: RawSqlStatement) -> Self {
        Statement::RawSql(statement)
    }
}

/// Error for a statement routed to a generator of the wrong kind.
///
/// The registry keys generators by [`StatementKind`], so this only fires
/// when a generator is invoked directly with a foreign statement.
pub(crate) fn kind_mismatch(statement: &Statement, expected: StatementKind) -> DiffError {
    DiffError::Unexpected {
        context: "SQL generation".to_string(),
        source: format!(
            "{} statement routed to a {} generator",
            statement.kind(),
            expected
        )
        .into(),
    }
}

/// Passes [`RawSqlStatement`] text through as-is.
pub struct RawSqlGenerator;

impl SqlGenerator for RawSqlGenerator {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::RawSql
    }

    fn validate(&self, statement: &Statement, _dialect: &dyn Dialect) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Statement::RawSql(stmt) = statement {
            errors.check_required_ident("sql", &stmt.sql);
        }
        errors
    }

    fn generate(&self, statement: &Statement, _dialect: &dyn Dialect) -> Result<Vec<RenderedSql>> {
        let Statement::RawSql(stmt) = statement else {
            return Err(kind_mismatch(statement, StatementKind::RawSql));
        };
        Ok(vec![RenderedSql::new(stmt.sql.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::OracleDialect;
    use crate::sqlgen::GeneratorRegistry;

    #[test]
    fn test_statement_kind_display() {
        assert_eq!(StatementKind::DropProcedure.to_string(), "dropProcedure");
        assert_eq!(StatementKind::RawSql.to_string(), "rawSql");
    }

    #[test]
    fn test_drop_procedure_object_ref() {
        let stmt = DropProcedureStatement::new("SP_REBUILD")
            .with_schema("app")
            .with_catalog("main");
        let obj = stmt.object_ref();
        assert_eq!(obj.to_string(), "main.app.SP_REBUILD");

        let bare = DropProcedureStatement::new("SP_REBUILD").object_ref();
        assert_eq!(bare.to_string(), "SP_REBUILD");
    }

    #[test]
    fn test_statement_kind_matches_variant() {
        let drop: Statement = DropProcedureStatement::new("P").into();
        assert_eq!(drop.kind(), StatementKind::DropProcedure);

        let raw: Statement = RawSqlStatement::new("SELECT 1").into();
        assert_eq!(raw.kind(), StatementKind::RawSql);
    }

    #[test]
    fn test_raw_sql_generator_requires_sql() {
        let mut registry = GeneratorRegistry::new();
        registry.register(RawSqlGenerator);
        let oracle = OracleDialect::new();

        let empty: Statement = RawSqlStatement::new("   ").into();
        let err = registry.render(&empty, &oracle).unwrap_err();
        assert!(err.to_string().contains("sql is required"));
    }

    #[test]
    fn test_raw_sql_generator_passes_text_through() {
        let mut registry = GeneratorRegistry::new();
        registry.register(RawSqlGenerator);
        let oracle = OracleDialect::new();

        let stmt: Statement = RawSqlStatement::new("UPDATE T SET A = 1").into();
        let rendered = registry.render(&stmt, &oracle).unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].sql, "UPDATE T SET A = 1");
        assert!(rendered[0].affected.is_empty());
    }
}
