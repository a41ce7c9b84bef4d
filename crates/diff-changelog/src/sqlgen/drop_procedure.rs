//! Generators for [`DropProcedureStatement`].
//!
//! The generic generator renders plain `DROP PROCEDURE` and works on every
//! dialect. SQL Server additionally gets an `IF EXISTS` guard so replaying a
//! changelog against a database that never had the procedure does not fail.

use crate::core::Dialect;
use crate::error::Result;

use super::chain::{RenderedSql, SqlGenerator, ValidationErrors, PRIORITY_DIALECT};
use super::statement::{kind_mismatch, DropProcedureStatement, Statement, StatementKind};

fn validate_drop_procedure(statement: &Statement) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Statement::DropProcedure(stmt) = statement {
        errors.check_required_ident("procedureName", &stmt.procedure_name);
    }
    errors
}

fn unpack(statement: &Statement) -> Result<&DropProcedureStatement> {
    match statement {
        Statement::DropProcedure(stmt) => Ok(stmt),
        other => Err(kind_mismatch(other, StatementKind::DropProcedure)),
    }
}

/// Renders `DROP PROCEDURE <name>` for any dialect.
pub struct DropProcedureGenerator;

impl SqlGenerator for DropProcedureGenerator {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropProcedure
    }

    fn validate(&self, statement: &Statement, _dialect: &dyn Dialect) -> ValidationErrors {
        validate_drop_procedure(statement)
    }

    fn generate(&self, statement: &Statement, dialect: &dyn Dialect) -> Result<Vec<RenderedSql>> {
        let stmt = unpack(statement)?;
        let object = stmt.object_ref();
        let sql = format!("DROP PROCEDURE {}", dialect.escape_object(&object));
        Ok(vec![RenderedSql::new(sql).with_affected(vec![object])])
    }
}

/// SQL Server override that guards the drop with `IF EXISTS`.
pub struct MssqlDropProcedureGenerator;

impl SqlGenerator for MssqlDropProcedureGenerator {
    fn statement_kind(&self) -> StatementKind {
        StatementKind::DropProcedure
    }

    fn priority(&self) -> i32 {
        PRIORITY_DIALECT
    }

    fn supports(&self, dialect: &dyn Dialect) -> bool {
        dialect.name() == "mssql"
    }

    fn validate(&self, statement: &Statement, _dialect: &dyn Dialect) -> ValidationErrors {
        validate_drop_procedure(statement)
    }

    fn generate(&self, statement: &Statement, dialect: &dyn Dialect) -> Result<Vec<RenderedSql>> {
        let stmt = unpack(statement)?;
        let object = stmt.object_ref();
        let sql = format!("DROP PROCEDURE IF EXISTS {}", dialect.escape_object(&object));
        Ok(vec![RenderedSql::new(sql).with_affected(vec![object])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MssqlDialect, OracleDialect, PostgresDialect};
    use crate::error::DiffError;
    use crate::sqlgen::GeneratorRegistry;

    fn drop_statement() -> Statement {
        DropProcedureStatement::new("SP_REBUILD_INDEX")
            .with_schema("APP")
            .into()
    }

    #[test]
    fn test_generic_drop_on_oracle() {
        let registry = GeneratorRegistry::with_builtins();
        let oracle = OracleDialect::new();

        let rendered = registry.render(&drop_statement(), &oracle).unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(
            rendered[0].sql,
            "DROP PROCEDURE \"APP\".\"SP_REBUILD_INDEX\""
        );
        assert_eq!(rendered[0].affected.len(), 1);
        assert_eq!(rendered[0].affected[0].to_string(), "APP.SP_REBUILD_INDEX");
    }

    #[test]
    fn test_generic_drop_on_postgres() {
        let registry = GeneratorRegistry::with_builtins();
        let postgres = PostgresDialect::new();

        let rendered = registry.render(&drop_statement(), &postgres).unwrap();
        assert_eq!(
            rendered[0].sql,
            "DROP PROCEDURE \"APP\".\"SP_REBUILD_INDEX\""
        );
    }

    #[test]
    fn test_mssql_drop_adds_if_exists() {
        let registry = GeneratorRegistry::with_builtins();
        let mssql = MssqlDialect::new();

        let rendered = registry.render(&drop_statement(), &mssql).unwrap();
        assert_eq!(
            rendered[0].sql,
            "DROP PROCEDURE IF EXISTS [APP].[SP_REBUILD_INDEX]"
        );
    }

    #[test]
    fn test_missing_procedure_name_fails_validation() {
        let registry = GeneratorRegistry::with_builtins();
        let oracle = OracleDialect::new();

        let statement: Statement = DropProcedureStatement::new("").into();
        let err = registry.render(&statement, &oracle).unwrap_err();
        match err {
            DiffError::Validation(errors) => {
                assert_eq!(errors.messages(), &["procedureName is required"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
