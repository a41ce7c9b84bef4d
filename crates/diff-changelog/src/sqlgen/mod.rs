//! Statement-to-SQL generation.
//!
//! Abstract statements come in, dialect-correct SQL comes out. The
//! [`GeneratorRegistry`] routes whole statements ([`Statement`]) through
//! priority-selected generators; the [`UpsertRegistry`] does the same for
//! row-level insert-or-update, producing parameterized SQL
//! ([`PreparedStatementInfo`]) instead of plain text.

pub mod chain;
pub mod drop_procedure;
pub mod prepared;
pub mod statement;
pub mod upsert;

pub use chain::{
    GeneratorRegistry, RenderedSql, SqlGenerator, ValidationErrors, PRIORITY_DEFAULT,
    PRIORITY_DIALECT,
};
pub use drop_procedure::{DropProcedureGenerator, MssqlDropProcedureGenerator};
pub use prepared::{
    build_insert, build_update, ColumnValue, ParamValue, PreparedStatementInfo, RowUpsert,
};
pub use statement::{
    DropProcedureStatement, RawSqlGenerator, RawSqlStatement, Statement, StatementKind,
};
pub use upsert::{
    BlockUpsertBuilder, ConflictUpsertBuilder, MergeUpsertBuilder, UpsertBuilder, UpsertRegistry,
};
