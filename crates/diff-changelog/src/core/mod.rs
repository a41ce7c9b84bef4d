//! Core abstractions shared by SQL generation and diff synthesis.
//!
//! This module provides the foundational types and traits used throughout
//! the engine:
//!
//! - [`object`]: catalog/schema/name references for database objects
//! - [`schema`]: table and column metadata types
//! - [`value`]: SQL value representation with efficient memory usage
//! - [`traits`]: the dialect strategy and the connection abstraction
//!
//! Database-specific behavior lives in the `dialect` module; everything here
//! is engine-agnostic and testable with mock implementations.

pub mod object;
pub mod schema;
pub mod traits;
pub mod value;

// Re-export commonly used types for convenience
pub use object::ObjectReference;
pub use schema::{Column, Table};
pub use traits::{Dialect, QueryResult, Row, SqlConnection};
pub use value::SqlValue;
