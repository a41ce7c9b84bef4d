//! Schema metadata types for diffed tables and columns.
//!
//! These types provide a database-agnostic representation of the reference
//! table being extracted: its qualified name, column definitions, and
//! primary-key column order.

use serde::{Deserialize, Serialize};

use crate::core::object::ObjectReference;

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Catalog (database) qualifier, if any.
    pub catalog: Option<String>,

    /// Schema qualifier, if any.
    pub schema: Option<String>,

    /// Table name.
    pub name: String,

    /// Column definitions in declared order.
    pub columns: Vec<Column>,

    /// Primary key column names in declared order.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Build a reference addressing this table.
    pub fn object_ref(&self) -> ObjectReference {
        ObjectReference {
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        self.object_ref().to_string()
    }

    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Column definitions for the primary key, in key order.
    pub fn pk_columns(&self) -> Vec<&Column> {
        self.primary_key
            .iter()
            .filter_map(|pk| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(pk))
            })
            .collect()
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared data type (e.g., "NUMBER", "VARCHAR2", "BLOB").
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Whether the column is an identity/auto-increment column.
    pub is_identity: bool,
}

impl Column {
    /// Whether the declared type is a binary large object.
    ///
    /// Matches declared type names only; sized binary types stay inline.
    pub fn is_blob(&self) -> bool {
        matches!(
            self.data_type.to_uppercase().as_str(),
            "BLOB" | "LONGBLOB" | "BYTEA" | "IMAGE"
        )
    }

    /// Whether the declared type is a character large object.
    pub fn is_clob(&self) -> bool {
        matches!(
            self.data_type.to_uppercase().as_str(),
            "CLOB" | "NCLOB" | "NTEXT"
        )
    }
}
