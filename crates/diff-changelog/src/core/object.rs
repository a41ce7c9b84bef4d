//! Database object references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::traits::Dialect;

/// A catalog/schema/name triple identifying any database object.
///
/// References are immutable once constructed. Derived equality compares the
/// raw parts verbatim; dialect-aware comparison goes through
/// [`ObjectReference::matches`], which applies the dialect's case-folding
/// rules for unquoted identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Catalog (database) qualifier, if any.
    pub catalog: Option<String>,

    /// Schema qualifier, if any.
    pub schema: Option<String>,

    /// Object name.
    pub name: String,
}

impl ObjectReference {
    /// Create an unqualified reference.
    pub fn new(name: impl Into<String>) -> Self {
        ObjectReference {
            catalog: None,
            schema: None,
            name: name.into(),
        }
    }

    /// Create a schema-qualified reference.
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectReference {
            catalog: None,
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Create a fully qualified reference.
    pub fn with_catalog(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ObjectReference {
            catalog: Some(catalog.into()),
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// The qualifier parts present on this reference, outermost first.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.catalog
            .as_deref()
            .into_iter()
            .chain(self.schema.as_deref())
            .chain(std::iter::once(self.name.as_str()))
    }

    /// Return a copy with every part folded per the dialect's case rules.
    pub fn normalized(&self, dialect: &dyn Dialect) -> ObjectReference {
        ObjectReference {
            catalog: self.catalog.as_deref().map(|c| dialect.fold_ident(c)),
            schema: self.schema.as_deref().map(|s| dialect.fold_ident(s)),
            name: dialect.fold_ident(&self.name),
        }
    }

    /// Dialect-normalized equality: true when both references fold to the
    /// same parts under the dialect's case rules.
    pub fn matches(&self, other: &ObjectReference, dialect: &dyn Dialect) -> bool {
        self.normalized(dialect) == other.normalized(dialect)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in self.parts() {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_present_parts() {
        assert_eq!(ObjectReference::new("orders").to_string(), "orders");
        assert_eq!(
            ObjectReference::with_schema("app", "orders").to_string(),
            "app.orders"
        );
        assert_eq!(
            ObjectReference::with_catalog("main", "app", "orders").to_string(),
            "main.app.orders"
        );
    }

    #[test]
    fn test_parts_skips_absent_qualifiers() {
        let partial = ObjectReference::with_schema("app", "orders");
        let parts: Vec<&str> = partial.parts().collect();
        assert_eq!(parts, vec!["app", "orders"]);
    }

    #[test]
    fn test_raw_equality_is_case_sensitive() {
        let upper = ObjectReference::new("ORDERS");
        let lower = ObjectReference::new("orders");
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_matches_applies_dialect_case_folding() {
        use crate::dialect::{MssqlDialect, OracleDialect};

        let upper = ObjectReference::with_schema("APP", "ORDERS");
        let lower = ObjectReference::with_schema("app", "orders");

        assert!(upper.matches(&lower, &OracleDialect::new()));
        assert!(!upper.matches(&lower, &MssqlDialect::new()));
        assert_eq!(lower.normalized(&OracleDialect::new()), upper);
    }
}
