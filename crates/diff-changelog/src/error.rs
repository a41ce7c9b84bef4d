//! Error types for the diff and SQL generation library.

use thiserror::Error;

use crate::sqlgen::ValidationErrors;

/// Main error type for diff and generation operations.
#[derive(Error, Debug)]
pub enum DiffError {
    /// Configuration error (invalid YAML, unknown dialect, bad filter setup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more required statement fields were missing before rendering
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No registered generator supports the statement on the given dialect
    #[error("No generator supports {statement} on dialect {dialect}")]
    NoGenerator { statement: String, dialect: String },

    /// Query produced a malformed or empty result where one was required
    #[error("Database error: {0}")]
    Database(String),

    /// Underlying database or I/O fault during extraction or emission
    #[error("Unexpected failure during {context}: {source}")]
    Unexpected {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Replay of a specific changeset failed
    #[error("Migration failed for change set {file}: {changeset}")]
    Migration {
        changeset: String,
        file: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// IO error (directory creation, data and side-file writes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DiffError {
    /// Create an Unexpected error wrapping an underlying cause.
    pub fn unexpected(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DiffError::Unexpected {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Create a Migration error pinpointing the failing changeset.
    pub fn migration(
        changeset: impl Into<String>,
        file: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DiffError::Migration {
            changeset: changeset.into(),
            file: file.into(),
            source: Box::new(source),
        }
    }

    /// Create a Database error
    pub fn database(message: impl Into<String>) -> Self {
        DiffError::Database(message.into())
    }

    /// Format error with full details including the flattened cause chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for diff and generation operations.
pub type Result<T> = std::result::Result<T, DiffError>;
