//! Generator chain: statement-to-SQL rendering with dialect-aware selection.
//!
//! Statements describe intent ([`Statement`]); generators render them into
//! executable SQL for a concrete [`Dialect`]. The [`GeneratorRegistry`] keeps
//! candidate generators per statement kind and selects one at render time.
//!
//! # Selection Rules
//!
//! - Generators whose [`supports`](SqlGenerator::supports) rejects the dialect
//!   are removed from consideration
//! - Of the remaining candidates, the highest [`priority`](SqlGenerator::priority)
//!   wins
//! - On a priority tie the earliest registered generator wins
//!
//! # Design Rationale
//!
//! - **No global state**: the registry is explicitly constructed and injected
//! - **Explicit registration**: clear, deterministic initialization order
//! - **Testable**: easy to build small registries with mock generators

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::{Dialect, ObjectReference};
use crate::error::{DiffError, Result};

use super::statement::{Statement, StatementKind};

/// Priority of generic generators that work on any dialect.
pub const PRIORITY_DEFAULT: i32 = 1;

/// Priority of generators specialized for a single dialect.
///
/// A specialized generator registered for the same statement kind overrides
/// the default one whenever its dialect is in play.
pub const PRIORITY_DIALECT: i32 = 5;

/// Accumulated validation failures for a statement.
///
/// Validation inspects every required field and records all missing ones
/// before rendering is attempted, so a caller sees the full list in one
/// round trip rather than fixing fields one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    /// Create an empty error collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation failure.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Record `<field> is required` when the value is absent.
    pub fn check_required_field<T>(&mut self, field: &str, value: Option<&T>) {
        if value.is_none() {
            self.add_error(format!("{} is required", field));
        }
    }

    /// Record `<field> is required` when the identifier is empty or blank.
    pub fn check_required_ident(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(format!("{} is required", field));
        }
    }

    /// True when at least one failure has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }

    /// All recorded failure messages, in the order they were recorded.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

/// One rendered SQL string plus the objects it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSql {
    /// The executable SQL text, without a trailing statement terminator.
    pub sql: String,

    /// Database objects affected by this SQL.
    pub affected: Vec<ObjectReference>,
}

impl RenderedSql {
    /// Create a rendered statement with no affected-object annotations.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            affected: Vec::new(),
        }
    }

    /// Attach the objects this SQL affects.
    pub fn with_affected(mut self, affected: Vec<ObjectReference>) -> Self {
        self.affected = affected;
        self
    }
}

/// Renders one kind of [`Statement`] into SQL for some set of dialects.
///
/// Implementations are registered with a [`GeneratorRegistry`]; the registry
/// routes each statement to the best candidate. A generator only ever sees
/// statements of its own [`statement_kind`](SqlGenerator::statement_kind).
pub trait SqlGenerator: Send + Sync {
    /// The statement kind this generator renders.
    fn statement_kind(&self) -> StatementKind;

    /// Selection priority; higher wins. Defaults to [`PRIORITY_DEFAULT`].
    fn priority(&self) -> i32 {
        PRIORITY_DEFAULT
    }

    /// Whether this generator can render for the given dialect.
    ///
    /// Defaults to accepting every dialect. Dialect-specialized generators
    /// override this to claim exactly one engine.
    fn supports(&self, _dialect: &dyn Dialect) -> bool {
        true
    }

    /// Check the statement for missing required fields.
    ///
    /// Returns every problem found, not just the first.
    fn validate(&self, _statement: &Statement, _dialect: &dyn Dialect) -> ValidationErrors {
        ValidationErrors::new()
    }

    /// Render the statement into one or more SQL strings.
    fn generate(&self, statement: &Statement, dialect: &dyn Dialect) -> Result<Vec<RenderedSql>>;
}

/// Pick the highest-priority item, keeping the earliest on ties.
///
/// Shared by the statement registry and the upsert builder registry so both
/// resolve candidates with identical semantics.
pub(crate) fn pick_best<T>(
    items: impl IntoIterator<Item = T>,
    priority: impl Fn(&T) -> i32,
) -> Option<T> {
    let mut best: Option<(i32, T)> = None;
    for item in items {
        let p = priority(&item);
        match &best {
            // Strictly-greater comparison keeps the first registered on ties.
            Some((bp, _)) if p <= *bp => {}
            _ => best = Some((p, item)),
        }
    }
    best.map(|(_, item)| item)
}

/// Registry of SQL generators keyed by statement kind.
///
/// The registry is explicitly constructed and passed to whatever drives
/// rendering, rather than living in a global. Registration order matters:
/// it breaks priority ties.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = GeneratorRegistry::new();
/// registry.register(DropProcedureGenerator);
/// registry.register(MssqlDropProcedureGenerator);
///
/// let rendered = registry.render(&statement, dialect.as_ref())?;
/// ```
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<StatementKind, Vec<Arc<dyn SqlGenerator>>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard built-in generators registered.
    pub fn with_builtins() -> Self {
        use super::drop_procedure::{DropProcedureGenerator, MssqlDropProcedureGenerator};
        use super::statement::RawSqlGenerator;

        let mut registry = Self::new();
        registry.register(DropProcedureGenerator);
        registry.register(MssqlDropProcedureGenerator);
        registry.register(RawSqlGenerator);
        registry
    }

    /// Register a generator under its own statement kind.
    pub fn register(&mut self, generator: impl SqlGenerator + 'static) {
        self.register_arc(Arc::new(generator));
    }

    /// Register a generator as an Arc (for sharing).
    pub fn register_arc(&mut self, generator: Arc<dyn SqlGenerator>) {
        self.generators
            .entry(generator.statement_kind())
            .or_default()
            .push(generator);
    }

    /// All registered generators for a kind that support the dialect,
    /// in registration order.
    pub fn candidates(
        &self,
        kind: StatementKind,
        dialect: &dyn Dialect,
    ) -> Vec<Arc<dyn SqlGenerator>> {
        self.generators
            .get(&kind)
            .map(|list| {
                list.iter()
                    .filter(|g| g.supports(dialect))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve the generator that will render `kind` on `dialect`, if any.
    pub fn resolve(
        &self,
        kind: StatementKind,
        dialect: &dyn Dialect,
    ) -> Option<Arc<dyn SqlGenerator>> {
        pick_best(self.candidates(kind, dialect), |g| g.priority())
    }

    /// Validate and render a statement for the given dialect.
    ///
    /// # Errors
    ///
    /// - [`DiffError::NoGenerator`] when no registered generator supports the
    ///   statement kind on this dialect
    /// - [`DiffError::Validation`] when required fields are missing; the error
    ///   carries every missing field
    pub fn render(&self, statement: &Statement, dialect: &dyn Dialect) -> Result<Vec<RenderedSql>> {
        let kind = statement.kind();
        let generator = self
            .resolve(kind, dialect)
            .ok_or_else(|| DiffError::NoGenerator {
                statement: kind.to_string(),
                dialect: dialect.name().to_string(),
            })?;

        let errors = generator.validate(statement, dialect);
        if errors.has_errors() {
            return Err(DiffError::Validation(errors));
        }

        tracing::debug!(
            statement = %kind,
            dialect = dialect.name(),
            priority = generator.priority(),
            "rendering statement"
        );
        generator.generate(statement, dialect)
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&StatementKind, usize> =
            self.generators.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("GeneratorRegistry")
            .field("generators", &counts)
            .finish()
    }
}
