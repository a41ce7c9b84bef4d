//! Diff-driven changeset synthesis.
//!
//! The pipeline runs leaf-last: the [`orchestrator`] picks filters for a
//! missing table, [`extract`] counts, windows, and materializes rows, and
//! [`emit`] turns each batch into a changelog file plus any side files.
//!
//! Everything here is synchronous except the database round-trips; one diff
//! run issues its queries strictly in sequence on one borrowed connection.

pub mod emit;
pub mod extract;
pub mod orchestrator;

pub use emit::DataEmitter;
pub use extract::{DataExtractor, ROWS_PER_CHUNK, SINGLE_FILE_ROW_LIMIT};
pub use orchestrator::DiffOrchestrator;
