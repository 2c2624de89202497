//! Error types for `phonebook-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The input table lacks one or more required columns. Fatal: the run is
  /// aborted before any row is processed and no log is written.
  #[error("missing required columns: {}", .0.join(", "))]
  MissingColumns(Vec<String>),

  #[error("unknown import status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown rank scale: {0:?}")]
  UnknownScale(String),

  /// A storage failure outside the per-row handlers (loading the tree,
  /// writing the run log). Fatal.
  #[error("import target error: {0}")]
  Target(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
