//! The import log: one immutable record per completed run.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ImportRunId(pub i64);

impl fmt::Display for ImportRunId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Outcome of a run, derived purely from its counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
  /// No row failed.
  Success,
  /// Some rows failed, at least one was written.
  Partial,
  /// Rows failed and none were written.
  Failed,
}

impl ImportStatus {
  pub fn from_counts(added: usize, updated: usize, errors: usize) -> Self {
    match (errors, added + updated) {
      (0, _) => Self::Success,
      (_, 0) => Self::Failed,
      _ => Self::Partial,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Partial => "partial",
      Self::Failed => "failed",
    }
  }
}

impl fmt::Display for ImportStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ImportStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "success" => Ok(Self::Success),
      "partial" => Ok(Self::Partial),
      "failed" => Ok(Self::Failed),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

/// Input to [`super::ImportTarget::record_run`]. The identifier and upload
/// timestamp are set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImportRun {
  pub file_name: String,
  pub status:    ImportStatus,
  pub total:     usize,
  pub added:     usize,
  pub updated:   usize,
  pub errors:    Vec<String>,
  pub user:      Option<String>,
}

/// A persisted run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRun {
  pub id:          ImportRunId,
  pub file_name:   String,
  pub uploaded_at: DateTime<Utc>,
  pub status:      ImportStatus,
  pub total:       usize,
  pub added:       usize,
  pub updated:     usize,
  /// `"row <n>: <message>"` lines in row order.
  pub errors:      Vec<String>,
  pub user:        Option<String>,
}

impl ImportRun {
  pub fn summary(&self) -> ImportSummary {
    ImportSummary {
      status:  self.status,
      total:   self.total,
      added:   self.added,
      updated: self.updated,
      errors:  self.errors.clone(),
    }
  }
}

/// The payload returned to the caller of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub status:  ImportStatus,
  pub total:   usize,
  pub added:   usize,
  pub updated: usize,
  pub errors:  Vec<String>,
}
