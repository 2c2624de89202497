//! Error type for `phonebook-store-sqlite`.

use phonebook_core::{department::DepartmentId, employee::EmployeeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] phonebook_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value is outside the range its column allows.
  #[error("corrupt column {column}: {value}")]
  Corrupt { column: &'static str, value: i64 },

  #[error("employee not found: {0}")]
  EmployeeNotFound(EmployeeId),

  #[error("department not found: {0}")]
  DepartmentNotFound(DepartmentId),

  #[error("an employee named {full_name:?} with internal phone {internal_phone:?} already exists")]
  DuplicateEmployee {
    full_name:      String,
    internal_phone: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
