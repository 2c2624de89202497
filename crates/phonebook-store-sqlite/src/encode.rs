//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The per-row error list of
//! an import run is stored as a compact JSON array.

use chrono::{DateTime, SecondsFormat, Utc};
use phonebook_core::{
  department::{Department, DepartmentId},
  employee::{Employee, EmployeeId, EmployeeRecord},
  import::{ImportRun, ImportRunId, ImportStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed-width nanosecond precision, so lexical order matches time order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Error lists ─────────────────────────────────────────────────────────────

pub fn encode_errors(errors: &[String]) -> Result<String> {
  Ok(serde_json::to_string(errors)?)
}

pub fn decode_errors(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn encode_count(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

fn decode_int<T: TryFrom<i64>>(column: &'static str, value: i64) -> Result<T> {
  T::try_from(value).map_err(|_| Error::Corrupt { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const DEPARTMENT_COLUMNS: &str =
  "department_id, name, short_name, parent_id, level, created_at, updated_at";

/// Raw values read directly from a `departments` row.
pub struct RawDepartment {
  pub department_id: i64,
  pub name:          String,
  pub short_name:    String,
  pub parent_id:     Option<i64>,
  pub level:         i64,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawDepartment {
  /// Map a row selected with [`DEPARTMENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      department_id: row.get(0)?,
      name:          row.get(1)?,
      short_name:    row.get(2)?,
      parent_id:     row.get(3)?,
      level:         row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
    })
  }

  pub fn into_department(self) -> Result<Department> {
    Ok(Department {
      id:         DepartmentId(self.department_id),
      name:       self.name,
      short_name: self.short_name,
      parent_id:  self.parent_id.map(DepartmentId),
      level:      decode_int("departments.level", self.level)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const EMPLOYEE_COLUMNS: &str = "e.employee_id, e.initials, e.full_name, \
   e.position, e.department_id, e.phone, e.internal_phone, e.email, e.room, \
   e.hierarchy, e.created_at, e.updated_at";

/// Raw values read directly from an `employees` row (aliased `e`).
pub struct RawEmployee {
  pub employee_id:    i64,
  pub initials:       String,
  pub full_name:      String,
  pub position:       String,
  pub department_id:  Option<i64>,
  pub phone:          String,
  pub internal_phone: String,
  pub email:          Option<String>,
  pub room:           Option<String>,
  pub hierarchy:      i64,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawEmployee {
  /// Map a row selected with [`EMPLOYEE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:    row.get(0)?,
      initials:       row.get(1)?,
      full_name:      row.get(2)?,
      position:       row.get(3)?,
      department_id:  row.get(4)?,
      phone:          row.get(5)?,
      internal_phone: row.get(6)?,
      email:          row.get(7)?,
      room:           row.get(8)?,
      hierarchy:      row.get(9)?,
      created_at:     row.get(10)?,
      updated_at:     row.get(11)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      id:         EmployeeId(self.employee_id),
      record:     EmployeeRecord {
        initials:       self.initials,
        full_name:      self.full_name,
        position:       self.position,
        department_id:  self.department_id.map(DepartmentId),
        phone:          self.phone,
        internal_phone: self.internal_phone,
        email:          self.email,
        room:           self.room,
        hierarchy:      decode_int("employees.hierarchy", self.hierarchy)?,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const IMPORT_RUN_COLUMNS: &str = "run_id, file_name, uploaded_at, status, \
   total_records, added, updated, errors, username";

/// Raw values read directly from an `import_logs` row.
pub struct RawImportRun {
  pub run_id:        i64,
  pub file_name:     String,
  pub uploaded_at:   String,
  pub status:        String,
  pub total_records: i64,
  pub added:         i64,
  pub updated:       i64,
  pub errors:        String,
  pub username:      Option<String>,
}

impl RawImportRun {
  /// Map a row selected with [`IMPORT_RUN_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      run_id:        row.get(0)?,
      file_name:     row.get(1)?,
      uploaded_at:   row.get(2)?,
      status:        row.get(3)?,
      total_records: row.get(4)?,
      added:         row.get(5)?,
      updated:       row.get(6)?,
      errors:        row.get(7)?,
      username:      row.get(8)?,
    })
  }

  pub fn into_run(self) -> Result<ImportRun> {
    Ok(ImportRun {
      id:          ImportRunId(self.run_id),
      file_name:   self.file_name,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      status:      self.status.parse::<ImportStatus>()?,
      total:       decode_int("import_logs.total_records", self.total_records)?,
      added:       decode_int("import_logs.added", self.added)?,
      updated:     decode_int("import_logs.updated", self.updated)?,
      errors:      decode_errors(&self.errors)?,
      user:        self.username,
    })
  }
}
