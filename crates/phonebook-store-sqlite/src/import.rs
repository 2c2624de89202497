//! The [`ImportTarget`] implementation over an open
//! transaction, plus the synchronous queries shared with [`crate::SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};

use phonebook_core::{
  department::{Department, DepartmentId, NewDepartment},
  employee::{Employee, EmployeeId, EmployeeRecord},
  import::{ImportRun, ImportRunId, ImportTarget, NewImportRun, Upsert},
  tree::DepartmentSink,
};

use crate::{
  Error, Result,
  encode::{
    DEPARTMENT_COLUMNS, EMPLOYEE_COLUMNS, RawDepartment, RawEmployee,
    encode_count, encode_dt, encode_errors,
  },
};

// ─── Shared queries ──────────────────────────────────────────────────────────

pub fn select_departments(conn: &Connection) -> rusqlite::Result<Vec<RawDepartment>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY level, name, department_id"
  ))?;
  stmt
    .query_map([], RawDepartment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

/// All employees in display order: department level, department name, rank,
/// full name. Employees without a department sort first.
pub fn select_employees(conn: &Connection) -> rusqlite::Result<Vec<RawEmployee>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {EMPLOYEE_COLUMNS}
     FROM employees e
     LEFT JOIN departments d ON d.department_id = e.department_id
     ORDER BY d.level, d.name, e.hierarchy, e.full_name, e.employee_id"
  ))?;
  stmt
    .query_map([], RawEmployee::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

pub fn select_employee(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<Option<RawEmployee>> {
  conn
    .query_row(
      &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.employee_id = ?1"),
      rusqlite::params![id],
      RawEmployee::from_row,
    )
    .optional()
}

pub fn find_by_natural_key(
  conn: &Connection,
  full_name: &str,
  internal_phone: &str,
) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT employee_id FROM employees WHERE full_name = ?1 AND internal_phone = ?2",
      rusqlite::params![full_name, internal_phone],
      |r| r.get(0),
    )
    .optional()
}

pub fn department_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM departments WHERE department_id = ?1",
        rusqlite::params![id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

pub fn insert_employee(
  conn: &Connection,
  record: &EmployeeRecord,
  at: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO employees (
       initials, full_name, position, department_id, phone, internal_phone,
       email, room, hierarchy, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    rusqlite::params![
      record.initials,
      record.full_name,
      record.position,
      record.department_id.map(|d| d.0),
      record.phone,
      record.internal_phone,
      record.email,
      record.room,
      record.hierarchy,
      at,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Overwrite every editable column. `created_at` is left alone.
pub fn update_employee(
  conn: &Connection,
  id: i64,
  record: &EmployeeRecord,
  at: &str,
) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE employees SET
       initials = ?2, full_name = ?3, position = ?4, department_id = ?5,
       phone = ?6, internal_phone = ?7, email = ?8, room = ?9,
       hierarchy = ?10, updated_at = ?11
     WHERE employee_id = ?1",
    rusqlite::params![
      id,
      record.initials,
      record.full_name,
      record.position,
      record.department_id.map(|d| d.0),
      record.phone,
      record.internal_phone,
      record.email,
      record.room,
      record.hierarchy,
      at,
    ],
  )
}

pub fn load_employee(conn: &Connection, id: i64) -> Result<Employee> {
  select_employee(conn, id)?
    .ok_or(Error::EmployeeNotFound(EmployeeId(id)))?
    .into_employee()
}

// ─── Transaction target ──────────────────────────────────────────────────────

/// Runs the reconciler's writes against an open transaction. Committing or
/// rolling back is up to the caller.
pub struct TxTarget<'a> {
  conn: &'a Connection,
}

impl<'a> TxTarget<'a> {
  pub fn new(tx: &'a rusqlite::Transaction<'_>) -> Self { Self { conn: tx } }
}

impl DepartmentSink for TxTarget<'_> {
  type Error = Error;

  fn create_department(&mut self, input: NewDepartment) -> Result<Department> {
    let now = Utc::now();
    let at = encode_dt(now);
    self.conn.execute(
      "INSERT INTO departments (name, short_name, parent_id, level, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      rusqlite::params![
        input.name,
        input.short_name,
        input.parent_id.map(|p| p.0),
        input.level,
        at,
      ],
    )?;

    Ok(Department {
      id:         DepartmentId(self.conn.last_insert_rowid()),
      name:       input.name,
      short_name: input.short_name,
      parent_id:  input.parent_id,
      level:      input.level,
      created_at: now,
      updated_at: now,
    })
  }

  fn set_short_name(&mut self, id: DepartmentId, short_name: &str) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE departments SET short_name = ?2, updated_at = ?3 WHERE department_id = ?1",
      rusqlite::params![id.0, short_name, encode_dt(Utc::now())],
    )?;
    if changed == 0 {
      return Err(Error::DepartmentNotFound(id));
    }
    Ok(())
  }
}

impl ImportTarget for TxTarget<'_> {
  fn load_departments(&mut self) -> Result<Vec<Department>> {
    select_departments(self.conn)?
      .into_iter()
      .map(RawDepartment::into_department)
      .collect()
  }

  fn upsert_employee(&mut self, record: &EmployeeRecord) -> Result<Upsert> {
    let at = encode_dt(Utc::now());
    match find_by_natural_key(self.conn, &record.full_name, &record.internal_phone)? {
      Some(id) => {
        update_employee(self.conn, id, record, &at)?;
        Ok(Upsert::Updated(EmployeeId(id)))
      }
      None => {
        let id = insert_employee(self.conn, record, &at)?;
        Ok(Upsert::Added(EmployeeId(id)))
      }
    }
  }

  fn record_run(&mut self, run: NewImportRun) -> Result<ImportRun> {
    let uploaded_at = Utc::now();
    self.conn.execute(
      "INSERT INTO import_logs (
         file_name, uploaded_at, status, total_records, added, updated,
         errors, username
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        run.file_name,
        encode_dt(uploaded_at),
        run.status.as_str(),
        encode_count(run.total),
        encode_count(run.added),
        encode_count(run.updated),
        encode_errors(&run.errors)?,
        run.user,
      ],
    )?;

    Ok(ImportRun {
      id: ImportRunId(self.conn.last_insert_rowid()),
      file_name: run.file_name,
      uploaded_at,
      status: run.status,
      total: run.total,
      added: run.added,
      updated: run.updated,
      errors: run.errors,
      user: run.user,
    })
  }
}
