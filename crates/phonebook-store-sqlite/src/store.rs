//! The SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::Utc;
use tracing::info;

use phonebook_core::{
  department::{Department, DepartmentId},
  employee::{Employee, EmployeeId, EmployeeRecord},
  import::{ImportRun, ImportSource, Reconciler, Table},
  store::{DirectoryStore, EmployeeQuery},
  tree::{DepartmentTree, Directory},
};

use crate::{
  Error, Result,
  encode::{IMPORT_RUN_COLUMNS, RawDepartment, RawEmployee, RawImportRun, encode_dt},
  import::{
    TxTarget, department_exists, find_by_natural_key, insert_employee,
    load_employee, select_departments, select_employee, select_employees,
    update_employee,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A phone directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Departments and employees read in one round trip.
  async fn snapshot(&self) -> Result<(DepartmentTree, Vec<Employee>)> {
    let (raw_departments, raw_employees) = self
      .conn
      .call(|conn| Ok((select_departments(conn)?, select_employees(conn)?)))
      .await?;

    let tree = DepartmentTree::from_departments(
      raw_departments
        .into_iter()
        .map(RawDepartment::into_department)
        .collect::<Result<Vec<_>>>()?,
    );
    let employees = raw_employees
      .into_iter()
      .map(RawEmployee::into_employee)
      .collect::<Result<Vec<_>>>()?;

    Ok((tree, employees))
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run raw SQL against the connection, to break the schema in tests.
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Departments ───────────────────────────────────────────────────────────

  async fn list_departments(&self) -> Result<Vec<Department>> {
    let raws = self
      .conn
      .call(|conn| Ok(select_departments(conn)?))
      .await?;

    raws.into_iter().map(RawDepartment::into_department).collect()
  }

  async fn department_tree(&self) -> Result<DepartmentTree> {
    Ok(DepartmentTree::from_departments(self.list_departments().await?))
  }

  async fn delete_department(&self, id: DepartmentId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM departments WHERE department_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;

    if removed > 0 {
      info!(department = %id, "deleted department");
    }
    Ok(removed > 0)
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_employee(conn, id.0)?))
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>> {
    let (tree, mut employees) = self.snapshot().await?;

    if let Some(department) = query.department {
      let scope = tree.scope(department);
      employees.retain(|e| {
        e.record.department_id.is_some_and(|d| scope.contains(&d))
      });
    }
    if query.unassigned {
      employees.retain(|e| e.record.department_id.is_none());
    }

    Ok(employees)
  }

  async fn create_employee(&self, record: EmployeeRecord) -> Result<Employee> {
    let at = encode_dt(Utc::now());

    let outcome: Result<Employee> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = (|| {
          check_department(&tx, &record)?;
          if find_by_natural_key(&tx, &record.full_name, &record.internal_phone)?
            .is_some()
          {
            return Err(duplicate(&record));
          }
          let id = insert_employee(&tx, &record, &at)?;
          load_employee(&tx, id)
        })();
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    outcome
  }

  async fn update_employee(
    &self,
    id: EmployeeId,
    record: EmployeeRecord,
  ) -> Result<Employee> {
    let at = encode_dt(Utc::now());

    let outcome: Result<Employee> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = (|| {
          check_department(&tx, &record)?;
          match find_by_natural_key(&tx, &record.full_name, &record.internal_phone)? {
            Some(other) if other != id.0 => return Err(duplicate(&record)),
            _ => {}
          }
          if update_employee(&tx, id.0, &record, &at)? == 0 {
            return Err(Error::EmployeeNotFound(id));
          }
          load_employee(&tx, id.0)
        })();
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    outcome
  }

  async fn delete_employee(&self, id: EmployeeId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM employees WHERE employee_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn directory(&self) -> Result<Directory> {
    let (tree, employees) = self.snapshot().await?;
    Ok(tree.aggregate(employees))
  }

  // ── Import ────────────────────────────────────────────────────────────────

  async fn import(
    &self,
    reconciler: Reconciler,
    table: Table,
    source: ImportSource,
  ) -> Result<ImportRun> {
    // The whole run shares one transaction; dropping it uncommitted on a
    // fatal error rolls back every row.
    let outcome: phonebook_core::Result<ImportRun> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = reconciler.run(&mut TxTarget::new(&tx), &table, source);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    Ok(outcome?)
  }

  async fn list_import_runs(&self, limit: Option<usize>) -> Result<Vec<ImportRun>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {IMPORT_RUN_COLUMNS} FROM import_logs
           ORDER BY uploaded_at DESC, run_id DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawImportRun::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawImportRun::into_run).collect()
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn check_department(conn: &rusqlite::Connection, record: &EmployeeRecord) -> Result<()> {
  match record.department_id {
    Some(d) if !department_exists(conn, d.0)? => Err(Error::DepartmentNotFound(d)),
    _ => Ok(()),
  }
}

fn duplicate(record: &EmployeeRecord) -> Error {
  Error::DuplicateEmployee {
    full_name:      record.full_name.clone(),
    internal_phone: record.internal_phone.clone(),
  }
}
