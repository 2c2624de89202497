//! An in-memory [`ImportTarget`] for unit tests.

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;

use crate::{
  department::{Department, DepartmentId, NewDepartment},
  employee::{Employee, EmployeeId, EmployeeRecord},
  import::{ImportRun, ImportRunId, ImportTarget, NewImportRun, Upsert},
  tree::DepartmentSink,
};

#[derive(Debug, Error)]
#[error("memory target refused {0:?}")]
pub struct Refused(pub String);

#[derive(Debug, Default)]
pub struct MemoryTarget {
  pub departments: BTreeMap<DepartmentId, Department>,
  pub employees:   BTreeMap<EmployeeId, Employee>,
  pub runs:        Vec<ImportRun>,
  /// Upserts of this full name fail.
  pub reject_name: Option<String>,
  next_id:         i64,
}

impl MemoryTarget {
  /// A target whose upserts of `full_name` fail.
  pub fn rejecting(full_name: impl Into<String>) -> Self {
    Self { reject_name: Some(full_name.into()), ..Self::default() }
  }

  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

impl DepartmentSink for MemoryTarget {
  type Error = Refused;

  fn create_department(
    &mut self,
    input: NewDepartment,
  ) -> Result<Department, Refused> {
    let now = Utc::now();
    let department = Department {
      id:         DepartmentId(self.next_id()),
      name:       input.name,
      short_name: input.short_name,
      parent_id:  input.parent_id,
      level:      input.level,
      created_at: now,
      updated_at: now,
    };
    self.departments.insert(department.id, department.clone());
    Ok(department)
  }

  fn set_short_name(
    &mut self,
    id: DepartmentId,
    short_name: &str,
  ) -> Result<(), Refused> {
    let department = self
      .departments
      .get_mut(&id)
      .ok_or_else(|| Refused(format!("department {id}")))?;
    department.short_name = short_name.to_owned();
    Ok(())
  }
}

impl ImportTarget for MemoryTarget {
  fn load_departments(&mut self) -> Result<Vec<Department>, Refused> {
    Ok(self.departments.values().cloned().collect())
  }

  fn upsert_employee(
    &mut self,
    record: &EmployeeRecord,
  ) -> Result<Upsert, Refused> {
    if self.reject_name.as_deref() == Some(record.full_name.as_str()) {
      return Err(Refused(record.full_name.clone()));
    }

    let key = record.natural_key();
    let now = Utc::now();
    if let Some(existing) =
      self.employees.values_mut().find(|e| e.natural_key() == key)
    {
      existing.record = record.clone();
      existing.updated_at = now;
      return Ok(Upsert::Updated(existing.id));
    }

    let id = EmployeeId(self.next_id());
    self.employees.insert(id, Employee {
      id,
      record: record.clone(),
      created_at: now,
      updated_at: now,
    });
    Ok(Upsert::Added(id))
  }

  fn record_run(&mut self, run: NewImportRun) -> Result<ImportRun, Refused> {
    let run = ImportRun {
      id:          ImportRunId(self.next_id()),
      file_name:   run.file_name,
      uploaded_at: Utc::now(),
      status:      run.status,
      total:       run.total,
      added:       run.added,
      updated:     run.updated,
      errors:      run.errors,
      user:        run.user,
    };
    self.runs.push(run.clone());
    Ok(run)
  }
}
