//! The `DirectoryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `phonebook-store-sqlite`). Front ends depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  department::{Department, DepartmentId},
  employee::{Employee, EmployeeId, EmployeeRecord},
  import::{ImportRun, ImportSource, Reconciler, Table},
  tree::{DepartmentTree, Directory},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DirectoryStore::list_employees`].
#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
  /// Restrict to this department and everything below it.
  pub department: Option<DepartmentId>,
  /// Restrict to employees without a department.
  pub unassigned: bool,
}

impl EmployeeQuery {
  pub fn in_department(id: DepartmentId) -> Self {
    Self { department: Some(id), ..Self::default() }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a phone-directory backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Departments ───────────────────────────────────────────────────────

  /// All departments ordered by level, then name.
  fn list_departments(
    &self,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_;

  /// The full department tree.
  fn department_tree(
    &self,
  ) -> impl Future<Output = Result<DepartmentTree, Self::Error>> + Send + '_;

  /// Delete a department and its whole subtree. Employees of removed
  /// departments are kept with no department. Returns `false` if `id` does
  /// not exist.
  fn delete_department(
    &self,
    id: DepartmentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Employees ─────────────────────────────────────────────────────────

  fn get_employee(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  /// Employees matching `query`, ordered by department level, department
  /// name, rank and full name.
  fn list_employees<'a>(
    &'a self,
    query: &'a EmployeeQuery,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + 'a;

  /// Insert an employee. Fails if the natural key is already taken.
  fn create_employee(
    &self,
    record: EmployeeRecord,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  /// Replace every editable field of an existing employee.
  fn update_employee(
    &self,
    id: EmployeeId,
    record: EmployeeRecord,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  /// Returns `false` if `id` does not exist.
  fn delete_employee(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The display directory: the tree with every employee placed under its
  /// department.
  fn directory(
    &self,
  ) -> impl Future<Output = Result<Directory, Self::Error>> + Send + '_;

  // ── Import ────────────────────────────────────────────────────────────

  /// Run `reconciler` over `table` in a single transaction. A fatal error
  /// leaves the store untouched and writes no log.
  fn import(
    &self,
    reconciler: Reconciler,
    table: Table,
    source: ImportSource,
  ) -> impl Future<Output = Result<ImportRun, Self::Error>> + Send + '_;

  /// Past runs, newest first.
  fn list_import_runs(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<ImportRun>, Self::Error>> + Send + '_;
}
