//! Bulk import reconciliation.
//!
//! A run validates the table's columns, then for each row: cleans the cells,
//! resolves (or creates) the department path, settles the hierarchy rank and
//! upserts the employee by natural key. Row failures are collected, never
//! fatal. The run ends by writing exactly one [`ImportRun`] log.
//!
//! Transaction scoping is the target's concern: backends run the whole of
//! [`Reconciler::run`] inside one transaction and discard it on `Err`.

pub mod columns;
pub mod run;
pub mod table;

use thiserror::Error;
use tracing::{info, warn};

pub use run::{ImportRun, ImportRunId, ImportStatus, ImportSummary, NewImportRun};
pub use table::{Row, Table};

use crate::{
  Error, Result,
  clean::{clean_optional, clean_rank, clean_value, split_short_name},
  department::{Department, PathSegment},
  employee::{EmployeeId, EmployeeRecord},
  rank::{RANK_RULES, RankRule, RankScale, infer_with},
  tree::{DepartmentSink, DepartmentTree},
};

// ─── Target ──────────────────────────────────────────────────────────────────

/// Whether an upsert created a new employee or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
  Added(EmployeeId),
  Updated(EmployeeId),
}

/// Synchronous storage operations a run needs, all within one transaction.
pub trait ImportTarget: DepartmentSink {
  /// Every stored department, used to seed the in-memory tree.
  fn load_departments(&mut self) -> Result<Vec<Department>, Self::Error>;

  /// Find the employee with `record`'s natural key and overwrite all of its
  /// fields, or insert a new one.
  fn upsert_employee(
    &mut self,
    record: &EmployeeRecord,
  ) -> Result<Upsert, Self::Error>;

  /// Persist the run log.
  fn record_run(&mut self, run: NewImportRun) -> Result<ImportRun, Self::Error>;
}

/// Where a run's input came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
  pub file_name: String,
  /// The user who started the run, if known.
  pub user:      Option<String>,
}

impl ImportSource {
  pub fn new(file_name: impl Into<String>) -> Self {
    Self { file_name: file_name.into(), user: None }
  }

  pub fn with_user(mut self, user: impl Into<String>) -> Self {
    self.user = Some(user.into());
    self
  }
}

// ─── Row errors ──────────────────────────────────────────────────────────────

/// Why a single row was skipped. Rendered into the run's error list.
#[derive(Debug, Error)]
pub enum RowError {
  #[error("missing full name")]
  MissingFullName,

  #[error("{0}")]
  Target(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RowError {
  fn target(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Target(Box::new(e))
  }
}

fn fatal(e: impl std::error::Error + Send + Sync + 'static) -> Error {
  Error::Target(Box::new(e))
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
  scale: RankScale,
  rules: &'static [RankRule],
}

impl Default for Reconciler {
  fn default() -> Self { Self::new(RankScale::default()) }
}

impl Reconciler {
  pub fn new(scale: RankScale) -> Self { Self { scale, rules: RANK_RULES } }

  /// Replace the title-inference table.
  pub fn with_rules(mut self, rules: &'static [RankRule]) -> Self {
    self.rules = rules;
    self
  }

  pub fn scale(&self) -> RankScale { self.scale }

  /// Reconcile `table` into `target` and log the run.
  ///
  /// Returns `Err` without touching `target` when required columns are
  /// missing, and `Err` when the target fails outside a row (loading the
  /// tree, writing the log). Per-row failures end up in
  /// [`ImportRun::errors`].
  pub fn run<T: ImportTarget>(
    &self,
    target: &mut T,
    table: &Table,
    source: ImportSource,
  ) -> Result<ImportRun> {
    let missing = columns::missing_columns(table);
    if !missing.is_empty() {
      return Err(Error::MissingColumns(missing));
    }

    info!(file = %source.file_name, rows = table.len(), scale = %self.scale, "import started");

    let mut tree =
      DepartmentTree::from_departments(target.load_departments().map_err(fatal)?);

    let (mut added, mut updated) = (0_usize, 0_usize);
    let mut errors = Vec::new();

    for row in table.rows() {
      match self.process_row(target, &mut tree, &row) {
        Ok(Upsert::Added(_)) => added += 1,
        Ok(Upsert::Updated(_)) => updated += 1,
        Err(e) => {
          warn!(row = row.number(), error = %e, "row skipped");
          errors.push(format!("row {}: {e}", row.number()));
        }
      }
    }

    let status = ImportStatus::from_counts(added, updated, errors.len());
    let run = target
      .record_run(NewImportRun {
        file_name: source.file_name,
        status,
        total: table.len(),
        added,
        updated,
        errors,
        user: source.user,
      })
      .map_err(fatal)?;

    info!(
      run = %run.id,
      %status,
      total = run.total,
      added,
      updated,
      failed = run.errors.len(),
      "import finished"
    );
    Ok(run)
  }

  fn process_row<T: ImportTarget>(
    &self,
    target: &mut T,
    tree: &mut DepartmentTree,
    row: &Row<'_>,
  ) -> Result<Upsert, RowError> {
    let full_name = clean_value(row.get(columns::FULL_NAME));
    if full_name.is_empty() {
      return Err(RowError::MissingFullName);
    }

    let segments: Vec<PathSegment> = columns::DEPARTMENTS
      .iter()
      .map(|c| clean_value(row.get(c)))
      .filter(|v| !v.is_empty())
      .map(|v| split_short_name(&v))
      .collect();
    let department_id =
      tree.resolve_path(target, &segments).map_err(RowError::target)?;

    let position = clean_value(row.get(columns::POSITION));
    let hierarchy = self.settle_rank(row.get(columns::LEVEL), &position);

    let record = EmployeeRecord {
      initials: clean_value(row.get(columns::INITIALS)),
      full_name,
      position,
      department_id,
      phone: clean_value(row.get(columns::PHONE)),
      internal_phone: clean_value(row.get(columns::INTERNAL_PHONE)),
      email: clean_optional(row.get(columns::EMAIL)),
      room: clean_optional(row.get(columns::ROOM)),
      hierarchy,
    };

    target.upsert_employee(&record).map_err(RowError::target)
  }

  /// The rank for a row: the explicit level when it differs from the scale
  /// default, otherwise inferred from the position title.
  pub fn settle_rank(&self, raw_level: &str, position: &str) -> u8 {
    let explicit = clean_rank(raw_level, self.scale);
    if explicit != self.scale.default_rank() {
      return explicit;
    }
    self.scale.from_standard(infer_with(self.rules, position))
  }
}
