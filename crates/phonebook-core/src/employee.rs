//! One entry of the phone directory.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::department::DepartmentId;

/// Store-assigned identifier of an [`Employee`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A persisted directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id:         EmployeeId,
  #[serde(flatten)]
  pub record:     EmployeeRecord,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Employee {
  pub fn natural_key(&self) -> NaturalKey { self.record.natural_key() }
}

/// Every user-editable field of an employee. Used both as the cleaned form of
/// an imported row and as the input for direct edits; an upsert replaces all
/// of these fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
  pub initials:       String,
  pub full_name:      String,
  pub position:       String,
  pub department_id:  Option<DepartmentId>,
  pub phone:          String,
  pub internal_phone: String,
  pub email:          Option<String>,
  pub room:           Option<String>,
  /// Rank on the active [`crate::rank::RankScale`]; 1 is most senior.
  pub hierarchy:      u8,
}

impl EmployeeRecord {
  pub fn natural_key(&self) -> NaturalKey {
    NaturalKey {
      full_name:      self.full_name.clone(),
      internal_phone: self.internal_phone.clone(),
    }
  }
}

/// The identity used to match imported rows against stored employees,
/// independent of the generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
  pub full_name:      String,
  pub internal_phone: String,
}
