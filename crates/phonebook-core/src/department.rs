//! One node of the organisational tree.
//!
//! Departments are addressed by a stable integer identifier assigned by the
//! store. The parent link is the only stored relationship; children are a
//! derived index (see [`crate::tree::DepartmentTree`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a [`Department`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DepartmentId(pub i64);

impl fmt::Display for DepartmentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A persisted organisational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub id:         DepartmentId,
  /// Display name with any parenthesised abbreviation removed.
  pub name:       String,
  /// Abbreviation, e.g. `"ОИТ"`; empty when unknown.
  pub short_name: String,
  pub parent_id:  Option<DepartmentId>,
  /// Depth in the tree; roots are level 1.
  pub level:      u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Department {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }
}

/// Input to [`crate::tree::DepartmentSink::create_department`].
/// The identifier and timestamps are set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
  pub name:       String,
  pub short_name: String,
  pub parent_id:  Option<DepartmentId>,
  pub level:      u32,
}

/// One department-name cell split into its display name and abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
  pub name:       String,
  pub short_name: String,
}

impl PathSegment {
  pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
    Self { name: name.into(), short_name: short_name.into() }
  }
}
