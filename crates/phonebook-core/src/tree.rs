//! The department tree.
//!
//! Departments are held in an arena keyed by [`DepartmentId`]. The only
//! stored relationship is each node's parent link; the parent → children
//! index is derived and rebuilt whenever nodes are added, so there is no
//! shared or cyclic ownership between nodes.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::{
  department::{Department, DepartmentId, NewDepartment, PathSegment},
  employee::Employee,
};

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Persistence hooks used while resolving department paths.
///
/// Implemented by storage backends; every mutation of the in-memory tree made
/// by [`DepartmentTree::resolve_path`] is mirrored through this trait first.
pub trait DepartmentSink {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new department and return it with its assigned identifier.
  fn create_department(
    &mut self,
    input: NewDepartment,
  ) -> Result<Department, Self::Error>;

  /// Overwrite the stored short name of an existing department.
  fn set_short_name(
    &mut self,
    id: DepartmentId,
    short_name: &str,
  ) -> Result<(), Self::Error>;
}

// ─── Arena ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DepartmentTree {
  nodes:    BTreeMap<DepartmentId, Department>,
  /// Children per parent (`None` = roots), each list ordered by identifier.
  children: HashMap<Option<DepartmentId>, Vec<DepartmentId>>,
}

impl DepartmentTree {
  pub fn new() -> Self { Self::default() }

  pub fn from_departments(
    departments: impl IntoIterator<Item = Department>,
  ) -> Self {
    let mut tree = Self::new();
    for department in departments {
      tree.insert(department);
    }
    tree
  }

  /// Add (or replace) a node and index it under its parent.
  pub fn insert(&mut self, department: Department) {
    let id = department.id;
    let parent = department.parent_id;
    if let Some(previous) = self.nodes.insert(id, department)
      && let Some(siblings) = self.children.get_mut(&previous.parent_id)
    {
      siblings.retain(|c| *c != id);
    }
    let siblings = self.children.entry(parent).or_default();
    if let Err(pos) = siblings.binary_search(&id) {
      siblings.insert(pos, id);
    }
  }

  pub fn get(&self, id: DepartmentId) -> Option<&Department> {
    self.nodes.get(&id)
  }

  pub fn len(&self) -> usize { self.nodes.len() }

  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

  /// All departments ordered by identifier.
  pub fn departments(&self) -> impl Iterator<Item = &Department> {
    self.nodes.values()
  }

  /// Direct children of `parent` (`None` for roots), ordered by identifier.
  pub fn children(&self, parent: Option<DepartmentId>) -> &[DepartmentId] {
    self.children.get(&parent).map_or(&[], Vec::as_slice)
  }

  pub fn roots(&self) -> impl Iterator<Item = &Department> {
    self.children(None).iter().filter_map(|id| self.nodes.get(id))
  }

  /// The child of `parent` named `name`. With duplicate siblings the lowest
  /// identifier wins.
  pub fn find_child(
    &self,
    parent: Option<DepartmentId>,
    name: &str,
  ) -> Option<&Department> {
    self
      .children(parent)
      .iter()
      .filter_map(|id| self.nodes.get(id))
      .find(|d| d.name == name)
  }

  // ── Path resolution ──────────────────────────────────────────────────────

  /// Walk `segments` from the forest root, reusing existing children by
  /// display name and creating missing ones through `sink`.
  ///
  /// An existing node with an empty short name picks up the segment's short
  /// name; a non-empty short name is left untouched. Returns the deepest
  /// node reached, or `None` when `segments` is empty.
  pub fn resolve_path<S: DepartmentSink>(
    &mut self,
    sink: &mut S,
    segments: &[PathSegment],
  ) -> Result<Option<DepartmentId>, S::Error> {
    let mut parent: Option<DepartmentId> = None;

    for segment in segments {
      let existing = self
        .find_child(parent, &segment.name)
        .map(|d| (d.id, d.short_name.is_empty()));

      let id = match existing {
        Some((id, short_missing)) => {
          if short_missing && !segment.short_name.is_empty() {
            sink.set_short_name(id, &segment.short_name)?;
            if let Some(node) = self.nodes.get_mut(&id) {
              node.short_name = segment.short_name.clone();
            }
            debug!(department = %id, short_name = %segment.short_name, "filled short name");
          }
          id
        }
        None => {
          let level = parent
            .and_then(|p| self.nodes.get(&p))
            .map_or(1, |p| p.level + 1);
          let created = sink.create_department(NewDepartment {
            name: segment.name.clone(),
            short_name: segment.short_name.clone(),
            parent_id: parent,
            level,
          })?;
          debug!(department = %created.id, name = %created.name, level, "created department");
          let id = created.id;
          self.insert(created);
          id
        }
      };

      parent = Some(id);
    }

    Ok(parent)
  }

  // ── Traversal ────────────────────────────────────────────────────────────

  /// Every node reachable from `id` through child links, depth-first
  /// pre-order. Does not include `id` itself.
  pub fn all_descendants(&self, id: DepartmentId) -> Vec<DepartmentId> {
    let mut out = Vec::new();
    let mut stack: Vec<DepartmentId> =
      self.children(Some(id)).iter().rev().copied().collect();
    while let Some(next) = stack.pop() {
      out.push(next);
      stack.extend(self.children(Some(next)).iter().rev().copied());
    }
    out
  }

  /// `id` followed by all of its descendants; empty for an unknown `id`.
  pub fn scope(&self, id: DepartmentId) -> Vec<DepartmentId> {
    if !self.nodes.contains_key(&id) {
      return Vec::new();
    }
    let mut out = vec![id];
    out.extend(self.all_descendants(id));
    out
  }

  /// `id` and its ancestors, nearest first.
  fn ancestors(&self, id: DepartmentId) -> impl Iterator<Item = &Department> {
    std::iter::successors(self.nodes.get(&id), |d| {
      d.parent_id.and_then(|p| self.nodes.get(&p))
    })
    .take(self.nodes.len())
  }

  /// Names from the root down to `id`, root first.
  pub fn full_path(&self, id: DepartmentId) -> Vec<&str> {
    let mut names: Vec<&str> =
      self.ancestors(id).map(|d| d.name.as_str()).collect();
    names.reverse();
    names
  }

  /// [`Self::full_path`] joined for display.
  pub fn display_path(&self, id: DepartmentId) -> String {
    self.full_path(id).join(" → ")
  }

  // ── Aggregation ──────────────────────────────────────────────────────────

  /// Arrange `employees` under their departments for display.
  ///
  /// Roots are ordered by identifier, children by name, and employees within
  /// a department by rank then full name.
  pub fn aggregate(
    &self,
    employees: impl IntoIterator<Item = Employee>,
  ) -> Directory {
    let mut buckets: HashMap<DepartmentId, Vec<Employee>> = HashMap::new();
    let mut unassigned = Vec::new();

    for employee in employees {
      match employee.record.department_id {
        Some(id) if self.nodes.contains_key(&id) => {
          buckets.entry(id).or_default().push(employee)
        }
        _ => unassigned.push(employee),
      }
    }

    for bucket in buckets.values_mut() {
      sort_for_display(bucket);
    }
    sort_for_display(&mut unassigned);

    let roots = self
      .children(None)
      .iter()
      .filter_map(|id| self.build_node(*id, &mut buckets))
      .collect();

    Directory { roots, unassigned }
  }

  fn build_node(
    &self,
    id: DepartmentId,
    buckets: &mut HashMap<DepartmentId, Vec<Employee>>,
  ) -> Option<DirectoryNode> {
    let department = self.nodes.get(&id)?.clone();

    let mut by_name: Vec<&Department> = self
      .children(Some(id))
      .iter()
      .filter_map(|c| self.nodes.get(c))
      .collect();
    by_name.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let children = by_name
      .into_iter()
      .filter_map(|c| self.build_node(c.id, buckets))
      .collect();

    Some(DirectoryNode {
      employees: buckets.remove(&id).unwrap_or_default(),
      department,
      children,
    })
  }
}

fn sort_for_display(employees: &mut [Employee]) {
  employees.sort_by(|a, b| {
    a.record
      .hierarchy
      .cmp(&b.record.hierarchy)
      .then_with(|| a.record.full_name.cmp(&b.record.full_name))
  });
}

// ─── Display model ───────────────────────────────────────────────────────────

/// One department with its employees and sub-departments.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryNode {
  pub department: Department,
  pub employees:  Vec<Employee>,
  pub children:   Vec<DirectoryNode>,
}

/// The whole directory as a forest, plus employees without a department.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Directory {
  pub roots:      Vec<DirectoryNode>,
  pub unassigned: Vec<Employee>,
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{employee::EmployeeRecord, testing::MemoryTarget};

  fn dept(id: i64, name: &str, parent: Option<i64>, level: u32) -> Department {
    Department {
      id:         DepartmentId(id),
      name:       name.into(),
      short_name: String::new(),
      parent_id:  parent.map(DepartmentId),
      level,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  fn path(names: &[(&str, &str)]) -> Vec<PathSegment> {
    names.iter().map(|(n, s)| PathSegment::new(*n, *s)).collect()
  }

  #[test]
  fn resolve_creates_nested_levels() {
    let mut sink = MemoryTarget::default();
    let mut tree = DepartmentTree::new();

    let leaf = tree
      .resolve_path(&mut sink, &path(&[("Дирекция", ""), ("Отдел", "ОТ")]))
      .unwrap()
      .unwrap();

    let leaf = tree.get(leaf).unwrap();
    assert_eq!(leaf.level, 2);
    assert_eq!(leaf.short_name, "ОТ");
    assert!(!leaf.is_root());
    let parent = tree.get(leaf.parent_id.unwrap()).unwrap();
    assert_eq!(parent.name, "Дирекция");
    assert_eq!(parent.level, 1);
    assert!(parent.is_root());
    assert_eq!(sink.departments.len(), 2);
  }

  #[test]
  fn resolve_is_referentially_stable() {
    let mut sink = MemoryTarget::default();
    let mut tree = DepartmentTree::new();
    let segments = path(&[("A", ""), ("B", ""), ("C", "")]);

    let first = tree.resolve_path(&mut sink, &segments).unwrap();
    let second = tree.resolve_path(&mut sink, &segments).unwrap();

    assert_eq!(first, second);
    assert_eq!(tree.len(), 3);
    assert_eq!(sink.departments.len(), 3);
  }

  #[test]
  fn same_name_under_different_parents_is_distinct() {
    let mut sink = MemoryTarget::default();
    let mut tree = DepartmentTree::new();

    let a = tree
      .resolve_path(&mut sink, &path(&[("A", ""), ("Бухгалтерия", "")]))
      .unwrap();
    let b = tree
      .resolve_path(&mut sink, &path(&[("B", ""), ("Бухгалтерия", "")]))
      .unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn empty_path_resolves_to_none() {
    let mut sink = MemoryTarget::default();
    let mut tree = DepartmentTree::new();
    assert_eq!(tree.resolve_path(&mut sink, &[]).unwrap(), None);
    assert!(sink.departments.is_empty());
  }

  #[test]
  fn short_name_is_filled_but_never_overwritten() {
    let mut sink = MemoryTarget::default();
    let mut tree = DepartmentTree::new();

    let id = tree
      .resolve_path(&mut sink, &path(&[("Отдел кадров", "")]))
      .unwrap()
      .unwrap();
    assert_eq!(tree.get(id).unwrap().short_name, "");

    tree
      .resolve_path(&mut sink, &path(&[("Отдел кадров", "ОК")]))
      .unwrap();
    assert_eq!(tree.get(id).unwrap().short_name, "ОК");
    assert_eq!(sink.departments[&id].short_name, "ОК");

    tree
      .resolve_path(&mut sink, &path(&[("Отдел кадров", "HR")]))
      .unwrap();
    assert_eq!(tree.get(id).unwrap().short_name, "ОК");
    assert_eq!(sink.departments[&id].short_name, "ОК");
  }

  #[test]
  fn duplicate_siblings_pick_lowest_id() {
    let mut tree = DepartmentTree::from_departments([
      dept(9, "Дубль", None, 1),
      dept(4, "Дубль", None, 1),
    ]);
    let mut sink = MemoryTarget::default();
    let id = tree
      .resolve_path(&mut sink, &path(&[("Дубль", "")]))
      .unwrap();
    assert_eq!(id, Some(DepartmentId(4)));
  }

  #[test]
  fn descendants_and_paths() {
    let tree = DepartmentTree::from_departments([
      dept(1, "Root", None, 1),
      dept(2, "Left", Some(1), 2),
      dept(3, "Right", Some(1), 2),
      dept(4, "Leaf", Some(2), 3),
      dept(5, "Other", None, 1),
    ]);

    let mut desc = tree.all_descendants(DepartmentId(1));
    desc.sort();
    assert_eq!(desc, vec![DepartmentId(2), DepartmentId(3), DepartmentId(4)]);
    assert!(tree.all_descendants(DepartmentId(4)).is_empty());
    assert_eq!(tree.scope(DepartmentId(2)), vec![DepartmentId(2), DepartmentId(4)]);
    assert!(tree.scope(DepartmentId(99)).is_empty());

    assert_eq!(tree.full_path(DepartmentId(4)), vec!["Root", "Left", "Leaf"]);
    assert_eq!(tree.display_path(DepartmentId(3)), "Root → Right");
    assert_eq!(
      tree.roots().map(|d| d.id).collect::<Vec<_>>(),
      vec![DepartmentId(1), DepartmentId(5)]
    );
  }

  #[test]
  fn aggregate_sorts_for_display() {
    let tree = DepartmentTree::from_departments([
      dept(1, "Root", None, 1),
      dept(2, "Zeta", Some(1), 2),
      dept(3, "Alpha", Some(1), 2),
    ]);

    let employee = |id: i64, name: &str, rank: u8, dept: Option<i64>| Employee {
      id:         crate::employee::EmployeeId(id),
      record:     EmployeeRecord {
        full_name: name.into(),
        hierarchy: rank,
        department_id: dept.map(DepartmentId),
        ..Default::default()
      },
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };

    let directory = tree.aggregate([
      employee(1, "Яковлев", 7, Some(1)),
      employee(2, "Андреев", 7, Some(1)),
      employee(3, "Борисов", 1, Some(1)),
      employee(4, "Без отдела", 8, None),
      employee(5, "Потерянный", 8, Some(42)),
    ]);

    assert_eq!(directory.roots.len(), 1);
    let root = &directory.roots[0];
    let names: Vec<_> =
      root.employees.iter().map(|e| e.record.full_name.as_str()).collect();
    assert_eq!(names, vec!["Борисов", "Андреев", "Яковлев"]);

    let children: Vec<_> =
      root.children.iter().map(|c| c.department.name.as_str()).collect();
    assert_eq!(children, vec!["Alpha", "Zeta"]);
    assert_eq!(directory.unassigned.len(), 2);
  }
}
