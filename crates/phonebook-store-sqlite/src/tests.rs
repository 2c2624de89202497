//! Integration tests for `SqliteStore` against an in-memory database.

use phonebook_core::{
  department::DepartmentId,
  employee::{EmployeeId, EmployeeRecord},
  import::{ImportSource, ImportStatus, Reconciler, Table},
  store::{DirectoryStore, EmployeeQuery},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const HEADER: [&str; 12] = [
  "Инициалы",
  "ФИО",
  "Должность",
  "Структурное подразделение 1",
  "Структурное подразделение 2",
  "Структурное подразделение 3",
  "Структурное подразделение 4",
  "Телефон",
  "Внутренний телефон",
  "Кабинет",
  "Уровень",
  "Email",
];

/// One sheet row: name, internal phone, position, level and up to two
/// department levels.
struct Line<'a> {
  name:     &'a str,
  internal: &'a str,
  position: &'a str,
  level:    &'a str,
  dept1:    &'a str,
  dept2:    &'a str,
}

fn line<'a>(name: &'a str, internal: &'a str) -> Line<'a> {
  Line {
    name,
    internal,
    position: "Ведущий специалист",
    level: "",
    dept1: "Дирекция по ИТ (ДИТ)",
    dept2: "Отдел разработки",
  }
}

fn sheet(lines: &[Line<'_>]) -> Table {
  Table::new(
    HEADER.iter().map(|h| (*h).to_owned()).collect(),
    lines
      .iter()
      .map(|l| {
        [
          "И.И.", l.name, l.position, l.dept1, l.dept2, "", "", "+7 495 123-45-67",
          l.internal, "404", l.level, "",
        ]
        .iter()
        .map(|c| (*c).to_owned())
        .collect()
      })
      .collect(),
  )
}

async fn import(s: &SqliteStore, table: Table) -> crate::Result<phonebook_core::import::ImportRun> {
  s.import(
    Reconciler::default(),
    table,
    ImportSource::new("staff.xlsx").with_user("admin"),
  )
  .await
}

// ─── Counting and idempotence ────────────────────────────────────────────────

#[tokio::test]
async fn first_import_adds_every_distinct_key() {
  let s = store().await;

  let run = import(&s, sheet(&[line("Иванов", "101"), line("Петров", "102")]))
    .await
    .unwrap();

  assert_eq!(run.status, ImportStatus::Success);
  assert_eq!((run.total, run.added, run.updated), (2, 2, 0));
  assert!(run.errors.is_empty());
  assert_eq!(run.user.as_deref(), Some("admin"));

  let all = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn same_name_with_other_internal_phone_is_a_new_employee() {
  let s = store().await;
  let run = import(&s, sheet(&[line("Иванов", "101"), line("Иванов", "202")]))
    .await
    .unwrap();
  assert_eq!((run.added, run.updated), (2, 0));
}

#[tokio::test]
async fn reimport_is_idempotent() {
  let s = store().await;
  let lines = [line("Иванов", "101"), line("Петров", "102")];

  import(&s, sheet(&lines)).await.unwrap();
  let before = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  let departments_before = s.list_departments().await.unwrap();

  let second = import(&s, sheet(&lines)).await.unwrap();
  assert_eq!((second.added, second.updated), (0, 2));

  let after = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  assert_eq!(before.len(), after.len());
  for (b, a) in before.iter().zip(&after) {
    assert_eq!(b.id, a.id);
    assert_eq!(b.record, a.record);
    assert_eq!(b.created_at, a.created_at);
  }
  assert_eq!(departments_before, s.list_departments().await.unwrap());
}

#[tokio::test]
async fn preexisting_keys_count_as_updated() {
  let s = store().await;
  s.create_employee(EmployeeRecord {
    full_name: "Иванов".into(),
    internal_phone: "101".into(),
    position: "Стажёр".into(),
    hierarchy: 8,
    ..Default::default()
  })
  .await
  .unwrap();

  let run = import(&s, sheet(&[line("Иванов", "101"), line("Новиков", "103")]))
    .await
    .unwrap();
  assert_eq!((run.added, run.updated), (1, 1));

  // Full replace: the imported position wins.
  let ivanov = s
    .list_employees(&EmployeeQuery::default())
    .await
    .unwrap()
    .into_iter()
    .find(|e| e.record.full_name == "Иванов")
    .unwrap();
  assert_eq!(ivanov.record.position, "Ведущий специалист");
  assert!(ivanov.record.department_id.is_some());
}

// ─── Status and row errors ───────────────────────────────────────────────────

#[tokio::test]
async fn missing_full_name_is_partial_with_row_number() {
  let s = store().await;
  let run = import(&s, sheet(&[line("Иванов", "101"), line("", "102")]))
    .await
    .unwrap();

  assert_eq!(run.status, ImportStatus::Partial);
  assert_eq!((run.added, run.updated), (1, 0));
  assert_eq!(run.errors, vec!["row 3: missing full name".to_owned()]);
}

#[tokio::test]
async fn all_rows_rejected_is_failed_and_logged() {
  let s = store().await;
  let run = import(&s, sheet(&[line("null", "1"), line(" ", "2")]))
    .await
    .unwrap();

  assert_eq!(run.status, ImportStatus::Failed);
  assert_eq!(run.errors.len(), 2);

  let runs = s.list_import_runs(None).await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0], run);
  assert!(s.list_departments().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_column_aborts_without_log() {
  let s = store().await;
  let headers: Vec<String> = HEADER
    .iter()
    .filter(|h| **h != "Внутренний телефон")
    .map(|h| (*h).to_owned())
    .collect();
  let table = Table::new(headers, vec![vec!["x".to_owned(); 11]]);

  let err = import(&s, table).await.unwrap_err();
  assert!(matches!(
    &err,
    Error::Core(phonebook_core::Error::MissingColumns(c)) if c == &["Внутренний телефон"]
  ));

  assert!(s.list_import_runs(None).await.unwrap().is_empty());
  assert!(s.list_employees(&EmployeeQuery::default()).await.unwrap().is_empty());
  assert!(s.list_departments().await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_log_write_rolls_back_every_row() {
  let s = store().await;
  let existing = s
    .create_employee(EmployeeRecord {
      full_name: "Иванов".into(),
      internal_phone: "101".into(),
      position: "Стажёр".into(),
      hierarchy: 8,
      ..Default::default()
    })
    .await
    .unwrap();

  // Rows are written before the log, so the run fails only at the end.
  s.execute_batch("DROP TABLE import_logs").await.unwrap();

  let err = import(&s, sheet(&[line("Иванов", "101"), line("Петров", "102")]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(phonebook_core::Error::Target(_))));

  let employees = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  assert_eq!(employees, vec![existing]);
  assert!(s.list_departments().await.unwrap().is_empty());
}

// ─── Departments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn department_paths_are_reused() {
  let s = store().await;
  import(&s, sheet(&[line("Иванов", "101")])).await.unwrap();
  import(&s, sheet(&[line("Петров", "102")])).await.unwrap();

  let departments = s.list_departments().await.unwrap();
  assert_eq!(departments.len(), 2);

  let employees = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  assert_eq!(employees[0].record.department_id, employees[1].record.department_id);

  let tree = s.department_tree().await.unwrap();
  let leaf = employees[0].record.department_id.unwrap();
  assert_eq!(tree.full_path(leaf), vec!["Дирекция по ИТ", "Отдел разработки"]);
  assert_eq!(tree.get(leaf).unwrap().level, 2);
  let root = tree.roots().next().unwrap();
  assert_eq!(root.short_name, "ДИТ");
}

#[tokio::test]
async fn short_names_fill_once() {
  let s = store().await;
  let mut first = line("Иванов", "101");
  first.dept1 = "Бухгалтерия";
  import(&s, sheet(&[first])).await.unwrap();

  let mut second = line("Петров", "102");
  second.dept1 = "Бухгалтерия (БУХ)";
  import(&s, sheet(&[second])).await.unwrap();

  let mut third = line("Сидоров", "103");
  third.dept1 = "Бухгалтерия (ФИН)";
  import(&s, sheet(&[third])).await.unwrap();

  let tree = s.department_tree().await.unwrap();
  let roots: Vec<_> = tree.roots().collect();
  assert_eq!(roots.len(), 1);
  assert_eq!(roots[0].short_name, "БУХ");
}

#[tokio::test]
async fn deleting_a_department_detaches_employees_in_its_subtree() {
  let s = store().await;
  let mut other = line("Кузнецов", "201");
  other.dept1 = "Бухгалтерия";
  other.dept2 = "";
  import(&s, sheet(&[line("Иванов", "101"), other])).await.unwrap();

  let tree = s.department_tree().await.unwrap();
  let it = tree.find_child(None, "Дирекция по ИТ").unwrap().id;
  assert!(s.delete_department(it).await.unwrap());
  assert!(!s.delete_department(it).await.unwrap());

  let departments = s.list_departments().await.unwrap();
  assert_eq!(departments.len(), 1);
  assert_eq!(departments[0].name, "Бухгалтерия");

  let employees = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  assert_eq!(employees.len(), 2);
  let ivanov = employees.iter().find(|e| e.record.full_name == "Иванов").unwrap();
  assert_eq!(ivanov.record.department_id, None);
}

// ─── Rank inference ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ranks_are_inferred_only_without_explicit_level() {
  let s = store().await;
  let mut deputy = line("Заместитель", "1");
  deputy.position = "Заместитель директора";
  let specialist = line("Специалист", "2");
  let mut explicit = line("Явный", "3");
  explicit.position = "Ведущий специалист";
  explicit.level = "2";

  import(&s, sheet(&[deputy, specialist, explicit])).await.unwrap();

  let employees = s.list_employees(&EmployeeQuery::default()).await.unwrap();
  let rank = |name: &str| {
    employees
      .iter()
      .find(|e| e.record.full_name == name)
      .unwrap()
      .record
      .hierarchy
  };
  assert_eq!(rank("Заместитель"), 3);
  assert_eq!(rank("Специалист"), 7);
  assert_eq!(rank("Явный"), 2);
}

// ─── Employees ───────────────────────────────────────────────────────────────

fn record(name: &str, internal: &str) -> EmployeeRecord {
  EmployeeRecord {
    initials: "А.А.".into(),
    full_name: name.into(),
    position: "Инженер".into(),
    phone: "100".into(),
    internal_phone: internal.into(),
    email: Some("a@corp.example".into()),
    hierarchy: 7,
    ..Default::default()
  }
}

#[tokio::test]
async fn employee_crud() {
  let s = store().await;

  let created = s.create_employee(record("Андреев", "11")).await.unwrap();
  let fetched = s.get_employee(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);

  let mut changed = record("Андреев", "12");
  changed.room = Some("301".into());
  let updated = s.update_employee(created.id, changed.clone()).await.unwrap();
  assert_eq!(updated.record, changed);
  assert_eq!(updated.created_at, created.created_at);

  assert!(s.delete_employee(created.id).await.unwrap());
  assert!(s.get_employee(created.id).await.unwrap().is_none());
  assert!(!s.delete_employee(created.id).await.unwrap());
}

#[tokio::test]
async fn natural_key_is_unique_for_direct_edits() {
  let s = store().await;
  let a = s.create_employee(record("Андреев", "11")).await.unwrap();
  s.create_employee(record("Борисов", "12")).await.unwrap();

  let err = s.create_employee(record("Андреев", "11")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateEmployee { .. }));

  let err = s.update_employee(a.id, record("Борисов", "12")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateEmployee { .. }));

  // Re-saving with its own key is fine.
  s.update_employee(a.id, record("Андреев", "11")).await.unwrap();
}

#[tokio::test]
async fn edits_reject_unknown_references() {
  let s = store().await;

  let err = s
    .update_employee(EmployeeId(999), record("Никто", "0"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmployeeNotFound(EmployeeId(999))));

  let mut orphan = record("Сирота", "1");
  orphan.department_id = Some(DepartmentId(42));
  let err = s.create_employee(orphan).await.unwrap_err();
  assert!(matches!(err, Error::DepartmentNotFound(DepartmentId(42))));
  assert!(s.list_employees(&EmployeeQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_by_department_includes_the_subtree() {
  let s = store().await;
  let mut top = line("Директоров", "1");
  top.dept2 = "";
  let mut elsewhere = line("Посторонний", "3");
  elsewhere.dept1 = "Склад";
  elsewhere.dept2 = "";
  import(&s, sheet(&[top, line("Разработчиков", "2"), elsewhere]))
    .await
    .unwrap();
  s.create_employee(record("Без отдела", "4")).await.unwrap();

  let tree = s.department_tree().await.unwrap();
  let it = tree.find_child(None, "Дирекция по ИТ").unwrap().id;
  let dev = tree.find_child(Some(it), "Отдел разработки").unwrap().id;

  let names = |employees: Vec<phonebook_core::employee::Employee>| {
    let mut names: Vec<String> =
      employees.into_iter().map(|e| e.record.full_name).collect();
    names.sort();
    names
  };

  let in_it = s.list_employees(&EmployeeQuery::in_department(it)).await.unwrap();
  assert_eq!(names(in_it), vec!["Директоров", "Разработчиков"]);

  let in_dev = s.list_employees(&EmployeeQuery::in_department(dev)).await.unwrap();
  assert_eq!(names(in_dev), vec!["Разработчиков"]);

  let unassigned = s
    .list_employees(&EmployeeQuery { unassigned: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(names(unassigned), vec!["Без отдела"]);
}

#[tokio::test]
async fn directory_groups_employees_under_departments() {
  let s = store().await;
  let mut boss = line("Яковлев", "1");
  boss.position = "Директор";
  boss.dept2 = "";
  import(&s, sheet(&[line("Алексеев", "2"), boss])).await.unwrap();
  s.create_employee(record("Без отдела", "3")).await.unwrap();

  let directory = s.directory().await.unwrap();
  assert_eq!(directory.roots.len(), 1);
  let root = &directory.roots[0];
  assert_eq!(root.department.name, "Дирекция по ИТ");
  assert_eq!(root.employees.len(), 1);
  assert_eq!(root.employees[0].record.hierarchy, 1);
  assert_eq!(root.children.len(), 1);
  assert_eq!(root.children[0].employees[0].record.full_name, "Алексеев");
  assert_eq!(directory.unassigned.len(), 1);
}

// ─── Import log ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_runs_are_listed_newest_first() {
  let s = store().await;
  let first = import(&s, sheet(&[line("Иванов", "1")])).await.unwrap();
  let second = import(&s, sheet(&[line("", "2")])).await.unwrap();

  let runs = s.list_import_runs(None).await.unwrap();
  assert_eq!(runs.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second.id, first.id]);
  assert_eq!(runs[0].errors, vec!["row 2: missing full name".to_owned()]);
  assert_eq!(runs[0].summary().status, ImportStatus::Failed);

  let latest = s.list_import_runs(Some(1)).await.unwrap();
  assert_eq!(latest.len(), 1);
  assert_eq!(latest[0].id, second.id);
}
