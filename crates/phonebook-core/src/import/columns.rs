//! Header names expected in an import workbook.

use super::table::Table;

pub const INITIALS: &str = "Инициалы";
pub const FULL_NAME: &str = "ФИО";
pub const POSITION: &str = "Должность";
pub const PHONE: &str = "Телефон";
pub const INTERNAL_PHONE: &str = "Внутренний телефон";
pub const ROOM: &str = "Кабинет";
pub const LEVEL: &str = "Уровень";
pub const EMAIL: &str = "Email";

/// Department levels, outermost first. These columns may be absent.
pub const DEPARTMENTS: [&str; 4] = [
  "Структурное подразделение 1",
  "Структурное подразделение 2",
  "Структурное подразделение 3",
  "Структурное подразделение 4",
];

/// Columns whose absence aborts a run.
pub const REQUIRED: [&str; 7] =
  [INITIALS, FULL_NAME, POSITION, PHONE, INTERNAL_PHONE, ROOM, LEVEL];

/// Required columns missing from `table`, in [`REQUIRED`] order.
pub fn missing_columns(table: &Table) -> Vec<String> {
  REQUIRED
    .iter()
    .filter(|c| !table.has_column(c))
    .map(|c| (*c).to_owned())
    .collect()
}
