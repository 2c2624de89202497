//! An in-memory table of string cells with a header row.
//!
//! File readers (e.g. `phonebook-sheet`) produce a [`Table`]; the reconciler
//! only ever sees strings.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
  headers: Vec<String>,
  index:   HashMap<String, usize>,
  rows:    Vec<Vec<String>>,
}

impl Table {
  /// Build a table. Header names are trimmed; with duplicate headers the
  /// leftmost column wins. Rows may be shorter than the header.
  pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
    let headers: Vec<String> =
      headers.into_iter().map(|h| h.trim().to_owned()).collect();
    let mut index = HashMap::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
      index.entry(header.clone()).or_insert(i);
    }
    Self { headers, index, rows }
  }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn has_column(&self, name: &str) -> bool { self.index.contains_key(name) }

  /// Number of data rows (the header is not counted).
  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
    self
      .rows
      .iter()
      .enumerate()
      .map(|(position, cells)| Row { table: self, cells, position })
  }
}

/// A borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
  table:    &'a Table,
  cells:    &'a [String],
  position: usize,
}

impl<'a> Row<'a> {
  /// The raw cell under `column`, or `""` when the column or cell is absent.
  pub fn get(&self, column: &str) -> &'a str {
    self
      .table
      .index
      .get(column)
      .and_then(|&i| self.cells.get(i))
      .map_or("", String::as_str)
  }

  /// Spreadsheet row number as a user sees it: 1-based, after the header.
  pub fn number(&self) -> usize { self.position + 2 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_by_column_name() {
    let table = Table::new(
      vec![" ФИО ".into(), "Телефон".into(), "ФИО".into()],
      vec![
        vec!["Иванов".into(), "123".into(), "ignored".into()],
        vec!["Петров".into()],
      ],
    );

    assert!(table.has_column("ФИО"));
    let rows: Vec<_> = table.rows().collect();
    assert_eq!(rows[0].get("ФИО"), "Иванов");
    assert_eq!(rows[0].get("Телефон"), "123");
    assert_eq!(rows[1].get("Телефон"), "");
    assert_eq!(rows[1].get("Email"), "");
    assert_eq!(rows[0].number(), 2);
    assert_eq!(rows[1].number(), 3);
  }
}
