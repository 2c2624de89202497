//! Spreadsheet reader for the phone directory import.
//!
//! Turns the first worksheet of an `.xlsx`/`.xls`/`.ods` workbook into a
//! [`phonebook_core::import::Table`]: row 0 is the header, every cell is
//! rendered as text. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let table = phonebook_sheet::read_path("staff.xlsx").unwrap();
//! println!("{} rows, columns {:?}", table.len(), table.headers());
//! ```

pub mod error;

use std::{io::Cursor, path::Path};

use calamine::{
  Data, ExcelDateTime, Range, Reader, open_workbook_auto,
  open_workbook_auto_from_rs,
};
use chrono::NaiveTime;
use phonebook_core::import::Table;
use tracing::debug;

pub use error::{Error, Result};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Read the first worksheet of the workbook at `path`. The format is picked
/// from the file extension.
pub fn read_path(path: impl AsRef<Path>) -> Result<Table> {
  let mut workbook = open_workbook_auto(path)?;
  let range = workbook.worksheet_range_at(0).ok_or(Error::NoWorksheet)??;
  table_from_range(&range)
}

/// Read the first worksheet of a workbook held in memory, e.g. an upload.
/// The format is sniffed from the content.
pub fn read_bytes(bytes: Vec<u8>) -> Result<Table> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
  let range = workbook.worksheet_range_at(0).ok_or(Error::NoWorksheet)??;
  table_from_range(&range)
}

/// Convert a cell range into a [`Table`].
///
/// The first row supplies the column names. Rows made only of blank cells at
/// the end of the sheet are dropped; blank rows in the middle are kept so
/// row numbers in error messages still match the sheet.
pub fn table_from_range(range: &Range<Data>) -> Result<Table> {
  let mut rows = range.rows();
  let headers: Vec<String> =
    rows.next().ok_or(Error::EmptySheet)?.iter().map(cell_to_string).collect();

  let mut body: Vec<Vec<String>> = rows
    .map(|row| row.iter().map(cell_to_string).collect())
    .collect();
  while body
    .last()
    .is_some_and(|row| row.iter().all(|c| c.trim().is_empty()))
  {
    body.pop();
  }

  debug!(columns = headers.len(), rows = body.len(), "read worksheet");
  Ok(Table::new(headers, body))
}

// ─── Cells ───────────────────────────────────────────────────────────────────

/// Render one cell as text. Whole floats print without a fractional part,
/// so a phone stored as `4501.0` reads back as `4501`.
fn cell_to_string(cell: &Data) -> String {
  match cell {
    Data::Empty | Data::Error(_) => String::new(),
    Data::String(s) => s.clone(),
    Data::Int(n) => n.to_string(),
    Data::Float(f) => format!("{f}"),
    Data::Bool(b) => b.to_string(),
    Data::DateTime(dt) => excel_datetime(dt),
    Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
  }
}

/// Dates as `YYYY-MM-DD`, with the time only when it is not midnight.
/// Durations keep their raw serial value.
fn excel_datetime(dt: &ExcelDateTime) -> String {
  match dt.as_datetime() {
    Some(at) if !dt.is_duration() => {
      let layout = if at.time() == NaiveTime::MIN {
        "%Y-%m-%d"
      } else {
        "%Y-%m-%d %H:%M:%S"
      };
      at.format(layout).to_string()
    }
    _ => dt.as_f64().to_string(),
  }
}
