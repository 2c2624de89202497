//! Error types for the phonebook-sheet reader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot open workbook: {0}")]
  Open(#[from] calamine::Error),

  #[error("workbook has no worksheets")]
  NoWorksheet,

  #[error("worksheet has no header row")]
  EmptySheet,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
