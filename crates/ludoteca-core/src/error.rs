//! Error types for `ludoteca-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A row layout declaration is malformed. This is a programming error.
  #[error("invalid row layout: {0}")]
  Layout(String),

  #[error("column {column} ({field}): expected {expected}, found {found}")]
  CellType {
    column:   usize,
    field:    &'static str,
    expected: &'static str,
    found:    String,
  },

  #[error("{0}")]
  UnknownKind(String),

  #[error("game {id:?} / {name:?} is not bound to a row of this sheet")]
  Unbound { id: String, name: String },

  #[error("row {row} no longer holds {id:?} / {name:?}")]
  RowMoved { row: String, id: String, name: String },

  #[error("row {0} does not exist")]
  RowNotFound(usize),

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap an arbitrary backend error.
  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
