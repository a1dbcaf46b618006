//! Error type for `ludoteca-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("sheet {sheet:?} has no row {position}")]
  RowNotFound { sheet: String, position: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
