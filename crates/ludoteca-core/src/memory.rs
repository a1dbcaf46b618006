//! [`MemorySheet`], an in-process [`Sheet`].
//!
//! Clones share the same rows, so a test (or an embedding application) can
//! keep a handle and edit rows the way a librarian would while a store owns
//! another clone.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use thiserror::Error;

use crate::{row::Row, sheet::Sheet};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("sheet {0:?} refused the read")]
  ReadRefused(String),

  #[error("sheet {0:?} refused the write")]
  WriteRefused(String),

  #[error("row {0} does not exist")]
  RowNotFound(usize),
}

#[derive(Debug, Default)]
struct Inner {
  rows:        Mutex<Vec<Row>>,
  fail_reads:  AtomicBool,
  fail_writes: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct MemorySheet {
  title: Arc<str>,
  inner: Arc<Inner>,
}

impl MemorySheet {
  pub fn new(title: &str) -> Self { Self::with_rows(title, Vec::new()) }

  pub fn with_rows(title: &str, rows: Vec<Row>) -> Self {
    Self {
      title: title.into(),
      inner: Arc::new(Inner { rows: Mutex::new(rows), ..Inner::default() }),
    }
  }

  /// A copy of every row.
  pub fn rows(&self) -> Vec<Row> { self.inner.rows.lock().clone() }

  pub fn len(&self) -> usize { self.inner.rows.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn push_row(&self, row: Row) { self.inner.rows.lock().push(row); }

  /// Insert before `position`, shifting later rows down. Clamped to the end.
  pub fn insert_row(&self, position: usize, row: Row) {
    let mut rows = self.inner.rows.lock();
    let position = position.min(rows.len());
    rows.insert(position, row);
  }

  /// Delete the row at `position`, shifting later rows up.
  pub fn remove_row(&self, position: usize) -> Option<Row> {
    let mut rows = self.inner.rows.lock();
    (position < rows.len()).then(|| rows.remove(position))
  }

  /// Overwrite the row at `position`, growing the sheet if needed.
  pub fn set_row(&self, position: usize, row: Row) {
    let mut rows = self.inner.rows.lock();
    if rows.len() <= position {
      rows.resize(position + 1, Row::new());
    }
    rows[position] = row;
  }

  /// Make every subsequent read fail until switched off.
  pub fn fail_reads(&self, fail: bool) {
    self.inner.fail_reads.store(fail, Ordering::SeqCst);
  }

  /// Make every subsequent write fail until switched off.
  pub fn fail_writes(&self, fail: bool) {
    self.inner.fail_writes.store(fail, Ordering::SeqCst);
  }

  fn check(&self, flag: &AtomicBool, err: fn(String) -> MemoryError) -> Result<(), MemoryError> {
    if flag.load(Ordering::SeqCst) {
      return Err(err(self.title.to_string()));
    }
    Ok(())
  }
}

impl Sheet for MemorySheet {
  type Error = MemoryError;

  fn title(&self) -> &str { &self.title }

  async fn read_rows(&self) -> Result<Vec<Row>, MemoryError> {
    self.check(&self.inner.fail_reads, MemoryError::ReadRefused)?;
    Ok(self.rows())
  }

  async fn append_rows(&self, rows: Vec<Row>) -> Result<(), MemoryError> {
    self.check(&self.inner.fail_writes, MemoryError::WriteRefused)?;
    self.inner.rows.lock().extend(rows);
    Ok(())
  }

  async fn update_rows(&self, rows: Vec<(usize, Row)>) -> Result<(), MemoryError> {
    self.check(&self.inner.fail_writes, MemoryError::WriteRefused)?;
    let mut current = self.inner.rows.lock();
    if let Some(&(missing, _)) = rows.iter().find(|(p, _)| *p >= current.len()) {
      return Err(MemoryError::RowNotFound(missing));
    }
    for (position, row) in rows {
      current[position] = row;
    }
    Ok(())
  }
}
