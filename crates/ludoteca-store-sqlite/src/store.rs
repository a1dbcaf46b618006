//! [`SqliteStore`] and [`SqliteSheet`], the SQLite implementation of
//! [`Sheet`].

use std::{path::Path, sync::Arc};

use ludoteca_core::{row::Row, sheet::Sheet};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{decode_position, decode_row, encode_position, encode_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A database file holding any number of sheets.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// A handle on the sheet called `title`. Sheets spring into existence on
  /// first append.
  pub fn sheet(&self, title: &str) -> SqliteSheet {
    SqliteSheet { conn: self.conn.clone(), title: title.into() }
  }
}

// ─── Sheet ───────────────────────────────────────────────────────────────────

/// One sheet inside a [`SqliteStore`].
#[derive(Clone)]
pub struct SqliteSheet {
  conn:  tokio_rusqlite::Connection,
  title: Arc<str>,
}

impl std::fmt::Debug for SqliteSheet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteSheet").field("title", &self.title).finish()
  }
}

impl SqliteSheet {
  /// Insert `row` before `position`, renumbering the rows after it. Clamped
  /// to the end of the sheet. This is how a librarian adds a row mid-table.
  pub async fn insert_row(&self, position: usize, row: &Row) -> Result<()> {
    let sheet = self.title.to_string();
    let cells = encode_row(row)?;
    let at    = encode_position(position);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let len: i64 = tx.query_row(
          "SELECT COUNT(*) FROM sheet_rows WHERE sheet = ?1",
          rusqlite::params![sheet],
          |r| r.get(0),
        )?;
        let at = at.min(len);

        // Two passes keep the primary key unique while renumbering.
        tx.execute(
          "UPDATE sheet_rows SET position = -position - 2
           WHERE sheet = ?1 AND position >= ?2",
          rusqlite::params![sheet, at],
        )?;
        tx.execute(
          "UPDATE sheet_rows SET position = -position - 1
           WHERE sheet = ?1 AND position < 0",
          rusqlite::params![sheet],
        )?;
        tx.execute(
          "INSERT INTO sheet_rows (sheet, position, cells) VALUES (?1, ?2, ?3)",
          rusqlite::params![sheet, at, cells],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete the row at `position`, renumbering the rows after it.
  pub async fn delete_row(&self, position: usize) -> Result<()> {
    let sheet = self.title.to_string();
    let at    = encode_position(position);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted = tx.execute(
          "DELETE FROM sheet_rows WHERE sheet = ?1 AND position = ?2",
          rusqlite::params![sheet, at],
        )?;
        if deleted == 0 {
          return Ok(false);
        }
        tx.execute(
          "UPDATE sheet_rows SET position = -position
           WHERE sheet = ?1 AND position > ?2",
          rusqlite::params![sheet, at],
        )?;
        tx.execute(
          "UPDATE sheet_rows SET position = -position - 1
           WHERE sheet = ?1 AND position < 0",
          rusqlite::params![sheet],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !deleted {
      return Err(Error::RowNotFound { sheet: self.title.to_string(), position });
    }
    Ok(())
  }
}

impl Sheet for SqliteSheet {
  type Error = Error;

  fn title(&self) -> &str { &self.title }

  async fn read_rows(&self) -> Result<Vec<Row>> {
    let sheet = self.title.to_string();

    let raws: Vec<(i64, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT position, cells FROM sheet_rows
           WHERE sheet = ?1
           ORDER BY position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![sheet], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Positions are dense unless the file was edited by hand; keep any gap
    // as an empty row so positions still line up with row bindings.
    let mut rows = Vec::with_capacity(raws.len());
    for (position, cells) in raws {
      let position = decode_position(position);
      if position > rows.len() {
        debug!(sheet = %self.title, position, "gap in sheet rows");
        rows.resize(position, Row::new());
      }
      rows.push(decode_row(&cells)?);
    }
    Ok(rows)
  }

  async fn append_rows(&self, rows: Vec<Row>) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }
    let sheet = self.title.to_string();
    let encoded = rows.iter().map(encode_row).collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let next: i64 = tx.query_row(
          "SELECT COALESCE(MAX(position) + 1, 0) FROM sheet_rows WHERE sheet = ?1",
          rusqlite::params![sheet],
          |r| r.get(0),
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO sheet_rows (sheet, position, cells) VALUES (?1, ?2, ?3)",
          )?;
          for (offset, cells) in encoded.iter().enumerate() {
            stmt.execute(rusqlite::params![sheet, next + offset as i64, cells])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update_rows(&self, rows: Vec<(usize, Row)>) -> Result<()> {
    let sheet = self.title.to_string();
    let encoded = rows
      .iter()
      .map(|(position, row)| Ok((encode_position(*position), encode_row(row)?)))
      .collect::<Result<Vec<_>>>()?;

    let missing: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "UPDATE sheet_rows SET cells = ?3 WHERE sheet = ?1 AND position = ?2",
          )?;
          for (position, cells) in &encoded {
            if stmt.execute(rusqlite::params![sheet, position, cells])? == 0 {
              // Dropping the transaction rolls back earlier updates.
              return Ok(Some(*position));
            }
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match missing {
      Some(position) => Err(Error::RowNotFound {
        sheet:    self.title.to_string(),
        position: decode_position(position),
      }),
      None => Ok(()),
    }
  }
}
