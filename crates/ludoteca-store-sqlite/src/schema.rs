//! SQL schema for the Ludoteca SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per sheet row. Positions are dense and zero-based within a sheet;
-- inserting or deleting a row renumbers the rows after it.
CREATE TABLE IF NOT EXISTS sheet_rows (
    sheet     TEXT    NOT NULL,
    position  INTEGER NOT NULL,
    cells     TEXT    NOT NULL,   -- JSON array of cell values
    PRIMARY KEY (sheet, position)
);

PRAGMA user_version = 1;
";
