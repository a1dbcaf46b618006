//! SQLite backend for Ludoteca sheets.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One database file holds any number of
//! sheets, each an ordered list of JSON-encoded rows.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteSheet, SqliteStore};
