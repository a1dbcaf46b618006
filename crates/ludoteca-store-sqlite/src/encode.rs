//! Encoding and decoding between rows and the `cells` column.
//!
//! Rows are stored as compact JSON arrays, exactly as the codec produced
//! them: nothing is interpreted on the way in.

use ludoteca_core::row::Row;

use crate::Result;

pub fn encode_row(row: &Row) -> Result<String> { Ok(serde_json::to_string(row)?) }

pub fn decode_row(s: &str) -> Result<Row> { Ok(serde_json::from_str(s)?) }

/// SQLite integers are signed; positions never approach the limit.
pub fn encode_position(position: usize) -> i64 { position as i64 }

pub fn decode_position(position: i64) -> usize { position.max(0) as usize }
