//! Core types and trait definitions for the Ludoteca loan registry.
//!
//! No HTTP or database code lives here. The crate owns the game and
//! audit-entry model, the row codec that maps both onto tabular
//! rows, and the store traits every backend implements.

// Trait methods spell out `impl Future + Send`; implementations use `async fn`.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod error;
pub mod game;
pub mod memory;
pub mod row;
pub mod sheet;
pub mod store;

pub use error::{Error, Result};
