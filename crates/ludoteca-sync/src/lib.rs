//! The audit-diff engine.
//!
//! Keeps an in-memory [`Snapshot`] of the catalogue, folded from the audit
//! log, and reconciles it against the live catalogue: every difference is
//! written to the log as a `new`, `update`, or `removed` entry. The
//! [`driver`] runs reconciliation on a schedule; [`query`] reads the log
//! back along time, game, and member axes.

pub mod diff;
pub mod driver;
pub mod error;
pub mod query;
pub mod reconcile;
pub mod shutdown;
pub mod snapshot;

pub use error::{Error, Result};
pub use reconcile::Reconciler;
pub use shutdown::{Shutdown, ShutdownHandle};
pub use snapshot::Snapshot;
