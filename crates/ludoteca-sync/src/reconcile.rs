//! [`Reconciler`]: one reconciliation cycle and the snapshot it owns.
//!
//! A cycle is: make sure a snapshot exists (folding the whole log if not),
//! read the catalogue, diff, apply the diff to the snapshot, verify, and
//! append the entries in a single call. Any failure drops the snapshot so the
//! next cycle starts again from the log; a snapshot is never kept ahead of
//! what was durably appended.

use ludoteca_core::{
  audit::AuditEntry,
  store::{AuditLog, Catalogue},
};
use tracing::{debug, info};

use crate::{Error, Result, diff, snapshot::Snapshot};

/// Where the reconciler's snapshot stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// No snapshot; the next cycle replays the log.
  Uninitialised,
  /// Replaying the log.
  Initialising,
  /// Snapshot matches the log.
  Ready,
  /// Snapshot is being advanced and is not yet backed by the log.
  Advancing,
}

#[derive(Debug)]
enum State {
  Uninitialised,
  Initialising,
  Ready(Snapshot),
  Advancing,
}

/// Owns the snapshot and the two stores it reconciles.
///
/// Cycles take `&mut self`, so only one runs at a time. Dropping a cycle's
/// future mid-way leaves the reconciler `Initialising` or `Advancing`, which
/// the next cycle treats like `Uninitialised`.
#[derive(Debug)]
pub struct Reconciler<C, L> {
  catalogue: C,
  log:       L,
  state:     State,
}

impl<C, L> Reconciler<C, L>
where
  C: Catalogue,
  L: AuditLog,
{
  pub fn new(catalogue: C, log: L) -> Self {
    Self { catalogue, log, state: State::Uninitialised }
  }

  pub fn catalogue(&self) -> &C { &self.catalogue }

  pub fn log(&self) -> &L { &self.log }

  pub fn phase(&self) -> Phase {
    match self.state {
      State::Uninitialised => Phase::Uninitialised,
      State::Initialising => Phase::Initialising,
      State::Ready(_) => Phase::Ready,
      State::Advancing => Phase::Advancing,
    }
  }

  /// The snapshot, when it is in step with the log.
  pub fn snapshot(&self) -> Option<&Snapshot> {
    match &self.state {
      State::Ready(snapshot) => Some(snapshot),
      _ => None,
    }
  }

  /// Run one cycle and return the entries it appended.
  pub async fn reconcile(&mut self) -> Result<Vec<AuditEntry>> {
    let mut snapshot = match self.take_snapshot().await {
      Ok(snapshot) => snapshot,
      Err(err) => {
        self.state = State::Uninitialised;
        return Err(err);
      }
    };

    self.state = State::Advancing;
    match self.advance(&mut snapshot).await {
      Ok(appended) => {
        self.state = State::Ready(snapshot);
        Ok(appended)
      }
      Err(err) => {
        self.state = State::Uninitialised;
        Err(err)
      }
    }
  }

  async fn take_snapshot(&mut self) -> Result<Snapshot> {
    match std::mem::replace(&mut self.state, State::Initialising) {
      State::Ready(snapshot) => Ok(snapshot),
      _ => {
        let entries = self.log.list().await.map_err(Error::audit_log)?;
        let snapshot = Snapshot::replay(&entries);
        info!(entries = entries.len(), games = snapshot.len(), "rebuilt snapshot from audit log");
        Ok(snapshot)
      }
    }
  }

  async fn advance(&self, snapshot: &mut Snapshot) -> Result<Vec<AuditEntry>> {
    let games = self.catalogue.list().await.map_err(Error::catalogue)?;
    let entries = diff::converge(snapshot, &games)?;
    if entries.is_empty() {
      debug!(games = games.len(), "catalogue unchanged");
      return Ok(Vec::new());
    }

    let appended = self.log.append(entries).await.map_err(Error::audit_log)?;
    info!(entries = appended.len(), games = games.len(), "appended audit entries");
    Ok(appended)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
