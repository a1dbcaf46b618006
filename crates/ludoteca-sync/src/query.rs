//! Audit query: filter the log by time window, game, and member.
//!
//! Selection walks the log newest-first so that `limit` keeps the most recent
//! matches; the result is then reversed so callers read it oldest-first.
//! Queries only read the log backend, never the snapshot, so they are safe to
//! run while a reconciliation is in flight.

use ludoteca_core::{
  audit::AuditEntry,
  game::normalise,
  store::{AuditLog, AuditQuery},
};

use crate::{Error, Result, Shutdown};

/// Read the log and filter it.
pub async fn query<L: AuditLog>(
  log: &L,
  query: &AuditQuery,
  shutdown: &Shutdown,
) -> Result<Vec<AuditEntry>> {
  let entries = tokio::select! {
    biased;
    _ = shutdown.cancelled() => return Err(Error::Cancelled),
    listed = log.list() => listed.map_err(Error::audit_log)?,
  };
  select(&entries, query, shutdown)
}

/// Filter `entries`, which must be in ascending timestamp order.
pub fn select(
  entries: &[AuditEntry],
  query: &AuditQuery,
  shutdown: &Shutdown,
) -> Result<Vec<AuditEntry>> {
  let member = query.member.as_deref().map(|m| normalise(m.trim()));

  let mut selected = Vec::new();
  for entry in entries.iter().rev() {
    if shutdown.is_cancelled() {
      return Err(Error::Cancelled);
    }
    if query.limit > 0 && selected.len() >= query.limit {
      break;
    }

    if let Some(from) = query.from
      && entry.timestamp < Some(from)
    {
      continue;
    }
    if let Some(to) = query.to
      && entry.timestamp > Some(to)
    {
      continue;
    }
    if let Some(key) = &query.game
      && !key.matches(&entry.game)
    {
      continue;
    }
    if let Some(member) = &member
      && normalise(entry.game.holder.trim()) != *member
    {
      continue;
    }
    selected.push(entry.clone());
  }

  selected.reverse();
  Ok(selected)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
