//! The reconciliation driver: one cycle at startup, then a ticker that runs
//! another whenever enough time has passed since the last good one.

use std::time::Duration;

use ludoteca_core::store::{AuditLog, Catalogue};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

use crate::{Reconciler, Shutdown};

/// When the driver wakes up and when it actually reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
  pub tick:         Duration,
  /// Minimum time between two successful cycles.
  pub min_interval: Duration,
}

impl Default for Schedule {
  fn default() -> Self {
    Self {
      tick:         Duration::from_secs(30 * 60),
      min_interval: Duration::from_secs(24 * 60 * 60),
    }
  }
}

/// Run until `shutdown` fires. A failed cycle is logged and retried on the
/// next tick; it never stops the loop.
pub async fn run<C, L>(
  mut reconciler: Reconciler<C, L>,
  schedule: Schedule,
  shutdown: Shutdown,
) where
  C: Catalogue,
  L: AuditLog,
{
  let mut last_success: Option<Instant> = None;

  if !cycle(&mut reconciler, &shutdown, &mut last_success).await {
    return;
  }

  let mut ticker = interval_at(Instant::now() + schedule.tick, schedule.tick);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    tokio::select! {
      biased;
      _ = shutdown.cancelled() => break,
      _ = ticker.tick() => {}
    }

    let due = last_success.is_none_or(|at| at.elapsed() >= schedule.min_interval);
    if due && !cycle(&mut reconciler, &shutdown, &mut last_success).await {
      return;
    }
  }
  info!("reconciliation driver stopped");
}

/// One cycle, abandoned if `shutdown` fires first. Returns `false` when the
/// driver should stop.
async fn cycle<C, L>(
  reconciler: &mut Reconciler<C, L>,
  shutdown: &Shutdown,
  last_success: &mut Option<Instant>,
) -> bool
where
  C: Catalogue,
  L: AuditLog,
{
  tokio::select! {
    biased;
    _ = shutdown.cancelled() => {
      info!("reconciliation cancelled");
      false
    }
    result = reconciler.reconcile() => {
      match result {
        Ok(entries) => {
          *last_success = Some(Instant::now());
          info!(entries = entries.len(), "reconciliation finished");
        }
        Err(err) => error!(error = %err, "reconciliation failed"),
      }
      true
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
