//! Cooperative cancellation shared by the driver, the reconciler's callers,
//! and audit queries.

use tokio::sync::watch;

/// Fires the signal. Dropping the handle without firing leaves every
/// [`Shutdown`] waiting forever.
#[derive(Debug)]
pub struct ShutdownHandle {
  tx: watch::Sender<bool>,
}

/// A cloneable view of the cancellation signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
  rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(false);
    Self { tx }
  }

  pub fn subscribe(&self) -> Shutdown { Shutdown { rx: self.tx.subscribe() } }

  pub fn trigger(&self) { self.tx.send_replace(true); }
}

impl Default for ShutdownHandle {
  fn default() -> Self { Self::new() }
}

impl Shutdown {
  /// A signal that never fires.
  pub fn never() -> Self {
    let (_tx, rx) = watch::channel(false);
    Self { rx }
  }

  pub fn is_cancelled(&self) -> bool { *self.rx.borrow() }

  /// Resolve once the signal fires.
  pub async fn cancelled(&self) {
    let mut rx = self.rx.clone();
    loop {
      if *rx.borrow_and_update() {
        return;
      }
      if rx.changed().await.is_err() {
        // Handle dropped without firing.
        std::future::pending::<()>().await;
      }
    }
  }
}
