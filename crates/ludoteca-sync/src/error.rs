//! Error type for `ludoteca-sync`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("catalogue error: {0}")]
  Catalogue(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("audit log error: {0}")]
  AuditLog(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// Applying the computed entries left the snapshot different from the
  /// catalogue. Nothing was written.
  #[error("failed to converge: {remaining} entries still pending after applying {applied}")]
  Diverged { applied: usize, remaining: usize },

  #[error("cancelled")]
  Cancelled,
}

impl Error {
  pub fn catalogue<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Catalogue(Box::new(err))
  }

  pub fn audit_log<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::AuditLog(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
