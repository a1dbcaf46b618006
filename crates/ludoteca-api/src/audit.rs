//! Handler for `GET /audit`.
//!
//! Query params map directly to [`AuditQuery`] fields. `id` and `name` only
//! make sense together, since a game is identified by the pair.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use ludoteca_core::{
  audit::AuditEntry,
  game::GameKey,
  store::{AuditLog, AuditQuery, Catalogue},
};
use serde::Deserialize;

use crate::{ApiState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct AuditParams {
  /// Inclusive lower bound, RFC 3339.
  pub from:   Option<DateTime<Utc>>,
  /// Inclusive upper bound, RFC 3339.
  pub to:     Option<DateTime<Utc>>,
  pub id:     Option<String>,
  pub name:   Option<String>,
  /// Holder nickname; matched accent- and case-insensitively.
  pub member: Option<String>,
  /// Most recent matches to keep; omitted or `0` keeps all.
  pub limit:  Option<usize>,
}

impl TryFrom<AuditParams> for AuditQuery {
  type Error = ApiError;

  fn try_from(params: AuditParams) -> Result<Self, Self::Error> {
    if let (Some(from), Some(to)) = (params.from, params.to)
      && from > to
    {
      return Err(ApiError::BadRequest("from is after to".into()));
    }

    let game = match (params.id, params.name) {
      (Some(id), Some(name)) => Some(GameKey::new(id, &name)),
      (None, None) => None,
      _ => {
        return Err(ApiError::BadRequest(
          "id and name must be given together".into(),
        ));
      }
    };

    Ok(AuditQuery {
      from: params.from,
      to: params.to,
      game,
      member: params.member.filter(|m| !m.trim().is_empty()),
      limit: params.limit.unwrap_or(0),
    })
  }
}

/// `GET /audit[?from=...][&to=...][&id=...&name=...][&member=...][&limit=...]`
pub async fn handler<C, L>(
  _: Authenticated,
  State(state): State<ApiState<C, L>>,
  Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  C: Catalogue,
  L: AuditLog,
{
  let query = AuditQuery::try_from(params)?;
  let entries =
    ludoteca_sync::query::query(&*state.log, &query, &state.shutdown).await?;
  Ok(Json(entries))
}
