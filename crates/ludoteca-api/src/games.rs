//! Handlers for `/games` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/games` | Every complete catalogue row |
//! | `GET`  | `/games/search?name=` | Accent- and case-insensitive substring |
//! | `GET`  | `/games/{id}/{name}` | 404 if not found |
//! | `POST` | `/games/{id}/{name}/borrow` | Body: `{"holder":"Ana","return_date":null}` |
//! | `POST` | `/games/{id}/{name}/return` | 409 if the game is on the shelf |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, SubsecRound, Utc};
use ludoteca_core::{
  game::Game,
  store::{AuditLog, Catalogue},
};
use serde::Deserialize;
use tracing::info;

use crate::{ApiState, auth::Authenticated, error::ApiError};

async fn lookup<C: Catalogue>(
  catalogue: &C,
  id: &str,
  name: &str,
) -> Result<Game, ApiError> {
  catalogue
    .get(id, name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("game {id} {name:?} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /games`
pub async fn list<C, L>(
  _: Authenticated,
  State(state): State<ApiState<C, L>>,
) -> Result<Json<Vec<Game>>, ApiError>
where
  C: Catalogue,
  L: AuditLog,
{
  let games = state.catalogue.list().await.map_err(ApiError::store)?;
  Ok(Json(games))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub name: String,
}

/// `GET /games/search?name=<text>`
pub async fn search<C, L>(
  _: Authenticated,
  State(state): State<ApiState<C, L>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Game>>, ApiError>
where
  C: Catalogue,
  L: AuditLog,
{
  if params.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }
  let games = state
    .catalogue
    .find(&params.name)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(games))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /games/{id}/{name}`
pub async fn get_one<C, L>(
  _: Authenticated,
  State(state): State<ApiState<C, L>>,
  Path((id, name)): Path<(String, String)>,
) -> Result<Json<Game>, ApiError>
where
  C: Catalogue,
  L: AuditLog,
{
  Ok(Json(lookup(&*state.catalogue, &id, &name).await?))
}

// ─── Borrow / return ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BorrowBody {
  pub holder:      String,
  #[serde(default)]
  pub return_date: Option<DateTime<Utc>>,
}

/// `POST /games/{id}/{name}/borrow`
pub async fn borrow<C, L>(
  _: Authenticated,
  State(state): State<ApiState<C, L>>,
  Path((id, name)): Path<(String, String)>,
  Json(body): Json<BorrowBody>,
) -> Result<Json<Game>, ApiError>
where
  C: Catalogue,
  L: AuditLog,
{
  if body.holder.trim().is_empty() {
    return Err(ApiError::BadRequest("holder must not be empty".into()));
  }

  let mut game = lookup(&*state.catalogue, &id, &name).await?;
  if !game.is_available() {
    let until = game
      .return_date_set()
      .map(|due| format!(" until {}", due.format("%Y-%m-%d")))
      .unwrap_or_default();
    return Err(ApiError::Conflict(format!(
      "{} is already held by {}{until}",
      game.name, game.holder
    )));
  }

  game.lend(&body.holder, Utc::now().trunc_subsecs(0), body.return_date);
  state
    .catalogue
    .update(vec![game.clone()])
    .await
    .map_err(ApiError::store)?;
  info!(id = %game.id, name = %game.name, holder = %game.holder, "game borrowed");
  Ok(Json(game))
}

/// `POST /games/{id}/{name}/return`
pub async fn give_back<C, L>(
  _: Authenticated,
  State(state): State<ApiState<C, L>>,
  Path((id, name)): Path<(String, String)>,
) -> Result<Json<Game>, ApiError>
where
  C: Catalogue,
  L: AuditLog,
{
  let mut game = lookup(&*state.catalogue, &id, &name).await?;
  if game.is_available() {
    return Err(ApiError::Conflict(format!("{} is not on loan", game.name)));
  }

  let holder = std::mem::take(&mut game.holder);
  game.give_back();
  state
    .catalogue
    .update(vec![game.clone()])
    .await
    .map_err(ApiError::store)?;
  info!(id = %game.id, name = %game.name, %holder, "game returned");
  Ok(Json(game))
}
