//! JSON REST API for Ludoteca.
//!
//! Exposes an axum [`Router`] backed by any [`Catalogue`] and [`AuditLog`].
//! Every route requires `Authorization: Bearer <token>`. The API reads the
//! catalogue and the audit log directly and never touches the reconciler's
//! snapshot.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = ludoteca_api::api_router(ApiState::new(catalogue, log, token, shutdown));
//! ```

pub mod audit;
pub mod auth;
pub mod error;
pub mod games;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ludoteca_core::store::{AuditLog, Catalogue};
use ludoteca_sync::Shutdown;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<C, L> {
  pub catalogue: Arc<C>,
  pub log:       Arc<L>,
  /// Bearer token every request must present.
  pub token:     Arc<str>,
  /// Fires on shutdown; long audit queries give up when it does.
  pub shutdown:  Shutdown,
}

impl<C, L> ApiState<C, L> {
  pub fn new(catalogue: C, log: L, token: &str, shutdown: Shutdown) -> Self {
    Self {
      catalogue: Arc::new(catalogue),
      log: Arc::new(log),
      token: token.into(),
      shutdown,
    }
  }
}

impl<C, L> Clone for ApiState<C, L> {
  fn clone(&self) -> Self {
    Self {
      catalogue: self.catalogue.clone(),
      log:       self.log.clone(),
      token:     self.token.clone(),
      shutdown:  self.shutdown.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<C, L>(state: ApiState<C, L>) -> Router<()>
where
  C: Catalogue + 'static,
  L: AuditLog + 'static,
{
  Router::new()
    // Games
    .route("/games", get(games::list::<C, L>))
    .route("/games/search", get(games::search::<C, L>))
    .route("/games/{id}/{name}", get(games::get_one::<C, L>))
    .route("/games/{id}/{name}/borrow", post(games::borrow::<C, L>))
    .route("/games/{id}/{name}/return", post(games::give_back::<C, L>))
    // Audit
    .route("/audit", get(audit::handler::<C, L>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{TimeZone, Utc};
  use ludoteca_core::{
    audit::{AuditEntry, EntryKind},
    game::Game,
    memory::MemorySheet,
    row::{EntryLayout, RowLayout},
    sheet::{SheetAuditLog, SheetCatalogue},
  };
  use ludoteca_sync::ShutdownHandle;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  const TOKEN: &str = "s3cret";

  type State = ApiState<SheetCatalogue<MemorySheet>, SheetAuditLog<MemorySheet>>;

  struct Fixture {
    catalogue: MemorySheet,
    audit:     MemorySheet,
    shutdown:  ShutdownHandle,
    state:     State,
  }

  fn fixture() -> Fixture {
    let layout = RowLayout::catalogue();
    let catalogue = MemorySheet::with_rows(
      "Catalogue",
      vec![
        vec![json!("Id"), json!("Name"), json!("Location"), json!("Holder")],
        layout.encode(&Game::new("1", "Catán", "Centro", "")),
        layout.encode(&Game::new("2", "Hanabi", "Gamonal", "Victor")),
      ],
    );

    let entries = EntryLayout::default();
    let day = |d| Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap();
    let audit = MemorySheet::with_rows(
      "Audit",
      vec![
        entries.encode(&AuditEntry::new(day(1), EntryKind::New, Game::new("1", "Catán", "Centro", ""))),
        entries.encode(&AuditEntry::new(day(1), EntryKind::New, Game::new("2", "Hanabi", "Gamonal", ""))),
        entries.encode(&AuditEntry::new(day(2), EntryKind::Update, Game::new("1", "Catán", "Centro", "Ana"))),
        entries.encode(&AuditEntry::new(day(3), EntryKind::Update, Game::new("1", "Catán", "Centro", ""))),
        entries.encode(&AuditEntry::new(day(4), EntryKind::Update, Game::new("2", "Hanabi", "Gamonal", "Victor"))),
      ],
    );

    let shutdown = ShutdownHandle::new();
    let state = ApiState::new(
      SheetCatalogue::new(catalogue.clone()),
      SheetAuditLog::new(audit.clone()),
      TOKEN,
      shutdown.subscribe(),
    );
    Fixture { catalogue, audit, shutdown, state }
  }

  async fn send(
    state: &State,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn requests_without_the_token_are_rejected() {
    let f = fixture();
    let req = Request::builder().uri("/games").body(Body::empty()).unwrap();
    let resp = api_router(f.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Games ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_every_game() {
    let f = fixture();
    let (status, body) = send(&f.state, "GET", "/games", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[1]["holder"], "Victor");
  }

  #[tokio::test]
  async fn get_matches_names_loosely() {
    let f = fixture();
    let (status, body) = send(&f.state, "GET", "/games/1/CATAN", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Catán");

    let (status, _) = send(&f.state, "GET", "/games/2/Catan", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn search_by_name_fragment() {
    let f = fixture();
    let (status, body) = send(&f.state, "GET", "/games/search?name=nab", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Hanabi");

    let (status, _) = send(&f.state, "GET", "/games/search?name=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn borrow_writes_the_holder_to_the_sheet() {
    let f = fixture();
    let (status, body) = send(
      &f.state,
      "POST",
      "/games/1/catan/borrow",
      Some(json!({ "holder": " Ana ", "return_date": "2023-02-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["holder"], "Ana");
    assert_eq!(f.catalogue.rows()[1][3], json!("Ana"));

    let (status, _) = send(
      &f.state,
      "POST",
      "/games/1/catan/borrow",
      Some(json!({ "holder": "Victor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn conflict_names_the_holder_and_due_date() {
    let f = fixture();
    let (status, body) =
      send(&f.state, "POST", "/games/2/hanabi/borrow", Some(json!({ "holder": "Ana" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Hanabi is already held by Victor");

    let mut row = f.catalogue.rows()[2].clone();
    row[6] = json!("1/3/2024");
    f.catalogue.set_row(2, row);
    let (_, body) =
      send(&f.state, "POST", "/games/2/hanabi/borrow", Some(json!({ "holder": "Ana" }))).await;
    assert_eq!(body["error"], "Hanabi is already held by Victor until 2024-03-01");

    // Dates before 2000 are the sheet's way of saying "no date".
    let mut row = f.catalogue.rows()[2].clone();
    row[6] = json!("30/12/1899");
    f.catalogue.set_row(2, row);
    let (_, body) =
      send(&f.state, "POST", "/games/2/hanabi/borrow", Some(json!({ "holder": "Ana" }))).await;
    assert_eq!(body["error"], "Hanabi is already held by Victor");
  }

  #[tokio::test]
  async fn borrow_requires_a_holder() {
    let f = fixture();
    let (status, _) =
      send(&f.state, "POST", "/games/1/catan/borrow", Some(json!({ "holder": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn return_clears_the_holder() {
    let f = fixture();
    let (status, body) = send(&f.state, "POST", "/games/2/hanabi/return", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["holder"], "");
    assert_eq!(f.catalogue.rows()[2][3], json!(""));

    let (status, _) = send(&f.state, "POST", "/games/2/hanabi/return", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn store_failures_are_500() {
    let f = fixture();
    f.catalogue.fail_reads(true);
    let (status, body) = send(&f.state, "GET", "/games", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
  }

  // ── Audit ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn audit_by_game_with_limit_is_oldest_first() {
    let f = fixture();
    let (status, body) =
      send(&f.state, "GET", "/audit?id=1&name=catan&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let stamps: Vec<_> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["timestamp"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(stamps, vec!["2023-01-02T00:00:00Z", "2023-01-03T00:00:00Z"]);
  }

  #[tokio::test]
  async fn audit_by_member_and_window() {
    let f = fixture();
    let (status, body) = send(
      &f.state,
      "GET",
      "/audit?member=victor&from=2023-01-02T00:00:00Z&to=2023-01-04T00:00:00Z",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["game"]["name"], "Hanabi");
  }

  #[tokio::test]
  async fn audit_rejects_half_an_identity() {
    let f = fixture();
    let (status, _) = send(&f.state, "GET", "/audit?id=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
      &f.state,
      "GET",
      "/audit?from=2023-01-05T00:00:00Z&to=2023-01-01T00:00:00Z",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn audit_after_shutdown_is_unavailable() {
    let f = fixture();
    f.shutdown.trigger();
    let (status, _) = send(&f.state, "GET", "/audit", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(f.audit.len(), 5);
  }
}
