//! Bearer-token extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use ludoteca_core::store::{AuditLog, Catalogue};

use crate::{ApiState, error::ApiError};

/// Zero-size marker: present in the handler means the request carried the
/// bot token.
pub struct Authenticated;

/// Check `Authorization: Bearer <token>` against `token`.
pub fn verify_token(headers: &HeaderMap, token: &str) -> Result<(), ApiError> {
  let presented = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(ApiError::Unauthorized)?;

  if token.is_empty() || presented.trim() != token {
    return Err(ApiError::Unauthorized);
  }
  Ok(())
}

impl<C, L> FromRequestParts<ApiState<C, L>> for Authenticated
where
  C: Catalogue + 'static,
  L: AuditLog + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<C, L>,
  ) -> Result<Self, Self::Rejection> {
    verify_token(&parts.headers, &state.token)?;
    Ok(Authenticated)
  }
}
