// crates/backend-lib/src/handlers/mod.rs

//! HTTP handlers for the `spendtrack` API.

pub mod auth;
pub mod expense;

use axum::http::{header, HeaderMap};

use crate::auth::Identity;
use crate::error::AppError;
use crate::store::Store;
use crate::AppState;

/// Pull the bearer token out of the `Authorization` header.
/// Anything other than a well-formed `Bearer <token>` is unauthorized.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)
}

/// Resolve the request's bearer token to a live identity.
pub(crate) async fn current_identity<S: Store>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<Identity, AppError> {
    let token = bearer_token(headers)?;
    crate::auth::resolve_identity(&state.store, &state.settings.signing_secret, token).await
}
