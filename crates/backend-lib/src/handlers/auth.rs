// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and user endpoints.
use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    Form, Json,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::auth;
use crate::error::AppError;
use crate::store::Store;
use crate::AppState;
use spendtrack_common::{LoginRequest, RegisterRequest, ReturnMessage, TokenResponse};

/// Client address for the login rate limiter. Direct clients are keyed by
/// their peer address; `x-real-ip` is honored only when the peer is the
/// loopback reverse proxy, since anyone else can set the header freely.
fn client_ip(peer: SocketAddr, headers: &HeaderMap) -> IpAddr {
    if peer.ip().is_loopback() {
        if let Some(forwarded) = headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
        {
            return forwarded;
        }
    }
    peer.ip()
}

/// `POST /api/auth/register`
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ReturnMessage>, AppError> {
    let identity = auth::register(&state.store, &req.username, &req.password, req.budget).await?;
    Ok(Json(ReturnMessage::ok(
        "User registered successfully",
        Some(serde_json::to_value(&identity)?),
    )))
}

/// `POST /api/auth/token`. Form login, returns a bearer token.
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let ip = client_ip(peer, &headers);
    if !state.login_limiter.check_rate_limit(ip) {
        return Err(AppError::AuthRateLimited);
    }

    match auth::authenticate(&state.store, &form.username, &form.password).await {
        Ok(identity) => {
            state.login_limiter.record_success(ip);
            let token = auth::issue_token(
                &identity,
                &state.settings.signing_secret,
                state.settings.token_ttl(),
            );
            Ok(Json(TokenResponse {
                access_token: token,
                token_type: "bearer".to_string(),
            }))
        },
        Err(err) => {
            if matches!(err, AppError::InvalidCredentials) {
                state.login_limiter.record_failed_attempt(ip);
            }
            Err(err)
        },
    }
}

/// `GET /api/auth/users/me`
pub async fn me<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<auth::Identity>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    Ok(Json(identity))
}

/// `GET /api/auth/users/{user_id}`. Self-access only.
pub async fn user_by_id<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<auth::Identity>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    if !auth::authorize(&identity, user_id) {
        return Err(AppError::Forbidden);
    }
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
    Ok(Json(user.into()))
}

/// `DELETE /api/auth/users/{user_id}`. Self-deletion only.
pub async fn delete_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ReturnMessage>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    if !auth::authorize(&identity, user_id) {
        return Err(AppError::Forbidden);
    }
    state.store.delete_user(user_id).await?;
    tracing::info!(user_id, "user deleted");
    Ok(Json(ReturnMessage::ok("User deleted successfully", None)))
}
