// ============================
// spendtrack-backend-lib/src/auth/service.rs
// ============================
//! Auth decision functions.
//!
//! Every function takes its data-access handle and configuration explicitly,
//! so the subsystem is testable without a running server.
use metrics::counter;
use once_cell::sync::Lazy;
use std::time::Duration;

use super::password::{hash_password, verify_password};
use super::token;
use super::Identity;
use crate::config::SigningSecret;
use crate::error::AppError;
use crate::metrics as keys;
use crate::store::Store;

/// Hash burned on lookups of unknown usernames so that the unknown-user and
/// wrong-password paths take comparable time.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("spendtrack.dummy").expect("scrypt hashing a fixed string"));

/// Register a new user.
///
/// The plaintext is hashed and discarded; it is never stored or logged.
/// A taken username fails with `AlreadyExists` and writes nothing.
pub async fn register(
    store: &dyn Store,
    username: &str,
    password: &str,
    budget: Option<f64>,
) -> Result<Identity, AppError> {
    if username.is_empty() {
        return Err(AppError::InvalidInput("username must not be empty".into()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("password must not be empty".into()));
    }

    let hash = hash_password(password).map_err(|e| AppError::Internal(e.to_string()))?;
    let record = store
        .insert_user(username, &hash, budget.unwrap_or(0.0))
        .await?;

    counter!(keys::AUTH_REGISTERED).increment(1);
    tracing::info!(username, user_id = record.id, "user registered");
    Ok(record.into())
}

/// Authenticate a user by username and password.
///
/// Unknown user and wrong password are indistinguishable to the caller:
/// same error, comparable timing (a dummy verification runs when the
/// username does not exist).
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<Identity, AppError> {
    match store.find_user_by_username(username).await? {
        Some(user) => {
            if verify_password(&user.password_hash, password) {
                counter!(keys::AUTH_LOGIN_SUCCESS).increment(1);
                Ok(user.into())
            } else {
                counter!(keys::AUTH_LOGIN_FAILURE).increment(1);
                Err(AppError::InvalidCredentials)
            }
        },
        None => {
            let _ = verify_password(&DUMMY_HASH, password);
            counter!(keys::AUTH_LOGIN_FAILURE).increment(1);
            Err(AppError::InvalidCredentials)
        },
    }
}

/// Issue a bearer token scoped to this identity's username.
pub fn issue_token(identity: &Identity, secret: &SigningSecret, ttl: Duration) -> String {
    counter!(keys::TOKEN_ISSUED).increment(1);
    token::issue(&identity.username, secret, ttl)
}

/// Resolve a presented token to a live identity.
///
/// Fails closed: every decode failure mode and a missing user row collapse
/// to `Unauthorized`. The specific mode is only visible in debug logs.
pub async fn resolve_identity(
    store: &dyn Store,
    secret: &SigningSecret,
    token: &str,
) -> Result<Identity, AppError> {
    let claims = match token::decode(token, secret) {
        Ok(claims) => claims,
        Err(reason) => {
            counter!(keys::TOKEN_REJECTED).increment(1);
            tracing::debug!(%reason, "bearer token rejected");
            return Err(AppError::Unauthorized);
        },
    };

    // The subject must still map to a live user: a deleted user's unexpired
    // token, or a forged subject, fails the same way.
    match store.find_user_by_username(&claims.sub).await? {
        Some(user) => Ok(user.into()),
        None => {
            counter!(keys::TOKEN_REJECTED).increment(1);
            tracing::debug!(subject = %claims.sub, "token subject has no live user");
            Err(AppError::Unauthorized)
        },
    }
}

/// Ownership check: may `identity` act on a resource owned by `resource_owner_id`?
pub fn authorize(identity: &Identity, resource_owner_id: i64) -> bool {
    let allowed = identity.id == resource_owner_id;
    if !allowed {
        counter!(keys::OWNERSHIP_DENIED).increment(1);
        tracing::debug!(
            user_id = identity.id,
            resource_owner_id,
            "ownership check denied"
        );
    }
    allowed
}
