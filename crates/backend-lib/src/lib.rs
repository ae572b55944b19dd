// ============================
// spendtrack-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `spendtrack` finance tracker.

pub mod auth;
pub mod config;
pub mod error;
pub mod expense;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod store;

use std::sync::Arc;

use crate::auth::AuthRateLimiter;
use crate::config::Settings;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Storage backend
    pub store: S,
    /// Settings, including the signing secret and token TTL
    pub settings: Arc<Settings>,
    /// Failed-login rate limiter
    pub login_limiter: AuthRateLimiter,
}

impl<S: store::Store> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
            login_limiter: AuthRateLimiter::default(),
        }
    }
}
