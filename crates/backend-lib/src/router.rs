// ============================
// spendtrack-backend-lib/src/router.rs
// ============================
//! Router assembly.
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::store::Store;
use crate::AppState;

/// Create the API router
pub fn create_router<S: Store + Send + Sync + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/token", post(handlers::auth::login))
        .route("/api/auth/users/me", get(handlers::auth::me))
        .route(
            "/api/auth/users/{user_id}",
            get(handlers::auth::user_by_id).delete(handlers::auth::delete_user),
        )
        .route(
            "/api/expense",
            post(handlers::expense::create).get(handlers::expense::list),
        )
        .route(
            "/api/expense/{expense_id}",
            get(handlers::expense::get_by_id)
                .put(handlers::expense::update)
                .delete(handlers::expense::delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
