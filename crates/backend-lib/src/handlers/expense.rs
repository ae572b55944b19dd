// ============================
// crates/backend-lib/src/handlers/expense.rs
// ============================
//! Expense endpoints. Every route resolves the bearer identity first; the
//! ownership gate inside the expense operations does the rest.
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::expense;
use crate::store::Store;
use crate::AppState;
use spendtrack_common::{Expense, ExpenseFilter, ExpenseRequest, ReturnMessage};

/// `POST /api/expense`
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<ExpenseRequest>,
) -> Result<Json<ReturnMessage>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    let created =
        expense::add_expense(&state.store, &identity, req.amount, &req.description).await?;
    Ok(Json(ReturnMessage::ok(
        "Expense added successfully",
        Some(serde_json::to_value(&created)?),
    )))
}

/// `GET /api/expense?month=&year=`
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(filter): Query<ExpenseFilter>,
    headers: HeaderMap,
) -> Result<Json<Vec<Expense>>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    let expenses = expense::list_expenses(&state.store, &identity, &filter).await?;
    Ok(Json(expenses))
}

/// `GET /api/expense/{expense_id}`
pub async fn get_by_id<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(expense_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Expense>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    let found = expense::get_expense(&state.store, &identity, expense_id).await?;
    Ok(Json(found))
}

/// `PUT /api/expense/{expense_id}`
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(expense_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<ExpenseRequest>,
) -> Result<Json<ReturnMessage>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    let updated = expense::update_expense(
        &state.store,
        &identity,
        expense_id,
        req.amount,
        &req.description,
    )
    .await?;
    Ok(Json(ReturnMessage::ok(
        "Expense updated successfully",
        Some(serde_json::to_value(&updated)?),
    )))
}

/// `DELETE /api/expense/{expense_id}`
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(expense_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ReturnMessage>, AppError> {
    let identity = super::current_identity(&state, &headers).await?;
    expense::delete_expense(&state.store, &identity, expense_id).await?;
    Ok(Json(ReturnMessage::ok("Expense deleted successfully", None)))
}
