// ============================
// spendtrack-backend-lib/src/expense.rs
// ============================
//! Expense operations.
//!
//! Every single-resource read and every mutation runs the ownership check
//! against the stored owner id before touching the row itself. The acting
//! identity is never trusted to select resources.
use metrics::counter;

use crate::auth::{authorize, Identity};
use crate::error::AppError;
use crate::metrics as keys;
use crate::store::Store;
use spendtrack_common::{Expense, ExpenseFilter};

/// Look up the owner of `expense_id` and gate on it.
/// Denial happens before any access to the expense row.
async fn require_owner(
    store: &dyn Store,
    identity: &Identity,
    expense_id: i64,
) -> Result<(), AppError> {
    let owner = store
        .find_expense_owner(expense_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("expense {expense_id}")))?;
    if !authorize(identity, owner) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Record a new expense owned by the acting identity.
pub async fn add_expense(
    store: &dyn Store,
    identity: &Identity,
    amount: f64,
    description: &str,
) -> Result<Expense, AppError> {
    let expense = store.insert_expense(identity.id, amount, description).await?;
    counter!(keys::EXPENSE_CREATED).increment(1);
    Ok(expense)
}

/// List the acting identity's expenses, optionally for one month of one year.
pub async fn list_expenses(
    store: &dyn Store,
    identity: &Identity,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>, AppError> {
    store.list_expenses(identity.id, filter).await
}

/// Fetch a single expense, owner only.
pub async fn get_expense(
    store: &dyn Store,
    identity: &Identity,
    expense_id: i64,
) -> Result<Expense, AppError> {
    require_owner(store, identity, expense_id).await?;
    store
        .get_expense(expense_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("expense {expense_id}")))
}

/// Apply a new amount and description to an expense, owner only.
pub async fn update_expense(
    store: &dyn Store,
    identity: &Identity,
    expense_id: i64,
    amount: f64,
    description: &str,
) -> Result<Expense, AppError> {
    require_owner(store, identity, expense_id).await?;
    store.update_expense(expense_id, amount, description).await?;
    store
        .get_expense(expense_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("expense {expense_id}")))
}

/// Delete an expense, owner only.
pub async fn delete_expense(
    store: &dyn Store,
    identity: &Identity,
    expense_id: i64,
) -> Result<(), AppError> {
    require_owner(store, identity, expense_id).await?;
    store.delete_expense(expense_id).await
}
