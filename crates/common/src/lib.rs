// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the `spendtrack` backend and its clients.
//! This module defines the HTTP request/response bodies and supporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An expense record as it appears on the wire and in storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expense {
    /// Stable identifier assigned at creation
    pub id: i64,
    /// Identifier of the owning user
    pub user_id: i64,
    /// Amount spent
    pub amount: f64,
    /// Free-form description
    pub description: String,
    /// When the expense was recorded
    pub timestamp: DateTime<Utc>,
}

/// Body for `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Starting budget; defaults to 0 when omitted
    pub budget: Option<f64>,
}

/// Form body for `POST /api/auth/token`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful login.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Body for creating or updating an expense.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExpenseRequest {
    pub amount: f64,
    pub description: String,
}

/// Query parameters for listing expenses.
/// The filter only applies when both `month` and `year` are present.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Generic success envelope returned by mutating endpoints.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReturnMessage {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ReturnMessage {
    pub fn ok(message: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload,
        }
    }
}
