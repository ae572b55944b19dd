// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const AUTH_REGISTERED: &str = "auth.registered";
pub const AUTH_LOGIN_SUCCESS: &str = "auth.login.success";
pub const AUTH_LOGIN_FAILURE: &str = "auth.login.failure";
pub const TOKEN_ISSUED: &str = "auth.token.issued";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const OWNERSHIP_DENIED: &str = "auth.ownership.denied";
pub const EXPENSE_CREATED: &str = "expense.created";
