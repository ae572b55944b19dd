// ============================
// spendtrack-backend-lib/src/auth/mod.rs
// ============================
//! Authentication and authorization module.

pub mod password;
pub mod rate_limit;
mod service;
pub mod token;

use serde::Serialize;

pub use password::{hash_password, hash_password_secure, verify_password};
pub use rate_limit::AuthRateLimiter;
pub use service::{authenticate, authorize, issue_token, register, resolve_identity};
pub use token::{Claims, TokenError};

use crate::store::UserRecord;

/// A resolved, authenticated user.
///
/// The password hash never appears here; this is the only user shape that
/// leaves the library.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub budget: f64,
}

impl From<UserRecord> for Identity {
    fn from(record: UserRecord) -> Self {
        Identity {
            id: record.id,
            username: record.username,
            budget: record.budget,
        }
    }
}
