// ============================
// spendtrack-backend-lib/src/store.rs
// ============================
//! Data-access abstraction with a SQLite implementation.
//!
//! Tables:
//! - `users`: username, password_hash, budget
//! - `expenses`: user_id, amount, description, timestamp
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

use crate::error::AppError;
use spendtrack_common::{Expense, ExpenseFilter};

/// A stored user row, including the credential hash.
/// Never serialized; the hash must not leave the library.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub budget: f64,
}

/// Trait for data-access backends. Each request acquires the handle,
/// performs its reads/writes, and releases it on completion.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a user by exact (case-sensitive) username
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError>;

    /// Look up a user by id
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, AppError>;

    /// Insert a new user; fails with `AlreadyExists` on a duplicate username
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        budget: f64,
    ) -> Result<UserRecord, AppError>;

    /// Delete a user and all of their expenses
    async fn delete_user(&self, user_id: i64) -> Result<(), AppError>;

    /// Return the owning user id of an expense, if the expense exists
    async fn find_expense_owner(&self, expense_id: i64) -> Result<Option<i64>, AppError>;

    /// Insert a new expense owned by `user_id`
    async fn insert_expense(
        &self,
        user_id: i64,
        amount: f64,
        description: &str,
    ) -> Result<Expense, AppError>;

    /// Fetch a single expense by id
    async fn get_expense(&self, expense_id: i64) -> Result<Option<Expense>, AppError>;

    /// List a user's expenses, optionally filtered to one month of one year
    async fn list_expenses(
        &self,
        user_id: i64,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, AppError>;

    /// Overwrite an expense's amount and description
    async fn update_expense(
        &self,
        expense_id: i64,
        amount: f64,
        description: &str,
    ) -> Result<(), AppError>;

    /// Delete an expense
    async fn delete_expense(&self, expense_id: i64) -> Result<(), AppError>;
}

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        // AUTOINCREMENT so ids are never reused, even after deletes
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                budget REAL NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_expenses_user ON expenses(user_id);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        budget: row.get(3)?,
    })
}

fn row_to_expense(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let raw: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        timestamp,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT id, username, password_hash, budget FROM users WHERE username = ?1",
            rusqlite::params![username],
            row_to_user,
        );
        match row {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, AppError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT id, username, password_hash, budget FROM users WHERE id = ?1",
            rusqlite::params![user_id],
            row_to_user,
        );
        match row {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        budget: f64,
    ) -> Result<UserRecord, AppError> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (username, password_hash, budget) VALUES (?1, ?2, ?3)",
            rusqlite::params![username, password_hash, budget],
        );
        match result {
            Ok(_) => Ok(UserRecord {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                budget,
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AppError::AlreadyExists)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), AppError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![user_id])?;
        Ok(())
    }

    async fn find_expense_owner(&self, expense_id: i64) -> Result<Option<i64>, AppError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT user_id FROM expenses WHERE id = ?1",
            rusqlite::params![expense_id],
            |row| row.get(0),
        );
        match row {
            Ok(owner) => Ok(Some(owner)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_expense(
        &self,
        user_id: i64,
        amount: f64,
        description: &str,
    ) -> Result<Expense, AppError> {
        let timestamp = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO expenses (user_id, amount, description, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, amount, description, timestamp.to_rfc3339()],
        )?;
        Ok(Expense {
            id: conn.last_insert_rowid(),
            user_id,
            amount,
            description: description.to_string(),
            timestamp,
        })
    }

    async fn get_expense(&self, expense_id: i64) -> Result<Option<Expense>, AppError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT id, user_id, amount, description, timestamp
             FROM expenses WHERE id = ?1",
            rusqlite::params![expense_id],
            row_to_expense,
        );
        match row {
            Ok(expense) => Ok(Some(expense)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_expenses(
        &self,
        user_id: i64,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, AppError> {
        let conn = self.conn.lock();
        let mut expenses = Vec::new();
        // The filter only applies when both month and year are given
        if let (Some(month), Some(year)) = (filter.month, filter.year) {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, amount, description, timestamp
                 FROM expenses
                 WHERE user_id = ?1
                   AND CAST(strftime('%m', timestamp) AS INTEGER) = ?2
                   AND CAST(strftime('%Y', timestamp) AS INTEGER) = ?3
                 ORDER BY id",
            )?;
            let rows = stmt.query_map(rusqlite::params![user_id, month, year], row_to_expense)?;
            for row in rows {
                expenses.push(row?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, amount, description, timestamp
                 FROM expenses WHERE user_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(rusqlite::params![user_id], row_to_expense)?;
            for row in rows {
                expenses.push(row?);
            }
        }
        Ok(expenses)
    }

    async fn update_expense(
        &self,
        expense_id: i64,
        amount: f64,
        description: &str,
    ) -> Result<(), AppError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE expenses SET amount = ?1, description = ?2 WHERE id = ?3",
            rusqlite::params![amount, description, expense_id],
        )?;
        Ok(())
    }

    async fn delete_expense(&self, expense_id: i64) -> Result<(), AppError> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM expenses WHERE id = ?1",
            rusqlite::params![expense_id],
        )?;
        Ok(())
    }
}
