// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! SQLite persistence for users and sessions.
//!
//! Timestamps are stored as unix milliseconds. Session payloads are stored
//! as JSON text and decoded by the session layer.

use super::types::{AuthError, User};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
];

type UserRow = (i64, String, String, String, i64);

/// Raw session row as persisted.
#[derive(Debug, Clone)]
pub(crate) struct SessionRow {
    pub id: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct AuthStore {
    pool: SqlitePool,
}

impl AuthStore {
    /// Opens (creating if needed) the database file and applies the schema.
    pub async fn open(path: &Path) -> Result<Self, AuthError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| {
                AuthError::Store(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    err
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        log::info!("Auth store ready at {}", path.display());
        Ok(store)
    }

    /// Private in-memory database. A single pinned connection keeps it alive.
    pub async fn open_in_memory() -> Result<Self, AuthError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), AuthError> {
        for statement in CREATE_TABLES {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                name: name.to_string(),
                created_at,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AuthError::DuplicateEmail)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn user_by_email(&self, email: &str) -> Result<User, AuthError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).ok_or(AuthError::NotFound)
    }

    pub(crate) async fn user_by_id(&self, id: i64) -> Result<User, AuthError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).ok_or(AuthError::NotFound)
    }

    pub(crate) async fn insert_session(&self, row: &SessionRow) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at, data) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(row.user_id)
        .bind(row.created_at.timestamp_millis())
        .bind(row.expires_at.timestamp_millis())
        .bind(&row.data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn load_session(&self, id: &str) -> Result<SessionRow, AuthError> {
        let row: Option<(String, i64, i64, i64, String)> = sqlx::query_as(
            "SELECT id, user_id, created_at, expires_at, data FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let (id, user_id, created_at, expires_at, data) = row.ok_or(AuthError::NotFound)?;
        Ok(SessionRow {
            id,
            user_id,
            created_at: from_millis(created_at),
            expires_at: from_millis(expires_at),
            data,
        })
    }

    /// Rewrites expiry and payload. A row deleted in the meantime yields `NotFound`.
    pub(crate) async fn update_session(&self, row: &SessionRow) -> Result<(), AuthError> {
        let done = sqlx::query("UPDATE sessions SET expires_at = ?, data = ? WHERE id = ?")
            .bind(row.expires_at.timestamp_millis())
            .bind(&row.data)
            .bind(&row.id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub(crate) async fn delete_session(&self, id: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes every session whose expiry is at or before `cutoff`.
    pub(crate) async fn delete_sessions_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AuthError> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

fn user_from_row((id, email, password_hash, name, created_at): UserRow) -> User {
    User {
        id,
        email,
        password_hash,
        name,
        created_at: from_millis(created_at),
    }
}

fn from_millis(value: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value).unwrap_or_default()
}
