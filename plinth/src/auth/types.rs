// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::payload::PayloadError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A registered account. The hash never leaves the process in serialized form.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum AuthError {
    NotFound,
    Expired,
    DuplicateEmail,
    InvalidCredentials,
    Store(String),
    Hash(String),
    Payload(PayloadError),
    ExpiryOutOfRange,
}

impl AuthError {
    /// True for the outcomes that should send a visitor to the login page
    /// rather than surface as a server fault.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::NotFound | AuthError::Expired | AuthError::InvalidCredentials
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotFound => write!(f, "Not found"),
            AuthError::Expired => write!(f, "Session expired"),
            AuthError::DuplicateEmail => write!(f, "Email is already registered"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Store(msg) => write!(f, "Auth store error: {}", msg),
            AuthError::Hash(msg) => write!(f, "Password hashing error: {}", msg),
            AuthError::Payload(err) => write!(f, "Session payload error: {}", err),
            AuthError::ExpiryOutOfRange => write!(f, "Session lifetime exceeds the clock range"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl From<PayloadError> for AuthError {
    fn from(err: PayloadError) -> Self {
        AuthError::Payload(err)
    }
}
