// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::clock::{Clock, truncate_to_millis};
use super::payload::{
    Payload, PayloadError, SessionValue, check_storable, decode_payload, encode_payload,
};
use super::store::{AuthStore, SessionRow};
use super::types::AuthError;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

const TOKEN_BYTES: usize = 32;

/// A live session as loaded from the store.
///
/// Payload edits on this value are local until passed to
/// [`SessionManager::save`] or made through [`SessionManager::set_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    data: Payload,
}

impl Session {
    pub fn payload(&self) -> &Payload {
        &self.data
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<SessionValue>) {
        self.data.insert(key.to_string(), value.into());
    }

    pub fn get_value(&self, key: &str) -> Option<&SessionValue> {
        self.data.get(key)
    }

    pub fn remove_value(&mut self, key: &str) -> Option<SessionValue> {
        self.data.remove(key)
    }

    pub fn get_string(&self, key: &str) -> Result<&str, PayloadError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| mismatch(key, "string", value))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, PayloadError> {
        let value = self.require(key)?;
        value.as_i64().ok_or_else(|| mismatch(key, "integer", value))
    }

    pub fn get_float(&self, key: &str) -> Result<f64, PayloadError> {
        let value = self.require(key)?;
        value.as_f64().ok_or_else(|| mismatch(key, "float", value))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, PayloadError> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| mismatch(key, "bool", value))
    }

    pub fn get_map(&self, key: &str) -> Result<&BTreeMap<String, SessionValue>, PayloadError> {
        let value = self.require(key)?;
        value.as_map().ok_or_else(|| mismatch(key, "map", value))
    }

    fn require(&self, key: &str) -> Result<&SessionValue, PayloadError> {
        self.data
            .get(key)
            .ok_or_else(|| PayloadError::Missing(key.to_string()))
    }

    fn to_row(&self) -> Result<SessionRow, PayloadError> {
        Ok(SessionRow {
            id: self.token.clone(),
            user_id: self.user_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
            data: encode_payload(&self.data)?,
        })
    }
}

fn mismatch(key: &str, expected: &'static str, found: &SessionValue) -> PayloadError {
    PayloadError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Issues, loads and expires sessions.
///
/// Payload writes are read-modify-write of the whole row with no locking.
/// Two requests writing under the same token race and the last write wins.
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: AuthStore,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: AuthStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, user_id: i64, ttl: Duration) -> Result<Session, AuthError> {
        let now = truncate_to_millis(self.clock.now());
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let session = Session {
            token: generate_token(),
            user_id,
            created_at: now,
            expires_at,
            data: Payload::new(),
        };
        self.store.insert_session(&session.to_row()?).await?;
        log::debug!(
            "Created session {} for user {}",
            token_prefix(&session.token),
            user_id
        );
        Ok(session)
    }

    /// Loads a session. A session at or past its expiry is deleted and
    /// reported as `Expired`; later lookups of the same token see `NotFound`.
    pub async fn get(&self, token: &str) -> Result<Session, AuthError> {
        let row = self.store.load_session(token).await?;
        if self.clock.now() >= row.expires_at {
            self.store.delete_session(token).await?;
            log::debug!("Session {} expired", token_prefix(token));
            return Err(AuthError::Expired);
        }
        Ok(Session {
            token: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
            data: decode_payload(&row.data)?,
        })
    }

    pub async fn delete(&self, token: &str) -> Result<(), AuthError> {
        self.store.delete_session(token).await
    }

    /// Re-persists the full row: payload and expiry.
    pub async fn save(&self, session: &Session) -> Result<(), AuthError> {
        self.store.update_session(&session.to_row()?).await
    }

    pub async fn set_value(
        &self,
        session: &mut Session,
        key: &str,
        value: impl Into<SessionValue>,
    ) -> Result<(), AuthError> {
        let value = value.into();
        check_storable(key, &value)?;
        session.set_value(key, value);
        self.save(session).await
    }

    pub fn get_value<'a>(&self, session: &'a Session, key: &str) -> Option<&'a SessionValue> {
        session.get_value(key)
    }

    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let purged = self.store.delete_sessions_before(self.clock.now()).await?;
        if purged > 0 {
            log::info!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
