// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::clock::{Clock, truncate_to_millis};
use super::password::{PasswordParams, hash_password, run_blocking, verify_password};
use super::store::AuthStore;
use super::types::{AuthError, User};
use std::sync::Arc;

/// User records and password hashes.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    store: AuthStore,
    params: PasswordParams,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(store: AuthStore, params: PasswordParams, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            params,
            clock,
        }
    }

    pub fn params(&self) -> &PasswordParams {
        &self.params
    }

    /// Hashes the password and inserts the user. The store assigns the id.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let params = self.params;
        let password = password.to_string();
        let password_hash = run_blocking(move || hash_password(&password, &params)).await?;
        let created_at = truncate_to_millis(self.clock.now());
        let user = self
            .store
            .insert_user(email, &password_hash, name, created_at)
            .await?;
        log::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.store.user_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, AuthError> {
        self.store.user_by_id(id).await
    }

    /// Compares a plaintext password with a stored hash on the blocking pool.
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let hash = hash.to_string();
        run_blocking(move || verify_password(&password, &hash)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;

    fn cheap_params() -> PasswordParams {
        PasswordParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    async fn credentials() -> CredentialStore {
        let store = AuthStore::open_in_memory().await.expect("store");
        CredentialStore::new(store, cheap_params(), Arc::new(FixedClock::default()))
    }

    #[actix_web::test]
    async fn created_user_has_hashed_password() {
        let creds = credentials().await;
        let user = creds
            .create_user("ada@example.com", "pw", "Ada")
            .await
            .expect("create");
        assert!(user.id > 0);
        assert_ne!(user.password_hash, "pw");

        let fetched = creds
            .get_user_by_email("ada@example.com")
            .await
            .expect("fetch");
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.created_at, user.created_at);
        assert!(
            creds
                .verify_password("pw", &fetched.password_hash)
                .await
                .expect("verify")
        );
    }

    #[actix_web::test]
    async fn user_ids_are_distinct() {
        let creds = credentials().await;
        let a = creds.create_user("a@example.com", "pw", "A").await.expect("a");
        let b = creds.create_user("b@example.com", "pw", "B").await.expect("b");
        assert_ne!(a.id, b.id);
        assert_eq!(creds.get_user_by_id(b.id).await.expect("b").email, "b@example.com");
    }
}
