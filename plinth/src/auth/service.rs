// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::clock::{Clock, SystemClock};
use super::credentials::CredentialStore;
use super::password::{PasswordParams, hash_password, run_blocking};
use super::session::{Session, SessionManager};
use super::store::AuthStore;
use super::types::{AuthError, User};
use crate::config::ValidatedConfig;
use chrono::Duration;
use std::sync::Arc;

const DUMMY_PASSWORD: &str = "plinth-dummy-password";

/// Checks email/password pairs and registers users.
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: CredentialStore,
    // Verified against when the email is unknown, so both failure paths
    // spend the same hashing time.
    dummy_hash: Arc<str>,
}

impl Authenticator {
    pub async fn new(credentials: CredentialStore) -> Result<Self, AuthError> {
        let params = *credentials.params();
        let dummy_hash = run_blocking(move || hash_password(DUMMY_PASSWORD, &params)).await?;
        Ok(Self {
            credentials,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn validate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.credentials.get_user_by_email(email).await {
            Ok(user) => user,
            Err(AuthError::NotFound) => {
                let _ = self
                    .credentials
                    .verify_password(password, &self.dummy_hash)
                    .await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(err),
        };

        if self
            .credentials
            .verify_password(password, &user.password_hash)
            .await?
        {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        self.credentials.create_user(email, password, name).await
    }

    pub async fn user_by_id(&self, id: i64) -> Result<User, AuthError> {
        self.credentials.get_user_by_id(id).await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.credentials.get_user_by_email(email).await
    }
}

/// The authenticator and session manager pair handed to feature code.
#[derive(Debug, Clone)]
pub struct AuthService {
    authenticator: Authenticator,
    sessions: SessionManager,
    session_ttl: Duration,
}

impl AuthService {
    pub async fn new(
        store: AuthStore,
        params: PasswordParams,
        session_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let credentials = CredentialStore::new(store.clone(), params, clock.clone());
        let authenticator = Authenticator::new(credentials).await?;
        Ok(Self {
            authenticator,
            sessions: SessionManager::new(store, clock),
            session_ttl,
        })
    }

    /// Opens the SQLite auth store named in the config.
    pub async fn open(config: &ValidatedConfig) -> Result<Self, AuthError> {
        let store = AuthStore::open(&config.auth_database_path()).await?;
        Self::new(
            store,
            config.auth.password,
            config.session_ttl(),
            Arc::new(SystemClock),
        )
        .await
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, Session), AuthError> {
        let user = self.authenticator.validate(email, password).await?;
        let session = self.sessions.create(user.id, self.session_ttl).await?;
        log::info!("User {} logged in", user.id);
        Ok((user, session))
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(User, Session), AuthError> {
        let user = self.authenticator.register(email, password, name).await?;
        let session = self.sessions.create(user.id, self.session_ttl).await?;
        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await
    }

    /// One session lookup, then one user lookup. A session whose owner is
    /// gone resolves as `NotFound`.
    pub async fn resolve(&self, token: &str) -> Result<(Session, User), AuthError> {
        let session = self.sessions.get(token).await?;
        let user = self.authenticator.user_by_id(session.user_id).await?;
        Ok((session, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;

    async fn service() -> AuthService {
        let store = AuthStore::open_in_memory().await.expect("store");
        let params = PasswordParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        };
        AuthService::new(
            store,
            params,
            Duration::hours(24),
            Arc::new(FixedClock::default()),
        )
        .await
        .expect("service")
    }

    #[actix_web::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let auth = service().await;
        auth.authenticator()
            .register("alice@example.com", "pw123", "Alice")
            .await
            .expect("register");

        let ok = auth
            .authenticator()
            .validate("alice@example.com", "pw123")
            .await
            .expect("valid");
        assert_eq!(ok.name, "Alice");

        let wrong = auth
            .authenticator()
            .validate("alice@example.com", "wrong")
            .await
            .expect_err("wrong password");
        let unknown = auth
            .authenticator()
            .validate("bob@example.com", "x")
            .await
            .expect_err("unknown email");
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[actix_web::test]
    async fn duplicate_registration_is_distinguishable() {
        let auth = service().await;
        auth.register("a@example.com", "pw", "A")
            .await
            .expect("first");
        assert!(matches!(
            auth.register("a@example.com", "pw", "A").await,
            Err(AuthError::DuplicateEmail)
        ));
    }

    #[actix_web::test]
    async fn login_issues_a_resolvable_session() {
        let auth = service().await;
        auth.register("a@example.com", "pw", "A")
            .await
            .expect("register");
        let (user, session) = auth.login("a@example.com", "pw").await.expect("login");
        let (resolved, resolved_user) = auth.resolve(&session.token).await.expect("resolve");
        assert_eq!(resolved.token, session.token);
        assert_eq!(resolved_user.id, user.id);

        auth.logout(&session.token).await.expect("logout");
        assert!(matches!(
            auth.resolve(&session.token).await,
            Err(AuthError::NotFound)
        ));
    }
}
