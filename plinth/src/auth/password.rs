// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::types::AuthError;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    rand_core::RngCore,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::Deserialize;

const SALT_LEN: usize = 16;

/// Argon2id cost parameters used when hashing new passwords.
/// Verification reads the parameters embedded in the stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PasswordParams {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    Params::DEFAULT_M_COST
}

fn default_iterations() -> u32 {
    Params::DEFAULT_T_COST
}

fn default_parallelism() -> u32 {
    Params::DEFAULT_P_COST
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl PasswordParams {
    pub fn validate(&self) -> Result<(), String> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map(|_| ())
            .map_err(|err| format!("invalid argon2 parameters: {}", err))
    }
}

/// Produces a PHC-formatted argon2id hash with a fresh random salt.
pub fn hash_password(password: &str, params: &PasswordParams) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| AuthError::Hash(err.to_string()))?;
    let argon2 = build_argon2(params)?;
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Hash(err.to_string()))?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| AuthError::Hash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn build_argon2(params: &PasswordParams) -> Result<Argon2<'static>, AuthError> {
    let argon2_params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
        .map_err(|err| AuthError::Hash(err.to_string()))?;
    Ok(Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        argon2_params,
    ))
}

/// Runs CPU-heavy hashing off the async workers.
pub(crate) async fn run_blocking<F, T>(task: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    actix_web::web::block(task)
        .await
        .map_err(|err| AuthError::Hash(err.to_string()))?
}
