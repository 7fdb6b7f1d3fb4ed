// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! Optional MySQL pool for feature business data.
//!
//! Failure to reach this store never stops the server: features that need it
//! see `None` from `Application::db`.

use serde::Deserialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_max_lifetime_seconds")]
    pub max_lifetime_seconds: u64,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_max_connections() -> u32 {
    25
}

fn default_max_lifetime_seconds() -> u64 {
    300
}

fn default_connect_timeout_seconds() -> u64 {
    5
}

impl DatabaseConfig {
    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }

    /// `user@host:port/name` with the password left out.
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

#[derive(Debug)]
pub enum DatabaseError {
    Unavailable(String),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::Unavailable(msg) => write!(f, "Database unavailable: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Opens the pool and checks it with a round trip.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

        log::info!("Connected to database {}", config.display_target());
        Ok(Self { pool })
    }

    /// Connects when configured. Failure is logged and yields `None`.
    pub async fn connect_optional(config: Option<&DatabaseConfig>) -> Option<Self> {
        let config = config?;
        match Self::connect(config).await {
            Ok(db) => Some(db),
            Err(e) => {
                log::warn!(
                    "Failed to initialize database {}: {}; continuing without it",
                    config.display_target(),
                    e
                );
                None
            }
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
