// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::auth::PasswordParams;
use crate::database::DatabaseConfig;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEV_PORT: u16 = 3000;
pub const PRODUCTION_PORT: u16 = 8080;
/// One year. Longer grants are refused at startup.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
const PLACEHOLDER_DB_PASSWORD: &str = "password";

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_dev_mode")]
    pub dev_mode: bool,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_dev_mode() -> bool {
    true
}

fn default_static_dir() -> String {
    "static".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
}

fn default_app_name() -> String {
    "Plinth".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Unset means 3000 in dev mode and 8080 in production.
    pub port: Option<u16>,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_workers() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ValidatedServerConfig {
    pub fn address_tuple(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_auth_database_path")]
    pub database_path: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
    #[serde(default)]
    pub password: PasswordParams,
}

fn default_auth_database_path() -> String {
    "data/auth.db".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            database_path: default_auth_database_path(),
            session_ttl_hours: default_session_ttl_hours(),
            login_path: default_login_path(),
            secure_cookies: default_secure_cookies(),
            password: PasswordParams::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplatesConfig {
    #[serde(default = "default_base_layout")]
    pub base_layout: String,
}

fn default_base_layout() -> String {
    "templates/layouts/base.html".to_string()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            base_layout: default_base_layout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Runtime root; relative paths in the config resolve against it.
    pub root: PathBuf,
    pub app: AppConfig,
    pub server: ValidatedServerConfig,
    pub dev_mode: bool,
    pub auth: AuthConfig,
    pub database: Option<DatabaseConfig>,
    pub templates: TemplatesConfig,
    pub static_dir: String,
    pub logging: LoggingConfig,
}

impl ValidatedConfig {
    pub fn is_production(&self) -> bool {
        !self.dev_mode
    }

    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn auth_database_path(&self) -> PathBuf {
        self.resolve_path(&self.auth.database_path)
    }

    pub fn base_layout_path(&self) -> PathBuf {
        self.resolve_path(&self.templates.base_layout)
    }

    pub fn static_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.static_dir)
    }

    /// Values above [`MAX_SESSION_TTL_HOURS`] never pass validation; a
    /// hand-built config holding one is capped there.
    pub fn session_ttl(&self) -> chrono::Duration {
        let hours = self.auth.session_ttl_hours.min(MAX_SESSION_TTL_HOURS);
        chrono::TimeDelta::try_hours(hours)
            .unwrap_or_else(|| chrono::TimeDelta::hours(MAX_SESSION_TTL_HOURS))
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate(root)
    }

    pub fn validate(self, root: &Path) -> Result<ValidatedConfig, ConfigError> {
        if self.server.workers < 1 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        if self.auth.session_ttl_hours < 1 {
            return Err(ConfigError::ValidationError(format!(
                "auth.session_ttl_hours must be at least 1, got: {}",
                self.auth.session_ttl_hours
            )));
        }

        if self.auth.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "auth.session_ttl_hours must be at most {}, got: {}",
                MAX_SESSION_TTL_HOURS, self.auth.session_ttl_hours
            )));
        }

        if !self.auth.login_path.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "auth.login_path must start with '/', got: {}",
                self.auth.login_path
            )));
        }

        self.auth
            .password
            .validate()
            .map_err(ConfigError::ValidationError)?;

        if let Some(database) = self.database.as_ref() {
            if !self.dev_mode && database.password == PLACEHOLDER_DB_PASSWORD {
                return Err(ConfigError::ValidationError(
                    "database.password must be changed from the placeholder value in production"
                        .to_string(),
                ));
            }
            if database.max_connections < 1 {
                return Err(ConfigError::ValidationError(
                    "database.max_connections must be at least 1".to_string(),
                ));
            }
        }

        if !self.dev_mode && !self.auth.secure_cookies {
            warn!("auth.secure_cookies is disabled in production; session cookies will be sent over plain HTTP");
        }

        let port = self.server.port.unwrap_or(if self.dev_mode {
            DEV_PORT
        } else {
            PRODUCTION_PORT
        });

        Ok(ValidatedConfig {
            root: root.to_path_buf(),
            app: self.app,
            server: ValidatedServerConfig {
                host: self.server.host,
                port,
                workers: self.server.workers,
            },
            dev_mode: self.dev_mode,
            auth: self.auth,
            database: self.database,
            templates: self.templates,
            static_dir: self.static_dir,
            logging: self.logging,
        })
    }
}
