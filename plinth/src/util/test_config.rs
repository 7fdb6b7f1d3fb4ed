// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
#![allow(dead_code)]

use crate::auth::PasswordParams;
use crate::config::{
    AppConfig, AuthConfig, LoggingConfig, TemplatesConfig, ValidatedConfig,
    ValidatedServerConfig,
};
use crate::database::DatabaseConfig;
use std::path::{Path, PathBuf};

/// Smallest argon2 cost the library accepts. Tests only.
pub const TEST_PASSWORD_PARAMS: PasswordParams = PasswordParams {
    memory_kib: 8,
    iterations: 1,
    parallelism: 1,
};

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                root: PathBuf::from("."),
                app: AppConfig {
                    name: "Plinth Test".to_string(),
                },
                server: ValidatedServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5466,
                    workers: 1,
                },
                dev_mode: true,
                auth: AuthConfig {
                    database_path: "data/auth.db".to_string(),
                    session_ttl_hours: 24,
                    login_path: "/login".to_string(),
                    secure_cookies: true,
                    password: TEST_PASSWORD_PARAMS,
                },
                database: None,
                templates: TemplatesConfig::default(),
                static_dir: "static".to_string(),
                logging: LoggingConfig::default(),
            },
        }
    }

    pub fn with_root(mut self, root: &Path) -> Self {
        self.config.root = root.to_path_buf();
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    pub fn with_login_path(mut self, path: &str) -> Self {
        self.config.auth.login_path = path.to_string();
        self
    }

    pub fn with_session_ttl_hours(mut self, hours: i64) -> Self {
        self.config.auth.session_ttl_hours = hours;
        self
    }

    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = Some(database);
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
