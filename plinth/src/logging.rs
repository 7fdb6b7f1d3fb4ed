// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::util::log_level_changer::{self, LevelDemotion};
use log::{Level, LevelFilter, SetLoggerError};
use std::io::Write;

/// sqlx reports every statement at info; demote those to debug.
const DEMOTIONS: &[LevelDemotion] =
    &[LevelDemotion::new("sqlx::query", Level::Info, Level::Debug)];

pub fn parse_level_filter(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Installs the process logger: stdout, UTC millisecond timestamps.
pub fn init_logging(level: &str) -> Result<(), SetLoggerError> {
    let logger = env_logger::Builder::from_default_env()
        .filter_level(parse_level_filter(level))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();

    log_level_changer::install(logger, DEMOTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(parse_level_filter("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level_filter("verbose"), LevelFilter::Info);
    }
}
