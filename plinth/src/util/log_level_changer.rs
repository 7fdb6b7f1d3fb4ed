// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! Logger wrapper that lowers the level of chatty third-party targets before
//! the real backend filters them.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Records from targets starting with `target_prefix` at exactly `from` are
/// re-emitted at `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDemotion {
    pub target_prefix: &'static str,
    pub from: Level,
    pub to: Level,
}

impl LevelDemotion {
    pub const fn new(target_prefix: &'static str, from: Level, to: Level) -> Self {
        Self {
            target_prefix,
            from,
            to,
        }
    }

    fn applies(&self, target: &str, level: Level) -> bool {
        level == self.from && target.starts_with(self.target_prefix)
    }
}

struct DemotingLogger<L> {
    inner: L,
    demotions: &'static [LevelDemotion],
}

impl<L: Log> DemotingLogger<L> {
    fn adjusted(&self, target: &str, level: Level) -> Level {
        self.demotions
            .iter()
            .find(|demotion| demotion.applies(target, level))
            .map_or(level, |demotion| demotion.to)
    }
}

impl<L: Log> Log for DemotingLogger<L> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let level = self.adjusted(metadata.target(), metadata.level());
        if level == metadata.level() {
            return self.inner.enabled(metadata);
        }
        let demoted = Metadata::builder()
            .level(level)
            .target(metadata.target())
            .build();
        self.inner.enabled(&demoted)
    }

    fn log(&self, record: &Record) {
        let level = self.adjusted(record.target(), record.level());
        if level == record.level() {
            self.inner.log(record);
            return;
        }
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(record.target())
                .args(*record.args())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs `inner` as the global logger behind the demotion rules. The
/// global max level stays open; `inner` does the filtering.
pub fn install<L: Log + 'static>(
    inner: L,
    demotions: &'static [LevelDemotion],
) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(DemotingLogger { inner, demotions }))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
