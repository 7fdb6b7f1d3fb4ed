// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use std::fmt;

mod context;
mod engine;
mod registry;

pub use context::{PageContext, PartialContext};
pub use engine::TemplateEngine;
pub use registry::{HelperInstaller, TemplateCache, TemplateRegistry, TemplateRegistryBuilder};

#[derive(Debug)]
pub enum TemplateError {
    /// A feature's chain or partial set could not be assembled. Fatal at startup.
    CompileFailure { feature: String, reason: String },
    /// No chain or partial under the given key.
    NotFound(String),
    Render(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::CompileFailure { feature, reason } => {
                write!(f, "Failed to compile templates for feature '{}': {}", feature, reason)
            }
            TemplateError::NotFound(key) => write!(f, "Template not found: {}", key),
            TemplateError::Render(msg) => write!(f, "Template render error: {}", msg),
        }
    }
}

impl std::error::Error for TemplateError {}
