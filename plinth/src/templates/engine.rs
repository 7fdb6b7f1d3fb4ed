// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::TemplateError;
use minijinja::Value;

/// Render seam used by request handlers.
pub trait TemplateEngine: Send + Sync {
    /// Renders the `feature:page` chain into a complete buffered body.
    fn render_page(
        &self,
        feature: &str,
        page: &str,
        data: Value,
        error: Option<&str>,
    ) -> Result<String, TemplateError>;

    fn render_partial(
        &self,
        feature: &str,
        partial: &str,
        data: Value,
    ) -> Result<String, TemplateError>;
}
