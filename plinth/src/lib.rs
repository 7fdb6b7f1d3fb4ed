// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod feature;
pub mod features;
pub mod headers;
pub mod logging;
pub mod nav;
pub mod templates;
pub mod util;
