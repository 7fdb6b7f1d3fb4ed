// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! Demo features shipped with the server binary.

pub mod about;
pub mod home;
pub mod users;

use crate::feature::Feature;

/// Every demo feature in registration order.
pub fn all() -> Vec<Feature> {
    vec![home::feature(), about::feature(), users::feature()]
}
