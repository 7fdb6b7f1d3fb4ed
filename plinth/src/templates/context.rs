// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::nav::NavigationTree;
use minijinja::{Value, context};

/// View-model for full pages: caller data plus navigation, feature name
/// and the flash error taken from the query string.
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    data: Value,
    nav: &'a NavigationTree,
    feature: &'a str,
    error: Option<&'a str>,
}

impl<'a> PageContext<'a> {
    pub fn new(
        data: Value,
        nav: &'a NavigationTree,
        feature: &'a str,
        error: Option<&'a str>,
    ) -> Self {
        Self {
            data,
            nav,
            feature,
            error,
        }
    }

    pub fn to_value(&self) -> Value {
        context! {
            data => &self.data,
            nav_items => Value::from_serialize(self.nav),
            feature => self.feature,
            error => self.error
        }
    }
}

/// View-model for partials: caller data only.
#[derive(Debug, Clone)]
pub struct PartialContext {
    data: Value,
}

impl PartialContext {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn to_value(&self) -> Value {
        context! {
            data => &self.data
        }
    }
}
