// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use serde::Serialize;

/// One navigation entry: a link, a group of child entries, or a divider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: String,
    pub url: String,
    pub priority: i32,
    pub sub_items: Vec<NavItem>,
    pub is_divider: bool,
}

impl NavItem {
    pub fn link(title: &str, url: &str, priority: i32) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            priority,
            sub_items: Vec::new(),
            is_divider: false,
        }
    }

    pub fn group(title: &str, priority: i32, sub_items: Vec<NavItem>) -> Self {
        Self {
            title: title.to_string(),
            url: String::new(),
            priority,
            sub_items,
            is_divider: false,
        }
    }

    pub fn divider(priority: i32) -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            priority,
            sub_items: Vec::new(),
            is_divider: true,
        }
    }

    pub fn is_group(&self) -> bool {
        !self.sub_items.is_empty()
    }
}

/// Navigation aggregated across features at registration time.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NavigationTree {
    items: Vec<NavItem>,
}

impl NavigationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = NavItem>) {
        self.items.extend(items);
    }

    /// Stable sort by priority at every level.
    pub fn sorted(mut self) -> Self {
        sort_items(&mut self.items);
        self
    }

    pub fn items(&self) -> &[NavItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn sort_items(items: &mut [NavItem]) {
    items.sort_by_key(|item| item.priority);
    for item in items.iter_mut() {
        sort_items(&mut item.sub_items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorting_is_by_priority_and_stable() {
        let mut tree = NavigationTree::new();
        tree.extend(vec![NavItem::link("About", "/about", 20)]);
        tree.extend(vec![
            NavItem::link("Home", "/", 10),
            NavItem::link("Login", "/login", 20),
        ]);
        let tree = tree.sorted();
        let titles: Vec<&str> = tree.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Home", "About", "Login"]);
    }

    #[test]
    fn group_children_are_sorted() {
        let mut tree = NavigationTree::new();
        tree.extend(vec![NavItem::group(
            "About",
            1,
            vec![
                NavItem::link("Contact", "/about/contact", 2),
                NavItem::divider(1),
                NavItem::link("Team", "/about/team", 0),
            ],
        )]);
        let tree = tree.sorted();
        let group = &tree.items()[0];
        assert!(group.is_group());
        assert_eq!(group.sub_items[0].title, "Team");
        assert!(group.sub_items[1].is_divider);
        assert_eq!(group.sub_items[2].url, "/about/contact");
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut tree = NavigationTree::new();
        tree.extend(vec![NavItem::link("Home", "/", 0)]);
        let json = serde_json::to_value(&tree).expect("json");
        assert_eq!(json[0]["url"], "/");
        assert_eq!(json[0]["is_divider"], false);
    }
}
