// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! Compiled template chains and partial sets.
//!
//! Each feature gets its own minijinja environment holding the shared base
//! shell, the feature layout, its pages and its partials. Layouts extend
//! `base.html` and pages extend `layout.html` implicitly, so a block defined
//! by a page overrides the same block in the layout and the base shell.
//! A builder is filled during the single-threaded startup phase and frozen
//! into an immutable [`TemplateRegistry`].

use super::context::{PageContext, PartialContext};
use super::engine::TemplateEngine;
use super::TemplateError;
use crate::nav::{NavItem, NavigationTree};
use minijinja::{Environment, Value, default_auto_escape_callback};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

const BASE_NAME: &str = "base.html";
const LAYOUT_NAME: &str = "layout.html";
const PARTIALS_DIR: &str = "partials";

/// Installs filters, functions or globals into every feature environment.
pub type HelperInstaller = Arc<dyn Fn(&mut Environment<'static>) + Send + Sync>;

struct FeatureTemplates {
    env: Environment<'static>,
    pages: BTreeSet<String>,
    partials: BTreeSet<String>,
}

pub struct TemplateRegistryBuilder {
    base_layout: PathBuf,
    helpers: Vec<HelperInstaller>,
    features: HashMap<String, FeatureTemplates>,
    nav: NavigationTree,
}

impl TemplateRegistryBuilder {
    pub fn new(base_layout: impl Into<PathBuf>) -> Self {
        Self {
            base_layout: base_layout.into(),
            helpers: Vec::new(),
            features: HashMap::new(),
            nav: NavigationTree::new(),
        }
    }

    /// Helpers apply to features registered after this call.
    pub fn register_helper(&mut self, helper: HelperInstaller) {
        self.helpers.push(helper);
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Compiles every page chain and the partial set under `{root}/templates`.
    /// Nothing is recorded for the feature unless all chains compile.
    pub fn register_feature(
        &mut self,
        name: &str,
        root: &Path,
        nav_items: &[NavItem],
    ) -> Result<(), TemplateError> {
        let fail = |reason: String| TemplateError::CompileFailure {
            feature: name.to_string(),
            reason,
        };

        if self.has_feature(name) {
            return Err(fail("feature already registered".to_string()));
        }

        log::info!("Registering templates for feature: {}", name);
        let templates_dir = root.join("templates");
        let pages = match discover_html(&templates_dir) {
            Ok(pages) => pages,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Feature {} has no templates directory", name);
                Vec::new()
            }
            Err(err) => return Err(fail(format!("{}: {}", templates_dir.display(), err))),
        }
        .into_iter()
            .filter(|page| page != "layout")
            .collect::<BTreeSet<_>>();

        let mut env = Environment::new();
        env.set_auto_escape_callback(default_auto_escape_callback);
        for helper in &self.helpers {
            helper(&mut env);
        }

        let base = read_source(&self.base_layout).map_err(&fail)?;
        env.add_template_owned(BASE_NAME, base)
            .map_err(|err| fail(err.to_string()))?;

        if !pages.is_empty() {
            let layout = read_source(&templates_dir.join(LAYOUT_NAME)).map_err(&fail)?;
            env.add_template_owned(LAYOUT_NAME, with_parent(layout, BASE_NAME))
                .map_err(|err| fail(err.to_string()))?;
        }

        for page in &pages {
            log::debug!("Processing page: {}", page);
            let source =
                read_source(&templates_dir.join(format!("{}.html", page))).map_err(&fail)?;
            env.add_template_owned(page_template(page), with_parent(source, LAYOUT_NAME))
                .map_err(|err| fail(format!("{}.html: {}", page, err)))?;
            log::debug!("Cached template chain: {}:{}", name, page);
        }

        let partials = self.load_partials(&mut env, name, &templates_dir.join(PARTIALS_DIR))?;

        self.nav.extend(nav_items.iter().cloned());
        self.features.insert(
            name.to_string(),
            FeatureTemplates {
                env,
                pages,
                partials,
            },
        );
        Ok(())
    }

    fn load_partials(
        &self,
        env: &mut Environment<'static>,
        feature: &str,
        dir: &Path,
    ) -> Result<BTreeSet<String>, TemplateError> {
        if !dir.is_dir() {
            log::debug!("No partials directory for feature {}", feature);
            return Ok(BTreeSet::new());
        }

        let names = discover_html(dir).map_err(|err| TemplateError::CompileFailure {
            feature: feature.to_string(),
            reason: format!("{}: {}", dir.display(), err),
        })?;
        if names.is_empty() {
            log::debug!("Partials directory for feature {} is empty", feature);
            return Ok(BTreeSet::new());
        }

        let mut partials = BTreeSet::new();
        for partial in names {
            let source = read_source(&dir.join(format!("{}.html", partial))).map_err(|reason| {
                TemplateError::CompileFailure {
                    feature: feature.to_string(),
                    reason,
                }
            })?;
            env.add_template_owned(partial_template(&partial), source)
                .map_err(|err| TemplateError::CompileFailure {
                    feature: feature.to_string(),
                    reason: format!("partials/{}.html: {}", partial, err),
                })?;
            partials.insert(partial);
        }
        log::info!("Loaded {} partials for feature {}", partials.len(), feature);
        Ok(partials)
    }

    pub fn build(self) -> TemplateRegistry {
        TemplateRegistry {
            features: self.features,
            nav: self.nav.sorted(),
        }
    }
}

/// Immutable set of compiled chains and partials, safe for concurrent rendering.
pub struct TemplateRegistry {
    features: HashMap<String, FeatureTemplates>,
    nav: NavigationTree,
}

impl TemplateRegistry {
    pub fn navigation(&self) -> &NavigationTree {
        &self.nav
    }

    pub fn has_chain(&self, feature: &str, page: &str) -> bool {
        self.features
            .get(feature)
            .is_some_and(|templates| templates.pages.contains(page))
    }

    /// Every cached chain as `feature:page`, sorted.
    pub fn chain_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .features
            .iter()
            .flat_map(|(feature, templates)| {
                templates
                    .pages
                    .iter()
                    .map(move |page| format!("{}:{}", feature, page))
            })
            .collect();
        keys.sort();
        keys
    }

    pub fn partial_names(&self, feature: &str) -> Vec<String> {
        self.features
            .get(feature)
            .map(|templates| templates.partials.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl TemplateEngine for TemplateRegistry {
    fn render_page(
        &self,
        feature: &str,
        page: &str,
        data: Value,
        error: Option<&str>,
    ) -> Result<String, TemplateError> {
        let templates = self
            .features
            .get(feature)
            .filter(|templates| templates.pages.contains(page))
            .ok_or_else(|| TemplateError::NotFound(format!("{}:{}", feature, page)))?;
        let tmpl = templates
            .env
            .get_template(&page_template(page))
            .map_err(|err| TemplateError::Render(err.to_string()))?;
        let ctx = PageContext::new(data, &self.nav, feature, error).to_value();
        tmpl.render(ctx)
            .map_err(|err| TemplateError::Render(err.to_string()))
    }

    fn render_partial(
        &self,
        feature: &str,
        partial: &str,
        data: Value,
    ) -> Result<String, TemplateError> {
        let templates = self
            .features
            .get(feature)
            .filter(|templates| templates.partials.contains(partial))
            .ok_or_else(|| TemplateError::NotFound(format!("{}/{}", feature, partial)))?;
        let tmpl = templates
            .env
            .get_template(&partial_template(partial))
            .map_err(|err| TemplateError::Render(err.to_string()))?;
        tmpl.render(PartialContext::new(data).to_value())
            .map_err(|err| TemplateError::Render(err.to_string()))
    }
}

/// Holder for the live registry. Re-registration after startup builds a
/// whole new registry and swaps it in; in-flight renders keep the old one.
pub struct TemplateCache {
    current: RwLock<Arc<TemplateRegistry>>,
}

impl TemplateCache {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn current(&self) -> Arc<TemplateRegistry> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the registry and returns the previous one.
    pub fn swap(&self, registry: TemplateRegistry) -> Arc<TemplateRegistry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }
}

impl TemplateEngine for TemplateCache {
    fn render_page(
        &self,
        feature: &str,
        page: &str,
        data: Value,
        error: Option<&str>,
    ) -> Result<String, TemplateError> {
        self.current().render_page(feature, page, data, error)
    }

    fn render_partial(
        &self,
        feature: &str,
        partial: &str,
        data: Value,
    ) -> Result<String, TemplateError> {
        self.current().render_partial(feature, partial, data)
    }
}

fn page_template(page: &str) -> String {
    format!("pages/{}.html", page)
}

fn partial_template(partial: &str) -> String {
    format!("{}/{}.html", PARTIALS_DIR, partial)
}

/// Sorted stems of the `.html` files directly inside `dir`.
fn discover_html(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("html") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn read_source(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("{}: {}", path.display(), err))
}

fn with_parent(source: String, parent: &str) -> String {
    let head = source.trim_start();
    if head.starts_with("{% extends") || head.starts_with("{%- extends") {
        return source;
    }
    format!("{{% extends \"{}\" %}}\n{}", parent, source)
}
