// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::app::Application;
use crate::nav::NavItem;
use actix_web::http::Method;
use actix_web::{FromRequest, Handler, Responder, guard, web};
use std::path::PathBuf;
use std::sync::Arc;

pub type RouteInstaller = fn(&mut FeatureRoutes<'_>);
pub type InitHook = fn(&Application) -> Result<(), String>;

/// An independently developed bundle of routes, templates and navigation.
///
/// `path` is resolved against the runtime root and must contain a
/// `templates/` directory laid out as `*.html` pages, `layout.html` and an
/// optional `partials/` directory.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub path: PathBuf,
    pub nav_items: Vec<NavItem>,
    pub routes: RouteInstaller,
    pub on_init: Option<InitHook>,
}

impl Feature {
    pub fn new(name: &str, path: impl Into<PathBuf>, routes: RouteInstaller) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            nav_items: Vec::new(),
            routes,
            on_init: None,
        }
    }

    pub fn with_nav_items(mut self, nav_items: Vec<NavItem>) -> Self {
        self.nav_items = nav_items;
        self
    }

    pub fn with_on_init(mut self, hook: InitHook) -> Self {
        self.on_init = Some(hook);
        self
    }
}

/// Route registration surface handed to a feature's installer.
pub struct FeatureRoutes<'a> {
    cfg: &'a mut web::ServiceConfig,
    app: &'a Arc<Application>,
    feature: &'a str,
}

impl<'a> FeatureRoutes<'a> {
    pub(crate) fn new(
        cfg: &'a mut web::ServiceConfig,
        app: &'a Arc<Application>,
        feature: &'a str,
    ) -> Self {
        Self { cfg, app, feature }
    }

    pub fn app(&self) -> &Arc<Application> {
        self.app
    }

    pub fn handle<F, Args>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Handler<Args>,
        Args: FromRequest + 'static,
        F::Output: Responder + 'static,
    {
        log::debug!("Route {} {} -> {}", method, path, self.feature);
        self.cfg
            .route(path, web::route().method(method).to(handler));
        self
    }

    /// Same as [`handle`](Self::handle) behind the auth gate.
    pub fn handle_protected<F, Args>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Handler<Args>,
        Args: FromRequest + 'static,
        F::Output: Responder + 'static,
    {
        log::debug!("Protected route {} {} -> {}", method, path, self.feature);
        self.cfg.service(
            web::resource(path)
                .guard(guard::Method(method))
                .wrap(self.app.require_auth())
                .route(web::route().to(handler)),
        );
        self
    }
}
