// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::app::Application;
use crate::auth::AuthRequest;
use crate::feature::{Feature, FeatureRoutes};
use crate::nav::NavItem;
use actix_web::http::Method;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

pub fn feature() -> Feature {
    Feature::new("home", "features/home", routes)
        .with_nav_items(vec![NavItem::link("Home", "/", 0)])
}

fn routes(routes: &mut FeatureRoutes<'_>) {
    routes.handle(Method::GET, "/", home);
}

#[derive(Serialize)]
struct HomeView {
    app_name: String,
    user_name: Option<String>,
}

async fn home(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    // Public route: the gate does not run, so resolve the visitor here.
    let user_name = match req.session_token() {
        Some(token) => app.auth().resolve(&token).await.ok().map(|(_, user)| user.name),
        None => None,
    };
    let view = HomeView {
        app_name: app.config().app.name.clone(),
        user_name,
    };
    app.render_template(&req, "home", "home", view)
}
