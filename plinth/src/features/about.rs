// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::app::Application;
use crate::feature::{Feature, FeatureRoutes};
use crate::nav::NavItem;
use actix_web::http::Method;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

pub fn feature() -> Feature {
    Feature::new("about", "features/about", routes).with_nav_items(vec![NavItem::group(
        "About",
        10,
        vec![
            NavItem::link("About", "/about", 10),
            NavItem::link("Team", "/about/team", 20),
            NavItem::divider(30),
            NavItem::link("Contact", "/about/contact", 40),
        ],
    )])
}

fn routes(routes: &mut FeatureRoutes<'_>) {
    routes
        .handle(Method::GET, "/about", about)
        .handle(Method::GET, "/about/team", team)
        .handle(Method::GET, "/about/contact", contact);
}

#[derive(Serialize)]
struct TeamMember {
    name: &'static str,
    role: &'static str,
}

const TEAM: &[TeamMember] = &[
    TeamMember {
        name: "John Doe",
        role: "Lead Developer",
    },
    TeamMember {
        name: "Jane Smith",
        role: "Designer",
    },
];

async fn about(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "about", "page", ())
}

async fn team(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "about", "team", TEAM)
}

async fn contact(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "about", "contact", ())
}
