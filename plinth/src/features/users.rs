// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use crate::app::Application;
use crate::auth::{
    AuthError, AuthRequest, PayloadError, SessionValue, clear_session_cookie, session_cookie,
};
use crate::error::internal_error_response;
use crate::feature::{Feature, FeatureRoutes};
use crate::nav::NavItem;
use actix_web::http::Method;
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PROFILE_KEY: &str = "profile";
const PROFILE_FIELDS: [&str; 3] = ["location", "bio", "website"];

pub fn feature() -> Feature {
    Feature::new("users", "features/users", routes).with_nav_items(vec![
        NavItem::link("Profile", "/profile", 90),
        NavItem::link("Login", "/login", 100),
    ])
}

fn routes(routes: &mut FeatureRoutes<'_>) {
    routes
        .handle(Method::GET, "/login", login_form)
        .handle(Method::POST, "/login", login)
        .handle(Method::GET, "/register", register_form)
        .handle(Method::POST, "/register", register)
        .handle(Method::POST, "/logout", logout)
        .handle_protected(Method::GET, "/profile", profile)
        .handle_protected(Method::GET, "/profile/info/add", add_profile_info)
        .handle_protected(Method::POST, "/profile/info/save", save_profile_info)
        .handle_protected(Method::GET, "/profile/info/show", show_profile_info);
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterForm {
    email: String,
    password: String,
    name: String,
}

#[derive(Deserialize, Serialize, Default)]
struct ProfileInfo {
    #[serde(default)]
    location: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    website: String,
}

impl ProfileInfo {
    fn from_payload(map: &BTreeMap<String, SessionValue>) -> Self {
        let field = |key: &str| {
            map.get(key)
                .and_then(SessionValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            location: field("location"),
            bio: field("bio"),
            website: field("website"),
        }
    }

    fn to_payload(&self) -> BTreeMap<String, SessionValue> {
        let values = [&self.location, &self.bio, &self.website];
        PROFILE_FIELDS
            .iter()
            .zip(values)
            .map(|(key, value)| (key.to_string(), SessionValue::from(value.as_str())))
            .collect()
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

async fn login_form(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "users", "login", ())
}

async fn login(app: web::Data<Application>, form: web::Form<LoginForm>) -> HttpResponse {
    match app.auth().login(&form.email, &form.password).await {
        Ok((_, session)) => {
            let cookie = session_cookie(
                &session.token,
                app.auth().session_ttl(),
                app.config().auth.secure_cookies,
            );
            HttpResponse::SeeOther()
                .insert_header((LOCATION, "/"))
                .cookie(cookie)
                .finish()
        }
        Err(AuthError::InvalidCredentials) => redirect("/login?error=invalid_credentials"),
        Err(err) => {
            log::error!("Login failed: {}", err);
            internal_error_response()
        }
    }
}

async fn register_form(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "users", "register", ())
}

async fn register(app: web::Data<Application>, form: web::Form<RegisterForm>) -> HttpResponse {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return redirect("/register?error=registration_failed");
    }

    match app
        .auth()
        .register(form.email.trim(), &form.password, form.name.trim())
        .await
    {
        Ok((_, session)) => {
            let cookie = session_cookie(
                &session.token,
                app.auth().session_ttl(),
                app.config().auth.secure_cookies,
            );
            HttpResponse::SeeOther()
                .insert_header((LOCATION, "/"))
                .cookie(cookie)
                .finish()
        }
        Err(AuthError::DuplicateEmail) => redirect("/register?error=registration_failed"),
        Err(err) => {
            log::error!("Registration failed: {}", err);
            internal_error_response()
        }
    }
}

async fn logout(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    if let Some(token) = req.session_token()
        && let Err(err) = app.auth().logout(&token).await
    {
        log::warn!("Failed to delete session on logout: {}", err);
    }

    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/"))
        .cookie(clear_session_cookie(app.config().auth.secure_cookies))
        .finish()
}

#[derive(Serialize)]
struct ProfileView {
    user: crate::auth::User,
}

async fn profile(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    let Some(user) = req.current_user() else {
        return internal_error_response();
    };
    app.render_template(&req, "users", "profile", ProfileView { user })
}

async fn add_profile_info(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    match stored_profile(&app, &req).await {
        Ok(info) => app.render_partial("users", "profile_form", info),
        Err(response) => response,
    }
}

async fn show_profile_info(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    match stored_profile(&app, &req).await {
        Ok(info) => app.render_partial("users", "profile_info", info),
        Err(response) => response,
    }
}

async fn save_profile_info(
    app: web::Data<Application>,
    req: HttpRequest,
    form: web::Form<ProfileInfo>,
) -> HttpResponse {
    let info = form.into_inner();
    match app
        .session_set_value(&req, PROFILE_KEY, info.to_payload())
        .await
    {
        Ok(()) => app.render_partial("users", "profile_info", info),
        Err(err) => session_failure(&app, err),
    }
}

async fn stored_profile(app: &Application, req: &HttpRequest) -> Result<ProfileInfo, HttpResponse> {
    match app.session_get_map(req, PROFILE_KEY).await {
        Ok(map) => Ok(ProfileInfo::from_payload(&map)),
        Err(AuthError::Payload(PayloadError::Missing(_))) => Ok(ProfileInfo::default()),
        Err(err) => Err(session_failure(app, err)),
    }
}

fn session_failure(app: &Application, err: AuthError) -> HttpResponse {
    if err.is_unauthenticated() {
        return redirect(&app.config().auth.login_path);
    }
    log::error!("Session payload access failed: {}", err);
    internal_error_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_info_round_trips_through_payload_map() {
        let info = ProfileInfo {
            location: "Wellington".to_string(),
            bio: "Builds things".to_string(),
            website: "example.com".to_string(),
        };
        let map = info.to_payload();
        assert_eq!(map.len(), 3);
        let back = ProfileInfo::from_payload(&map);
        assert_eq!(back.location, "Wellington");
        assert_eq!(back.website, "example.com");
    }

    #[test]
    fn non_string_profile_fields_read_as_empty() {
        let mut map = BTreeMap::new();
        map.insert("bio".to_string(), SessionValue::from(7));
        assert_eq!(ProfileInfo::from_payload(&map).bio, "");
    }
}
