// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test};
use chrono::Duration;
use plinth::app::{AppBuilder, Application, configure};
use plinth::auth::{AuthService, AuthStore, FixedClock, SESSION_COOKIE_NAME};
use plinth::feature::Feature;
use plinth::features;
use plinth::util::TestConfigBuilder;
use plinth::util::test_config::TEST_PASSWORD_PARAMS;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "correct horse";
pub const ALICE_NAME: &str = "Alice";

/// Directory holding the demo site shipped with the crate.
pub fn site_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("site")
}

pub struct TestHarness {
    pub clock: Arc<FixedClock>,
    pub app: Arc<Application>,
}

impl TestHarness {
    /// Demo site with every shipped feature registered.
    pub async fn new() -> Self {
        Self::with_features(&site_root(), features::all()).await
    }

    pub async fn with_features(root: &Path, features: Vec<Feature>) -> Self {
        let clock = Arc::new(FixedClock::default());
        let builder = builder_at(root, clock.clone()).await;
        Self::finish(builder, features, clock)
    }

    pub fn finish(mut builder: AppBuilder, features: Vec<Feature>, clock: Arc<FixedClock>) -> Self {
        for feature in features {
            builder.register_feature(feature).expect("register feature");
        }
        let app = builder.build().expect("build application");
        Self { clock, app }
    }

    /// Registers Alice directly through the auth service and returns her
    /// session token.
    pub async fn register_alice(&self) -> String {
        let (_, session) = self
            .app
            .auth()
            .register(ALICE_EMAIL, ALICE_PASSWORD, ALICE_NAME)
            .await
            .expect("register alice");
        session.token
    }
}

/// Builder over an in-memory auth store with cheap password hashing.
pub async fn builder_at(root: &Path, clock: Arc<FixedClock>) -> AppBuilder {
    let config = Arc::new(TestConfigBuilder::new().with_root(root).build());
    let store = AuthStore::open_in_memory().await.expect("auth store");
    let auth = AuthService::new(store, TEST_PASSWORD_PARAMS, Duration::hours(24), clock)
        .await
        .expect("auth service");
    AppBuilder::new(config, auth, None)
}

pub fn build_test_app(
    app: &Arc<Application>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let app = app.clone();
    App::new().configure(move |cfg| configure(&app, cfg))
}

pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE_NAME, token.to_string())
}

pub fn location(resp: &ServiceResponse) -> Option<String> {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn response_session_cookie(resp: &ServiceResponse) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.into_owned())
}

pub async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
