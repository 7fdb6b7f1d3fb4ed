// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.


mod common;

use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse, test, web};
use minijinja::Value;
use plinth::app::{AppError, Application};
use plinth::auth::FixedClock;
use plinth::feature::{Feature, FeatureRoutes};
use plinth::nav::NavItem;
use plinth::templates::TemplateEngine;
use plinth::util::TestFixtureRoot;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const BASE: &str = "<title>{% block title %}Base{% endblock %}</title>\
<nav>{% for item in nav_items %}[{{ item.title }}]{% endfor %}</nav>\
{% if error %}<p class=\"error\">{{ error }}</p>{% endif %}\
<main>{% block content %}{% endblock %}</main>";

fn fixture_with_base(prefix: &str) -> TestFixtureRoot {
    let fixture = TestFixtureRoot::new_unique(prefix).expect("fixture root");
    fixture.write_base_layout(BASE).expect("base layout");
    fixture
}

fn write_greet_feature(fixture: &TestFixtureRoot, greeting: &str) {
    fixture
        .write_feature_template(
            "greet",
            "layout.html",
            "{% block content %}<div>{% block body %}{% endblock %}</div>{% endblock %}",
        )
        .expect("layout");
    fixture
        .write_feature_template(
            "greet",
            "hello.html",
            &format!("{{% block body %}}{} {{{{ data.name }}}}{{% endblock %}}", greeting),
        )
        .expect("page");
}

fn greet_routes(routes: &mut FeatureRoutes<'_>) {
    routes
        .handle(Method::GET, "/greet", greet)
        .handle(Method::GET, "/greet/broken", broken);
}

async fn greet(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "greet", "hello", json!({ "name": "World" }))
}

async fn broken(app: web::Data<Application>, req: HttpRequest) -> HttpResponse {
    app.render_template(&req, "greet", "missing", ())
}

fn greet_feature() -> Feature {
    Feature::new("greet", "features/greet", greet_routes)
        .with_nav_items(vec![NavItem::link("Greet", "/greet", 5)])
}

fn no_routes(_: &mut FeatureRoutes<'_>) {}

#[actix_web::test]
async fn demo_site_registers_every_chain_and_partial() {
    let harness = common::TestHarness::new().await;
    let registry = harness.app.templates().current();

    assert_eq!(
        registry.chain_keys(),
        vec![
            "about:contact",
            "about:page",
            "about:team",
            "home:home",
            "users:login",
            "users:profile",
            "users:register",
        ]
    );
    assert_eq!(
        registry.partial_names("users"),
        vec!["profile_form".to_string(), "profile_info".to_string()]
    );
    assert!(registry.partial_names("home").is_empty());
}

#[actix_web::test]
async fn pages_render_through_base_and_layout() {
    let harness = common::TestHarness::new().await;
    let app = test::init_service(common::build_test_app(&harness.app)).await;

    let req = test::TestRequest::get().uri("/about/team").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_text(resp).await;
    assert!(body.contains("<title>Team</title>"));
    assert!(body.contains("<article class=\"about\">"));
    assert!(body.contains("<strong>Jane Smith</strong>"));
    assert!(body.contains("class=\"feature-about\""));
    assert!(body.contains("role=\"separator\""));
}

#[actix_web::test]
async fn navigation_is_sorted_across_features() {
    let harness = common::TestHarness::new().await;
    let app = test::init_service(common::build_test_app(&harness.app)).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body = common::body_text(test::call_service(&app, req).await).await;

    let position = |needle: &str| body.find(needle).expect(needle);
    let home = position(">Home</a>");
    let about = position("<span>About</span>");
    let profile = position(">Profile</a>");
    let login = position(">Login</a>");
    assert!(home < about && about < profile && profile < login);
}

#[actix_web::test]
async fn static_assets_are_served() {
    let harness = common::TestHarness::new().await;
    let app = test::init_service(common::build_test_app(&harness.app)).await;

    let req = test::TestRequest::get().uri("/static/site.css").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn fixture_feature_renders_with_error_from_query() {
    let fixture = fixture_with_base("render-greet");
    write_greet_feature(&fixture, "Hello");
    let harness = common::TestHarness::with_features(fixture.path(), vec![greet_feature()]).await;
    let app = test::init_service(common::build_test_app(&harness.app)).await;

    let req = test::TestRequest::get().uri("/greet?error=oops").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_text(resp).await;
    assert_eq!(
        body,
        "<title>Base</title><nav>[Greet]</nav><p class=\"error\">oops</p>\
<main><div>Hello World</div></main>"
    );
}

#[actix_web::test]
async fn unknown_page_is_a_generic_500() {
    let fixture = fixture_with_base("render-missing");
    write_greet_feature(&fixture, "Hello");
    let harness = common::TestHarness::with_features(fixture.path(), vec![greet_feature()]).await;
    let app = test::init_service(common::build_test_app(&harness.app)).await;

    let req = test::TestRequest::get().uri("/greet/broken").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_text(resp).await;
    assert!(!body.contains("missing"));
}

#[actix_web::test]
async fn reload_swaps_templates_and_keeps_old_ones_on_failure() {
    let fixture = fixture_with_base("render-reload");
    write_greet_feature(&fixture, "Hello");
    let harness = common::TestHarness::with_features(fixture.path(), vec![greet_feature()]).await;
    let render = || {
        harness
            .app
            .templates()
            .render_page("greet", "hello", Value::from_serialize(json!({ "name": "Ann" })), None)
            .expect("render")
    };
    assert!(render().contains("Hello Ann"));

    write_greet_feature(&fixture, "Howdy");
    harness.app.reload_templates().expect("reload");
    assert!(render().contains("Howdy Ann"));

    fixture
        .write_feature_template("greet", "hello.html", "{% block body %}{{ unclosed {% endblock %}")
        .expect("broken page");
    let err = harness.app.reload_templates().expect_err("syntax error");
    assert!(matches!(err, AppError::Template(_)));
    assert!(render().contains("Howdy Ann"));
}

#[actix_web::test]
async fn duplicate_feature_names_are_rejected() {
    let fixture = fixture_with_base("render-duplicate");
    write_greet_feature(&fixture, "Hello");
    let clock = Arc::new(FixedClock::default());
    let mut builder = common::builder_at(fixture.path(), clock).await;

    builder.register_feature(greet_feature()).expect("first");
    let err = builder
        .register_feature(greet_feature())
        .expect_err("second registration");
    assert!(matches!(err, AppError::DuplicateFeature(name) if name == "greet"));
}

#[actix_web::test]
async fn broken_feature_templates_abort_registration() {
    let fixture = fixture_with_base("render-broken");
    fixture
        .write_feature_template("greet", "hello.html", "{% block body %}no layout{% endblock %}")
        .expect("page");
    let clock = Arc::new(FixedClock::default());
    let mut builder = common::builder_at(fixture.path(), clock).await;

    let err = builder
        .register_feature(greet_feature())
        .expect_err("missing layout");
    assert!(matches!(err, AppError::Template(_)));
}

static INIT_CALLS: AtomicUsize = AtomicUsize::new(0);

fn counting_init(app: &Application) -> Result<(), String> {
    assert!(app.templates().current().has_chain("greet", "hello"));
    INIT_CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

fn failing_init(_: &Application) -> Result<(), String> {
    Err("seed data missing".to_string())
}

#[actix_web::test]
async fn init_hooks_run_after_templates_are_frozen() {
    let fixture = fixture_with_base("render-init");
    write_greet_feature(&fixture, "Hello");
    let feature = greet_feature().with_on_init(counting_init);
    common::TestHarness::with_features(fixture.path(), vec![feature]).await;
    assert_eq!(INIT_CALLS.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn failing_init_hook_aborts_build() {
    let fixture = fixture_with_base("render-init-fail");
    write_greet_feature(&fixture, "Hello");
    let clock = Arc::new(FixedClock::default());
    let mut builder = common::builder_at(fixture.path(), clock).await;
    builder
        .register_feature(greet_feature().with_on_init(failing_init))
        .expect("register");

    let err = builder.build().err().expect("init failure");
    match err {
        AppError::FeatureInit { feature, reason } => {
            assert_eq!(feature, "greet");
            assert_eq!(reason, "seed data missing");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[actix_web::test]
async fn helper_filters_reach_every_feature() {
    let fixture = fixture_with_base("render-helper");
    fixture
        .write_feature_template("shout", "layout.html", "")
        .expect("layout");
    fixture
        .write_feature_template(
            "shout",
            "loud.html",
            "{% block content %}{{ data.word | shout }}{% endblock %}",
        )
        .expect("page");
    let clock = Arc::new(FixedClock::default());
    let mut builder = common::builder_at(fixture.path(), clock.clone()).await;
    builder
        .register_helper_filter("shout", |value: Value| {
            Ok(Value::from(value.to_string().to_uppercase()))
        })
        .expect("helper");

    let harness = common::TestHarness::finish(
        builder,
        vec![Feature::new("shout", "features/shout", no_routes)],
        clock,
    );
    let html = harness
        .app
        .templates()
        .render_page("shout", "loud", Value::from_serialize(json!({ "word": "hey" })), None)
        .expect("render");
    assert!(html.contains("<main>HEY</main>"));
}

#[actix_web::test]
async fn helpers_after_features_are_rejected() {
    let fixture = fixture_with_base("render-helper-late");
    write_greet_feature(&fixture, "Hello");
    let clock = Arc::new(FixedClock::default());
    let mut builder = common::builder_at(fixture.path(), clock).await;
    builder.register_feature(greet_feature()).expect("register");

    let err = builder
        .register_helper_filter("late", |value: Value| Ok(value))
        .expect_err("helper after feature");
    assert!(matches!(err, AppError::HelperAfterFeatures(name) if name == "late"));
}
