// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! Application assembly: feature registration during startup, then a frozen
//! [`Application`] shared by every worker.

use crate::auth::{
    AuthError, AuthRequest, AuthService, RequireAuth, Session, SessionValue,
};
use crate::config::{ConfigError, ValidatedConfig};
use crate::database::Database;
use crate::error::{internal_error_response, not_found_response};
use crate::feature::{Feature, FeatureRoutes};
use crate::templates::{
    HelperInstaller, TemplateCache, TemplateEngine, TemplateError, TemplateRegistry,
    TemplateRegistryBuilder,
};
use actix_web::http::header::CACHE_CONTROL;
use actix_web::{HttpRequest, HttpResponse, web};
use minijinja::{Environment, Value};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Auth(AuthError),
    Template(TemplateError),
    DuplicateFeature(String),
    HelperAfterFeatures(String),
    FeatureInit { feature: String, reason: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Auth(err) => write!(f, "Auth store initialization failed: {}", err),
            AppError::Template(err) => write!(f, "{}", err),
            AppError::DuplicateFeature(name) => {
                write!(f, "Feature '{}' is already registered", name)
            }
            AppError::HelperAfterFeatures(name) => write!(
                f,
                "Template helper '{}' must be registered before any feature",
                name
            ),
            AppError::FeatureInit { feature, reason } => {
                write!(f, "Feature '{}' failed to initialize: {}", feature, reason)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        AppError::Template(err)
    }
}

/// Opens the stores the application depends on. The auth store is required;
/// the business database is optional and its failure only logs a warning.
pub async fn start_services(
    config: &ValidatedConfig,
) -> Result<(AuthService, Option<Database>), AppError> {
    let auth = AuthService::open(config).await?;
    let db = Database::connect_optional(config.database.as_ref()).await;

    if let Err(err) = auth.sessions().purge_expired().await {
        log::warn!("Failed to purge expired sessions: {}", err);
    }

    Ok((auth, db))
}

/// Purges expired sessions on a fixed period for the life of the runtime.
/// Expired rows are also removed lazily on lookup.
pub fn spawn_session_sweeper(auth: Arc<AuthService>, every: StdDuration) {
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; startup already purged.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = auth.sessions().purge_expired().await {
                log::warn!("Failed to purge expired sessions: {}", err);
            }
        }
    });
}

/// Collects features during the single-threaded startup phase.
pub struct AppBuilder {
    config: Arc<ValidatedConfig>,
    auth: Arc<AuthService>,
    db: Option<Database>,
    helpers: Vec<HelperInstaller>,
    templates: TemplateRegistryBuilder,
    features: Vec<Feature>,
}

impl AppBuilder {
    pub fn new(config: Arc<ValidatedConfig>, auth: AuthService, db: Option<Database>) -> Self {
        let templates = TemplateRegistryBuilder::new(config.base_layout_path());
        Self {
            config,
            auth: Arc::new(auth),
            db,
            helpers: Vec::new(),
            templates,
            features: Vec::new(),
        }
    }

    /// Installs arbitrary minijinja helpers into every feature environment.
    pub fn register_helper<F>(&mut self, name: &str, install: F) -> Result<(), AppError>
    where
        F: Fn(&mut Environment<'static>) + Send + Sync + 'static,
    {
        if !self.features.is_empty() {
            return Err(AppError::HelperAfterFeatures(name.to_string()));
        }
        let helper: HelperInstaller = Arc::new(install);
        self.templates.register_helper(helper.clone());
        self.helpers.push(helper);
        Ok(())
    }

    /// Adds a single-argument filter usable as `{{ value | name }}`.
    pub fn register_helper_filter<F>(&mut self, name: &str, filter: F) -> Result<(), AppError>
    where
        F: Fn(Value) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        let filter = Arc::new(filter);
        let filter_name = name.to_string();
        self.register_helper(name, move |env: &mut Environment<'static>| {
            let filter = filter.clone();
            env.add_filter(filter_name.clone(), move |value: Value| filter(value));
        })
    }

    /// Compiles the feature's templates and records its routes. Any failure
    /// aborts startup; nothing of the failed feature is kept.
    pub fn register_feature(&mut self, feature: Feature) -> Result<(), AppError> {
        if self.features.iter().any(|f| f.name == feature.name) {
            return Err(AppError::DuplicateFeature(feature.name));
        }

        let root = self.config.resolve_path(&feature.path);
        self.templates
            .register_feature(&feature.name, &root, &feature.nav_items)?;
        log::info!("Registered feature: {}", feature.name);
        self.features.push(feature);
        Ok(())
    }

    /// Freezes templates and navigation, then runs every `on_init` hook in
    /// registration order.
    pub fn build(self) -> Result<Arc<Application>, AppError> {
        let app = Arc::new(Application {
            config: self.config,
            auth: self.auth,
            db: self.db,
            helpers: self.helpers,
            templates: TemplateCache::new(self.templates.build()),
            features: self.features,
        });

        for feature in app.features() {
            if let Some(hook) = feature.on_init {
                hook(&app).map_err(|reason| AppError::FeatureInit {
                    feature: feature.name.clone(),
                    reason,
                })?;
            }
        }
        Ok(app)
    }
}

/// The assembled application. Read-only after startup apart from an explicit
/// template reload, which swaps the whole registry.
pub struct Application {
    config: Arc<ValidatedConfig>,
    auth: Arc<AuthService>,
    db: Option<Database>,
    helpers: Vec<HelperInstaller>,
    templates: TemplateCache,
    features: Vec<Feature>,
}

impl Application {
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn auth_handle(&self) -> Arc<AuthService> {
        self.auth.clone()
    }

    pub fn db(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Auth gate configured with the login path from config.
    pub fn require_auth(&self) -> RequireAuth {
        RequireAuth::new(self.auth_handle(), &self.config.auth.login_path)
    }

    /// Recompiles every feature's templates from disk and swaps the result in.
    /// The live registry is untouched if any feature fails.
    pub fn reload_templates(&self) -> Result<(), AppError> {
        let mut builder = TemplateRegistryBuilder::new(self.config.base_layout_path());
        for helper in &self.helpers {
            builder.register_helper(helper.clone());
        }
        for feature in &self.features {
            let root = self.config.resolve_path(&feature.path);
            builder.register_feature(&feature.name, &root, &feature.nav_items)?;
        }
        let registry: TemplateRegistry = builder.build();
        self.templates.swap(registry);
        log::info!("Reloaded templates for {} features", self.features.len());
        Ok(())
    }

    /// Renders `feature:page` into a buffered 200 response. The `error` query
    /// parameter is exposed to the page as `error`.
    pub fn render_template<T: Serialize>(
        &self,
        req: &HttpRequest,
        feature: &str,
        page: &str,
        data: T,
    ) -> HttpResponse {
        let error = query_error(req);
        let result = self.templates.render_page(
            feature,
            page,
            Value::from_serialize(&data),
            error.as_deref(),
        );
        html_response(result, feature, page)
    }

    /// Renders a partial fragment with caller data only.
    pub fn render_partial<T: Serialize>(
        &self,
        feature: &str,
        partial: &str,
        data: T,
    ) -> HttpResponse {
        let result = self
            .templates
            .render_partial(feature, partial, Value::from_serialize(&data));
        html_response(result, feature, partial)
    }

    /// Loads the session named by the request, fresh from the store.
    pub async fn request_session(&self, req: &HttpRequest) -> Result<Session, AuthError> {
        let token = req.session_token().ok_or(AuthError::NotFound)?;
        self.auth.sessions().get(&token).await
    }

    /// Read-modify-write of the request's session payload. Last write wins.
    pub async fn session_set_value(
        &self,
        req: &HttpRequest,
        key: &str,
        value: impl Into<SessionValue>,
    ) -> Result<(), AuthError> {
        let mut session = self.request_session(req).await?;
        self.auth.sessions().set_value(&mut session, key, value).await
    }

    pub async fn session_get_value(
        &self,
        req: &HttpRequest,
        key: &str,
    ) -> Result<Option<SessionValue>, AuthError> {
        let session = self.request_session(req).await?;
        Ok(session.get_value(key).cloned())
    }

    pub async fn session_get_string(
        &self,
        req: &HttpRequest,
        key: &str,
    ) -> Result<String, AuthError> {
        let session = self.request_session(req).await?;
        Ok(session.get_string(key)?.to_string())
    }

    pub async fn session_get_int(&self, req: &HttpRequest, key: &str) -> Result<i64, AuthError> {
        let session = self.request_session(req).await?;
        Ok(session.get_int(key)?)
    }

    pub async fn session_get_map(
        &self,
        req: &HttpRequest,
        key: &str,
    ) -> Result<BTreeMap<String, SessionValue>, AuthError> {
        let session = self.request_session(req).await?;
        Ok(session.get_map(key)?.clone())
    }
}

/// Installs shared state, every feature's routes and `/static`. Unmatched
/// paths get the generic 404 page.
pub fn configure(app: &Arc<Application>, cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::Data::from(app.clone()));

    for feature in app.features() {
        let mut routes = FeatureRoutes::new(cfg, app, &feature.name);
        (feature.routes)(&mut routes);
    }

    let static_dir = app.config().static_dir_path();
    if static_dir.is_dir() {
        cfg.service(actix_files::Files::new("/static", static_dir));
    } else {
        log::debug!("Static directory {} not found; /static disabled", static_dir.display());
    }

    cfg.default_service(web::to(|| async { not_found_response() }));
}

fn query_error(req: &HttpRequest) -> Option<String> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.get("error").cloned())
        .filter(|error| !error.is_empty())
}

fn html_response(result: Result<String, TemplateError>, feature: &str, name: &str) -> HttpResponse {
    match result {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .insert_header((CACHE_CONTROL, "no-store"))
            .body(html),
        Err(err) => {
            log::error!("Failed to render {}/{}: {}", feature, name, err);
            internal_error_response()
        }
    }
}
