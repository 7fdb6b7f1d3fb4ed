// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use super::cookie::session_token;
use super::service::AuthService;
use super::session::{Session, token_prefix};
use super::types::User;
use crate::error::internal_error_response;
use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::LOCATION,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

/// Request-scoped identity populated by [`RequireAuth`].
pub trait AuthRequest {
    fn current_user(&self) -> Option<User>;
    fn current_session(&self) -> Option<Session>;
    fn session_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool;
}

impl AuthRequest for HttpRequest {
    fn current_user(&self) -> Option<User> {
        self.extensions().get::<User>().cloned()
    }

    fn current_session(&self) -> Option<Session> {
        self.extensions().get::<Session>().cloned()
    }

    fn session_token(&self) -> Option<String> {
        self.current_session()
            .map(|session| session.token)
            .or_else(|| session_token(self))
    }

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

/// Guard for protected routes. Requests without a usable session are
/// redirected to the login path and never reach the wrapped service.
pub struct RequireAuth {
    auth: Arc<AuthService>,
    login_path: Rc<str>,
}

impl RequireAuth {
    pub fn new(auth: Arc<AuthService>, login_path: &str) -> Self {
        Self {
            auth,
            login_path: login_path.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthService {
            service: Rc::new(service),
            auth: self.auth.clone(),
            login_path: self.login_path.clone(),
        }))
    }
}

pub struct RequireAuthService<S> {
    service: Rc<S>,
    auth: Arc<AuthService>,
    login_path: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let auth = self.auth.clone();
        let login_path = self.login_path.clone();

        Box::pin(async move {
            let Some(token) = session_token(req.request()) else {
                return Ok(redirect_to_login(req, &login_path));
            };

            match auth.resolve(&token).await {
                Ok((session, user)) => {
                    req.extensions_mut().insert(user);
                    req.extensions_mut().insert(session);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) if err.is_unauthenticated() => {
                    log::debug!(
                        "Session {} rejected for {}: {}",
                        token_prefix(&token),
                        req.path(),
                        err
                    );
                    Ok(redirect_to_login(req, &login_path))
                }
                Err(err) => {
                    log::error!("Auth gate failed for {}: {}", req.path(), err);
                    let (req, _) = req.into_parts();
                    let response = internal_error_response().map_into_right_body();
                    Ok(ServiceResponse::new(req, response))
                }
            }
        })
    }
}

fn redirect_to_login<B>(req: ServiceRequest, login_path: &str) -> ServiceResponse<EitherBody<B>> {
    let (req, _) = req.into_parts();
    let response = HttpResponse::SeeOther()
        .insert_header((LOCATION, login_path))
        .finish()
        .map_into_right_body();
    ServiceResponse::new(req, response)
}
