//! Security middleware for Actix Web.
//!
//! # Spring Equivalent
//! `SecurityFilterChain` / `FilterChainProxy`
//!
//! Per request:
//! 1. Principal from the session, else from a remember-me cookie
//! 2. Principal into the request extensions
//! 3. Login, logout and access-denied pages pass untouched
//! 4. Policy decision; a denied anonymous caller is sent to the login page,
//!    a denied authenticated caller to the access-denied page

use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;

use actix_service::{Service, Transform};
use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{ok, LocalBoxFuture, Ready};

use crate::http::security::authorizer::Decision;
use crate::http::security::web::WebSecurity;

/// Security middleware factory.
///
/// # Spring Equivalent
/// `SecurityFilterChain`
///
/// Must be wrapped *inside* `SessionMiddleware` (register it first).
///
/// # Example
/// ```ignore
/// App::new()
///     .wrap(SecurityTransform::new(security.clone()))
///     .wrap(SessionMiddleware::new(CookieSessionStore::default(), key))
/// ```
pub struct SecurityTransform {
    security: Arc<WebSecurity>,
}

impl SecurityTransform {
    pub fn new(security: Arc<WebSecurity>) -> Self {
        SecurityTransform { security }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityTransform
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SecurityService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SecurityService {
            security: Arc::clone(&self.security),
            service: Rc::new(service),
        })
    }
}

/// Security middleware service.
///
/// # Spring Equivalent
/// `FilterChainProxy`
pub struct SecurityService<S> {
    security: Arc<WebSecurity>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SecurityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let security = Arc::clone(&self.security);

        Box::pin(async move {
            let session = req.get_session();
            let sessions = security.sessions();

            // Step 1: Authenticate - session first, then remember-me
            let mut principal = sessions.get_principal(&session);
            let mut response_cookie: Option<Cookie<'static>> = None;

            if principal.is_none() {
                let cookie_name = security.remember_me().cookie_name();
                if let Some(cookie) = req.cookie(cookie_name) {
                    match security.remember_me_login(cookie.value()).await {
                        Ok((resolved, rotated)) => {
                            if let Err(e) = sessions.login(&session, &resolved) {
                                log::error!("Could not store remember-me principal in session: {}", e);
                            }
                            log::info!("User {} authenticated by remember-me", resolved.get_username());
                            principal = Some(resolved);
                            response_cookie = Some(rotated);
                        }
                        Err(e) => {
                            log::debug!("Rejected remember-me cookie: {}", e);
                            response_cookie = Some(security.remember_me().logout_cookie());
                        }
                    }
                }
            }

            // Step 2: Store principal in request extensions
            if let Some(ref p) = principal {
                req.extensions_mut().insert(p.clone());
            }

            // Step 3: Authorize the path as the router sees it (percent-decoded)
            let path = req.match_info().as_str().to_string();
            if !security.is_entry_point(&path) {
                let roles = principal
                    .as_ref()
                    .map(|p| p.get_roles().clone())
                    .unwrap_or_else(BTreeSet::new);

                if security.evaluator().authorize(&path, &roles) == Decision::Deny {
                    let location = match principal {
                        None => {
                            let target = req
                                .uri()
                                .path_and_query()
                                .map(|pq| pq.as_str().to_string())
                                .unwrap_or(path);
                            if let Err(e) = sessions.save_request(&session, &target) {
                                log::error!("Could not save request {}: {}", target, e);
                            }
                            security.login_page().to_string()
                        }
                        Some(ref p) => {
                            log::warn!("Access denied for user {} to {}", p.get_username(), path);
                            security.access_denied_path().to_string()
                        }
                    };

                    let mut redirect = HttpResponse::Found();
                    redirect.insert_header((LOCATION, location));
                    if let Some(cookie) = response_cookie {
                        redirect.cookie(cookie);
                    }
                    return Ok(req.into_response(redirect.finish()).map_into_right_body());
                }
            }

            let mut res = service.call(req).await?;

            // The handler's own cookie (e.g. logout clearing it) wins.
            if let Some(cookie) = response_cookie {
                let handler_set = res
                    .response()
                    .cookies()
                    .any(|c| c.name() == cookie.name());
                if !handler_set {
                    res.response_mut().add_cookie(&cookie)?;
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}
