//! Common test utilities and configuration.
//!
//! This module provides shared test infrastructure including:
//! - Test members and stores
//! - Test app builder
//! - Cookie and login helpers

#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{get, post, test, web, App, Error, HttpResponse, Responder};

use board_guard_core::http::security::{
    security_routes, AuthenticatedPrincipal, BCryptHasher, Hasher, InMemoryCredentialStore,
    InMemoryTokenRepository, OptionalPrincipal, SecurityConfig, SecurityTransform, WebSecurity,
};

pub const PASSWORD: &str = "1111";
pub const SESSION_COOKIE: &str = "id";
pub const REMEMBER_ME_COOKIE: &str = "remember-me";

// =============================================================================
// Test Configuration
// =============================================================================

/// Stores shared between the app under test and the assertions.
pub struct Fixture {
    pub store: InMemoryCredentialStore,
    pub tokens: InMemoryTokenRepository,
    pub security: Arc<WebSecurity>,
    key: Key,
}

/// Members (all with password `1111`):
/// - u1: BASIC
/// - m1: MANAGER
/// - a1: ADMIN
/// - guest: no roles
/// - off: BASIC, disabled
pub async fn fixture() -> Fixture {
    let hasher = Arc::new(BCryptHasher::with_cost(4));
    let store = InMemoryCredentialStore::new();

    for (username, enabled, roles) in [
        ("u1", true, vec!["BASIC"]),
        ("m1", true, vec!["MANAGER"]),
        ("a1", true, vec!["ADMIN"]),
        ("guest", true, vec![]),
        ("off", false, vec!["BASIC"]),
    ] {
        store
            .add_user(username, hasher.hash(PASSWORD).unwrap(), enabled, roles)
            .await
            .unwrap();
    }

    let tokens = InMemoryTokenRepository::new();
    let security = WebSecurity::new(
        &SecurityConfig::default(),
        Arc::new(store.clone()),
        hasher,
        Arc::new(tokens.clone()),
    )
    .unwrap();

    Fixture {
        store,
        tokens,
        security: Arc::new(security),
        key: Key::generate(),
    }
}

// =============================================================================
// Test Handlers
// =============================================================================

#[get("/")]
async fn index(principal: OptionalPrincipal) -> impl Responder {
    match principal.into_inner() {
        Some(p) => HttpResponse::Ok().body(format!("Welcome, {}!", p.get_username())),
        None => HttpResponse::Ok().body("Welcome, guest!"),
    }
}

#[get("/login")]
async fn login_page() -> impl Responder {
    HttpResponse::Ok().body("Login page")
}

#[get("/accessDenied")]
async fn access_denied(principal: AuthenticatedPrincipal) -> impl Responder {
    HttpResponse::Forbidden().body(format!("Access Denied for {}", principal.get_username()))
}

#[get("/boards/list")]
async fn board_list() -> impl Responder {
    HttpResponse::Ok().body("Board list")
}

#[get("/boards/register")]
async fn board_register_form(principal: AuthenticatedPrincipal) -> impl Responder {
    HttpResponse::Ok().body(format!("Register a board as {}", principal.get_username()))
}

#[post("/boards/register")]
async fn board_register(_principal: AuthenticatedPrincipal) -> impl Responder {
    HttpResponse::Found()
        .insert_header((LOCATION, "/boards/list"))
        .finish()
}

// =============================================================================
// Test App
// =============================================================================

pub async fn create_test_app(
    fixture: &Fixture,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let security = fixture.security.clone();

    test::init_service(
        App::new()
            .wrap(SecurityTransform::new(security.clone()))
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), fixture.key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .configure(security_routes(security))
            .service(index)
            .service(login_page)
            .service(access_denied)
            .service(board_list)
            .service(board_register_form)
            .service(board_register),
    )
    .await
}

// =============================================================================
// Helpers
// =============================================================================

/// Cookies set by a response.
pub fn cookies<B>(resp: &ServiceResponse<B>) -> Vec<Cookie<'static>> {
    resp.response().cookies().map(|c| c.into_owned()).collect()
}

pub fn cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    cookies(resp).into_iter().find(|c| c.name() == name)
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `GET uri` carrying `cookies`.
pub fn get_with(uri: &str, cookies: &[Cookie<'static>]) -> Request {
    let mut req = test::TestRequest::get().uri(uri);
    for c in cookies {
        req = req.cookie(c.clone());
    }
    req.to_request()
}

/// `POST /login` carrying `cookies`.
pub fn login_request(
    username: &str,
    password: &str,
    remember_me: bool,
    cookies: &[Cookie<'static>],
) -> Request {
    let mut form = vec![("username", username), ("password", password)];
    if remember_me {
        form.push(("remember-me", "on"));
    }

    let mut req = test::TestRequest::post().uri("/login").set_form(form);
    for c in cookies {
        req = req.cookie(c.clone());
    }
    req.to_request()
}

/// Logs in and returns the cookies of the successful response.
pub async fn login<S, B>(app: &S, username: &str, remember_me: bool) -> Vec<Cookie<'static>>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    let resp = test::call_service(app, login_request(username, PASSWORD, remember_me, &[])).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    cookies(&resp)
}

/// Only the session cookie out of `cookies`.
pub fn session_only(cookies: &[Cookie<'static>]) -> Vec<Cookie<'static>> {
    cookies
        .iter()
        .filter(|c| c.name() == SESSION_COOKIE)
        .cloned()
        .collect()
}
