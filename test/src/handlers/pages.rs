//! Login, access-denied and home pages.

use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;

use board_guard_core::http::security::OptionalPrincipal;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
    logout: Option<String>,
}

/// Login page. The form posts back to `/login`.
#[get("/login")]
pub async fn login(query: web::Query<LoginQuery>) -> impl Responder {
    let notice = if query.error.is_some() {
        "<p class=\"error\">Invalid username or password.</p>"
    } else if query.logout.is_some() {
        "<p class=\"info\">You have been logged out.</p>"
    } else {
        ""
    };

    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(format!(
        r#"<h1>Login</h1>
{notice}
<form method="post" action="/login">
  <input type="text" name="username">
  <input type="password" name="password">
  <label><input type="checkbox" name="remember-me"> Remember me</label>
  <button type="submit">Sign in</button>
</form>"#
    ))
}

#[get("/accessDenied")]
pub async fn access_denied(principal: OptionalPrincipal) -> impl Responder {
    let who = principal
        .as_ref()
        .map(|p| p.get_username().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    HttpResponse::Forbidden().body(format!("Access Denied for {}", who))
}

#[get("/")]
pub async fn index(principal: OptionalPrincipal) -> impl Responder {
    match principal.into_inner() {
        Some(p) => HttpResponse::Ok().body(format!(
            "Welcome, {}!\nRoles: {:?}",
            p.get_username(),
            p.authorities()
        )),
        None => HttpResponse::Ok().body("Welcome, guest!"),
    }
}
