//! Board routes. Registration is guarded by the access rules.

use actix_web::http::header::LOCATION;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;

use board_guard_core::http::security::AuthenticatedPrincipal;

/// Public board list.
#[get("/boards/list")]
pub async fn list() -> impl Responder {
    HttpResponse::Ok().body("Board list")
}

/// Registration form (BASIC, MANAGER or ADMIN).
#[get("/boards/register")]
pub async fn register_form(principal: AuthenticatedPrincipal) -> impl Responder {
    HttpResponse::Ok().body(format!("Register a board as {}", principal.get_username()))
}

#[derive(Debug, Deserialize)]
pub struct BoardForm {
    pub title: String,
    pub content: String,
}

#[post("/boards/register")]
pub async fn register(principal: AuthenticatedPrincipal, form: web::Form<BoardForm>) -> impl Responder {
    log::info!(
        "User {} registered board \"{}\" ({} chars)",
        principal.get_username(),
        form.title,
        form.content.len()
    );

    HttpResponse::Found()
        .insert_header((LOCATION, "/boards/list"))
        .finish()
}
