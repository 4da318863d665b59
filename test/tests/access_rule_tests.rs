//! URL access rule tests.
//!
//! `/boards/register` requires BASIC, MANAGER or ADMIN; every other path is
//! open.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;

use common::{create_test_app, fixture, get_with, location, login, login_request, session_only, PASSWORD};

// =============================================================================
// Anonymous Access
// =============================================================================

#[actix_web::test]
async fn test_anonymous_register_redirects_to_login() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, get_with("/boards/register", &[])).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

#[actix_web::test]
async fn test_anonymous_open_paths() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, get_with("/boards/list", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, get_with("/", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(String::from_utf8_lossy(&body), "Welcome, guest!");

    let resp = test::call_service(&app, get_with("/login", &[])).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_unmatched_path_is_not_guarded() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    // No rule and no route: the request reaches the router.
    let resp = test::call_service(&app, get_with("/members/profile", &[])).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Authenticated Access
// =============================================================================

#[actix_web::test]
async fn test_each_board_role_may_register() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    for username in ["u1", "m1", "a1"] {
        let cookies = login(&app, username, false).await;

        let resp = test::call_service(&app, get_with("/boards/register", &cookies)).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", username);

        let body = test::read_body(resp).await;
        assert_eq!(
            String::from_utf8_lossy(&body),
            format!("Register a board as {}", username)
        );
    }
}

#[actix_web::test]
async fn test_post_register_with_basic_role() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;
    let cookies = login(&app, "u1", false).await;

    let mut req = test::TestRequest::post()
        .uri("/boards/register")
        .set_form([("title", "hello"), ("content", "first post")]);
    for c in &cookies {
        req = req.cookie(c.clone());
    }

    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/boards/list"));
}

#[actix_web::test]
async fn test_missing_role_redirects_to_access_denied() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;
    let cookies = login(&app, "guest", false).await;

    let resp = test::call_service(&app, get_with("/boards/register", &cookies)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/accessDenied"));

    let resp = test::call_service(&app, get_with("/accessDenied", &cookies)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = test::read_body(resp).await;
    assert_eq!(String::from_utf8_lossy(&body), "Access Denied for guest");
}

#[actix_web::test]
async fn test_percent_encoded_path_is_guarded() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, get_with("/boards/%72egister", &[])).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let cookies = login(&app, "guest", false).await;
    let resp = test::call_service(&app, get_with("/boards/%72egister", &cookies)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/accessDenied"));

    let cookies = login(&app, "u1", false).await;
    let resp = test::call_service(&app, get_with("/boards/%72egister", &cookies)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(String::from_utf8_lossy(&body), "Register a board as u1");
}

#[actix_web::test]
async fn test_login_returns_to_saved_request() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, get_with("/boards/register?bno=7", &[])).await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    let anonymous_session = session_only(&common::cookies(&resp));
    assert_eq!(anonymous_session.len(), 1);

    let resp = test::call_service(
        &app,
        login_request("u1", PASSWORD, false, &anonymous_session),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/boards/register?bno=7"));
}

#[actix_web::test]
async fn test_role_granted_after_login_needs_new_session() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;
    let cookies = login(&app, "guest", false).await;

    // Roles are resolved at login and kept in the session.
    fixture.store.grant_role("guest", "BASIC").await.unwrap();
    let resp = test::call_service(&app, get_with("/boards/register", &cookies)).await;
    assert_eq!(location(&resp).as_deref(), Some("/accessDenied"));

    let cookies = login(&app, "guest", false).await;
    let resp = test::call_service(&app, get_with("/boards/register", &cookies)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
