//! Form login and logout tests.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;

use common::{
    cookie, cookies, create_test_app, fixture, get_with, location, login, login_request,
    PASSWORD, REMEMBER_ME_COOKIE, SESSION_COOKIE,
};

// =============================================================================
// Login
// =============================================================================

#[actix_web::test]
async fn test_login_success_starts_session() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, login_request("m1", PASSWORD, false, &[])).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    assert!(cookie(&resp, SESSION_COOKIE).is_some());
    assert!(cookie(&resp, REMEMBER_ME_COOKIE).is_none());

    let session = cookies(&resp);
    let resp = test::call_service(&app, get_with("/", &session)).await;
    let body = test::read_body(resp).await;
    assert_eq!(String::from_utf8_lossy(&body), "Welcome, m1!");
}

#[actix_web::test]
async fn test_login_failures_are_indistinguishable() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let attempts = [
        ("nope", "x"),       // unknown user
        ("m1", "wrong"),     // bad password
        ("off", PASSWORD),   // disabled account
    ];

    let mut responses = Vec::new();
    for (username, password) in attempts {
        let resp = test::call_service(&app, login_request(username, password, true, &[])).await;
        let status = resp.status();
        let location = location(&resp);
        let set_cookies = cookies(&resp).len();
        let body = test::read_body(resp).await;
        responses.push((status, location, set_cookies, body));
    }

    assert_eq!(responses[0].0, StatusCode::FOUND);
    assert_eq!(responses[0].1.as_deref(), Some("/login?error"));
    assert_eq!(responses[0].2, 0);
    assert_eq!(responses[0], responses[1]);
    assert_eq!(responses[1], responses[2]);

    assert_eq!(fixture.tokens.series_count("m1").await, 0);
    assert_eq!(fixture.tokens.series_count("off").await, 0);
}

#[actix_web::test]
async fn test_failed_login_does_not_authenticate() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, login_request("u1", "wrong", false, &[])).await;
    let after = cookies(&resp);

    let resp = test::call_service(&app, get_with("/boards/register", &after)).await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

#[actix_web::test]
async fn test_login_rotates_session_cookie() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    // An anonymous session exists before login (saved request).
    let resp = test::call_service(&app, get_with("/boards/register", &[])).await;
    let before = cookie(&resp, SESSION_COOKIE).unwrap();

    let resp = test::call_service(&app, login_request("u1", PASSWORD, false, &[before.clone()])).await;
    let after = cookie(&resp, SESSION_COOKIE).unwrap();
    assert_ne!(before.value(), after.value());
}

// =============================================================================
// Logout
// =============================================================================

#[actix_web::test]
async fn test_logout_clears_session_and_remember_me() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let login_cookies = login(&app, "u1", true).await;
    assert_eq!(fixture.tokens.series_count("u1").await, 1);

    let resp = test::call_service(&app, get_with("/logout", &login_cookies)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/login?logout"));

    let remember_me = cookie(&resp, REMEMBER_ME_COOKIE).unwrap();
    assert_eq!(remember_me.value(), "");
    let session = cookie(&resp, SESSION_COOKIE).unwrap();
    assert_eq!(session.value(), "");

    assert_eq!(fixture.tokens.series_count("u1").await, 0);

    // The old remember-me cookie no longer logs anybody in.
    let old_remember_me: Vec<_> = login_cookies
        .into_iter()
        .filter(|c| c.name() == REMEMBER_ME_COOKIE)
        .collect();
    let resp = test::call_service(&app, get_with("/boards/register", &old_remember_me)).await;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

#[actix_web::test]
async fn test_logout_via_post() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;
    let login_cookies = login(&app, "m1", false).await;

    let mut req = test::TestRequest::post().uri("/logout");
    for c in &login_cookies {
        req = req.cookie(c.clone());
    }

    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/login?logout"));
}

#[actix_web::test]
async fn test_anonymous_logout() {
    let fixture = fixture().await;
    let app = create_test_app(&fixture).await;

    let resp = test::call_service(&app, get_with("/logout", &[])).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/login?logout"));
}
