//! Board application secured by board-guard.
//!
//! Only `/boards/register` needs a role (BASIC, MANAGER or ADMIN); every other
//! path is open. Login is form based with an optional remember-me cookie.
//!
//! Set `BOARD_GUARD_CONFIG` to a TOML file to override the default security
//! configuration.

mod handlers;

use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer};

use board_guard_core::http::security::{
    security_routes, BCryptHasher, Hasher, InMemoryCredentialStore, InMemoryTokenRepository,
    SecurityConfig, SecurityTransform, WebSecurity,
};

/// Demo members. Passwords are stored as BCrypt hashes.
///
/// # Spring Security Equivalent
/// ```java
/// auth.jdbcAuthentication()
///     .dataSource(dataSource)
///     .usersByUsernameQuery("select uid, upw, true from tbl_members where uid = ?")
///     .authoritiesByUsernameQuery("select member, role_name from tbl_member_roles where member = ?")
///     .passwordEncoder(new BCryptPasswordEncoder());
/// ```
async fn credential_store(hasher: &dyn Hasher) -> std::io::Result<InMemoryCredentialStore> {
    let store = InMemoryCredentialStore::new();
    let members: [(&str, &[&str]); 4] = [
        ("u1", &["BASIC"]),
        ("m1", &["MANAGER"]),
        ("a1", &["ADMIN"]),
        ("guest", &[]),
    ];

    for (username, roles) in members {
        let hash = hasher.hash("1111").map_err(std::io::Error::other)?;
        store
            .add_user(username, hash, true, roles.iter().copied())
            .await
            .map_err(std::io::Error::other)?;
    }

    Ok(store)
}

fn security_config() -> std::io::Result<SecurityConfig> {
    match std::env::var("BOARD_GUARD_CONFIG") {
        Ok(path) => SecurityConfig::from_file(&path).map_err(std::io::Error::other),
        Err(_) => Ok(SecurityConfig::default()),
    }
}

fn print_startup_info() {
    println!("=== Board Guard Demo ===");
    println!();
    println!("Server: http://127.0.0.1:8080");
    println!();
    println!("Members (password 1111):");
    println!("  u1    - Roles: [BASIC]");
    println!("  m1    - Roles: [MANAGER]");
    println!("  a1    - Roles: [ADMIN]");
    println!("  guest - Roles: []");
    println!();
    println!("Routes:");
    println!("  GET  /                - Home (anyone)");
    println!("  GET  /boards/list     - Board list (anyone)");
    println!("  GET  /boards/register - BASIC, MANAGER or ADMIN");
    println!("  POST /boards/register - BASIC, MANAGER or ADMIN");
    println!("  GET  /login           - Login page");
    println!("  POST /login           - Login processing (remember-me checkbox)");
    println!("  GET  /logout          - Logout");
    println!("  GET  /accessDenied    - Access denied page");
    println!();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = security_config()?;
    let hasher = Arc::new(BCryptHasher::with_cost(config.bcrypt_cost));
    let store = credential_store(&*hasher).await?;

    let security = Arc::new(
        WebSecurity::new(
            &config,
            Arc::new(store),
            hasher,
            Arc::new(InMemoryTokenRepository::new()),
        )
        .map_err(std::io::Error::other)?,
    );
    let session_key = Key::generate();

    print_startup_info();

    HttpServer::new(move || {
        App::new()
            .wrap(SecurityTransform::new(security.clone()))
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                session_key.clone(),
            ))
            .configure(security_routes(security.clone()))
            .service(handlers::pages::index)
            .service(handlers::pages::login)
            .service(handlers::pages::access_denied)
            .service(handlers::boards::list)
            .service(handlers::boards::register_form)
            .service(handlers::boards::register)
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}
