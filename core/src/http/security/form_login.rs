//! Form-based login and logout.
//!
//! # Spring Security Equivalent
//! `formLogin()` (`UsernamePasswordAuthenticationFilter`) and `logout()`
//! (`LogoutFilter`).
//!
//! `POST {login_processing_url}` with `username`, `password` and the optional
//! remember-me checkbox. Every failed attempt ends in the same redirect to the
//! failure URL, whatever the reason.

use std::collections::HashMap;

use actix_session::Session;
use actix_web::cookie::Cookie;
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::http::security::config::SecurityConfig;
use crate::http::security::principal::Principal;
use crate::http::security::session::SessionAuthenticator;
use crate::http::security::web::WebSecurity;

// =============================================================================
// Form Login Configuration
// =============================================================================

/// Form login configuration.
///
/// # Spring Security Equivalent
/// `FormLoginConfigurer` + `LogoutConfigurer`
#[derive(Debug, Clone)]
pub struct FormLoginConfig {
    /// URL of the login page (GET)
    login_page: String,
    /// URL that processes the login form (POST)
    login_processing_url: String,
    default_success_url: String,
    /// Always redirect to the default success URL (ignore saved request)
    always_use_default_success_url: bool,
    failure_url: String,
    logout_url: String,
    logout_success_url: String,
}

impl Default for FormLoginConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FormLoginConfig {
    pub fn new() -> Self {
        Self {
            login_page: "/login".to_string(),
            login_processing_url: "/login".to_string(),
            default_success_url: "/".to_string(),
            always_use_default_success_url: false,
            failure_url: "/login?error".to_string(),
            logout_url: "/logout".to_string(),
            logout_success_url: "/login?logout".to_string(),
        }
    }

    /// Login page and processing URL at `login_path`, failure and logout
    /// success as query variants of it.
    pub fn from_security_config(config: &SecurityConfig) -> Self {
        Self::new()
            .login_page(&config.login_path)
            .login_processing_url(&config.login_path)
            .failure_url(&format!("{}?error", config.login_path))
            .default_success_url(&config.default_success_path)
            .always_use_default_success_url(config.always_use_default_success_url)
            .logout_url(&config.logout_path)
            .logout_success_url(&format!("{}?logout", config.login_path))
    }

    /// # Spring Equivalent
    /// `formLogin().loginPage("/login")`
    pub fn login_page(mut self, url: &str) -> Self {
        self.login_page = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().loginProcessingUrl("/login")`
    pub fn login_processing_url(mut self, url: &str) -> Self {
        self.login_processing_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().defaultSuccessUrl("/")`
    pub fn default_success_url(mut self, url: &str) -> Self {
        self.default_success_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `formLogin().defaultSuccessUrl("/", true)`
    pub fn always_use_default_success_url(mut self, always: bool) -> Self {
        self.always_use_default_success_url = always;
        self
    }

    /// # Spring Equivalent
    /// `formLogin().failureUrl("/login?error")`
    pub fn failure_url(mut self, url: &str) -> Self {
        self.failure_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `logout().logoutUrl("/logout")`
    pub fn logout_url(mut self, url: &str) -> Self {
        self.logout_url = url.to_string();
        self
    }

    /// # Spring Equivalent
    /// `logout().logoutSuccessUrl("/login?logout")`
    pub fn logout_success_url(mut self, url: &str) -> Self {
        self.logout_success_url = url.to_string();
        self
    }

    pub fn get_login_page(&self) -> &str {
        &self.login_page
    }

    pub fn get_login_processing_url(&self) -> &str {
        &self.login_processing_url
    }

    pub fn get_default_success_url(&self) -> &str {
        &self.default_success_url
    }

    pub fn is_always_use_default_success_url(&self) -> bool {
        self.always_use_default_success_url
    }

    pub fn get_failure_url(&self) -> &str {
        &self.failure_url
    }

    pub fn get_logout_url(&self) -> &str {
        &self.logout_url
    }

    pub fn get_logout_success_url(&self) -> &str {
        &self.logout_success_url
    }
}

// =============================================================================
// Login Form Data
// =============================================================================

/// Submitted login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Remaining fields, including the remember-me checkbox.
    #[serde(flatten)]
    pub params: HashMap<String, String>,
}

impl LoginForm {
    /// Whether the checkbox named `parameter` was ticked.
    pub fn is_remember_me(&self, parameter: &str) -> bool {
        self.params
            .get(parameter)
            .is_some_and(|v| matches!(v.as_str(), "on" | "true" | "yes" | "1"))
    }
}

// =============================================================================
// Form Login Handler
// =============================================================================

/// Builds the redirects of the login flow.
///
/// # Spring Security Equivalent
/// `SavedRequestAwareAuthenticationSuccessHandler` +
/// `SimpleUrlAuthenticationFailureHandler` + `SimpleUrlLogoutSuccessHandler`
#[derive(Debug, Clone)]
pub struct FormLoginHandler {
    config: FormLoginConfig,
    sessions: SessionAuthenticator,
}

impl FormLoginHandler {
    pub fn new(config: FormLoginConfig, sessions: SessionAuthenticator) -> Self {
        Self { config, sessions }
    }

    /// Stores `principal` in the session and redirects to the saved request
    /// or the default success URL.
    pub fn on_authentication_success(
        &self,
        session: &Session,
        principal: &Principal,
        remember_me: Option<Cookie<'static>>,
    ) -> HttpResponse {
        let saved = self.sessions.take_saved_request(session);

        if let Err(e) = self.sessions.login(session, principal) {
            log::error!("Could not store principal {} in session: {}", principal.get_username(), e);
            return self.on_authentication_failure();
        }

        let target = match saved {
            Some(url) if !self.config.always_use_default_success_url && is_local(&url) => url,
            _ => self.config.default_success_url.clone(),
        };

        let mut response = HttpResponse::Found();
        response.insert_header((LOCATION, target));
        if let Some(cookie) = remember_me {
            response.cookie(cookie);
        }
        response.finish()
    }

    /// Same response for every failure reason.
    pub fn on_authentication_failure(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((LOCATION, self.config.failure_url.clone()))
            .finish()
    }

    /// Invalidates the session and clears the remember-me cookie.
    pub fn on_logout(&self, session: &Session, clear_cookie: Cookie<'static>) -> HttpResponse {
        self.sessions.logout(session);

        HttpResponse::Found()
            .insert_header((LOCATION, self.config.logout_success_url.clone()))
            .cookie(clear_cookie)
            .finish()
    }

    pub fn is_login_page(&self, path: &str) -> bool {
        path == self.config.login_page
    }

    pub fn is_login_processing_url(&self, path: &str) -> bool {
        path == self.config.login_processing_url
    }

    pub fn is_logout_url(&self, path: &str) -> bool {
        path == self.config.logout_url
    }

    pub fn config(&self) -> &FormLoginConfig {
        &self.config
    }
}

/// Relative URL on this host.
fn is_local(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

// =============================================================================
// Route Handlers
// =============================================================================

/// `POST {login_processing_url}`
pub async fn process_login(
    session: Session,
    form: web::Form<LoginForm>,
    security: web::Data<WebSecurity>,
) -> HttpResponse {
    let form = form.into_inner();
    let handler = security.form_login();

    let principal = match security.pipeline().verify(&form.username, &form.password).await {
        Ok(principal) => principal,
        Err(_) => return handler.on_authentication_failure(),
    };

    let remember_me = security.remember_me();
    let cookie = if remember_me.is_always_remember() || form.is_remember_me(remember_me.parameter_name()) {
        match remember_me.login_success(&principal).await {
            Ok(cookie) => Some(cookie),
            Err(e) => {
                log::error!("Remember-me token not issued for user {}: {}", principal.get_username(), e);
                None
            }
        }
    } else {
        None
    };

    handler.on_authentication_success(&session, &principal, cookie)
}

/// `GET|POST {logout_url}`
pub async fn process_logout(session: Session, security: web::Data<WebSecurity>) -> HttpResponse {
    if let Some(principal) = security.sessions().get_principal(&session) {
        if let Err(e) = security.remember_me().logout(principal.get_username()).await {
            log::error!("Failed to remove remember-me tokens of {}: {}", principal.get_username(), e);
        }
        log::info!("User {} logged out", principal.get_username());
    }

    security
        .form_login()
        .on_logout(&session, security.remember_me().logout_cookie())
}
