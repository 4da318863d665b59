//! Wiring of the security components for an actix application.
//!
//! # Spring Security Equivalent
//! The beans of a `@EnableWebSecurity` configuration class.
//!
//! Everything is built once at startup and shared through an `Arc`:
//!
//! ```rust,ignore
//! let security = Arc::new(WebSecurity::new(
//!     &SecurityConfig::default(),
//!     Arc::new(store),
//!     Arc::new(BCryptHasher::new()),
//!     Arc::new(InMemoryTokenRepository::new()),
//! )?);
//!
//! App::new()
//!     .wrap(SecurityTransform::new(security.clone()))
//!     .wrap(SessionMiddleware::new(CookieSessionStore::default(), key.clone()))
//!     .configure(security_routes(security.clone()))
//!     .route("/boards/register", web::get().to(register))
//! ```

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::web;

use crate::http::error::{AuthError, ConfigError};
use crate::http::security::authenticator::CredentialPipeline;
use crate::http::security::authorizer::PolicyEvaluator;
use crate::http::security::config::SecurityConfig;
use crate::http::security::credential::CredentialStore;
use crate::http::security::crypto::Hasher;
use crate::http::security::form_login::{self, FormLoginConfig, FormLoginHandler};
use crate::http::security::principal::Principal;
use crate::http::security::remember_me::{PersistentTokenRepository, RememberMeServices};
use crate::http::security::session::SessionAuthenticator;

/// Every security collaborator of the application.
pub struct WebSecurity {
    evaluator: PolicyEvaluator,
    pipeline: CredentialPipeline,
    remember_me: RememberMeServices,
    sessions: SessionAuthenticator,
    form_login: FormLoginHandler,
    access_denied_path: String,
}

impl WebSecurity {
    /// Validates `config` and assembles the components around the injected
    /// stores and hasher.
    pub fn new(
        config: &SecurityConfig,
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn Hasher>,
        token_repository: Arc<dyn PersistentTokenRepository>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let sessions = SessionAuthenticator::new(config.session.to_config());
        Ok(WebSecurity {
            evaluator: PolicyEvaluator::new(config.compile_rules()?),
            pipeline: CredentialPipeline::from_shared(store, hasher),
            remember_me: RememberMeServices::from_shared(
                config.remember_me.to_config(),
                token_repository,
            ),
            form_login: FormLoginHandler::new(
                FormLoginConfig::from_security_config(config),
                sessions.clone(),
            ),
            sessions,
            access_denied_path: config.access_denied_path.clone(),
        })
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    pub fn pipeline(&self) -> &CredentialPipeline {
        &self.pipeline
    }

    pub fn remember_me(&self) -> &RememberMeServices {
        &self.remember_me
    }

    pub fn sessions(&self) -> &SessionAuthenticator {
        &self.sessions
    }

    pub fn form_login(&self) -> &FormLoginHandler {
        &self.form_login
    }

    pub fn login_page(&self) -> &str {
        self.form_login.config().get_login_page()
    }

    pub fn access_denied_path(&self) -> &str {
        &self.access_denied_path
    }

    /// Paths the middleware never blocks: login page, login processing,
    /// logout and the access-denied page.
    pub fn is_entry_point(&self, path: &str) -> bool {
        self.form_login.is_login_page(path)
            || self.form_login.is_login_processing_url(path)
            || self.form_login.is_logout_url(path)
            || path == self.access_denied_path
    }

    /// Resolves a remember-me cookie into a principal and the cookie with
    /// the rotated token.
    pub async fn remember_me_login(
        &self,
        cookie_value: &str,
    ) -> Result<(Principal, Cookie<'static>), AuthError> {
        let login = self.remember_me.auto_login(cookie_value).await?;
        let principal = self.pipeline.load_principal(&login.username).await?;
        Ok((principal, login.cookie))
    }
}

/// Registers the login processing and logout routes, and the `WebSecurity`
/// app data their handlers read.
pub fn security_routes(security: Arc<WebSecurity>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let config = security.form_login().config().clone();
        cfg.app_data(web::Data::from(security))
            .route(
                config.get_login_processing_url(),
                web::post().to(form_login::process_login),
            )
            .route(config.get_logout_url(), web::get().to(form_login::process_logout))
            .route(config.get_logout_url(), web::post().to(form_login::process_logout));
    }
}
