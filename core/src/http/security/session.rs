//! Session-based authentication state.
//!
//! # Spring Security Equivalent
//! `HttpSessionSecurityContextRepository` + `SessionFixationProtectionStrategy`
//! + `HttpSessionRequestCache`
//!
//! The authenticated principal (username and roles, never the hash) and the
//! URL that triggered the login redirect live in the actix-session.
//! `SessionMiddleware` must wrap the security middleware.

use actix_session::Session;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::http::security::principal::Principal;

/// Strategy for session fixation protection.
///
/// # Spring Security Equivalent
/// `sessionManagement().sessionFixation()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFixationStrategy {
    /// New session id, attributes kept.
    ///
    /// # Spring Equivalent
    /// `SessionFixationProtectionStrategy.MIGRATE_SESSION`
    #[default]
    MigrateSession,

    /// New session id, attributes dropped.
    ///
    /// # Spring Equivalent
    /// `SessionFixationProtectionStrategy.NEW_SESSION`
    NewSession,
}

/// Principal as serialized into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub username: String,
    pub roles: Vec<String>,
}

impl SessionPrincipal {
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            username: principal.get_username().to_string(),
            roles: principal
                .get_roles()
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
        }
    }

    pub fn to_principal(&self) -> Principal {
        Principal::new(self.username.clone(), String::new()).roles(self.roles.iter().cloned())
    }
}

impl From<&Principal> for SessionPrincipal {
    fn from(principal: &Principal) -> Self {
        Self::from_principal(principal)
    }
}

/// Session write failures.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[display("failed to write session attribute: {reason}")]
    Insert { reason: String },
}

/// Session attribute keys and fixation strategy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    principal_key: String,
    saved_request_key: String,
    fixation_strategy: SessionFixationStrategy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            principal_key: "security_principal".to_string(),
            saved_request_key: "security_saved_request".to_string(),
            fixation_strategy: SessionFixationStrategy::MigrateSession,
        }
    }

    pub fn principal_key(mut self, key: &str) -> Self {
        self.principal_key = key.to_string();
        self
    }

    pub fn saved_request_key(mut self, key: &str) -> Self {
        self.saved_request_key = key.to_string();
        self
    }

    pub fn fixation_strategy(mut self, strategy: SessionFixationStrategy) -> Self {
        self.fixation_strategy = strategy;
        self
    }

    pub fn get_principal_key(&self) -> &str {
        &self.principal_key
    }

    pub fn get_saved_request_key(&self) -> &str {
        &self.saved_request_key
    }

    pub fn get_fixation_strategy(&self) -> SessionFixationStrategy {
        self.fixation_strategy
    }
}

/// Reads and writes the security attributes of a session.
///
/// # Example
/// ```rust,ignore
/// async fn login(session: Session, security: Data<WebSecurity>) -> impl Responder {
///     let principal = security.pipeline().verify(&form.username, &form.password).await?;
///     security.sessions().login(&session, &principal)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionAuthenticator {
    config: SessionConfig,
}

impl SessionAuthenticator {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Stores `principal` after rotating the session id.
    pub fn login(&self, session: &Session, principal: &Principal) -> Result<(), SessionError> {
        match self.config.fixation_strategy {
            SessionFixationStrategy::MigrateSession => session.renew(),
            SessionFixationStrategy::NewSession => {
                session.purge();
                session.renew();
            }
        }

        session
            .insert(&self.config.principal_key, SessionPrincipal::from(principal))
            .map_err(|e| SessionError::Insert {
                reason: e.to_string(),
            })
    }

    /// Invalidates the whole session.
    pub fn logout(&self, session: &Session) {
        session.purge();
    }

    /// The principal stored in the session, if any. Unreadable entries are
    /// dropped and treated as anonymous.
    pub fn get_principal(&self, session: &Session) -> Option<Principal> {
        match session.get::<SessionPrincipal>(&self.config.principal_key) {
            Ok(stored) => stored.map(|p| p.to_principal()),
            Err(e) => {
                log::warn!("Discarding unreadable session principal: {}", e);
                session.remove(&self.config.principal_key);
                None
            }
        }
    }

    /// Remembers the URL to return to after login.
    ///
    /// # Spring Equivalent
    /// `HttpSessionRequestCache.saveRequest()`
    pub fn save_request(&self, session: &Session, url: &str) -> Result<(), SessionError> {
        session
            .insert(&self.config.saved_request_key, url)
            .map_err(|e| SessionError::Insert {
                reason: e.to_string(),
            })
    }

    /// Removes and returns the saved URL.
    pub fn take_saved_request(&self, session: &Session) -> Option<String> {
        session
            .remove_as::<String>(&self.config.saved_request_key)
            .and_then(Result::ok)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
