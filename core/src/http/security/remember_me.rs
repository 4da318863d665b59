//! Persistent remember-me authentication.
//!
//! # Spring Security Equivalent
//! `PersistentTokenBasedRememberMeServices` + `PersistentTokenRepository`
//!
//! # Token Lifecycle
//! - On login with the checkbox ticked a new *series* and *token value* are
//!   stored and sent to the browser as a signed cookie.
//! - Every auto-login consumes the token value: the stored value is replaced
//!   by a fresh one with a single conditional update, and the browser gets
//!   the new value.
//! - Presenting a series with an outdated value means the cookie was copied
//!   and used elsewhere. All tokens of that user are removed.
//!
//! # Cookie Format
//! `base64url(series:token:hex(hmac_sha256(key, series:token)))`
//!
//! # Example
//! ```rust,ignore
//! let remember_me = RememberMeServices::new(
//!     RememberMeConfig::new("zerock").token_validity_days(14),
//!     InMemoryTokenRepository::new(),
//! );
//!
//! // In the login handler, after the credential pipeline succeeded
//! let cookie = remember_me.login_success(&principal).await?;
//!
//! // On a later request without a session
//! let login = remember_me.auto_login(cookie.value()).await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use actix_web::cookie::{Cookie, SameSite};
use async_trait::async_trait;
use base64::prelude::*;
use derive_more::{Display, Error};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tokio::sync::RwLock;

use crate::http::security::credential::StoreError;
use crate::http::security::principal::Principal;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Remember-Me Configuration
// =============================================================================

/// Remember-Me configuration.
///
/// # Spring Security Equivalent
/// `RememberMeConfigurer`
#[derive(Clone)]
pub struct RememberMeConfig {
    /// Secret key for cookie signing
    key: String,
    token_validity: Duration,
    cookie_name: String,
    cookie_path: String,
    cookie_secure: bool,
    cookie_http_only: bool,
    cookie_same_site: SameSite,
    /// Login form checkbox name
    parameter_name: String,
    /// Ignore the checkbox and always issue a cookie
    always_remember: bool,
}

impl RememberMeConfig {
    /// Create a configuration signing cookies with `key`.
    ///
    /// # Spring Equivalent
    /// `rememberMe().key("zerock")`
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            token_validity: Duration::from_secs(14 * 24 * 60 * 60), // 14 days
            cookie_name: "remember-me".to_string(),
            cookie_path: "/".to_string(),
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            parameter_name: "remember-me".to_string(),
            always_remember: false,
        }
    }

    pub fn token_validity_days(mut self, days: u64) -> Self {
        self.token_validity = Duration::from_secs(days.saturating_mul(24 * 60 * 60));
        self
    }

    pub fn token_validity_seconds(mut self, seconds: u64) -> Self {
        self.token_validity = Duration::from_secs(seconds);
        self
    }

    pub fn cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_string();
        self
    }

    pub fn cookie_path(mut self, path: &str) -> Self {
        self.cookie_path = path.to_string();
        self
    }

    /// Set whether the cookie requires HTTPS.
    pub fn cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    pub fn cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    pub fn parameter_name(mut self, name: &str) -> Self {
        self.parameter_name = name.to_string();
        self
    }

    pub fn always_remember(mut self, always: bool) -> Self {
        self.always_remember = always;
        self
    }

    pub fn get_token_validity(&self) -> Duration {
        self.token_validity
    }

    pub fn get_cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn get_cookie_path(&self) -> &str {
        &self.cookie_path
    }

    pub fn get_cookie_same_site(&self) -> SameSite {
        self.cookie_same_site
    }

    pub fn get_parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn is_always_remember(&self) -> bool {
        self.always_remember
    }
}

// =============================================================================
// Persisted Token
// =============================================================================

/// A row of the persistent token table.
///
/// # Spring Security Equivalent
/// `PersistentRememberMeToken` (`persistent_logins` table)
#[derive(Clone, PartialEq, Eq)]
pub struct RememberMeToken {
    pub series: String,
    pub token_value: String,
    pub username: String,
    pub last_used: SystemTime,
}

impl RememberMeToken {
    /// A brand new series for `username`.
    pub fn issue(username: &str) -> Self {
        Self {
            series: generate_random_value(),
            token_value: generate_random_value(),
            username: username.to_string(),
            last_used: SystemTime::now(),
        }
    }

    /// True once `validity` has passed since the last use.
    pub fn is_expired(&self, validity: Duration, now: SystemTime) -> bool {
        match self.last_used.checked_add(validity) {
            Some(expiry) => expiry < now,
            None => false,
        }
    }
}

impl fmt::Debug for RememberMeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RememberMeToken")
            .field("series", &self.series)
            .field("username", &self.username)
            .field("last_used", &self.last_used)
            .finish_non_exhaustive()
    }
}

fn generate_random_value() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    BASE64_STANDARD.encode(bytes)
}

// =============================================================================
// Token Repository
// =============================================================================

/// Storage of remember-me series.
///
/// # Spring Security Equivalent
/// `PersistentTokenRepository` / `JdbcTokenRepositoryImpl`
///
/// `rotate_token` must be a single conditional update (`UPDATE ... SET
/// token = ?new, last_used = ? WHERE series = ? AND token = ?presented`) so
/// that two requests racing with the same cookie cannot both succeed.
#[async_trait]
pub trait PersistentTokenRepository: Send + Sync {
    async fn create_new_token(&self, token: RememberMeToken) -> Result<(), StoreError>;

    async fn get_token_for_series(&self, series: &str)
        -> Result<Option<RememberMeToken>, StoreError>;

    /// Replaces the token value of `series` only if it still equals
    /// `presented_value`. Returns whether the update happened.
    async fn rotate_token(
        &self,
        series: &str,
        presented_value: &str,
        new_value: &str,
        last_used: SystemTime,
    ) -> Result<bool, StoreError>;

    async fn remove_series(&self, series: &str) -> Result<(), StoreError>;

    async fn remove_user_tokens(&self, username: &str) -> Result<(), StoreError>;
}

/// In-memory token repository. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RememberMeToken>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live series for `username`.
    pub async fn series_count(&self, username: &str) -> usize {
        let tokens = self.tokens.read().await;
        tokens.values().filter(|t| t.username == username).count()
    }
}

#[async_trait]
impl PersistentTokenRepository for InMemoryTokenRepository {
    async fn create_new_token(&self, token: RememberMeToken) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.series) {
            return Err(StoreError::Storage {
                message: format!("series {} already exists", token.series),
            });
        }
        tokens.insert(token.series.clone(), token);
        Ok(())
    }

    async fn get_token_for_series(
        &self,
        series: &str,
    ) -> Result<Option<RememberMeToken>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(series).cloned())
    }

    async fn rotate_token(
        &self,
        series: &str,
        presented_value: &str,
        new_value: &str,
        last_used: SystemTime,
    ) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(series) {
            Some(token) if token.token_value == presented_value => {
                token.token_value = new_value.to_string();
                token.last_used = last_used;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_series(&self, series: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        tokens.remove(series);
        Ok(())
    }

    async fn remove_user_tokens(&self, username: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, t| t.username != username);
        Ok(())
    }
}

// =============================================================================
// Remember-Me Error
// =============================================================================

/// Remember-me failures.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum RememberMeError {
    #[display("invalid remember-me cookie")]
    InvalidToken,
    #[display("invalid remember-me cookie signature")]
    InvalidSignature,
    #[display("no persistent token found for series")]
    TokenNotFound,
    #[display("remember-me token expired")]
    TokenExpired,
    /// The presented value was already consumed: the whole chain is
    /// considered stolen.
    #[display("remember-me token reused; possible cookie theft")]
    ForgedToken,
    #[display("remember-me key is unusable")]
    InvalidKey,
    #[display("token repository error: {_0}")]
    Store(StoreError),
}

impl From<StoreError> for RememberMeError {
    fn from(error: StoreError) -> Self {
        RememberMeError::Store(error)
    }
}

// =============================================================================
// Remember-Me Services
// =============================================================================

/// Result of a successful auto-login.
#[derive(Debug)]
pub struct RememberMeLogin {
    pub username: String,
    /// Cookie carrying the rotated token value.
    pub cookie: Cookie<'static>,
}

/// Remember-me services.
///
/// # Spring Security Equivalent
/// `PersistentTokenBasedRememberMeServices`
#[derive(Clone)]
pub struct RememberMeServices {
    config: RememberMeConfig,
    repository: Arc<dyn PersistentTokenRepository>,
}

impl RememberMeServices {
    pub fn new<R: PersistentTokenRepository + 'static>(config: RememberMeConfig, repository: R) -> Self {
        Self::from_shared(config, Arc::new(repository))
    }

    pub fn from_shared(config: RememberMeConfig, repository: Arc<dyn PersistentTokenRepository>) -> Self {
        Self { config, repository }
    }

    /// Starts a new series and returns its cookie.
    ///
    /// # Spring Equivalent
    /// `RememberMeServices.loginSuccess()`
    pub async fn login_success(&self, principal: &Principal) -> Result<Cookie<'static>, RememberMeError> {
        let token = RememberMeToken::issue(principal.get_username());
        let value = self.encode(&token.series, &token.token_value)?;
        self.repository.create_new_token(token).await?;
        log::debug!("Issued remember-me series for user {}", principal.get_username());
        Ok(self.create_cookie(value))
    }

    /// Validates a cookie and rotates its token.
    ///
    /// # Spring Equivalent
    /// `RememberMeServices.autoLogin()`
    pub async fn auto_login(&self, cookie_value: &str) -> Result<RememberMeLogin, RememberMeError> {
        let (series, token_value) = self.decode(cookie_value)?;
        let rotated = self.consume(&series, &token_value).await?;
        let value = self.encode(&rotated.series, &rotated.token_value)?;

        Ok(RememberMeLogin {
            username: rotated.username,
            cookie: self.create_cookie(value),
        })
    }

    /// Consumes `(series, token_value)` and returns the rotated token.
    ///
    /// A second call with the same pair fails with `ForgedToken` and removes
    /// every series of the user.
    pub async fn consume(&self, series: &str, token_value: &str) -> Result<RememberMeToken, RememberMeError> {
        let stored = self
            .repository
            .get_token_for_series(series)
            .await?
            .ok_or(RememberMeError::TokenNotFound)?;

        if stored.token_value != token_value {
            return Err(self.theft_detected(&stored.username).await);
        }

        let now = SystemTime::now();
        if stored.is_expired(self.config.token_validity, now) {
            self.repository.remove_series(series).await?;
            return Err(RememberMeError::TokenExpired);
        }

        let new_value = generate_random_value();
        if !self
            .repository
            .rotate_token(series, token_value, &new_value, now)
            .await?
        {
            // Someone consumed the same value between our read and update.
            return Err(self.theft_detected(&stored.username).await);
        }

        log::debug!("Rotated remember-me token for user {}", stored.username);
        Ok(RememberMeToken {
            token_value: new_value,
            last_used: now,
            ..stored
        })
    }

    async fn theft_detected(&self, username: &str) -> RememberMeError {
        log::warn!(
            "Remember-me token reuse detected for user {}; invalidating all series",
            username
        );
        if let Err(e) = self.repository.remove_user_tokens(username).await {
            log::error!("Failed to remove remember-me tokens of user {}: {}", username, e);
            return RememberMeError::Store(e);
        }
        RememberMeError::ForgedToken
    }

    /// Removes every series of `username`.
    ///
    /// # Spring Equivalent
    /// `RememberMeServices.logout()`
    pub async fn logout(&self, username: &str) -> Result<(), RememberMeError> {
        self.repository.remove_user_tokens(username).await?;
        Ok(())
    }

    /// Create a cookie that clears the remember-me token.
    pub fn logout_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.config.cookie_name.clone(), "")
            .path(self.config.cookie_path.clone())
            .max_age(actix_web::cookie::time::Duration::ZERO)
            .http_only(self.config.cookie_http_only)
            .same_site(self.config.cookie_same_site);

        if self.config.cookie_secure {
            cookie = cookie.secure(true);
        }

        cookie.finish()
    }

    fn create_cookie(&self, value: String) -> Cookie<'static> {
        let seconds = i64::try_from(self.config.token_validity.as_secs()).unwrap_or(i64::MAX);
        let max_age = actix_web::cookie::time::Duration::seconds(seconds);

        let mut cookie = Cookie::build(self.config.cookie_name.clone(), value)
            .path(self.config.cookie_path.clone())
            .max_age(max_age)
            .http_only(self.config.cookie_http_only)
            .same_site(self.config.cookie_same_site);

        if self.config.cookie_secure {
            cookie = cookie.secure(true);
        }

        cookie.finish()
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, RememberMeError> {
        let mut mac = HmacSha256::new_from_slice(self.config.key.as_bytes())
            .map_err(|_| RememberMeError::InvalidKey)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    fn encode(&self, series: &str, token_value: &str) -> Result<String, RememberMeError> {
        let payload = format!("{}:{}", series, token_value);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(BASE64_URL_SAFE_NO_PAD.encode(format!("{}:{}", payload, signature)))
    }

    fn decode(&self, cookie_value: &str) -> Result<(String, String), RememberMeError> {
        let decoded = BASE64_URL_SAFE_NO_PAD
            .decode(cookie_value)
            .map_err(|_| RememberMeError::InvalidToken)?;
        let data = String::from_utf8(decoded).map_err(|_| RememberMeError::InvalidToken)?;

        let parts: Vec<&str> = data.splitn(3, ':').collect();
        let [series, token_value, signature] = parts[..] else {
            return Err(RememberMeError::InvalidToken);
        };
        if series.is_empty() || token_value.is_empty() {
            return Err(RememberMeError::InvalidToken);
        }

        let signature = hex::decode(signature).map_err(|_| RememberMeError::InvalidSignature)?;
        self.mac(&format!("{}:{}", series, token_value))?
            .verify_slice(&signature)
            .map_err(|_| RememberMeError::InvalidSignature)?;

        Ok((series.to_string(), token_value.to_string()))
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub fn parameter_name(&self) -> &str {
        &self.config.parameter_name
    }

    pub fn is_always_remember(&self) -> bool {
        self.config.always_remember
    }

    pub fn config(&self) -> &RememberMeConfig {
        &self.config
    }
}
