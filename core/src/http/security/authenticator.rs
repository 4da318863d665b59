//! Credential verification pipeline.
//!
//! # Spring Security Equivalent
//! `DaoAuthenticationProvider`
//!
//! Looks the user up in a [`CredentialStore`], checks the enabled flag,
//! verifies the password against the stored self-describing hash and finally
//! loads the role set.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use derive_more::{Display, Error};

use crate::http::security::credential::{CredentialStore, StoreError, StoredCredential};
use crate::http::security::crypto::{HashError, Hasher};
use crate::http::security::principal::{Principal, Role};

/// Password verified against unknown usernames so that a miss costs as much
/// as a wrong password.
const TIMING_DUMMY_PASSWORD: &str = "userNotFoundPassword";

/// Why a login attempt failed. For logs only; never show it to the client.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    #[display("user not found")]
    UserNotFound,
    #[display("account disabled")]
    Disabled,
    #[display("bad password")]
    BadPassword,
    #[display("credential store unavailable")]
    ServiceUnavailable,
}

/// A failed authentication.
///
/// `Display` is identical for every reason.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("Bad credentials")]
pub struct AuthFailure {
    #[error(not(source))]
    reason: FailureReason,
}

impl AuthFailure {
    pub fn new(reason: FailureReason) -> Self {
        AuthFailure { reason }
    }

    pub fn reason(&self) -> FailureReason {
        self.reason
    }
}

/// Verifies logins and resolves principals.
///
/// # Spring Security Equivalent
/// `DaoAuthenticationProvider` with a `UserDetailsService` and a `PasswordEncoder`
///
/// Stateless apart from the injected collaborators; clone it freely and call
/// it from any number of requests at once.
///
/// # Example
/// ```rust,ignore
/// let store = InMemoryCredentialStore::new();
/// let pipeline = CredentialPipeline::new(store.clone(), BCryptHasher::new());
///
/// store.add_user("m1", pipeline.hash("1111")?, true, ["MANAGER"]).await?;
///
/// let principal = pipeline.verify("m1", "1111").await?;
/// assert!(principal.has_role("MANAGER"));
/// ```
#[derive(Clone)]
pub struct CredentialPipeline {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn Hasher>,
    timing_hash: Arc<OnceLock<Option<String>>>,
}

impl CredentialPipeline {
    pub fn new<S, H>(store: S, hasher: H) -> Self
    where
        S: CredentialStore + 'static,
        H: Hasher + 'static,
    {
        Self::from_shared(Arc::new(store), Arc::new(hasher))
    }

    pub fn from_shared(store: Arc<dyn CredentialStore>, hasher: Arc<dyn Hasher>) -> Self {
        CredentialPipeline {
            store,
            hasher,
            timing_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Verifies a username / raw password pair.
    ///
    /// Checks run in this order: user exists, user enabled, password matches.
    /// Every failure costs exactly one password verification. Roles are only
    /// loaded once all three pass.
    pub async fn verify(&self, username: &str, raw_password: &str) -> Result<Principal, AuthFailure> {
        let credential = match self.lookup(username).await? {
            Some(credential) => credential,
            None => {
                self.burn_verification(raw_password).await;
                return Err(self.failure(username, FailureReason::UserNotFound));
            }
        };

        if !credential.enabled {
            // Same hash work as the other failures.
            self.check_password(raw_password, credential.password_hash).await;
            return Err(self.failure(username, FailureReason::Disabled));
        }

        if !self
            .check_password(raw_password, credential.password_hash.clone())
            .await
        {
            return Err(self.failure(username, FailureReason::BadPassword));
        }

        let roles = self.roles(username).await?;
        log::info!("User {} authenticated with roles {:?}", username, roles);

        Ok(Principal::new(username, credential.password_hash).roles(roles))
    }

    /// Resolves a principal without a password, for remember-me logins.
    ///
    /// Unknown and disabled users are still rejected.
    pub async fn load_principal(&self, username: &str) -> Result<Principal, AuthFailure> {
        let credential = self
            .lookup(username)
            .await?
            .ok_or_else(|| self.failure(username, FailureReason::UserNotFound))?;

        if !credential.enabled {
            return Err(self.failure(username, FailureReason::Disabled));
        }

        let roles = self.roles(username).await?;
        Ok(Principal::new(username, credential.password_hash).roles(roles))
    }

    /// Produces a new hash for provisioning or resetting a credential.
    pub fn hash(&self, raw_password: &str) -> Result<String, HashError> {
        self.hasher.hash(raw_password)
    }

    async fn lookup(&self, username: &str) -> Result<Option<StoredCredential>, AuthFailure> {
        self.store
            .find_by_username(username)
            .await
            .map_err(|e| self.unavailable(username, e))
    }

    async fn roles(&self, username: &str) -> Result<BTreeSet<Role>, AuthFailure> {
        self.store
            .find_roles(username)
            .await
            .map_err(|e| self.unavailable(username, e))
    }

    async fn check_password(&self, raw_password: &str, password_hash: String) -> bool {
        let hasher = Arc::clone(&self.hasher);
        let raw = raw_password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&raw, &password_hash))
            .await
            .unwrap_or(false)
    }

    async fn burn_verification(&self, raw_password: &str) {
        let hasher = Arc::clone(&self.hasher);
        let cell = Arc::clone(&self.timing_hash);
        let raw = raw_password.to_string();
        let _ = tokio::task::spawn_blocking(move || {
            if let Some(dummy) = cell.get_or_init(|| hasher.hash(TIMING_DUMMY_PASSWORD).ok()) {
                hasher.verify(&raw, dummy);
            }
        })
        .await;
    }

    fn failure(&self, username: &str, reason: FailureReason) -> AuthFailure {
        log::warn!("Authentication failed for user {}: {}", username, reason);
        AuthFailure::new(reason)
    }

    fn unavailable(&self, username: &str, error: StoreError) -> AuthFailure {
        log::error!("Credential lookup for user {} failed: {}", username, error);
        AuthFailure::new(FailureReason::ServiceUnavailable)
    }
}
