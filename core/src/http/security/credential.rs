//! Credential store capability.
//!
//! # Spring Security Equivalent
//! `UserDetailsService` backed by `JdbcDaoImpl`, whose two queries
//! (`usersByUsernameQuery`, `authoritiesByUsernameQuery`) become the two
//! trait methods below.
//!
//! # Example
//! ```rust,ignore
//! use board_guard_core::http::security::credential::{CredentialStore, StoredCredential, StoreError};
//! use board_guard_core::http::security::Role;
//! use async_trait::async_trait;
//!
//! struct MemberTable {
//!     pool: PgPool,
//! }
//!
//! #[async_trait]
//! impl CredentialStore for MemberTable {
//!     async fn find_by_username(&self, username: &str) -> Result<Option<StoredCredential>, StoreError> {
//!         // select upw, true from tbl_member where uid = $1
//!     }
//!
//!     async fn find_roles(&self, username: &str) -> Result<BTreeSet<Role>, StoreError> {
//!         // select role_name from tbl_member_roles where member = $1
//!     }
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{Display, Error};
use tokio::sync::RwLock;

use crate::http::security::principal::Role;

/// Failure of the backing store itself (not a failed login).
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[display("user {username} already exists")]
    AlreadyExists { username: String },
    #[display("user {username} not found")]
    NotFound { username: String },
    #[display("storage error: {message}")]
    Storage { message: String },
}

/// The password row of a user.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub password_hash: String,
    pub enabled: bool,
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Query surface of the user store.
///
/// # Spring Security Equivalent
/// `UserDetailsService.loadUserByUsername()`, split into its two queries.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the credential row, or `Ok(None)` if the user does not exist.
    async fn find_by_username(&self, username: &str)
        -> Result<Option<StoredCredential>, StoreError>;

    /// Returns the user's roles. Unknown users have no roles.
    async fn find_roles(&self, username: &str) -> Result<BTreeSet<Role>, StoreError>;
}

#[derive(Clone)]
struct MemberRecord {
    credential: StoredCredential,
    roles: BTreeSet<Role>,
}

/// In-memory credential store.
///
/// Useful for tests, demos and small deployments. Cloning shares the
/// underlying map.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    members: Arc<RwLock<HashMap<String, MemberRecord>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user. Fails if the username is taken.
    ///
    /// # Spring Equivalent
    /// `UserDetailsManager.createUser()`
    pub async fn add_user<I, R>(
        &self,
        username: &str,
        password_hash: String,
        enabled: bool,
        roles: I,
    ) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        let mut members = self.members.write().await;
        if members.contains_key(username) {
            return Err(StoreError::AlreadyExists {
                username: username.to_string(),
            });
        }
        members.insert(
            username.to_string(),
            MemberRecord {
                credential: StoredCredential {
                    password_hash,
                    enabled,
                },
                roles: roles.into_iter().map(Into::into).collect(),
            },
        );
        Ok(())
    }

    /// Replaces a user's password hash.
    pub async fn set_password_hash(
        &self,
        username: &str,
        password_hash: String,
    ) -> Result<(), StoreError> {
        self.with_member(username, |m| m.credential.password_hash = password_hash)
            .await
    }

    /// Enables or disables a user.
    pub async fn set_enabled(&self, username: &str, enabled: bool) -> Result<(), StoreError> {
        self.with_member(username, |m| m.credential.enabled = enabled)
            .await
    }

    /// Grants an extra role.
    pub async fn grant_role(&self, username: &str, role: impl Into<Role>) -> Result<(), StoreError> {
        let role = role.into();
        self.with_member(username, |m| {
            m.roles.insert(role);
        })
        .await
    }

    /// Removes a user.
    pub async fn remove_user(&self, username: &str) -> Result<(), StoreError> {
        let mut members = self.members.write().await;
        members
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                username: username.to_string(),
            })
    }

    async fn with_member<F>(&self, username: &str, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut MemberRecord),
    {
        let mut members = self.members.write().await;
        match members.get_mut(username) {
            Some(member) => {
                update(member);
                Ok(())
            }
            None => Err(StoreError::NotFound {
                username: username.to_string(),
            }),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredential>, StoreError> {
        let members = self.members.read().await;
        Ok(members.get(username).map(|m| m.credential.clone()))
    }

    async fn find_roles(&self, username: &str) -> Result<BTreeSet<Role>, StoreError> {
        let members = self.members.read().await;
        Ok(members
            .get(username)
            .map(|m| m.roles.clone())
            .unwrap_or_default())
    }
}
