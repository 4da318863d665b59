//! Principal and role model.
//!
//! # Spring Equivalent
//! `UserDetails` / `GrantedAuthority`

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An authorization label such as `MANAGER`.
///
/// Roles are stored without the `ROLE_` prefix. The prefixed form only
/// appears at the authorization boundary through [`Role::authority`], so a
/// store that still returns `ROLE_ADMIN` compares equal to `ADMIN`.
///
/// # Example
/// ```
/// use board_guard_core::http::security::Role;
///
/// assert_eq!(Role::new("ROLE_ADMIN"), Role::new("ADMIN"));
/// assert_eq!(Role::new("ADMIN").authority(), "ROLE_ADMIN");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role(String);

impl Role {
    /// Prefix added at the authorization boundary.
    ///
    /// # Spring Equivalent
    /// `JdbcDaoImpl.setRolePrefix("ROLE_")`
    pub const PREFIX: &'static str = "ROLE_";

    /// Creates a role, dropping a leading `ROLE_` if present.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        match label.strip_prefix(Self::PREFIX) {
            Some(bare) => Role(bare.to_string()),
            None => Role(label),
        }
    }

    /// Returns the bare label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the prefixed authority string (`ROLE_X`).
    pub fn authority(&self) -> String {
        format!("{}{}", Self::PREFIX, self.0)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Role::new(label)
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Role::new(label)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

/// Builds a role set from labels.
pub fn role_set<I, R>(roles: I) -> BTreeSet<Role>
where
    I: IntoIterator<Item = R>,
    R: Into<Role>,
{
    roles.into_iter().map(Into::into).collect()
}

/// An authenticated identity and its role set.
///
/// # Spring Equivalent
/// `UserDetails` / `User`
///
/// Created by the credential pipeline once a lookup succeeds and never
/// mutated afterwards; the builder methods consume `self`.
///
/// # Example
/// ```
/// use board_guard_core::http::security::Principal;
///
/// let principal = Principal::new("m1", "$2b$10$...")
///     .roles(["MANAGER"]);
///
/// assert!(principal.has_role("MANAGER"));
/// assert!(principal.is_enabled());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    password_hash: String,
    enabled: bool,
    roles: BTreeSet<Role>,
}

impl Principal {
    /// Creates an enabled principal with no roles.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Principal {
            username: username.into(),
            password_hash: password_hash.into(),
            enabled: true,
            roles: BTreeSet::new(),
        }
    }

    /// Sets the enabled flag (builder pattern).
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Adds roles (builder pattern). Duplicates collapse.
    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Returns a copy with the password hash erased.
    ///
    /// # Spring Equivalent
    /// `CredentialsContainer.eraseCredentials()`
    pub fn without_credentials(&self) -> Self {
        Principal {
            password_hash: String::new(),
            ..self.clone()
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Returns the `ROLE_`-prefixed authorities.
    pub fn authorities(&self) -> Vec<String> {
        self.roles.iter().map(Role::authority).collect()
    }

    /// Checks if the principal has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(&Role::new(role))
    }

    /// Checks if the principal has ANY of the specified roles (OR logic).
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

// Hand-written so the hash never ends up in logs.
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("enabled", &self.enabled)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Principal {{ username: {}, authorities: {:?} }}",
            self.username,
            self.authorities()
        )
    }
}
