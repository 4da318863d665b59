//! Declarative security configuration.
//!
//! # Spring Security Equivalent
//! The `SecurityFilterChain` bean of a `@Configuration` class, as data.
//!
//! `SecurityConfig::default()` is the board application's setup; a TOML file
//! can override any part of it:
//!
//! ```toml
//! login_path = "/login"
//! bcrypt_cost = 12
//!
//! [[access_rules]]
//! pattern = "/boards/register"
//! access = "any_role"
//! roles = ["BASIC", "MANAGER", "ADMIN"]
//!
//! [[access_rules]]
//! pattern = "^/admin/.*"
//! matcher = "regex"
//! access = "deny_all"
//!
//! [remember_me]
//! key = "zerock"
//! token_validity_seconds = 604800
//! cookie_same_site = "strict"
//!
//! [session]
//! fixation = "new_session"
//! ```

use std::path::Path;

use actix_web::cookie::SameSite;
use serde::{Deserialize, Serialize};

use crate::http::error::ConfigError;
use crate::http::security::authorizer::{Access, AccessRule};
use crate::http::security::crypto::BCryptHasher;
use crate::http::security::path_pattern::PathPattern;
use crate::http::security::remember_me::RememberMeConfig;
use crate::http::security::session::{SessionConfig, SessionFixationStrategy};

/// How `AccessRuleConfig::pattern` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    #[default]
    Ant,
    Regex,
}

/// Requirement of a configured rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    PermitAll,
    DenyAll,
    /// Needs `roles`.
    AnyRole,
}

/// One `[[access_rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub matcher: MatcherKind,
    pub access: AccessKind,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AccessRuleConfig {
    pub fn any_role(pattern: &str, roles: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            matcher: MatcherKind::Ant,
            access: AccessKind::AnyRole,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Compiles the entry into an evaluator rule.
    pub fn compile(&self) -> Result<AccessRule, ConfigError> {
        let pattern = match self.matcher {
            MatcherKind::Ant => PathPattern::ant(&self.pattern),
            MatcherKind::Regex => PathPattern::regex(&self.pattern)?,
        };
        let access = match self.access {
            AccessKind::PermitAll => Access::PermitAll,
            AccessKind::DenyAll => Access::DenyAll,
            AccessKind::AnyRole => {
                Access::AnyRole(self.roles.iter().map(|r| r.as_str().into()).collect())
            }
        };
        Ok(AccessRule::new(pattern, access))
    }
}

/// `SameSite` attribute of the remember-me cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(same_site: CookieSameSite) -> Self {
        match same_site {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

/// `[remember_me]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RememberMeSettings {
    pub key: String,
    pub cookie_name: String,
    pub parameter: String,
    pub token_validity_seconds: u64,
    pub cookie_secure: bool,
    pub cookie_path: String,
    pub cookie_same_site: CookieSameSite,
}

impl Default for RememberMeSettings {
    fn default() -> Self {
        Self {
            key: "zerock".to_string(),
            cookie_name: "remember-me".to_string(),
            parameter: "remember-me".to_string(),
            token_validity_seconds: 14 * 24 * 60 * 60,
            cookie_secure: true,
            cookie_path: "/".to_string(),
            cookie_same_site: CookieSameSite::Lax,
        }
    }
}

impl RememberMeSettings {
    pub fn to_config(&self) -> RememberMeConfig {
        RememberMeConfig::new(&self.key)
            .cookie_name(&self.cookie_name)
            .parameter_name(&self.parameter)
            .token_validity_seconds(self.token_validity_seconds)
            .cookie_secure(self.cookie_secure)
            .cookie_path(&self.cookie_path)
            .cookie_same_site(self.cookie_same_site.into())
    }
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub fixation: SessionFixationStrategy,
    pub principal_key: String,
    pub saved_request_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            fixation: config.get_fixation_strategy(),
            principal_key: config.get_principal_key().to_string(),
            saved_request_key: config.get_saved_request_key().to_string(),
        }
    }
}

impl SessionSettings {
    pub fn to_config(&self) -> SessionConfig {
        SessionConfig::new()
            .fixation_strategy(self.fixation)
            .principal_key(&self.principal_key)
            .saved_request_key(&self.saved_request_key)
    }
}

/// Whole security setup of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Ordered; the first matching rule decides.
    pub access_rules: Vec<AccessRuleConfig>,
    pub login_path: String,
    pub logout_path: String,
    pub access_denied_path: String,
    pub default_success_path: String,
    /// Ignore the saved request after login.
    pub always_use_default_success_url: bool,
    pub remember_me: RememberMeSettings,
    pub session: SessionSettings,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_rules: vec![AccessRuleConfig::any_role(
                "/boards/register",
                &["BASIC", "MANAGER", "ADMIN"],
            )],
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
            access_denied_path: "/accessDenied".to_string(),
            default_success_path: "/".to_string(),
            always_use_default_success_url: false,
            remember_me: RememberMeSettings::default(),
            session: SessionSettings::default(),
            bcrypt_cost: BCryptHasher::DEFAULT_COST,
        }
    }
}

impl SecurityConfig {
    /// Loads and validates a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded security config from {} ({} access rules)",
            path.display(),
            config.access_rules.len()
        );
        Ok(config)
    }

    /// Parses and validates TOML. Missing keys take their default.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SecurityConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("login_path", &self.login_path),
            ("logout_path", &self.logout_path),
            ("access_denied_path", &self.access_denied_path),
            ("default_success_path", &self.default_success_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::RelativePath {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.remember_me.key.is_empty() {
            return Err(ConfigError::EmptyRememberMeKey);
        }

        if !self.remember_me.cookie_path.starts_with('/') {
            return Err(ConfigError::RelativePath {
                field: "remember_me.cookie_path",
                value: self.remember_me.cookie_path.clone(),
            });
        }

        if self.remember_me.token_validity_seconds > i64::MAX as u64 {
            return Err(ConfigError::InvalidTokenValidity {
                seconds: self.remember_me.token_validity_seconds,
            });
        }

        if self.session.principal_key.is_empty()
            || self.session.principal_key == self.session.saved_request_key
        {
            return Err(ConfigError::InvalidSessionKeys);
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidCost {
                cost: self.bcrypt_cost,
            });
        }

        self.compile_rules().map(|_| ())
    }

    /// Compiles `access_rules` in order.
    pub fn compile_rules(&self) -> Result<Vec<AccessRule>, ConfigError> {
        self.access_rules.iter().map(AccessRuleConfig::compile).collect()
    }
}
