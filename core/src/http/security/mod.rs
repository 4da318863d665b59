//! Security module providing authentication and authorization.
//!
//! # Spring Equivalent
//! `org.springframework.security` package
//!
//! # Module Structure
//!
//! - `authorizer` - Ordered access rules and the policy evaluator
//! - `authenticator` - Credential pipeline (lookup, enabled check, hash check, roles)
//! - `config` - Declarative `SecurityConfig`, loadable from TOML
//! - `credential` - Credential store capability and in-memory store
//! - `crypto` - Password hashing (BCrypt, Argon2, Delegating)
//! - `extractor` - Actix Web extractors (AuthenticatedPrincipal, OptionalPrincipal)
//! - `form_login` - Login and logout processing
//! - `middleware` - Security middleware (SecurityTransform)
//! - `path_pattern` - Ant-style and regex URL matching
//! - `principal` - Principal and Role
//! - `remember_me` - Persistent remember-me tokens
//! - `session` - Session-held principal and saved request
//! - `web` - `WebSecurity` bundle and route registration
//!
//! # Feature Flags
//! - `argon2`: Enables `Argon2Hasher` and `DelegatingHasher`

pub use authenticator::{AuthFailure, CredentialPipeline, FailureReason};
pub use authorizer::{Access, AccessRule, Decision, PolicyEvaluator};
pub use config::{
    AccessKind, AccessRuleConfig, CookieSameSite, MatcherKind, RememberMeSettings, SecurityConfig,
    SessionSettings,
};
pub use credential::{CredentialStore, InMemoryCredentialStore, StoreError, StoredCredential};
pub use crypto::{BCryptHasher, HashError, Hasher};
#[cfg(feature = "argon2")]
pub use crypto::{Argon2Hasher, DelegatingHasher, HashAlgorithm};
pub use extractor::{AuthenticatedPrincipal, OptionalPrincipal, SecurityExt};
pub use form_login::{FormLoginConfig, FormLoginHandler, LoginForm};
pub use middleware::SecurityTransform;
pub use path_pattern::{AntPattern, PathPattern};
pub use principal::{role_set, Principal, Role};
pub use remember_me::{
    InMemoryTokenRepository, PersistentTokenRepository, RememberMeConfig, RememberMeError,
    RememberMeLogin, RememberMeServices, RememberMeToken,
};
pub use session::{
    SessionAuthenticator, SessionConfig, SessionError, SessionFixationStrategy, SessionPrincipal,
};
pub use web::{security_routes, WebSecurity};

pub mod authenticator;
pub mod authorizer;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod extractor;
pub mod form_login;
pub mod middleware;
pub mod path_pattern;
pub mod principal;
pub mod remember_me;
pub mod session;
pub mod web;
