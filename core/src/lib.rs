//! # Board Guard Core
//!
//! Spring Security-style request authorization and credential verification
//! for Actix Web.
//!
//! The crate is organised like a security filter chain:
//!
//! - [`http::security::authorizer`] - ordered URL access rules and the policy evaluator
//! - [`http::security::authenticator`] - the credential pipeline (lookup, hash check, roles)
//! - [`http::security::crypto`] - self-describing password hashes (BCrypt, Argon2)
//! - [`http::security::remember_me`] - persistent, rotating remember-me tokens
//! - [`http::security::middleware`] - the `SecurityTransform` middleware
//! - [`http::security::form_login`] - login / logout processing
//! - [`http::error`] - error types surfaced to the transport
//!
//! Everything is wired explicitly at startup through
//! [`http::security::WebSecurity`].

pub mod http;
