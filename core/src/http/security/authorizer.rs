//! URL access rules and the policy evaluator.
//!
//! # Spring Security Equivalent
//! `org.springframework.security.web.access.intercept.RequestMatcherDelegatingAuthorizationManager`
//!
//! Rules are an ordered list; the first rule whose pattern matches the
//! request path decides. A path that no rule matches is allowed, exactly like
//! a trailing `anyRequest().permitAll()`.
//!
//! ```
//! use board_guard_core::http::security::{AccessRule, Decision, PolicyEvaluator, role_set};
//!
//! let evaluator = PolicyEvaluator::new(vec![
//!     AccessRule::any_role("/boards/register", ["BASIC", "MANAGER", "ADMIN"]),
//! ]);
//!
//! assert_eq!(evaluator.authorize("/boards/register", &role_set::<_, &str>([])), Decision::Deny);
//! assert_eq!(evaluator.authorize("/boards/register", &role_set(["BASIC"])), Decision::Allow);
//! assert_eq!(evaluator.authorize("/other", &role_set::<_, &str>([])), Decision::Allow);
//! ```

use std::collections::BTreeSet;

use crate::http::security::path_pattern::PathPattern;
use crate::http::security::principal::Role;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// What a matching rule demands.
///
/// # Spring Security Equivalent
/// `permitAll()`, `denyAll()`, `hasAnyRole(..)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    PermitAll,
    DenyAll,
    /// Any one of the roles suffices. An empty set never allows.
    AnyRole(BTreeSet<Role>),
}

impl Access {
    /// Decides for a caller holding `roles`.
    pub fn decide(&self, roles: &BTreeSet<Role>) -> Decision {
        let allowed = match self {
            Access::PermitAll => true,
            Access::DenyAll => false,
            Access::AnyRole(required) => !required.is_disjoint(roles),
        };
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// One entry of the policy table.
#[derive(Debug, Clone)]
pub struct AccessRule {
    pattern: PathPattern,
    access: Access,
}

impl AccessRule {
    pub fn new(pattern: PathPattern, access: Access) -> Self {
        AccessRule { pattern, access }
    }

    /// `requestMatchers(pattern).hasAnyRole(roles...)`
    pub fn any_role<I, R>(pattern: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self::new(
            PathPattern::ant(pattern),
            Access::AnyRole(roles.into_iter().map(Into::into).collect()),
        )
    }

    /// `requestMatchers(pattern).permitAll()`
    pub fn permit_all(pattern: &str) -> Self {
        Self::new(PathPattern::ant(pattern), Access::PermitAll)
    }

    /// `requestMatchers(pattern).denyAll()`
    pub fn deny_all(pattern: &str) -> Self {
        Self::new(PathPattern::ant(pattern), Access::DenyAll)
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }
}

/// Evaluates an immutable, ordered rule list.
///
/// Pure and `Send + Sync`: share one instance behind an `Arc` across all
/// workers.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    rules: Vec<AccessRule>,
}

impl PolicyEvaluator {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        PolicyEvaluator { rules }
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// First rule matching `path`, if any.
    pub fn matching_rule(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    /// Decides whether a caller with `roles` may access `path`.
    pub fn authorize(&self, path: &str, roles: &BTreeSet<Role>) -> Decision {
        match self.matching_rule(path) {
            Some(rule) => {
                let decision = rule.access.decide(roles);
                log::debug!(
                    "Path {} matched rule {} ({:?}): {:?}",
                    path,
                    rule.pattern,
                    rule.access,
                    decision
                );
                decision
            }
            None => Decision::Allow,
        }
    }
}
