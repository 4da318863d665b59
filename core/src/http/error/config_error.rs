use derive_more::{Display, Error};

/// Errors raised while loading or validating a `SecurityConfig`.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[display("cannot read config file {path}: {reason}")]
    Io { path: String, reason: String },
    #[display("cannot parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[display("`{field}` must be an absolute path, got `{value}`")]
    RelativePath { field: &'static str, value: String },
    #[display("remember-me key must not be empty")]
    EmptyRememberMeKey,
    #[display("bcrypt cost {cost} is outside 4..=31")]
    InvalidCost { cost: u32 },
    #[display("remember-me token validity of {seconds}s is too large")]
    InvalidTokenValidity { seconds: u64 },
    #[display("session principal key must be non-empty and differ from the saved request key")]
    InvalidSessionKeys,
}
