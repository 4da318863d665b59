use actix_web::{error, http::StatusCode, HttpResponse, HttpResponseBuilder};
use derive_more::{Display, Error};

use crate::http::security::authenticator::AuthFailure;
use crate::http::security::remember_me::RememberMeError;

/// Errors as the client sees them.
///
/// Every credential failure collapses into `AuthenticationFailed`, so the
/// response for an unknown user, a disabled account and a wrong password is
/// byte-for-byte the same.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[display("authentication failed")]
    AuthenticationFailed,
    #[display("remember-me token rejected")]
    TokenRejected,
    #[display("forbidden")]
    Forbidden,
    #[display("unauthorized")]
    Unauthorized,
}

impl error::ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            AuthError::TokenRejected => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponseBuilder::new(self.status_code()).body(self.to_string())
    }
}

impl From<AuthFailure> for AuthError {
    fn from(_: AuthFailure) -> Self {
        AuthError::AuthenticationFailed
    }
}

impl From<RememberMeError> for AuthError {
    fn from(_: RememberMeError) -> Self {
        AuthError::TokenRejected
    }
}
