use std::fmt;

pub type AuthResult<T> = Result<T, AuthError>;

/// Failures the auth binding can observe from the authentication client.
///
/// Backend-reported failures arrive as `Backend` with the provider's own
/// code and message preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Network(String),
    TokenRefresh(String),
    Backend { code: String, message: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(message) => write!(f, "Network error: {message}"),
            AuthError::TokenRefresh(message) => write!(f, "Token refresh failed: {message}"),
            AuthError::Backend { code, message } => write!(f, "{message} ({code})"),
        }
    }
}

impl std::error::Error for AuthError {}
