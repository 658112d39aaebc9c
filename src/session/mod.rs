//! Session engine: login, refresh rotation, logout, and request
//! authentication over the credential store and token codec.

use std::time::Duration;
use thiserror::Error;

use crate::store::StoreError;

pub mod engine;
pub mod password;

pub use engine::SessionEngine;

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 60 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Everything a session operation can report to the request boundary.
///
/// All variants map to a 4xx/5xx response; none crash the process. A missing
/// signing secret is rejected at startup, before any of these can occur.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("user is logged out")]
    LoggedOut,
    #[error("invalid or revoked session")]
    InvalidSession,
    #[error("token reuse detected; all sessions have been invalidated")]
    SecurityBreach,
    #[error("server configuration error")]
    Configuration,
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl AuthError {
    /// Machine-readable reason code, so clients can distinguish
    /// prompt-re-login conditions from retry-after-refresh ones.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
            Self::LoggedOut => "logged_out",
            Self::InvalidSession => "invalid_session",
            Self::SecurityBreach => "security_breach",
            Self::Configuration => "configuration_error",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// Access/refresh pair minted together under one session nonce.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            refresh_token_ttl: Duration::from_secs(DEFAULT_REFRESH_TOKEN_TTL_SECONDS),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    #[must_use]
    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }
}
