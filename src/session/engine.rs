//! The session engine proper: mint, rotate, revoke.

use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::{password, AuthError, SessionConfig, TokenPair};
use crate::store::CredentialStore;
use crate::token::{Claims, TokenCodec, TokenError};

pub struct SessionEngine {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    config: SessionConfig,
}

fn verify_error(err: &TokenError) -> AuthError {
    match err {
        TokenError::Expired => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    }
}

fn parse_subject(claims: &Claims) -> Result<Uuid, AuthError> {
    Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)
}

impl SessionEngine {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec, config: SessionConfig) -> Self {
        Self {
            store,
            codec,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Mint an access/refresh pair under one fresh session nonce.
    fn mint_pair(&self, subject: Uuid) -> Result<TokenPair, AuthError> {
        let nonce = OsRng.next_u32();
        let access_token = self
            .codec
            .mint(subject, nonce, self.config.access_token_ttl())
            .map_err(|_| AuthError::Configuration)?;
        let refresh_token = self
            .codec
            .mint(subject, nonce, self.config.refresh_token_ttl())
            .map_err(|_| AuthError::Configuration)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Authenticate credentials and start a session.
    ///
    /// A successful login overwrites the account's active set with the new
    /// refresh token alone: prior sessions are revoked, not appended to.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown identity or wrong password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(crate::store::Account, TokenPair), AuthError> {
        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.mint_pair(account.id)?;
        self.store
            .set_refresh_tokens(account.id, &pair.refresh_token)
            .await?;
        Ok((account, pair))
    }

    /// Exchange a refresh token for a new pair, consuming it.
    ///
    /// Presenting a token that is no longer in the active set is a replay of
    /// a consumed or revoked token: every session for the account is revoked
    /// before `SecurityBreach` is returned. Losing the swap to a concurrent
    /// rotation of the same token is indistinguishable from replay and takes
    /// the same path.
    ///
    /// # Errors
    /// `TokenExpired`, `InvalidToken`, `SecurityBreach`, `StoreUnavailable`.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .verify(refresh_token)
            .map_err(|err| verify_error(&err))?;
        let user_id = parse_subject(&claims)?;

        let account = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !account
            .refresh_tokens
            .iter()
            .any(|token| token == refresh_token)
        {
            warn!(user_id = %user_id, "Refresh token reuse detected, revoking all sessions");
            self.store.clear_refresh_tokens(user_id).await?;
            return Err(AuthError::SecurityBreach);
        }

        let pair = self.mint_pair(user_id)?;
        let swapped = self
            .store
            .compare_and_swap_refresh_tokens(user_id, refresh_token, &pair.refresh_token)
            .await?;
        if !swapped {
            warn!(user_id = %user_id, "Lost rotation race, treating as token reuse");
            self.store.clear_refresh_tokens(user_id).await?;
            return Err(AuthError::SecurityBreach);
        }

        Ok(pair)
    }

    /// Log out of every session for the token's account.
    ///
    /// # Errors
    /// The access token must still be valid: an expired token fails with
    /// `TokenExpired` and revokes nothing.
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self
            .codec
            .verify(access_token)
            .map_err(|err| verify_error(&err))?;
        let user_id = parse_subject(&claims)?;

        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.store.clear_refresh_tokens(user_id).await?;
        Ok(())
    }

    /// Resolve an access token to its subject id.
    ///
    /// Validity is re-derived from the stored refresh-token set on every
    /// call: some member must carry the access token's nonce. Stored tokens
    /// that fail to decode (for example, signed under a rotated secret) are
    /// non-matches, not errors.
    ///
    /// # Errors
    /// `TokenExpired`, `InvalidToken`, `LoggedOut` when the active set is
    /// empty, `InvalidSession` when no member matches the nonce.
    pub async fn authenticate(&self, access_token: &str) -> Result<Uuid, AuthError> {
        let claims = self
            .codec
            .verify(access_token)
            .map_err(|err| verify_error(&err))?;
        let user_id = parse_subject(&claims)?;

        let account = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if account.refresh_tokens.is_empty() {
            return Err(AuthError::LoggedOut);
        }

        let session_active = account.refresh_tokens.iter().any(|stored| {
            self.codec
                .verify(stored)
                .map(|refresh| refresh.random == claims.random)
                .unwrap_or(false)
        });

        if session_active {
            Ok(user_id)
        } else {
            Err(AuthError::InvalidSession)
        }
    }
}
