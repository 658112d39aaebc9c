//! Signed session tokens: stateless mint and verify.
//!
//! Access and refresh tokens share one shape: `{ sub, random, exp }` signed
//! with a server-held secret (HS256). The codec holds no mutable state and is
//! safe to share across any number of concurrent callers.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no signing secret configured")]
    MissingSecret,
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token")]
    Signing,
}

/// Payload carried by both token variants.
///
/// `random` is the session nonce pairing an access token with the refresh
/// token minted alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub random: u32,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from the configured signing secret.
    ///
    /// # Errors
    /// Returns `MissingSecret` when the secret is empty. Startup must refuse
    /// to proceed in that case; there is no per-request fallback.
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked explicitly in verify_at so the boundary instant
        // (now == exp) counts as expired, with zero leeway.
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Mint a signed token for `subject` expiring `ttl` from now.
    ///
    /// # Errors
    /// Returns `Signing` if serialization or signing fails.
    pub fn mint(&self, subject: Uuid, nonce: u32, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            random: nonce,
            exp: jsonwebtoken::get_current_timestamp() + ttl.as_secs(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| TokenError::Signing)
    }

    /// Verify signature and expiry, returning the decoded payload.
    ///
    /// # Errors
    /// `Expired` when the token's TTL has lapsed, `Invalid` for anything
    /// malformed or carrying a bad signature.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, jsonwebtoken::get_current_timestamp())
    }

    fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        // Valid strictly before exp; expired at and after it.
        if data.claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("test-secret".to_string()))
            .expect("secret is non-empty")
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let err = TokenCodec::new(&SecretString::from(String::new())).err();
        assert!(matches!(err, Some(TokenError::MissingSecret)));
    }

    #[test]
    fn mint_verify_round_trip() {
        let codec = codec();
        let subject = Uuid::new_v4();
        let token = codec
            .mint(subject, 42, Duration::from_secs(60))
            .expect("mint");
        let claims = codec.verify(&token).expect("verify");
        assert_eq!(claims.sub, subject.to_string());
        assert_eq!(claims.random, 42);
    }

    #[test]
    fn expiry_boundary_is_exact() {
        let codec = codec();
        let token = codec
            .mint(Uuid::new_v4(), 7, Duration::from_secs(3600))
            .expect("mint");
        let exp = codec.verify(&token).expect("still valid").exp;

        assert!(codec.verify_at(&token, exp - 1).is_ok());
        assert!(matches!(
            codec.verify_at(&token, exp),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            codec.verify_at(&token, exp + 1),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn zero_ttl_token_is_already_expired() {
        let codec = codec();
        let token = codec
            .mint(Uuid::new_v4(), 7, Duration::from_secs(0))
            .expect("mint");
        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let codec = codec();
        let token = codec
            .mint(Uuid::new_v4(), 7, Duration::from_secs(60))
            .expect("mint");
        let mut tampered = token.clone();
        tampered.pop();
        assert!(matches!(codec.verify(&tampered), Err(TokenError::Invalid)));
        assert!(matches!(
            codec.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let codec = codec();
        let other = TokenCodec::new(&SecretString::from("other-secret".to_string()))
            .expect("secret is non-empty");
        let token = other
            .mint(Uuid::new_v4(), 7, Duration::from_secs(60))
            .expect("mint");
        assert!(matches!(codec.verify(&token), Err(TokenError::Invalid)));
    }
}
