//! Credential store: one record per user holding the password hash and the
//! set of currently valid refresh tokens.
//!
//! The store is the single owner of per-account session state. The session
//! engine is its only mutator; the request gate only reads through the
//! engine. Mutations of one account's refresh-token set serialize against
//! each other inside the store, while different accounts never block one
//! another.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Transient backend failure, retryable by the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    /// Membership is what matters; order is irrelevant.
    pub refresh_tokens: Vec<String>,
}

#[derive(Debug)]
pub enum SignupOutcome {
    Created(Uuid),
    Conflict,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<SignupOutcome, StoreError>;

    /// Overwrite the active set with a single refresh token (login policy:
    /// a new password login replaces all prior sessions).
    async fn set_refresh_tokens(&self, id: Uuid, token: &str) -> Result<(), StoreError>;

    async fn clear_refresh_tokens(&self, id: Uuid) -> Result<(), StoreError>;

    /// Atomically remove `expected_remove` and insert `to_insert`, only if
    /// `expected_remove` is currently a member. Returns `false` when it was
    /// absent, so two rotations racing on the same token cannot both succeed.
    async fn compare_and_swap_refresh_tokens(
        &self,
        id: Uuid,
        expected_remove: &str,
        to_insert: &str,
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::{Account, SignupOutcome};
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        let id = Uuid::nil();
        assert_eq!(
            format!("{:?}", SignupOutcome::Created(id)),
            format!("Created({id:?})")
        );
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn account_holds_values() {
        let account = Account {
            id: Uuid::nil(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            refresh_tokens: vec!["r1".to_string()],
        };
        assert_eq!(account.refresh_tokens, vec!["r1".to_string()]);
    }
}
