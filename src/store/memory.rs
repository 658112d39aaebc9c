//! In-memory credential store used by tests and local development.
//!
//! A single `RwLock` over the account map is enough here: every mutation of a
//! refresh-token set runs under the write lock, which gives the conditional
//! swap the same atomicity the Postgres store gets from a single statement.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Account, CredentialStore, SignupOutcome, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<SignupOutcome, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|account| account.email == email) {
            return Ok(SignupOutcome::Conflict);
        }
        let id = Uuid::new_v4();
        accounts.insert(
            id,
            Account {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                refresh_tokens: Vec::new(),
            },
        );
        Ok(SignupOutcome::Created(id))
    }

    async fn set_refresh_tokens(&self, id: Uuid, token: &str) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.get_mut(&id) {
            account.refresh_tokens = vec![token.to_string()];
        }
        Ok(())
    }

    async fn clear_refresh_tokens(&self, id: Uuid) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.get_mut(&id) {
            account.refresh_tokens.clear();
        }
        Ok(())
    }

    async fn compare_and_swap_refresh_tokens(
        &self,
        id: Uuid,
        expected_remove: &str,
        to_insert: &str,
    ) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(false);
        };
        let Some(position) = account
            .refresh_tokens
            .iter()
            .position(|token| token == expected_remove)
        else {
            return Ok(false);
        };
        account.refresh_tokens.remove(position);
        account.refresh_tokens.push(to_insert.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_account() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let outcome = store
            .insert_account("alice@example.com", "$argon2id$stub")
            .await
            .expect("memory store is infallible");
        let SignupOutcome::Created(id) = outcome else {
            panic!("expected account creation");
        };
        (store, id)
    }

    #[tokio::test]
    async fn insert_account_rejects_duplicate_email() {
        let (store, _id) = store_with_account().await;
        let outcome = store
            .insert_account("alice@example.com", "$argon2id$other")
            .await
            .expect("memory store is infallible");
        assert!(matches!(outcome, SignupOutcome::Conflict));
    }

    #[tokio::test]
    async fn set_refresh_tokens_overwrites() {
        let (store, id) = store_with_account().await;
        store.set_refresh_tokens(id, "r1").await.expect("set");
        store.set_refresh_tokens(id, "r2").await.expect("set");
        let account = store.find_by_id(id).await.expect("find").expect("exists");
        assert_eq!(account.refresh_tokens, vec!["r2".to_string()]);
    }

    #[tokio::test]
    async fn compare_and_swap_requires_membership() {
        let (store, id) = store_with_account().await;
        store.set_refresh_tokens(id, "r1").await.expect("set");

        let swapped = store
            .compare_and_swap_refresh_tokens(id, "r1", "r2")
            .await
            .expect("cas");
        assert!(swapped);

        // r1 was consumed above; swapping it again must fail.
        let swapped = store
            .compare_and_swap_refresh_tokens(id, "r1", "r3")
            .await
            .expect("cas");
        assert!(!swapped);

        let account = store.find_by_id(id).await.expect("find").expect("exists");
        assert_eq!(account.refresh_tokens, vec!["r2".to_string()]);
    }

    #[tokio::test]
    async fn clear_refresh_tokens_empties_the_set() {
        let (store, id) = store_with_account().await;
        store.set_refresh_tokens(id, "r1").await.expect("set");
        store.clear_refresh_tokens(id).await.expect("clear");
        let account = store.find_by_id(id).await.expect("find").expect("exists");
        assert!(account.refresh_tokens.is_empty());
    }

    #[tokio::test]
    async fn find_by_email_matches_exactly() {
        let (store, id) = store_with_account().await;
        let found = store
            .find_by_email("alice@example.com")
            .await
            .expect("find");
        assert_eq!(found.map(|account| account.id), Some(id));
        let missing = store.find_by_email("bob@example.com").await.expect("find");
        assert!(missing.is_none());
    }
}
