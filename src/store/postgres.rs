//! Postgres credential store.
//!
//! Refresh tokens live in a child table keyed by `(user_id, token)`. The
//! conditional swap used by rotation is a single statement, so two rotations
//! racing on the same token resolve inside Postgres: one row wins the
//! `DELETE`, the other observes zero rows and reports absence.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{Account, CredentialStore, SignupOutcome, StoreError};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: &sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        refresh_tokens: row.get("refresh_tokens"),
    }
}

const SELECT_ACCOUNT: &str = r"
    SELECT users.id, users.email, users.password_hash,
           COALESCE(
               array_agg(user_refresh_tokens.token)
                   FILTER (WHERE user_refresh_tokens.token IS NOT NULL),
               '{}'
           ) AS refresh_tokens
    FROM users
    LEFT JOIN user_refresh_tokens ON user_refresh_tokens.user_id = users.id
";

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = format!("{SELECT_ACCOUNT} WHERE users.email = $1 GROUP BY users.id");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| unavailable(&err))?;
        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = format!("{SELECT_ACCOUNT} WHERE users.id = $1 GROUP BY users.id");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| unavailable(&err))?;
        Ok(row.as_ref().map(account_from_row))
    }

    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<SignupOutcome, StoreError> {
        let query = r"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(SignupOutcome::Created(row.get("id"))),
            Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
            Err(err) => Err(unavailable(&err)),
        }
    }

    async fn set_refresh_tokens(&self, id: Uuid, token: &str) -> Result<(), StoreError> {
        // Transaction so login's overwrite is never observed half-applied.
        let mut tx = self.pool.begin().await.map_err(|err| unavailable(&err))?;

        let query = "DELETE FROM user_refresh_tokens WHERE user_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .map_err(|err| unavailable(&err))?;

        let query = "INSERT INTO user_refresh_tokens (user_id, token) VALUES ($1, $2)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(token)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .map_err(|err| unavailable(&err))?;

        tx.commit().await.map_err(|err| unavailable(&err))
    }

    async fn clear_refresh_tokens(&self, id: Uuid) -> Result<(), StoreError> {
        let query = "DELETE FROM user_refresh_tokens WHERE user_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| unavailable(&err))?;
        Ok(())
    }

    async fn compare_and_swap_refresh_tokens(
        &self,
        id: Uuid,
        expected_remove: &str,
        to_insert: &str,
    ) -> Result<bool, StoreError> {
        // Single statement: the insert happens only for the row the delete
        // actually removed, which is the per-account critical section of
        // rotation.
        let query = r"
            WITH removed AS (
                DELETE FROM user_refresh_tokens
                WHERE user_id = $1 AND token = $2
                RETURNING user_id
            )
            INSERT INTO user_refresh_tokens (user_id, token)
            SELECT user_id, $3 FROM removed
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(expected_remove)
            .bind(to_insert)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| unavailable(&err))?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_keeps_the_backend_message() {
        let err = unavailable(&sqlx::Error::RowNotFound);
        let StoreError::Unavailable(message) = err;
        assert!(message.contains("no rows"));
    }

    #[test]
    fn unique_violation_matches_sqlstate_only() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
