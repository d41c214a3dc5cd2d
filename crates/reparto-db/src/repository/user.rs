//! # User Repository
//!
//! Database operations for principals and token revocation.
//!
//! ## Token Revocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Logout Flow                                          │
//! │                                                                         │
//! │  POST /api/logout (Bearer token)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  revoke_token(jti, token expiry) ──► revoked_tokens row                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Every later request checks is_token_revoked(jti) and gets 401.        │
//! │                                                                         │
//! │  Rows only need to live as long as the token would have: the purge     │
//! │  drops entries whose expiry has passed, since expiry alone already     │
//! │  rejects those tokens.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use reparto_core::User;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Ok(())` - User stored
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(username = %user.username, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds a user by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Counts registered users.
    ///
    /// ## Usage
    /// The seeding tool refuses to run against a database that already
    /// has principals.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Marks a token id as revoked until its natural expiry.
    ///
    /// Revoking twice is fine; the second call is a no-op.
    pub async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES (?1, ?2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Checks whether a token id has been revoked.
    pub async fn is_token_revoked(&self, jti: &str) -> DbResult<bool> {
        let revoked: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM revoked_tokens WHERE jti = ?1")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;

        Ok(revoked > 0)
    }

    /// Drops revocation rows whose token would have expired anyway.
    ///
    /// ## Returns
    /// The number of rows purged.
    pub async fn purge_expired_tokens(&self) -> DbResult<u64> {
        let now = Utc::now();

        let purged = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if purged > 0 {
            debug!(purged = purged, "Purged expired token revocations");
        }
        Ok(purged)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use reparto_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn user(id: &str, username: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$salt$hash".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = test_db().await;
        let users = db.users();

        users.insert(&user("u-1", "maria", Role::Admin)).await.unwrap();

        let found = users.find_by_username("maria").await.unwrap().unwrap();
        assert_eq!(found.id, "u-1");
        assert_eq!(found.role, Role::Admin);
        assert!(users.find_by_username("pedro").await.unwrap().is_none());
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        let users = db.users();

        users.insert(&user("u-1", "maria", Role::User)).await.unwrap();
        let err = users
            .insert(&user("u-2", "maria", Role::User))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_token_revocation() {
        let db = test_db().await;
        let users = db.users();
        let expiry = Utc::now() + Duration::hours(24);

        assert!(!users.is_token_revoked("jti-1").await.unwrap());

        users.revoke_token("jti-1", expiry).await.unwrap();
        assert!(users.is_token_revoked("jti-1").await.unwrap());

        // Second revocation is a no-op, not an error
        users.revoke_token("jti-1", expiry).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired() {
        let db = test_db().await;
        let users = db.users();

        users
            .revoke_token("old", Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        users
            .revoke_token("live", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let purged = users.purge_expired_tokens().await.unwrap();
        assert_eq!(purged, 1);

        assert!(!users.is_token_revoked("old").await.unwrap());
        assert!(users.is_token_revoked("live").await.unwrap());
    }
}
