use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

use crate::entities::sessions;

/// A session row as handed to callers.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: i32,
    pub created_at: String,
    pub expires_at: String,
}

impl From<sessions::Model> for SessionRecord {
    fn from(model: sessions::Model) -> Self {
        Self {
            token: model.token,
            user_id: model.user_id,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a new session for a user. `ttl_minutes` must be positive, so
    /// the expiry is always in the future at creation.
    pub async fn create(&self, user_id: i32, ttl_minutes: i64) -> Result<SessionRecord> {
        anyhow::ensure!(ttl_minutes > 0, "Session TTL must be positive");

        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::minutes(ttl_minutes);

        let active = sessions::ActiveModel {
            token: Set(generate_token()),
            user_id: Set(user_id),
            created_at: Set(now.to_rfc3339()),
            expires_at: Set(expires_at.to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")?;

        Ok(SessionRecord::from(model))
    }

    /// Resolve a token to its owning user id.
    ///
    /// Returns `Some(user_id)` only while the session's expiry is strictly
    /// in the future. An expired row is deleted on sight (lazy cleanup) and
    /// the token reported invalid; a deleted session is never resurrected.
    pub async fn validate(&self, token: &str) -> Result<Option<i32>> {
        let session = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session by token")?;

        let Some(session) = session else {
            return Ok(None);
        };

        // An unparseable expiry counts as expired.
        let expired = chrono::DateTime::parse_from_rfc3339(&session.expires_at)
            .map_or(true, |exp| exp <= chrono::Utc::now());

        if expired {
            debug!(user_id = session.user_id, "Purging expired session");
            sessions::Entity::delete_by_id(session.id)
                .exec(&self.conn)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    /// Delete a session by token (logout). Idempotent.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected > 0)
    }

    /// Delete every session a user owns (deactivation, password change).
    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete user sessions")?;

        Ok(result.rows_affected)
    }

    /// Sweep all expired sessions. Run periodically by the scheduler; the
    /// validator also purges lazily, so this only bounds table growth.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired sessions")?;

        Ok(result.rows_affected)
    }

    pub async fn count_active(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        let now = chrono::Utc::now().to_rfc3339();

        let count = sessions::Entity::find()
            .filter(sessions::Column::ExpiresAt.gt(now))
            .count(&self.conn)
            .await
            .context("Failed to count active sessions")?;

        Ok(count)
    }
}

/// Generate a random opaque session token (64-char hex string).
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_is_random() {
        assert_ne!(generate_token(), generate_token());
    }
}
