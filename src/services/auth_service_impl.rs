//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::{SecurityConfig, SessionConfig};
use crate::db::{Store, repositories::user::verify_password};
use crate::domain::events::DomainEvent;
use crate::services::auth_service::{
    AuthError, AuthService, LoginResult, UserInfo, validate_email, validate_password_strength,
};
use crate::tiers::Tier;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    sessions: SessionConfig,
    event_bus: broadcast::Sender<DomainEvent>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        security: SecurityConfig,
        sessions: SessionConfig,
        event_bus: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            store,
            security,
            sessions,
            event_bus,
        }
    }

    fn emit(&self, event: DomainEvent) {
        // Nobody listening is fine; the log service usually is.
        let _ = self.event_bus.send(event);
    }

    fn user_info(user: crate::db::User) -> UserInfo {
        UserInfo {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            tier: user.tier,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserInfo, AuthError> {
        validate_email(email)?;
        validate_password_strength(password)?;

        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let user = self
            .store
            .create_user(email, password, display_name, Tier::Free, &self.security)
            .await?;

        info!(user_id = user.id, "User registered");
        self.emit(DomainEvent::UserRegistered {
            user_id: user.id,
            email: user.email.clone(),
        });

        Ok(Self::user_info(user))
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((user, password_hash)) =
            self.store.get_user_by_email_with_password(email).await?
        else {
            self.emit(DomainEvent::LoginFailed {
                email: email.to_string(),
            });
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &password_hash).await? {
            self.emit(DomainEvent::LoginFailed {
                email: email.to_string(),
            });
            return Err(AuthError::InvalidCredentials);
        }

        // Checked after the hash so deactivation is not probeable without
        // valid credentials.
        if !user.is_active {
            return Err(AuthError::Deactivated);
        }

        self.store.touch_user_last_login(user.id).await?;

        let session = self
            .store
            .create_session(user.id, self.sessions.ttl_minutes)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;

        self.emit(DomainEvent::LoginSucceeded { user_id: user.id });

        Ok(LoginResult {
            user: Self::user_info(user),
            token: session.token,
            expires_at: session.expires_at,
        })
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store
            .delete_session(token)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;
        Ok(())
    }

    async fn validate_session(&self, token: &str) -> Result<Option<i32>, AuthError> {
        let user_id = self
            .store
            .validate_session(token)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;
        Ok(user_id)
    }

    async fn current_user(&self, token: &str) -> Result<Option<UserInfo>, AuthError> {
        let Some(user_id) = self.validate_session(token).await? else {
            return Ok(None);
        };

        let Some(user) = self.store.get_user_by_id(user_id).await? else {
            return Ok(None);
        };

        if !user.is_active {
            return Ok(None);
        }

        Ok(Some(Self::user_info(user)))
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password_strength(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some((_, password_hash)) = self
            .store
            .get_user_by_email_with_password(&user.email)
            .await?
        else {
            return Err(AuthError::UserNotFound);
        };

        if !verify_password(current_password, &password_hash).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new_password, &self.security)
            .await?;

        // A changed password invalidates every outstanding session.
        let revoked = self.store.delete_sessions_for_user(user_id).await?;

        info!(user_id, "Password changed");
        self.emit(DomainEvent::PasswordChanged { user_id });
        if revoked > 0 {
            self.emit(DomainEvent::SessionsRevoked {
                user_id,
                count: revoked,
            });
        }

        Ok(())
    }

    async fn set_tier(&self, user_id: i32, tier: Tier) -> Result<(), AuthError> {
        if self.store.get_user_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        self.store.set_user_tier(user_id, tier).await?;

        info!(user_id, tier = %tier, "Tier changed");
        self.emit(DomainEvent::TierChanged {
            user_id,
            tier: tier.as_str().to_string(),
        });

        Ok(())
    }

    async fn deactivate(&self, user_id: i32) -> Result<(), AuthError> {
        if self.store.get_user_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        self.store.set_user_active(user_id, false).await?;
        let revoked = self.store.delete_sessions_for_user(user_id).await?;

        info!(user_id, revoked, "User deactivated");
        self.emit(DomainEvent::UserDeactivated { user_id });

        Ok(())
    }
}
