//! Domain service for authentication and user management.
//!
//! Handles registration, login, session issue/validation, password changes,
//! and account lifecycle.

use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

use crate::tiers::Tier;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("An account with this email already exists")]
    AlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    Deactivated,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub tier: Tier,
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
}

/// Login result containing user info and the issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserInfo,
    pub token: String,
    pub expires_at: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account on the free tier.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEmail`], [`AuthError::WeakPassword`] or
    /// [`AuthError::AlreadyExists`] when the input is rejected.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserInfo, AuthError>;

    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails and
    /// [`AuthError::Deactivated`] for soft-deleted accounts.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Deletes the session for a token. Idempotent.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Resolves a token to the owning user id, purging expired sessions.
    async fn validate_session(&self, token: &str) -> Result<Option<i32>, AuthError>;

    /// Resolves a token to the full user record, or `None` when the token
    /// is invalid or the account has been deactivated.
    async fn current_user(&self, token: &str) -> Result<Option<UserInfo>, AuthError>;

    /// Changes a user's password and revokes their other sessions.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong,
    /// [`AuthError::WeakPassword`] if the new one fails the policy.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Moves a user to a different tier.
    async fn set_tier(&self, user_id: i32, tier: Tier) -> Result<(), AuthError>;

    /// Soft-deactivates a user and revokes all their sessions.
    async fn deactivate(&self, user_id: i32) -> Result<(), AuthError>;
}

static EMAIL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

/// Syntactic email check. Anything stricter belongs to a verification mail,
/// which this service does not send.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

/// Password policy: at least 8 characters with one uppercase, one lowercase
/// and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::WeakPassword(
            "must be at least 8 characters".to_string(),
        ));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::WeakPassword(
            "must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthError::WeakPassword(
            "must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "must contain a digit".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Abcdef12").is_ok());
        assert!(validate_password_strength("Sh0rt").is_err());
        assert!(validate_password_strength("alllowercase1").is_err());
        assert!(validate_password_strength("ALLUPPERCASE1").is_err());
        assert!(validate_password_strength("NoDigitsHere").is_err());
    }
}
