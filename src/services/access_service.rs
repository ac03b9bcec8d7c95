//! Domain service for tier entitlements and daily usage quotas.

use serde::Serialize;
use thiserror::Error;

use crate::tiers::{Feature, Tier, UsageKind};

/// Errors specific to access checks.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("The {tier} tier does not include {feature}")]
    FeatureNotEntitled { tier: Tier, feature: Feature },

    #[error("Daily {kind} quota of {limit} exhausted")]
    QuotaExhausted { kind: UsageKind, limit: i64 },

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AccessError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// One metered kind with today's consumption against the tier's quota.
/// `limit` is `None` for unlimited quotas.
#[derive(Debug, Clone, Serialize)]
pub struct UsageItem {
    pub kind: UsageKind,
    pub used_today: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub tier: Tier,
    pub items: Vec<UsageItem>,
}

/// Domain service trait for entitlement and quota evaluation.
#[async_trait::async_trait]
pub trait AccessService: Send + Sync {
    /// Checks that the user's tier grants a feature.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::FeatureNotEntitled`] when it does not.
    async fn require_feature(&self, user_id: i32, feature: Feature) -> Result<(), AccessError>;

    /// Checks today's count against the tier quota and, if allowed, appends
    /// one usage event.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::QuotaExhausted`] when the quota is spent.
    async fn check_and_record(&self, user_id: i32, kind: UsageKind) -> Result<(), AccessError>;

    /// Today's per-kind usage against the user's tier quotas.
    async fn usage_summary(&self, user_id: i32) -> Result<UsageSummary, AccessError>;
}
