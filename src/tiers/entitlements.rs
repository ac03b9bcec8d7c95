//! Static entitlement table mapping tiers to features and daily quotas.

use serde::{Deserialize, Serialize};

use super::Tier;

/// Gated product features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PortfolioAnalysis,
    PriceAlerts,
    AdvancedReports,
    DataExport,
    ApiAccess,
}

impl Feature {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PortfolioAnalysis => "portfolio_analysis",
            Self::PriceAlerts => "price_alerts",
            Self::AdvancedReports => "advanced_reports",
            Self::DataExport => "data_export",
            Self::ApiAccess => "api_access",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metered action kinds. Stored in `usage_events.kind` as the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Analysis,
    Alert,
}

impl UsageKind {
    pub const ALL: [Self; 2] = [Self::Analysis, Self::Alert];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Alert => "alert",
        }
    }
}

impl std::fmt::Display for UsageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A daily quota. `Unlimited` is a real sentinel, not a large number, and
/// must be matched before any numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Limited(i64),
}

impl Quota {
    /// Whether another action is allowed given today's recorded count.
    #[must_use]
    pub const fn allows(self, used_today: i64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(limit) => used_today < limit,
        }
    }

    /// The numeric limit, or `None` for unlimited. Used for API responses.
    #[must_use]
    pub const fn limit(self) -> Option<i64> {
        match self {
            Self::Unlimited => None,
            Self::Limited(limit) => Some(limit),
        }
    }
}

/// What a tier grants: its feature set and per-kind daily quotas.
#[derive(Debug, Clone, Copy)]
pub struct Entitlements {
    pub features: &'static [Feature],
    pub daily_analyses: Quota,
    pub daily_alerts: Quota,
}

impl Entitlements {
    #[must_use]
    pub fn allows(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    #[must_use]
    pub const fn quota_for(&self, kind: UsageKind) -> Quota {
        match kind {
            UsageKind::Analysis => self.daily_analyses,
            UsageKind::Alert => self.daily_alerts,
        }
    }
}

const FREE: Entitlements = Entitlements {
    features: &[Feature::PortfolioAnalysis],
    daily_analyses: Quota::Limited(5),
    daily_alerts: Quota::Limited(0),
};

const BASIC: Entitlements = Entitlements {
    features: &[Feature::PortfolioAnalysis, Feature::PriceAlerts],
    daily_analyses: Quota::Limited(50),
    daily_alerts: Quota::Limited(10),
};

const PREMIUM: Entitlements = Entitlements {
    features: &[
        Feature::PortfolioAnalysis,
        Feature::PriceAlerts,
        Feature::AdvancedReports,
        Feature::DataExport,
    ],
    daily_analyses: Quota::Limited(500),
    daily_alerts: Quota::Limited(100),
};

const ENTERPRISE: Entitlements = Entitlements {
    features: &[
        Feature::PortfolioAnalysis,
        Feature::PriceAlerts,
        Feature::AdvancedReports,
        Feature::DataExport,
        Feature::ApiAccess,
    ],
    daily_analyses: Quota::Unlimited,
    daily_alerts: Quota::Unlimited,
};

/// Entitlement lookup keyed on the tier enum.
#[must_use]
pub const fn entitlements_for(tier: Tier) -> &'static Entitlements {
    match tier {
        Tier::Free => &FREE,
        Tier::Basic => &BASIC,
        Tier::Premium => &PREMIUM,
        Tier::Enterprise => &ENTERPRISE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_always_allows() {
        assert!(Quota::Unlimited.allows(0));
        assert!(Quota::Unlimited.allows(1_000_000));
        assert!(Quota::Unlimited.allows(i64::MAX));
    }

    #[test]
    fn test_limited_boundary() {
        let quota = Quota::Limited(5);
        assert!(quota.allows(0));
        assert!(quota.allows(4));
        assert!(!quota.allows(5));
        assert!(!quota.allows(6));
    }

    #[test]
    fn test_zero_quota_never_allows() {
        assert!(!Quota::Limited(0).allows(0));
    }

    #[test]
    fn test_feature_gating_per_tier() {
        assert!(entitlements_for(Tier::Free).allows(Feature::PortfolioAnalysis));
        assert!(!entitlements_for(Tier::Free).allows(Feature::AdvancedReports));
        assert!(!entitlements_for(Tier::Basic).allows(Feature::AdvancedReports));
        assert!(entitlements_for(Tier::Premium).allows(Feature::AdvancedReports));
        assert!(!entitlements_for(Tier::Premium).allows(Feature::ApiAccess));
        assert!(entitlements_for(Tier::Enterprise).allows(Feature::ApiAccess));
    }

    #[test]
    fn test_enterprise_quotas_are_unlimited() {
        let ent = entitlements_for(Tier::Enterprise);
        assert_eq!(ent.quota_for(UsageKind::Analysis), Quota::Unlimited);
        assert_eq!(ent.quota_for(UsageKind::Alert), Quota::Unlimited);
    }
}
