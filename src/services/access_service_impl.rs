//! `SeaORM` implementation of the `AccessService` trait.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::db::Store;
use crate::domain::events::DomainEvent;
use crate::services::access_service::{AccessError, AccessService, UsageItem, UsageSummary};
use crate::tiers::{Feature, Quota, Tier, UsageKind, entitlements_for};

pub struct SeaOrmAccessService {
    store: Store,
    event_bus: broadcast::Sender<DomainEvent>,
}

impl SeaOrmAccessService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<DomainEvent>) -> Self {
        Self { store, event_bus }
    }

    fn emit(&self, event: DomainEvent) {
        let _ = self.event_bus.send(event);
    }

    async fn tier_of(&self, user_id: i32) -> Result<Tier, AccessError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccessError::UserNotFound)?;
        Ok(user.tier)
    }
}

#[async_trait]
impl AccessService for SeaOrmAccessService {
    async fn require_feature(&self, user_id: i32, feature: Feature) -> Result<(), AccessError> {
        let tier = self.tier_of(user_id).await?;

        if entitlements_for(tier).allows(feature) {
            return Ok(());
        }

        debug!(user_id, %tier, %feature, "Feature denied");
        self.emit(DomainEvent::FeatureDenied {
            user_id,
            feature: feature.as_str().to_string(),
        });

        Err(AccessError::FeatureNotEntitled { tier, feature })
    }

    async fn check_and_record(&self, user_id: i32, kind: UsageKind) -> Result<(), AccessError> {
        let tier = self.tier_of(user_id).await?;
        let quota = entitlements_for(tier).quota_for(kind);

        // The unlimited sentinel must short-circuit before any numeric
        // comparison; `Quota::allows` encodes that.
        match quota {
            Quota::Unlimited => {}
            Quota::Limited(limit) => {
                let used_today = self.store.usage_count_today(user_id, kind).await?;
                if !quota.allows(used_today) {
                    self.emit(DomainEvent::QuotaExhausted {
                        user_id,
                        kind: kind.as_str().to_string(),
                    });
                    return Err(AccessError::QuotaExhausted { kind, limit });
                }
            }
        }

        self.store.record_usage(user_id, kind).await?;
        Ok(())
    }

    async fn usage_summary(&self, user_id: i32) -> Result<UsageSummary, AccessError> {
        let tier = self.tier_of(user_id).await?;
        let entitlements = entitlements_for(tier);

        let mut items = Vec::with_capacity(UsageKind::ALL.len());
        for kind in UsageKind::ALL {
            let used_today = self.store.usage_count_today(user_id, kind).await?;
            items.push(UsageItem {
                kind,
                used_today,
                limit: entitlements.quota_for(kind).limit(),
            });
        }

        Ok(UsageSummary { tier, items })
    }
}
