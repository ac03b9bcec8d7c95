//! Service-level tests for the tier evaluator and usage quotas.

use vestor::config::SecurityConfig;
use vestor::db::Store;
use vestor::services::{AccessError, AccessService, SeaOrmAccessService};
use vestor::tiers::{Feature, Tier, UsageKind};

async fn spawn_access() -> (Store, SeaOrmAccessService) {
    // One pooled connection: every connection to an in-memory SQLite URL
    // opens its own empty database.
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory store");
    let (event_bus, _) = tokio::sync::broadcast::channel(16);
    let access = SeaOrmAccessService::new(store.clone(), event_bus);
    (store, access)
}

async fn seed_user(store: &Store, email: &str, tier: Tier) -> i32 {
    store
        .create_user(
            email,
            "Sup3rSecret",
            "Test User",
            tier,
            &SecurityConfig::default(),
        )
        .await
        .expect("Failed to create user")
        .id
}

#[tokio::test]
async fn test_free_tier_feature_denied() {
    let (store, access) = spawn_access().await;
    let user_id = seed_user(&store, "alice@example.com", Tier::Free).await;

    assert!(
        access
            .require_feature(user_id, Feature::PortfolioAnalysis)
            .await
            .is_ok()
    );

    let err = access
        .require_feature(user_id, Feature::AdvancedReports)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::FeatureNotEntitled { .. }));
}

#[tokio::test]
async fn test_quota_exhaustion_on_limited_tier() {
    let (store, access) = spawn_access().await;
    let user_id = seed_user(&store, "bob@example.com", Tier::Free).await;

    // Free tier: 5 analyses per day.
    for _ in 0..5 {
        access
            .check_and_record(user_id, UsageKind::Analysis)
            .await
            .unwrap();
    }

    let err = access
        .check_and_record(user_id, UsageKind::Analysis)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::QuotaExhausted { limit: 5, .. }
    ));

    // The denied attempt recorded nothing.
    assert_eq!(
        store
            .usage_count_today(user_id, UsageKind::Analysis)
            .await
            .unwrap(),
        5
    );
}

#[tokio::test]
async fn test_unlimited_quota_always_allows() {
    let (store, access) = spawn_access().await;
    let user_id = seed_user(&store, "carol@example.com", Tier::Enterprise).await;

    // Well past every limited tier's ceiling for alerts.
    for _ in 0..120 {
        access
            .check_and_record(user_id, UsageKind::Alert)
            .await
            .unwrap();
    }

    assert_eq!(
        store
            .usage_count_today(user_id, UsageKind::Alert)
            .await
            .unwrap(),
        120
    );
}

#[tokio::test]
async fn test_tier_change_takes_effect_immediately() {
    let (store, access) = spawn_access().await;
    let user_id = seed_user(&store, "dave@example.com", Tier::Free).await;

    assert!(
        access
            .require_feature(user_id, Feature::PriceAlerts)
            .await
            .is_err()
    );

    store.set_user_tier(user_id, Tier::Basic).await.unwrap();

    assert!(
        access
            .require_feature(user_id, Feature::PriceAlerts)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_usage_summary_reports_limits() {
    let (store, access) = spawn_access().await;
    let user_id = seed_user(&store, "erin@example.com", Tier::Basic).await;

    access
        .check_and_record(user_id, UsageKind::Analysis)
        .await
        .unwrap();

    let summary = access.usage_summary(user_id).await.unwrap();
    assert_eq!(summary.tier, Tier::Basic);

    let analysis = summary
        .items
        .iter()
        .find(|item| item.kind == UsageKind::Analysis)
        .unwrap();
    assert_eq!(analysis.used_today, 1);
    assert_eq!(analysis.limit, Some(50));

    let enterprise_id = seed_user(&store, "frank@example.com", Tier::Enterprise).await;
    let summary = access.usage_summary(enterprise_id).await.unwrap();
    assert!(summary.items.iter().all(|item| item.limit.is_none()));
}

#[tokio::test]
async fn test_unknown_user_rejected() {
    let (_store, access) = spawn_access().await;

    let err = access
        .require_feature(9999, Feature::PortfolioAnalysis)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::UserNotFound));
}
