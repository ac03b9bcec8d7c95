//! Store-level tests for session lifecycle and usage metering.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use vestor::config::SecurityConfig;
use vestor::db::Store;
use vestor::entities::{sessions, usage_events};
use vestor::tiers::{Tier, UsageKind};

async fn spawn_store() -> Store {
    // One pooled connection: every connection to an in-memory SQLite URL
    // opens its own empty database.
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory store")
}

async fn seed_user(store: &Store, email: &str) -> i32 {
    store
        .create_user(
            email,
            "Sup3rSecret",
            "Test User",
            Tier::Free,
            &SecurityConfig::default(),
        )
        .await
        .expect("Failed to create user")
        .id
}

#[tokio::test]
async fn test_unknown_token_is_invalid() {
    let store = spawn_store().await;

    let result = store.validate_session("no-such-token").await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_valid_session_resolves_to_user() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "alice@example.com").await;

    let session = store.create_session(user_id, 60).await.unwrap();
    assert!(session.expires_at > session.created_at);

    let result = store.validate_session(&session.token).await.unwrap();
    assert_eq!(result, Some(user_id));

    // Successful validation has no side effects on the row.
    let result = store.validate_session(&session.token).await.unwrap();
    assert_eq!(result, Some(user_id));
}

#[tokio::test]
async fn test_expired_session_is_purged_on_validation() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "bob@example.com").await;

    let past = (chrono::Utc::now() - chrono::Duration::minutes(5)).to_rfc3339();
    let token = "a".repeat(64);

    sessions::ActiveModel {
        token: Set(token.clone()),
        user_id: Set(user_id),
        created_at: Set((chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339()),
        expires_at: Set(past),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .unwrap();

    let result = store.validate_session(&token).await.unwrap();
    assert_eq!(result, None);

    // Lazy cleanup removed the row; the session cannot come back.
    let remaining = sessions::Entity::find()
        .filter(sessions::Column::Token.eq(token.clone()))
        .one(&store.conn)
        .await
        .unwrap();
    assert!(remaining.is_none());

    let result = store.validate_session(&token).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_logout_deletes_session() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "carol@example.com").await;

    let session = store.create_session(user_id, 60).await.unwrap();

    assert!(store.delete_session(&session.token).await.unwrap());
    assert_eq!(store.validate_session(&session.token).await.unwrap(), None);

    // Idempotent: deleting again reports nothing removed.
    assert!(!store.delete_session(&session.token).await.unwrap());
}

#[tokio::test]
async fn test_create_session_rejects_nonpositive_ttl() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "dave@example.com").await;

    assert!(store.create_session(user_id, 0).await.is_err());
    assert!(store.create_session(user_id, -10).await.is_err());
}

#[tokio::test]
async fn test_purge_expired_sweeps_only_expired() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "erin@example.com").await;

    let live = store.create_session(user_id, 60).await.unwrap();

    sessions::ActiveModel {
        token: Set("b".repeat(64)),
        user_id: Set(user_id),
        created_at: Set((chrono::Utc::now() - chrono::Duration::hours(2)).to_rfc3339()),
        expires_at: Set((chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339()),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .unwrap();

    let purged = store.purge_expired_sessions().await.unwrap();
    assert_eq!(purged, 1);

    assert_eq!(
        store.validate_session(&live.token).await.unwrap(),
        Some(user_id)
    );
}

#[tokio::test]
async fn test_usage_counting_per_kind() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "frank@example.com").await;
    let other_id = seed_user(&store, "grace@example.com").await;

    for _ in 0..3 {
        store.record_usage(user_id, UsageKind::Analysis).await.unwrap();
    }
    store.record_usage(user_id, UsageKind::Alert).await.unwrap();
    store.record_usage(other_id, UsageKind::Analysis).await.unwrap();

    assert_eq!(
        store.usage_count_today(user_id, UsageKind::Analysis).await.unwrap(),
        3
    );
    assert_eq!(
        store.usage_count_today(user_id, UsageKind::Alert).await.unwrap(),
        1
    );
    assert_eq!(
        store.usage_count_today(other_id, UsageKind::Analysis).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_usage_pruning_keeps_recent_events() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "heidi@example.com").await;

    store.record_usage(user_id, UsageKind::Analysis).await.unwrap();

    usage_events::ActiveModel {
        user_id: Set(user_id),
        kind: Set("analysis".to_string()),
        created_at: Set((chrono::Utc::now() - chrono::Duration::days(10)).to_rfc3339()),
        ..Default::default()
    }
    .insert(&store.conn)
    .await
    .unwrap();

    let pruned = store.prune_usage_events(7).await.unwrap();
    assert_eq!(pruned, 1);

    assert_eq!(
        store.usage_count_today(user_id, UsageKind::Analysis).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_deactivation_revokes_sessions() {
    let store = spawn_store().await;
    let user_id = seed_user(&store, "ivan@example.com").await;

    let first = store.create_session(user_id, 60).await.unwrap();
    let second = store.create_session(user_id, 60).await.unwrap();

    store.set_user_active(user_id, false).await.unwrap();
    let revoked = store.delete_sessions_for_user(user_id).await.unwrap();
    assert_eq!(revoked, 2);

    assert_eq!(store.validate_session(&first.token).await.unwrap(), None);
    assert_eq!(store.validate_session(&second.token).await.unwrap(), None);

    let user = store.get_user_by_id(user_id).await.unwrap().unwrap();
    assert!(!user.is_active);
}

#[tokio::test]
async fn test_password_hash_round_trip() {
    use vestor::db::repositories::user::{hash_password, verify_password};

    let hash = hash_password("Sup3rSecret", Some(&SecurityConfig::default())).unwrap();
    assert!(hash.starts_with("$argon2id$"));

    assert!(verify_password("Sup3rSecret", &hash).await.unwrap());
    assert!(!verify_password("WrongPass1", &hash).await.unwrap());
}
