use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::system_logs;
use crate::tiers::{Tier, UsageKind};

pub mod migrator;
pub mod repositories;

pub use crate::entities::system_logs::Model as SystemLog;
pub use repositories::session::SessionRecord;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn usage_repo(&self) -> repositories::usage::UsageRepository {
        repositories::usage::UsageRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        tier: Tier,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(email, password, display_name, tier, config)
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, config)
            .await
    }

    pub async fn set_user_tier(&self, user_id: i32, tier: Tier) -> Result<()> {
        self.user_repo().set_tier(user_id, tier).await
    }

    pub async fn set_user_active(&self, user_id: i32, active: bool) -> Result<()> {
        self.user_repo().set_active(user_id, active).await
    }

    pub async fn touch_user_last_login(&self, user_id: i32) -> Result<()> {
        self.user_repo().touch_last_login(user_id).await
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ========== Sessions ==========

    pub async fn create_session(&self, user_id: i32, ttl_minutes: i64) -> Result<SessionRecord> {
        self.session_repo().create(user_id, ttl_minutes).await
    }

    pub async fn validate_session(&self, token: &str) -> Result<Option<i32>> {
        self.session_repo().validate(token).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        self.session_repo().delete(token).await
    }

    pub async fn delete_sessions_for_user(&self, user_id: i32) -> Result<u64> {
        self.session_repo().delete_for_user(user_id).await
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.session_repo().purge_expired().await
    }

    pub async fn active_session_count(&self) -> Result<u64> {
        self.session_repo().count_active().await
    }

    // ========== Usage ==========

    pub async fn record_usage(&self, user_id: i32, kind: UsageKind) -> Result<()> {
        self.usage_repo().record(user_id, kind).await
    }

    pub async fn usage_count_today(&self, user_id: i32, kind: UsageKind) -> Result<i64> {
        self.usage_repo().count_today(user_id, kind).await
    }

    pub async fn total_usage_today(&self) -> Result<i64> {
        self.usage_repo().count_total_today().await
    }

    pub async fn prune_usage_events(&self, older_than_days: i64) -> Result<u64> {
        self.usage_repo().prune_older_than(older_than_days).await
    }

    // ========== Logs ==========

    pub async fn add_log(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        user_id: Option<i32>,
        details: Option<String>,
    ) -> Result<()> {
        self.logs_repo()
            .add(event_type, level, message, user_id, details)
            .await
    }

    pub async fn get_logs(
        &self,
        page: u64,
        page_size: u64,
        level_filter: Option<String>,
        event_type_filter: Option<String>,
        user_filter: Option<i32>,
    ) -> Result<(Vec<system_logs::Model>, u64)> {
        self.logs_repo()
            .get_logs(page, page_size, level_filter, event_type_filter, user_filter)
            .await
    }

    pub async fn clear_logs(&self) -> Result<()> {
        self.logs_repo().clear_logs().await
    }

    pub async fn prune_logs(&self, older_than_days: i64) -> Result<u64> {
        self.logs_repo().prune_logs(older_than_days).await
    }
}
