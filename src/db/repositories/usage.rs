use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::entities::{prelude::*, usage_events};
use crate::tiers::UsageKind;

/// Repository for the append-only usage log.
pub struct UsageRepository {
    conn: DatabaseConnection,
}

impl UsageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append one usage event. Rows are never updated afterwards.
    pub async fn record(&self, user_id: i32, kind: UsageKind) -> Result<()> {
        let active = usage_events::ActiveModel {
            user_id: Set(user_id),
            kind: Set(kind.as_str().to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        UsageEvents::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert usage event")?;

        Ok(())
    }

    /// Count of a user's events of one kind since UTC midnight.
    pub async fn count_today(&self, user_id: i32, kind: UsageKind) -> Result<i64> {
        let count = UsageEvents::find()
            .filter(usage_events::Column::UserId.eq(user_id))
            .filter(usage_events::Column::Kind.eq(kind.as_str()))
            .filter(usage_events::Column::CreatedAt.gte(start_of_utc_day()))
            .count(&self.conn)
            .await
            .context("Failed to count usage events")?;

        Ok(count as i64)
    }

    /// Drop events older than the retention window.
    pub async fn prune_older_than(&self, days: i64) -> Result<u64> {
        let cutoff = (chrono::Utc::now() - chrono::Duration::days(days)).to_rfc3339();

        let result = UsageEvents::delete_many()
            .filter(usage_events::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to prune usage events")?;

        Ok(result.rows_affected)
    }

    pub async fn count_total_today(&self) -> Result<i64> {
        let count = UsageEvents::find()
            .filter(usage_events::Column::CreatedAt.gte(start_of_utc_day()))
            .count(&self.conn)
            .await
            .context("Failed to count usage events")?;

        Ok(count as i64)
    }
}

/// RFC 3339 timestamp for 00:00:00 UTC today. All rows are written in the
/// same format, so string comparison matches timestamp comparison.
fn start_of_utc_day() -> String {
    let today = chrono::Utc::now().date_naive();
    let midnight = today
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    midnight.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_utc_day_precedes_now() {
        let midnight = start_of_utc_day();
        let now = chrono::Utc::now().to_rfc3339();
        assert!(midnight <= now);
        assert!(midnight.starts_with(&now[..10]));
    }
}
