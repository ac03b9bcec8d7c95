use crate::db::Store;
use crate::domain::events::DomainEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::error;

/// Persists domain events to the audit log table.
pub struct LogService {
    store: Store,
    event_bus: broadcast::Sender<DomainEvent>,
}

impl LogService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<DomainEvent>) -> Self {
        Self { store, event_bus }
    }

    pub fn start_listener(self: Arc<Self>) {
        let mut rx = self.event_bus.subscribe();
        let service = self;

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = service.handle_event(event).await {
                            error!(error = %e, "Failed to save log");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        error!(count, "Log listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Log listener event bus closed");
                        break;
                    }
                }
            }
        });
    }

    async fn handle_event(&self, event: DomainEvent) -> anyhow::Result<()> {
        let (event_type, level, message, user_id, details) = match &event {
            DomainEvent::UserRegistered { user_id, email } => (
                "UserRegistered",
                "info",
                format!("User {user_id} registered ({email})"),
                Some(*user_id),
                None,
            ),
            DomainEvent::LoginSucceeded { user_id } => (
                "LoginSucceeded",
                "info",
                format!("User {user_id} logged in"),
                Some(*user_id),
                None,
            ),
            // No user id here; failed attempts may name accounts that do
            // not exist.
            DomainEvent::LoginFailed { email } => (
                "LoginFailed",
                "warn",
                format!("Failed login attempt for {email}"),
                None,
                None,
            ),
            DomainEvent::PasswordChanged { user_id } => (
                "PasswordChanged",
                "info",
                format!("User {user_id} changed password"),
                Some(*user_id),
                None,
            ),
            DomainEvent::SessionsRevoked { user_id, count } => (
                "SessionsRevoked",
                "info",
                format!("Revoked {count} sessions for user {user_id}"),
                Some(*user_id),
                None,
            ),
            DomainEvent::TierChanged { user_id, tier } => (
                "TierChanged",
                "info",
                format!("User {user_id} moved to tier {tier}"),
                Some(*user_id),
                None,
            ),
            DomainEvent::UserDeactivated { user_id } => (
                "UserDeactivated",
                "warn",
                format!("User {user_id} deactivated"),
                Some(*user_id),
                None,
            ),
            DomainEvent::FeatureDenied { user_id, feature } => (
                "FeatureDenied",
                "warn",
                format!("User {user_id} denied feature {feature}"),
                Some(*user_id),
                None,
            ),
            DomainEvent::QuotaExhausted { user_id, kind } => (
                "QuotaExhausted",
                "warn",
                format!("User {user_id} exhausted daily {kind} quota"),
                Some(*user_id),
                None,
            ),
            DomainEvent::MaintenanceFinished {
                purged_sessions,
                pruned_usage_events,
                pruned_logs,
            } => {
                if *purged_sessions == 0 && *pruned_usage_events == 0 && *pruned_logs == 0 {
                    return Ok(());
                }
                (
                    "MaintenanceFinished",
                    "info",
                    format!(
                        "Maintenance: {purged_sessions} sessions purged, {pruned_usage_events} usage events pruned, {pruned_logs} logs pruned"
                    ),
                    None,
                    Some(serde_json::to_string(&event)?),
                )
            }
            DomainEvent::Error { message } => ("Error", "error", message.clone(), None, None),
            DomainEvent::Info { message } => ("Info", "info", message.clone(), None, None),
        };

        self.store
            .add_log(event_type, level, &message, user_id, details)
            .await?;

        Ok(())
    }
}
