//! Domain events for the application.
//!
//! Events are sent via the event bus; the log service persists them to the
//! audit log and other listeners can subscribe for their own purposes.

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum DomainEvent {
    UserRegistered {
        user_id: i32,
        email: String,
    },
    LoginSucceeded {
        user_id: i32,
    },
    LoginFailed {
        email: String,
    },
    PasswordChanged {
        user_id: i32,
    },
    SessionsRevoked {
        user_id: i32,
        count: u64,
    },
    TierChanged {
        user_id: i32,
        tier: String,
    },
    UserDeactivated {
        user_id: i32,
    },
    FeatureDenied {
        user_id: i32,
        feature: String,
    },
    QuotaExhausted {
        user_id: i32,
        kind: String,
    },
    MaintenanceFinished {
        purged_sessions: u64,
        pruned_usage_events: u64,
        pruned_logs: u64,
    },

    Error {
        message: String,
    },
    Info {
        message: String,
    },
}
