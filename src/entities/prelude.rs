pub use super::sessions::Entity as Sessions;
pub use super::system_logs::Entity as SystemLogs;
pub use super::usage_events::Entity as UsageEvents;
pub use super::users::Entity as Users;
