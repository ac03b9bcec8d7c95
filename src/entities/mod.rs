pub mod prelude;

pub mod sessions;
pub mod system_logs;
pub mod usage_events;
pub mod users;
