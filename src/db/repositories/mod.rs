pub mod logs;
pub mod session;
pub mod usage;
pub mod user;
