pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod access_service;
pub mod access_service_impl;
pub use access_service::{AccessError, AccessService, UsageItem, UsageSummary};
pub use access_service_impl::SeaOrmAccessService;

pub mod logs;
pub use logs::LogService;
