pub mod api;
pub mod auth;
pub mod io;
pub mod permissions;

pub use api::{ApiClient, ApiConfig, ApiError, ApiResult};
pub use auth::{SessionManager, SessionState};
pub use permissions::Permission;
