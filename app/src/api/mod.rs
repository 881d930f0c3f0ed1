pub mod auth;
pub mod client;
pub mod pagination;
pub mod projects;
pub mod tasks;
pub mod teams;
pub mod users;

use std::collections::BTreeMap;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Session expired, please log in again")]
    SessionExpired,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Unexpected response HTTP {status}: {body}")]
    Unexpected { status: u16, body: String },
}

impl ApiError {
    /// Client-side required-field failure, shaped like a backend field error.
    pub fn missing_field(field: &str) -> Self {
        let message = format!("{} is required", field);
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        ApiError::ValidationError { message, fields }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::NetworkError(error.to_string())
    }
}

impl From<crate::io::session_store::StoreError> for ApiError {
    fn from(error: crate::io::session_store::StoreError) -> Self {
        ApiError::Storage(error.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()))
    }

    /// Joins an endpoint such as `projetos/` onto the base URL. Absolute URLs pass through.
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Whether `link` points at the configured backend. Relative links always do.
    pub fn is_same_origin(&self, link: &str) -> bool {
        if !(link.starts_with("http://") || link.starts_with("https://")) {
            return true;
        }
        match (Url::parse(&self.base_url), Url::parse(link)) {
            (Ok(base), Ok(link)) => base.origin() == link.origin(),
            _ => false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub use auth::{AuthApi, Credentials, Registration, TokenPair};
pub use client::ApiClient;
pub use projects::{NewProject, Project, ProjectDetail, ProjectPatch, ProjectQuery, ProjectStatus, ProjectsApi};
pub use tasks::{NewTask, Priority, Task, TaskFilter, TaskPatch, TaskStatus, TasksApi};
pub use teams::{NewTeam, Team, TeamPatch, TeamsApi};
pub use users::{ProfileUpdate, Role, User, UserSummary, UsersApi};
