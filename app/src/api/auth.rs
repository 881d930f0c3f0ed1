use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::client::{ApiClient, detail_message, error_for_status};
use super::users::{Role, User};
use super::{ApiConfig, ApiError, ApiResult};
use crate::auth::RefreshedTokens;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Access/refresh pair returned by the credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(rename = "tipo_usuario", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Registration {
    fn check_required(&self) -> ApiResult<()> {
        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
            ("nome", &self.name),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::missing_field(field));
            }
        }
        Ok(())
    }
}

pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchanges credentials for a token pair and stores it.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<TokenPair> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.client.post_public_raw("token/", &credentials).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!("Login rejected for {}", username);
            self.client.session().logout();
            return Err(ApiError::InvalidCredentials(detail_message(&body)));
        }

        let tokens: TokenPair = ApiClient::handle_response(response).await?;
        self.client.session().establish(&tokens)?;
        info!("Logged in as {}", username);
        Ok(tokens)
    }

    pub async fn register(&self, registration: &Registration) -> ApiResult<User> {
        registration.check_required()?;
        self.client.post_public("usuarios/registro/", registration).await
    }

    pub async fn register_and_login(&self, registration: &Registration) -> ApiResult<User> {
        self.register(registration).await?;
        self.login(&registration.username, &registration.password).await?;
        self.fetch_current_user().await
    }

    /// Retrieves the profile of the logged-in account and caches it in the session.
    pub async fn fetch_current_user(&self) -> ApiResult<User> {
        let user: User = self.client.get("usuarios/perfil/").await?;
        self.client.session().cache_user(&user)?;
        Ok(user)
    }

    pub fn current_user(&self) -> Option<User> {
        self.client.session().current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    pub fn logout(&self) {
        self.client.session().logout();
    }
}

/// The refresh call itself. Rejection of the refresh token maps to `SessionExpired`;
/// anything else keeps its own error kind.
pub(crate) async fn request_refresh(
    client: &Client,
    config: &ApiConfig,
    refresh_token: &str,
) -> ApiResult<RefreshedTokens> {
    let response = client
        .post(config.url("token/refresh/"))
        .json(&RefreshRequest {
            refresh: refresh_token,
        })
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        let refreshed: RefreshResponse = ApiClient::handle_response(response).await?;
        return Ok(RefreshedTokens {
            access: refreshed.access,
            refresh: refreshed.refresh,
        });
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
            warn!("Refresh token rejected: {}", detail_message(&body));
            Err(ApiError::SessionExpired)
        }
        _ => Err(error_for_status(status, &body)),
    }
}
