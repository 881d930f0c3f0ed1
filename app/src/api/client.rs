use std::collections::{BTreeMap, HashSet};

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use super::auth::{AuthApi, request_refresh};
use super::pagination::Listing;
use super::projects::ProjectsApi;
use super::tasks::TasksApi;
use super::teams::TeamsApi;
use super::users::UsersApi;
use super::{ApiConfig, ApiError, ApiResult};
use crate::auth::{RefreshedTokens, SessionManager};

/// A call may go through the refresh protocol at most this many times.
const MAX_REFRESH_RETRIES: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Session,
    Public,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    session: SessionManager,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: SessionManager) -> Self {
        Self {
            client: Client::new(),
            config,
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    pub fn projects(&self) -> ProjectsApi {
        ProjectsApi::new(self.clone())
    }

    pub fn teams(&self) -> TeamsApi {
        TeamsApi::new(self.clone())
    }

    pub fn tasks(&self) -> TasksApi {
        TasksApi::new(self.clone())
    }

    fn refresher(&self) -> impl FnOnce(String) -> BoxFuture<'static, ApiResult<RefreshedTokens>> {
        let client = self.client.clone();
        let config = self.config.clone();
        move |refresh_token| {
            async move { request_refresh(&client, &config, &refresh_token).await }.boxed()
        }
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        access: Access,
    ) -> ApiResult<Response> {
        let url = self.config.url(endpoint);
        let mut token = match access {
            Access::Session => self.session.access_token(),
            Access::Public => None,
        };
        let mut refresh_retries = 0u8;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!("{} {}", method, url);
            let response = request.send().await?;
            debug!("{} {} -> {}", method, url, response.status());

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            // Only a request that carried a token can be rescued by a refresh.
            // Anything else is the caller's 401 to interpret.
            let Some(rejected) = token.take() else {
                return Ok(response);
            };
            if refresh_retries >= MAX_REFRESH_RETRIES {
                warn!("{} {} rejected again after session refresh", method, url);
                return Err(Self::error_from(response).await);
            }
            refresh_retries += 1;

            let fresh = self
                .session
                .refresh_after_rejection(&rejected, self.refresher())
                .await?;
            token = Some(fresh);
        }
    }

    pub(crate) async fn handle_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::NetworkError(format!("Failed to read response body: {}", e)))?;

            serde_json::from_str::<T>(&body).map_err(|e| {
                ApiError::ParseError(format!("Failed to parse response: {}. Response body: {}", e, body))
            })
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error_for_status(status, &body)
    }

    fn encode<R: Serialize>(body: &R) -> ApiResult<Value> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::ParseError(format!("Failed to encode request body: {}", e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.get_with_query(endpoint, &[]).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self.send(Method::GET, endpoint, query, None, Access::Session).await?;
        Self::handle_response(response).await
    }

    /// Every item of a list endpoint, following `next` links of paginated envelopes.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        self.collect_list(endpoint, query, Access::Session).await
    }

    pub async fn get_public_list<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<Vec<T>> {
        self.collect_list(endpoint, &[], Access::Public).await
    }

    async fn collect_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        access: Access,
    ) -> ApiResult<Vec<T>> {
        let response = self.send(Method::GET, endpoint, query, None, access).await?;
        let mut listing: Listing<T> = Self::handle_response(response).await?;
        let mut items = Vec::new();
        let mut visited = HashSet::new();

        loop {
            let next = listing.next_page().map(str::to_string);
            items.extend(listing.into_items());
            let Some(next) = next else {
                return Ok(items);
            };
            if !self.config.is_same_origin(&next) {
                warn!("Not following pagination link to another host: {}", next);
                return Ok(items);
            }
            if !visited.insert(next.clone()) {
                warn!("Pagination link repeats, stopping at {}", next);
                return Ok(items);
            }
            let response = self.send(Method::GET, &next, &[], None, access).await?;
            listing = Self::handle_response(response).await?;
        }
    }

    pub async fn post<T: DeserializeOwned, R: Serialize>(&self, endpoint: &str, body: &R) -> ApiResult<T> {
        let body = Self::encode(body)?;
        let response = self
            .send(Method::POST, endpoint, &[], Some(&body), Access::Session)
            .await?;
        Self::handle_response(response).await
    }

    /// POST without the session's bearer token (login, registration).
    pub async fn post_public<T: DeserializeOwned, R: Serialize>(
        &self,
        endpoint: &str,
        body: &R,
    ) -> ApiResult<T> {
        let response = self.post_public_raw(endpoint, body).await?;
        Self::handle_response(response).await
    }

    pub(crate) async fn post_public_raw<R: Serialize>(&self, endpoint: &str, body: &R) -> ApiResult<Response> {
        let body = Self::encode(body)?;
        self.send(Method::POST, endpoint, &[], Some(&body), Access::Public).await
    }

    pub async fn put<T: DeserializeOwned, R: Serialize>(&self, endpoint: &str, body: &R) -> ApiResult<T> {
        let body = Self::encode(body)?;
        let response = self
            .send(Method::PUT, endpoint, &[], Some(&body), Access::Session)
            .await?;
        Self::handle_response(response).await
    }

    pub async fn patch<T: DeserializeOwned, R: Serialize>(&self, endpoint: &str, body: &R) -> ApiResult<T> {
        let body = Self::encode(body)?;
        let response = self
            .send(Method::PATCH, endpoint, &[], Some(&body), Access::Session)
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete(&self, endpoint: &str) -> ApiResult<()> {
        let response = self.send(Method::DELETE, endpoint, &[], None, Access::Session).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// DELETE for endpoints that answer with the updated record.
    pub async fn delete_returning<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let response = self.send(Method::DELETE, endpoint, &[], None, Access::Session).await?;
        Self::handle_response(response).await
    }
}

/// Maps a non-success response onto the error taxonomy.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    match status.as_u16() {
        400 => validation_error(body),
        401 => ApiError::Unauthorized(detail_message(body)),
        403 => ApiError::Forbidden(detail_message(body)),
        404 => ApiError::NotFound(detail_message(body)),
        500..=599 => ApiError::ServerError(detail_message(body)),
        code => ApiError::Unexpected {
            status: code,
            body: body.to_string(),
        },
    }
}

/// The backend reports errors as `{"detail": ..}`, `{"erro": ..}` or a field map.
pub(crate) fn detail_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ["detail", "erro"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

fn validation_error(body: &str) -> ApiError {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return ApiError::ValidationError {
            message: body.to_string(),
            fields: BTreeMap::new(),
        };
    };

    let mut message = None;
    let mut fields = BTreeMap::new();
    for (key, value) in map {
        let messages = match value {
            Value::String(text) => vec![text],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(text) => text,
                    other => other.to_string(),
                })
                .collect(),
            other => vec![other.to_string()],
        };
        if key == "detail" || key == "erro" {
            message = messages.into_iter().next();
        } else {
            fields.insert(key, messages);
        }
    }

    let message = message.unwrap_or_else(|| {
        fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    });
    ApiError::ValidationError { message, fields }
}
