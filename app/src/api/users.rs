use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "coordenador")]
    Coordinator,
    #[serde(rename = "professor")]
    Professor,
    #[serde(rename = "estudante")]
    Student,
    #[serde(rename = "visitante")]
    Visitor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Coordinator => "coordinator",
            Role::Professor => "professor",
            Role::Student => "student",
            Role::Visitor => "visitor",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tipo_usuario")]
    pub role: Role,
}

/// Nested user reference embedded in projects, teams and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "tipo_usuario", default)]
    pub role: Option<Role>,
}

/// A project member together with the state of its membership.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Participant {
    #[serde(flatten)]
    pub user: UserSummary,
    #[serde(rename = "ativo", default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "senha_atual", skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(rename = "nova_senha", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.client.get_list("usuarios/", &[]).await
    }

    pub async fn get_user(&self, user_id: i64) -> ApiResult<User> {
        let endpoint = format!("usuarios/{}/", user_id);
        self.client.get(&endpoint).await
    }

    /// Sends only the fields set on `update`. Refreshes the cached profile on success.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<User> {
        let user: User = self.client.put("usuarios/editar-perfil/", update).await?;
        self.client.session().cache_user(&user)?;
        Ok(user)
    }
}
