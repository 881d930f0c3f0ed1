use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::users::UserSummary;
use super::{ApiClient, ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Team {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "projeto")]
    pub project: i64,
    #[serde(rename = "projeto_nome", default)]
    pub project_name: Option<String>,
    #[serde(rename = "lider", default)]
    pub leader: Option<i64>,
    #[serde(rename = "lider_detalhes", default)]
    pub leader_details: Option<UserSummary>,
    #[serde(rename = "membros", default)]
    pub members: Vec<i64>,
    #[serde(rename = "membros_detalhes", default)]
    pub member_details: Vec<UserSummary>,
    #[serde(rename = "data_criacao", default)]
    pub created_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTeam {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "projeto")]
    pub project: i64,
    #[serde(rename = "lider", skip_serializing_if = "Option::is_none")]
    pub leader: Option<i64>,
    #[serde(rename = "membros", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<i64>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, project: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            project,
            leader: None,
            members: Vec::new(),
        }
    }

    fn check_required(&self) -> ApiResult<()> {
        if self.name.trim().is_empty() {
            return Err(ApiError::missing_field("nome"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamPatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(rename = "membros", skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<i64>>,
}

pub struct TeamsApi {
    client: ApiClient,
}

impl TeamsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_teams(&self, project_id: Option<i64>) -> ApiResult<Vec<Team>> {
        let query: Vec<(&str, String)> = project_id
            .map(|id| vec![("projeto", id.to_string())])
            .unwrap_or_default();
        self.client.get_list("equipes/", &query).await
    }

    pub async fn get_team(&self, team_id: i64) -> ApiResult<Team> {
        let endpoint = format!("equipes/{}/", team_id);
        self.client.get(&endpoint).await
    }

    pub async fn create_team(&self, team: &NewTeam) -> ApiResult<Team> {
        team.check_required()?;
        self.client.post("equipes/", team).await
    }

    pub async fn update_team(&self, team_id: i64, patch: &TeamPatch) -> ApiResult<Team> {
        let endpoint = format!("equipes/{}/", team_id);
        self.client.patch(&endpoint, patch).await
    }

    pub async fn delete_team(&self, team_id: i64) -> ApiResult<()> {
        let endpoint = format!("equipes/{}/", team_id);
        self.client.delete(&endpoint).await
    }

    pub async fn set_leader(&self, team_id: i64, leader_id: i64) -> ApiResult<Team> {
        let endpoint = format!("equipes/{}/definir-lider/", team_id);
        self.client.patch(&endpoint, &json!({ "lider_id": leader_id })).await
    }

    pub async fn add_member(&self, team_id: i64, user_id: i64) -> ApiResult<Team> {
        let endpoint = format!("equipes/{}/adicionar-membro/", team_id);
        self.client.post(&endpoint, &json!({ "usuario_id": user_id })).await
    }

    pub async fn remove_member(&self, team_id: i64, user_id: i64) -> ApiResult<Team> {
        let endpoint = format!("equipes/{}/remover-membro/{}/", team_id, user_id);
        self.client.delete_returning(&endpoint).await
    }
}
