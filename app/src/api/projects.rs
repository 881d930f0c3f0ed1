use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::teams::Team;
use super::users::{Participant, UserSummary};
use super::{ApiClient, ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "nao_iniciado", alias = "planejamento")]
    NotStarted,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "nao_iniciado",
            ProjectStatus::InProgress => "em_andamento",
            ProjectStatus::Completed => "concluido",
            ProjectStatus::Cancelled => "cancelado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "data_inicio", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim_prevista", alias = "data_fim", default)]
    pub due_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    #[serde(rename = "participantes", default)]
    pub participants: Vec<i64>,
    #[serde(default)]
    pub professor: Option<i64>,
    #[serde(rename = "criado_por", default)]
    pub created_by: Option<UserSummary>,
    #[serde(rename = "professor_detalhes", default)]
    pub professor_details: Option<UserSummary>,
    #[serde(rename = "lider_detalhes", default)]
    pub leader_details: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    #[serde(rename = "equipes", default)]
    pub teams: Vec<Team>,
    #[serde(rename = "membros", default)]
    pub members: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "data_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim_prevista", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<i64>,
    #[serde(rename = "participantes", skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<i64>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            start_date: None,
            due_date: None,
            status: None,
            professor: None,
            participants: Vec::new(),
        }
    }

    fn check_required(&self) -> ApiResult<()> {
        if self.name.trim().is_empty() {
            return Err(ApiError::missing_field("nome"));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::missing_field("descricao"));
        }
        Ok(())
    }
}

/// Partial update: only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectPatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "data_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim_prevista", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<Option<i64>>,
    #[serde(rename = "participantes", skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
}

impl ProjectQuery {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }
}

pub struct ProjectsApi {
    client: ApiClient,
}

impl ProjectsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_projects(&self, query: &ProjectQuery) -> ApiResult<Vec<Project>> {
        self.client.get_list("projetos/", &query.to_query()).await
    }

    /// Projects exposed to unauthenticated visitors. Never sends the session token.
    pub async fn list_public_projects(&self) -> ApiResult<Vec<Project>> {
        self.client.get_public_list("projetos/publicos/").await
    }

    pub async fn get_project(&self, project_id: i64) -> ApiResult<ProjectDetail> {
        let endpoint = format!("projetos/{}/", project_id);
        self.client.get(&endpoint).await
    }

    pub async fn create_project(&self, project: &NewProject) -> ApiResult<Project> {
        project.check_required()?;
        self.client.post("projetos/", project).await
    }

    pub async fn update_project(&self, project_id: i64, patch: &ProjectPatch) -> ApiResult<Project> {
        let endpoint = format!("projetos/{}/", project_id);
        self.client.patch(&endpoint, patch).await
    }

    pub async fn delete_project(&self, project_id: i64) -> ApiResult<()> {
        let endpoint = format!("projetos/{}/", project_id);
        self.client.delete(&endpoint).await
    }

    pub async fn project_teams(&self, project_id: i64) -> ApiResult<Vec<Team>> {
        let endpoint = format!("projetos/{}/equipes/", project_id);
        self.client.get_list(&endpoint, &[]).await
    }

    pub async fn participants(&self, project_id: i64) -> ApiResult<Vec<Participant>> {
        let endpoint = format!("projetos/{}/participantes/", project_id);
        self.client.get_list(&endpoint, &[]).await
    }

    pub async fn add_participant(&self, project_id: i64, user_id: i64) -> ApiResult<Value> {
        let endpoint = format!("projetos/{}/add_participante/", project_id);
        self.client.post(&endpoint, &json!({ "usuario_id": user_id })).await
    }

    pub async fn set_leader(&self, project_id: i64, user_id: i64) -> ApiResult<Project> {
        let endpoint = format!("projetos/{}/definir-lider/", project_id);
        self.client.post(&endpoint, &json!({ "usuario_id": user_id })).await
    }

    pub async fn set_professor(&self, project_id: i64, professor_id: i64) -> ApiResult<Project> {
        let endpoint = format!("projetos/{}/definir-professor/", project_id);
        self.client.post(&endpoint, &json!({ "professor_id": professor_id })).await
    }

    pub async fn dashboard(&self, project_id: i64) -> ApiResult<Value> {
        let endpoint = format!("projetos/{}/dashboard/", project_id);
        self.client.get(&endpoint).await
    }

    pub async fn reports(&self) -> ApiResult<Value> {
        self.client.get("projetos/relatorios/").await
    }
}
