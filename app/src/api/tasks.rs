use std::fmt;

use chrono::NaiveDate;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;

use super::teams::Team;
use super::users::UserSummary;
use super::{ApiClient, ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "nao_iniciado", alias = "pendente")]
    Pending,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "concluida")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "nao_iniciado",
            TaskStatus::InProgress => "em_andamento",
            TaskStatus::Done => "concluida",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored by the backend as 1 (alta), 2 (media), 3 (baixa); names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn level(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "alta",
            Priority::Medium => "media",
            Priority::Low => "baixa",
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Level(u8),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Level(1) => Ok(Priority::High),
            Raw::Level(2) => Ok(Priority::Medium),
            Raw::Level(3) => Ok(Priority::Low),
            Raw::Level(level) => Err(Error::custom(format!("unknown priority level {}", level))),
            Raw::Name(name) => match name.as_str() {
                "alta" => Ok(Priority::High),
                "media" | "média" => Ok(Priority::Medium),
                "baixa" => Ok(Priority::Low),
                _ => Err(Error::custom(format!("unknown priority {:?}", name))),
            },
        }
    }
}

/// The backend answers with either the team id or the expanded team.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TeamRef {
    Id(i64),
    Expanded(Box<Team>),
}

impl TeamRef {
    pub fn id(&self) -> i64 {
        match self {
            TeamRef::Id(id) => *id,
            TeamRef::Expanded(team) => team.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(rename = "prioridade", default)]
    pub priority: Priority,
    #[serde(rename = "projeto", default)]
    pub project: Option<i64>,
    #[serde(rename = "equipe", default)]
    pub team: Option<TeamRef>,
    #[serde(rename = "responsavel", default)]
    pub responsible: Option<i64>,
    #[serde(rename = "responsavel_detalhes", default)]
    pub responsible_details: Option<UserSummary>,
    #[serde(rename = "data_inicio", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim_prevista", alias = "data_fim", default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "prioridade", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "projeto", skip_serializing_if = "Option::is_none")]
    pub project: Option<i64>,
    #[serde(rename = "equipe", skip_serializing_if = "Option::is_none")]
    pub team: Option<i64>,
    #[serde(rename = "responsavel_id", skip_serializing_if = "Option::is_none")]
    pub responsible: Option<i64>,
    #[serde(rename = "data_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim_prevista", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            priority: None,
            project: None,
            team: None,
            responsible: None,
            start_date: None,
            due_date: None,
        }
    }

    fn check_required(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::missing_field("titulo"));
        }
        Ok(())
    }
}

/// Partial update: only the fields that are `Some` are sent. `Some(None)` clears a relation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "prioridade", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "equipe", skip_serializing_if = "Option::is_none")]
    pub team: Option<Option<i64>>,
    #[serde(rename = "responsavel_id", skip_serializing_if = "Option::is_none")]
    pub responsible: Option<Option<i64>>,
    #[serde(rename = "data_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim_prevista", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub team: Option<i64>,
    pub responsible: Option<i64>,
}

impl TaskFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            query.push(("prioridade", priority.level().to_string()));
        }
        if let Some(team) = self.team {
            query.push(("equipe", team.to_string()));
        }
        if let Some(responsible) = self.responsible {
            query.push(("responsavel", responsible.to_string()));
        }
        query
    }
}

pub struct TasksApi {
    client: ApiClient,
}

impl TasksApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
        self.client.get_list("tarefas/", &filter.to_query()).await
    }

    pub async fn get_task(&self, task_id: i64) -> ApiResult<Task> {
        let endpoint = format!("tarefas/{}/", task_id);
        self.client.get(&endpoint).await
    }

    pub async fn create_task(&self, task: &NewTask) -> ApiResult<Task> {
        task.check_required()?;
        self.client.post("tarefas/", task).await
    }

    pub async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> ApiResult<Task> {
        let endpoint = format!("tarefas/{}/", task_id);
        self.client.patch(&endpoint, patch).await
    }

    pub async fn delete_task(&self, task_id: i64) -> ApiResult<()> {
        let endpoint = format!("tarefas/{}/", task_id);
        self.client.delete(&endpoint).await
    }

    pub async fn assign_task(&self, task_id: i64, user_id: i64) -> ApiResult<Task> {
        let endpoint = format!("tarefas/{}/assign/", task_id);
        self.client.post(&endpoint, &json!({ "responsavel_id": user_id })).await
    }

    pub async fn change_status(&self, task_id: i64, status: TaskStatus) -> ApiResult<Task> {
        let endpoint = format!("tarefas/{}/change_status/", task_id);
        self.client.post(&endpoint, &json!({ "status": status })).await
    }
}
