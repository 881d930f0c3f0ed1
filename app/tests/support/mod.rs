//! In-process stand-in for the DevLab backend, bound to an ephemeral port.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::http::header;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use devlab::io::{MemoryStore, SessionStore};
use devlab::{ApiClient, ApiConfig, SessionManager};
use serde_json::{Value, json};

pub const FRESH_ACCESS: &str = "fresh-access";
pub const STALE_ACCESS: &str = "stale-access";
pub const REFRESH: &str = "refresh-1";
pub const PASSWORD: &str = "s3nha";

#[derive(Default)]
pub struct Backend {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    /// Refresh endpoint answers 401, as for a revoked refresh token.
    pub reject_refresh: AtomicBool,
    /// Every protected endpoint answers 401, even for a fresh token.
    pub reject_everything: AtomicBool,
    /// Authorization header of every request, in arrival order.
    pub authorization: Mutex<Vec<Option<String>>>,
    pub task_patches: Mutex<Vec<Value>>,
    /// Method, path and JSON body of every mutating call on teams, projects and profiles.
    pub calls: Mutex<Vec<(String, String, Value)>>,
}

impl Backend {
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().last().cloned().flatten()
    }

    fn record(&self, req: &HttpRequest) -> Option<String> {
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization.lock().unwrap().push(value.clone());
        value
    }

    pub fn calls(&self) -> Vec<(String, String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, req: &HttpRequest, body: Value) {
        self.calls
            .lock()
            .unwrap()
            .push((req.method().to_string(), req.path().to_string(), body));
    }

    fn authorize(&self, req: &HttpRequest) -> Result<(), HttpResponse> {
        let value = self.record(req);
        let expected = format!("Bearer {}", FRESH_ACCESS);
        if !self.reject_everything.load(Ordering::SeqCst) && value.as_deref() == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(HttpResponse::Unauthorized().json(json!({
                "detail": "Given token not valid for any token type",
                "code": "token_not_valid"
            })))
        }
    }
}

pub fn user_json() -> Value {
    json!({
        "id": 7,
        "username": "ana",
        "email": "ana@devlab.edu",
        "nome": "Ana Souza",
        "tipo_usuario": "coordenador"
    })
}

pub fn team_json(id: i64, leader: i64, members: &[i64]) -> Value {
    json!({
        "id": id,
        "nome": "Firmware",
        "descricao": null,
        "projeto": 1,
        "lider": leader,
        "membros": members,
        "data_criacao": "2025-04-02"
    })
}

pub fn project_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "nome": name,
        "descricao": "Projeto de extensão",
        "data_inicio": "2025-03-01",
        "data_fim_prevista": "2025-12-01",
        "status": "em_andamento",
        "participantes": [7],
        "professor": 3
    })
}

pub fn task_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "titulo": "Calibrar sensores",
        "descricao": "Usar o multímetro do laboratório",
        "status": status,
        "prioridade": 1,
        "projeto": 1,
        "equipe": 2,
        "responsavel": 7,
        "data_inicio": "2025-04-01",
        "data_fim_prevista": "2025-04-20"
    })
}

async fn obtain_token(state: web::Data<Backend>, body: web::Json<Value>) -> HttpResponse {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] == PASSWORD {
        HttpResponse::Ok().json(json!({ "access": FRESH_ACCESS, "refresh": REFRESH }))
    } else {
        HttpResponse::Unauthorized().json(json!({
            "detail": "No active account found with the given credentials"
        }))
    }
}

async fn refresh_token(state: web::Data<Backend>, body: web::Json<Value>) -> HttpResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Long enough for concurrent callers to pile up behind the same refresh.
    actix_web::rt::time::sleep(Duration::from_millis(100)).await;

    if state.reject_refresh.load(Ordering::SeqCst) || body["refresh"] != REFRESH {
        HttpResponse::Unauthorized().json(json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid"
        }))
    } else {
        HttpResponse::Ok().json(json!({ "access": FRESH_ACCESS }))
    }
}

async fn profile(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    HttpResponse::Ok().json(user_json())
}

async fn list_projects(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    HttpResponse::Ok().json(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [project_json(1, "Estação meteorológica"), project_json(2, "Horta urbana")]
    }))
}

async fn public_projects(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    state.record(&req);
    HttpResponse::Ok().json(json!([project_json(2, "Horta urbana")]))
}

async fn create_project(req: HttpRequest, state: web::Data<Backend>, body: web::Json<Value>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    let start = body["data_inicio"].as_str().unwrap_or_default();
    let due = body["data_fim_prevista"].as_str().unwrap_or_default();
    if !start.is_empty() && !due.is_empty() && due < start {
        return HttpResponse::BadRequest().json(json!({
            "data_fim_prevista": ["A data de término prevista não pode ser anterior à data de início."]
        }));
    }
    let mut created = project_json(3, body["nome"].as_str().unwrap_or_default());
    created["status"] = json!("nao_iniciado");
    HttpResponse::Created().json(created)
}

async fn delete_project(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    HttpResponse::Forbidden().json(json!({
        "detail": "Você não tem permissão para executar essa ação."
    }))
}

async fn list_tasks(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    if req.query_string().contains("page=2") {
        return HttpResponse::Ok().json(json!({
            "count": 2,
            "next": null,
            "results": [task_json(8, "nao_iniciado")]
        }));
    }
    let next = format!("http://{}/api/tarefas/?page=2", req.connection_info().host());
    HttpResponse::Ok().json(json!({
        "count": 2,
        "next": next,
        "results": [task_json(7, "em_andamento")]
    }))
}

async fn patch_task(
    req: HttpRequest,
    state: web::Data<Backend>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    let body = body.into_inner();
    let mut task = task_json(path.into_inner(), "em_andamento");
    if let (Value::Object(task), Value::Object(changes)) = (&mut task, &body) {
        for (key, value) in changes {
            task.insert(key.clone(), value.clone());
        }
    }
    state.task_patches.lock().unwrap().push(body);
    HttpResponse::Ok().json(task)
}

async fn list_users(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    let mut other = user_json();
    other["id"] = json!(12);
    other["username"] = json!("teo");
    other["tipo_usuario"] = json!("estudante");
    HttpResponse::Ok().json(json!([user_json(), other]))
}

async fn get_user(req: HttpRequest, state: web::Data<Backend>, path: web::Path<i64>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    if path.into_inner() == 7 {
        HttpResponse::Ok().json(user_json())
    } else {
        HttpResponse::NotFound().json(json!({ "detail": "Not found." }))
    }
}

async fn edit_profile(req: HttpRequest, state: web::Data<Backend>, body: web::Json<Value>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    let body = body.into_inner();
    let mut user = user_json();
    for key in ["nome", "email"] {
        if let Some(value) = body.get(key) {
            user[key] = value.clone();
        }
    }
    state.record_call(&req, body);
    HttpResponse::Ok().json(user)
}

async fn list_teams(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    // The second page points back at itself.
    let next = format!("http://{}/api/equipes/?page=2", req.connection_info().host());
    let results = if req.query_string().contains("page=2") {
        vec![team_json(3, 12, &[12])]
    } else {
        vec![team_json(2, 11, &[11, 12])]
    };
    HttpResponse::Ok().json(json!({ "count": 2, "next": next, "results": results }))
}

async fn set_team_leader(
    req: HttpRequest,
    state: web::Data<Backend>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    let body = body.into_inner();
    let leader = body["lider_id"].as_i64().unwrap_or_default();
    state.record_call(&req, body);
    HttpResponse::Ok().json(team_json(path.into_inner(), leader, &[11, leader]))
}

async fn remove_team_member(
    req: HttpRequest,
    state: web::Data<Backend>,
    path: web::Path<(i64, i64)>,
) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    let (team, user) = path.into_inner();
    state.record_call(&req, Value::Null);
    let members: Vec<i64> = [11, 12].into_iter().filter(|m| *m != user).collect();
    HttpResponse::Ok().json(team_json(team, 11, &members))
}

async fn project_dashboard(req: HttpRequest, state: web::Data<Backend>, path: web::Path<i64>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    HttpResponse::Ok().json(json!({
        "projeto": path.into_inner(),
        "total_tarefas": 4,
        "tarefas_concluidas": 1
    }))
}

async fn set_project_leader(
    req: HttpRequest,
    state: web::Data<Backend>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    state.record_call(&req, body.into_inner());
    HttpResponse::Ok().json(project_json(path.into_inner(), "Estação meteorológica"))
}

async fn project_teams(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    HttpResponse::Ok().json(json!([team_json(2, 11, &[11, 12])]))
}

async fn project_participants(req: HttpRequest, state: web::Data<Backend>) -> HttpResponse {
    if let Err(denied) = state.authorize(&req) {
        return denied;
    }
    HttpResponse::Ok().json(json!({
        "count": 3,
        "next": "http://elsewhere.invalid/api/projetos/1/participantes/?page=2",
        "results": [
            {"id": 11, "nome": "Lia", "username": "lia", "tipo_usuario": "estudante"},
            {"id": 12, "nome": "Téo", "username": "teo", "tipo_usuario": "estudante", "ativo": false}
        ]
    }))
}

pub struct FakeBackend {
    pub state: Arc<Backend>,
    pub config: ApiConfig,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Backend::default());
        let data = web::Data::from(state.clone());

        let server = HttpServer::new(move || {
            App::new().app_data(data.clone()).service(
                web::scope("/api")
                    .route("/token/", web::post().to(obtain_token))
                    .route("/token/refresh/", web::post().to(refresh_token))
                    .route("/usuarios/perfil/", web::get().to(profile))
                    .route("/usuarios/editar-perfil/", web::put().to(edit_profile))
                    .route("/usuarios/", web::get().to(list_users))
                    .route("/usuarios/{id}/", web::get().to(get_user))
                    .route("/equipes/", web::get().to(list_teams))
                    .route("/equipes/{id}/definir-lider/", web::patch().to(set_team_leader))
                    .route(
                        "/equipes/{id}/remover-membro/{user}/",
                        web::delete().to(remove_team_member),
                    )
                    .route("/projetos/{id}/dashboard/", web::get().to(project_dashboard))
                    .route("/projetos/{id}/definir-lider/", web::post().to(set_project_leader))
                    .route("/projetos/{id}/equipes/", web::get().to(project_teams))
                    .route("/projetos/{id}/participantes/", web::get().to(project_participants))
                    .route("/projetos/", web::get().to(list_projects))
                    .route("/projetos/", web::post().to(create_project))
                    .route("/projetos/publicos/", web::get().to(public_projects))
                    .route("/projetos/{id}/", web::delete().to(delete_project))
                    .route("/tarefas/", web::get().to(list_tasks))
                    .route("/tarefas/{id}/", web::patch().to(patch_task)),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("Failed to bind fake backend");

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        Self {
            state,
            config: ApiConfig::new(format!("http://{}/api/", addr)),
        }
    }

    /// A client whose session starts out with the given stored tokens.
    pub fn client_with_tokens(&self, access: &str, refresh: Option<&str>) -> ApiClient {
        let store = MemoryStore::new();
        store.set("access_token", access).unwrap();
        if let Some(refresh) = refresh {
            store.set("refresh_token", refresh).unwrap();
        }
        ApiClient::new(self.config.clone(), SessionManager::new(Arc::new(store)))
    }

    pub fn anonymous_client(&self) -> ApiClient {
        ApiClient::new(self.config.clone(), SessionManager::in_memory())
    }
}
