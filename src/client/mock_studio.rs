//! In-process stand-in for the studio API, used by tests.
//!
//! Serves the `runs` and `execute` generations side by side. Ids are
//! handed out as `A1`, `T1`, `C1`, `R1`, ... Run status checks replay a
//! scripted sequence of payloads; the last entry repeats.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::config::StudioConfig;

type Shared = Arc<Mutex<StudioState>>;
type Reply = (StatusCode, Json<Value>);

#[derive(Debug, Clone, Copy)]
enum Kind {
    Agents,
    Tasks,
    Crews,
}

impl Kind {
    fn key(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Tasks => "tasks",
            Self::Crews => "crews",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Agents => "A",
            Self::Tasks => "T",
            Self::Crews => "C",
        }
    }
}

struct StudioState {
    agents: Vec<Value>,
    tasks: Vec<Value>,
    crews: Vec<Value>,
    sequence: [u32; 4],
    run_script: Vec<Value>,
    script_pos: usize,
    status_polls: usize,
    requests: usize,
    failing_status_checks: usize,
    wrap_lists: bool,
    persist_crew_links: bool,
    omit_job_id: bool,
    last_submit: Value,
}

impl StudioState {
    fn new() -> Self {
        Self {
            agents: Vec::new(),
            tasks: Vec::new(),
            crews: Vec::new(),
            sequence: [0; 4],
            run_script: Vec::new(),
            script_pos: 0,
            status_polls: 0,
            requests: 0,
            failing_status_checks: 0,
            wrap_lists: false,
            persist_crew_links: true,
            omit_job_id: false,
            last_submit: Value::Null,
        }
    }

    fn store(&mut self, kind: Kind) -> &mut Vec<Value> {
        match kind {
            Kind::Agents => &mut self.agents,
            Kind::Tasks => &mut self.tasks,
            Kind::Crews => &mut self.crews,
        }
    }

    fn next_id(&mut self, slot: usize, prefix: &str) -> String {
        self.sequence[slot] += 1;
        format!("{}{}", prefix, self.sequence[slot])
    }

    fn next_status(&mut self, job_id: &str) -> Reply {
        self.status_polls += 1;
        if self.failing_status_checks > 0 {
            self.failing_status_checks -= 1;
            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "busy"})));
        }
        let mut payload = match self.run_script.len() {
            0 => json!({"status": "pending"}),
            len => self.run_script[self.script_pos.min(len - 1)].clone(),
        };
        self.script_pos += 1;
        if payload.is_object() {
            payload["id"] = Value::String(job_id.to_string());
        }
        (StatusCode::OK, Json(payload))
    }
}

/// Handle to a running mock studio. The server stops on drop.
pub(crate) struct MockStudio {
    base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockStudio {
    pub(crate) async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(StudioState::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock studio");
        let addr = listener.local_addr().expect("mock studio address");
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub(crate) fn config(&self) -> StudioConfig {
        StudioConfig::new(self.base_url.clone())
    }

    pub(crate) fn script_run(&self, payloads: Vec<Value>) {
        let mut state = self.state.lock();
        state.run_script = payloads;
        state.script_pos = 0;
    }

    pub(crate) fn fail_status_checks(&self, count: usize) {
        self.state.lock().failing_status_checks = count;
    }

    pub(crate) fn wrap_lists(&self, wrap: bool) {
        self.state.lock().wrap_lists = wrap;
    }

    pub(crate) fn persist_crew_links(&self, persist: bool) {
        self.state.lock().persist_crew_links = persist;
    }

    pub(crate) fn omit_job_id(&self, omit: bool) {
        self.state.lock().omit_job_id = omit;
    }

    /// Store raw records as if the studio had created them.
    pub(crate) fn seed(&self, kind: &str, records: Vec<Value>) {
        let mut state = self.state.lock();
        let target = match kind {
            "agents" => &mut state.agents,
            "tasks" => &mut state.tasks,
            _ => &mut state.crews,
        };
        target.extend(records);
    }

    pub(crate) fn status_polls(&self) -> usize {
        self.state.lock().status_polls
    }

    pub(crate) fn request_count(&self) -> usize {
        self.state.lock().requests
    }

    pub(crate) fn last_submit(&self) -> Value {
        self.state.lock().last_submit.clone()
    }

    pub(crate) fn stored(&self, kind: &str) -> Vec<Value> {
        let state = self.state.lock();
        match kind {
            "agents" => state.agents.clone(),
            "tasks" => state.tasks.clone(),
            _ => state.crews.clone(),
        }
    }
}

impl Drop for MockStudio {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/teapot", get(teapot))
        .route("/agents", get(list_agents).post(create_agent))
        .route("/agents/:id", axum::routing::delete(delete_agent))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/crews", get(list_crews).post(create_crew))
        .route("/crews/:id", get(get_crew).put(update_crew).delete(delete_crew))
        .route("/tools", get(list_tools))
        .route("/runs", post(submit_run))
        .route("/runs/:id", get(run_status))
        .route("/execute", post(execute))
        .route("/status/:id", get(run_status))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}

async fn count_requests(State(state): State<Shared>, req: Request, next: Next) -> Response {
    state.lock().requests += 1;
    next.run(req).await
}

async fn root() -> Json<Value> {
    Json(json!({"status": "ok", "service": "mock-studio"}))
}

async fn teapot() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, r#"{"detail":"short and stout"}"#)
}

fn list(state: &Shared, kind: Kind) -> Reply {
    let mut state = state.lock();
    let wrap = state.wrap_lists;
    let items = Value::Array(state.store(kind).clone());
    if wrap {
        (StatusCode::OK, Json(json!({ kind.key(): items })))
    } else {
        (StatusCode::OK, Json(items))
    }
}

fn create(state: &Shared, kind: Kind, mut body: Value) -> Reply {
    let mut state = state.lock();
    let id = state.next_id(kind as usize, kind.prefix());
    body["id"] = Value::String(id);
    if matches!(kind, Kind::Crews) && !state.persist_crew_links {
        body["agent_ids"] = json!([]);
        body["task_ids"] = json!([]);
    }
    state.store(kind).push(body.clone());
    (StatusCode::OK, Json(body))
}

fn position(items: &[Value], id: &str) -> Option<usize> {
    items.iter().position(|item| item["id"] == id)
}

fn not_found(id: &str) -> Reply {
    (StatusCode::NOT_FOUND, Json(json!({"detail": format!("{} not found", id)})))
}

fn remove(state: &Shared, kind: Kind, id: &str) -> Reply {
    let mut state = state.lock();
    let items = state.store(kind);
    match position(items, id) {
        Some(index) => {
            items.remove(index);
            (StatusCode::OK, Json(json!({"deleted": id})))
        }
        None => not_found(id),
    }
}

async fn list_agents(State(state): State<Shared>) -> Reply {
    list(&state, Kind::Agents)
}

async fn create_agent(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    create(&state, Kind::Agents, body)
}

async fn delete_agent(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    remove(&state, Kind::Agents, &id)
}

async fn list_tasks(State(state): State<Shared>) -> Reply {
    list(&state, Kind::Tasks)
}

async fn create_task(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    create(&state, Kind::Tasks, body)
}

async fn list_crews(State(state): State<Shared>) -> Reply {
    list(&state, Kind::Crews)
}

async fn create_crew(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    create(&state, Kind::Crews, body)
}

async fn get_crew(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let state = state.lock();
    match position(&state.crews, &id) {
        Some(index) => (StatusCode::OK, Json(state.crews[index].clone())),
        None => not_found(&id),
    }
}

async fn update_crew(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock();
    let Some(index) = position(&state.crews, &id) else {
        return not_found(&id);
    };
    let crew = &mut state.crews[index];
    if let (Some(target), Some(fields)) = (crew.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    (StatusCode::OK, Json(crew.clone()))
}

async fn delete_crew(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    remove(&state, Kind::Crews, &id)
}

async fn list_tools() -> Json<Value> {
    Json(json!([
        {"name": "search", "description": "Web search"},
        {"name": "file_search", "description": "Search uploaded files"}
    ]))
}

async fn submit_run(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock();
    state.last_submit = body;
    if state.omit_job_id {
        return (StatusCode::OK, Json(json!({"status": "pending"})));
    }
    let id = state.next_id(3, "R");
    (StatusCode::OK, Json(json!({"id": id, "status": "pending"})))
}

async fn execute(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock();
    state.last_submit = body;
    if state.omit_job_id {
        return (StatusCode::OK, Json(json!({"message": "accepted"})));
    }
    let id = state.next_id(3, "job-");
    (StatusCode::OK, Json(json!({"task_id": id})))
}

async fn run_status(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    state.lock().next_status(&id)
}
