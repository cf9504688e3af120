//! HTTP client for the CrewAI Studio API.
//!
//! [`StudioClient::request`] is the only place that touches the network;
//! every resource operation is a thin wrapper around it.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};

use super::errors::{ApiResult, OrchestrationApiError};
use super::method::HttpMethod;
use super::schema::ApiSchema;
use crate::config::StudioConfig;
use crate::types::{
    normalize_list, Agent, AgentSpec, Crew, CrewSpec, Resource, ResourceId, Task, TaskSpec, Tool,
};

/// Client for one studio deployment.
#[derive(Debug, Clone)]
pub struct StudioClient {
    config: StudioConfig,
    http: reqwest::Client,
}

impl StudioClient {
    /// Create a client for the deployment described by `config`.
    pub fn new(config: StudioConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|source| OrchestrationApiError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn schema(&self) -> ApiSchema {
        self.config.schema
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Issue a request with a verb given as text.
    ///
    /// Verbs other than GET, POST, PUT and DELETE are rejected before
    /// any network activity.
    pub async fn request(&self, method: &str, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        let method: HttpMethod = method.parse()?;
        self.send(method, path, body).await
    }

    /// Issue a request and decode the JSON response.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    pub async fn send(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        let url = self.url(path);
        tracing::debug!(method = %method, url = %url, "studio request");

        let mut req = self
            .http
            .request(method.to_reqwest(), &url)
            .header(ACCEPT, "application/json");
        if method.takes_body() {
            req = req
                .header(CONTENT_TYPE, "application/json")
                .json(body.unwrap_or(&Value::Object(Map::new())));
        }

        let resp = req.send().await.map_err(|source| OrchestrationApiError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|source| OrchestrationApiError::Transport {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %url, "studio request rejected");
            return Err(OrchestrationApiError::Status {
                url,
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|source| OrchestrationApiError::Decode { url, source })
    }

    async fn list<T: Resource>(&self) -> ApiResult<Vec<T>> {
        let path = format!("/{}", T::LIST_KEY);
        let response = self.send(HttpMethod::Get, &path, None).await?;
        normalize_list(response, T::LIST_KEY)
            .into_iter()
            .map(|raw| decode::<T>(&path, raw))
            .collect()
    }

    async fn create<T: Resource>(&self, body: Value) -> ApiResult<T> {
        let path = format!("/{}", T::LIST_KEY);
        let response = self.send(HttpMethod::Post, &path, Some(&body)).await?;
        let created = decode::<T>(&path, response)?;
        if created.id().is_none() {
            return Err(OrchestrationApiError::missing_field(
                format!("create {}", T::KIND),
                T::ID_KEYS[0],
            ));
        }
        Ok(created)
    }

    async fn delete<T: Resource>(&self, id: &ResourceId) -> ApiResult<Value> {
        self.send(HttpMethod::Delete, &format!("/{}/{}", T::LIST_KEY, id), None)
            .await
    }

    /// Fetch the service root, used as a liveness check.
    pub async fn check_status(&self) -> ApiResult<Value> {
        self.send(HttpMethod::Get, "/", None).await
    }

    pub async fn list_agents(&self) -> ApiResult<Vec<Agent>> {
        self.list().await
    }

    pub async fn create_agent(&self, spec: &AgentSpec) -> ApiResult<Agent> {
        self.create(self.schema().agent_body(spec)).await
    }

    pub async fn delete_agent(&self, id: &ResourceId) -> ApiResult<Value> {
        self.delete::<Agent>(id).await
    }

    pub async fn list_tasks(&self) -> ApiResult<Vec<Task>> {
        self.list().await
    }

    pub async fn create_task(&self, spec: &TaskSpec) -> ApiResult<Task> {
        self.create(self.schema().task_body(spec)).await
    }

    pub async fn list_crews(&self) -> ApiResult<Vec<Crew>> {
        self.list().await
    }

    pub async fn get_crew(&self, id: &ResourceId) -> ApiResult<Crew> {
        let path = format!("/crews/{}", id);
        let response = self.send(HttpMethod::Get, &path, None).await?;
        decode(&path, response)
    }

    pub async fn create_crew(&self, spec: &CrewSpec) -> ApiResult<Crew> {
        self.create(self.schema().crew_body(spec)).await
    }

    /// Replace a crew's settings and associations with `PUT /crews/{id}`.
    pub async fn update_crew(&self, id: &ResourceId, spec: &CrewSpec) -> ApiResult<Crew> {
        let path = format!("/crews/{}", id);
        let body = self.schema().crew_body(spec);
        let response = self.send(HttpMethod::Put, &path, Some(&body)).await?;
        let mut crew: Crew = decode(&path, response)?;
        if crew.id.is_none() {
            crew.id = Some(id.clone());
        }
        Ok(crew)
    }

    pub async fn delete_crew(&self, id: &ResourceId) -> ApiResult<Value> {
        self.delete::<Crew>(id).await
    }

    pub async fn list_tools(&self) -> ApiResult<Vec<Tool>> {
        self.list().await
    }

    /// Start a run of `crew_id` and return the job id to poll.
    pub async fn submit_run(&self, crew_id: &ResourceId, inputs: &Map<String, Value>) -> ApiResult<ResourceId> {
        let schema = self.schema();
        let body = schema.submit_body(crew_id, inputs);
        let response = self.send(HttpMethod::Post, schema.submit_path(), Some(&body)).await?;
        ResourceId::from_keys(&response, &[schema.job_id_key()]).ok_or_else(|| {
            OrchestrationApiError::missing_field(format!("run crew {}", crew_id), schema.job_id_key())
        })
    }

    /// Fetch the raw status payload of a job.
    pub async fn run_status(&self, job_id: &ResourceId) -> ApiResult<Value> {
        self.send(HttpMethod::Get, &self.schema().status_path(job_id), None)
            .await
    }
}

fn decode<T: Resource>(path: &str, raw: Value) -> ApiResult<T> {
    T::from_json(raw).map_err(|source| OrchestrationApiError::Decode {
        url: path.to_string(),
        source,
    })
}
