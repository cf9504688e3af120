//! Client for the CrewAI Studio orchestration service.
//!
//! Provides uniform HTTP access with typed failures, resource
//! operations for agents, tasks, crews and tools, and the
//! submit-and-wait operation for crew runs.

pub mod api_client;
pub mod errors;
pub mod method;
pub mod polling;
pub mod schema;

#[cfg(test)]
pub(crate) mod mock_studio;

pub use api_client::StudioClient;
pub use errors::{ApiResult, OrchestrationApiError};
pub use method::HttpMethod;
pub use polling::PollingConfig;
pub use schema::ApiSchema;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Map};

    use super::mock_studio::MockStudio;
    use super::*;
    use crate::config::StudioConfig;
    use crate::types::{AgentSpec, CrewSpec, ResourceId, RunStatus, TaskSpec};

    fn client_for(studio: &MockStudio) -> StudioClient {
        StudioClient::new(studio.config()).unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_method_fails_before_network() {
        // Nothing listens on port 9; any network attempt would be a Transport error.
        let client = StudioClient::new(StudioConfig::new("http://127.0.0.1:9")).unwrap();
        for verb in ["PATCH", "HEAD", "OPTIONS"] {
            let err = client.request(verb, "/agents", None).await.unwrap_err();
            assert!(
                matches!(err, OrchestrationApiError::UnsupportedMethod { .. }),
                "{verb}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_unsupported_method_makes_no_request() {
        let studio = MockStudio::start().await;
        let client = client_for(&studio);
        assert!(client.request("PATCH", "/agents", None).await.is_err());
        assert_eq!(studio.request_count(), 0);
    }

    #[tokio::test]
    async fn test_non_2xx_keeps_response_body() {
        let studio = MockStudio::start().await;
        let client = client_for(&studio);

        let err = client.request("GET", "/teapot", None).await.unwrap_err();
        assert_eq!(err.status(), Some(418));
        assert_eq!(err.response_body(), Some(r#"{"detail":"short and stout"}"#));

        let err = client.request("GET", "/nowhere", None).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped() {
        let client = StudioClient::new(
            StudioConfig::new("http://127.0.0.1:9").with_request_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = client.request("GET", "/", None).await.unwrap_err();
        assert!(matches!(err, OrchestrationApiError::Transport { .. }), "{err:?}");
        assert_eq!(err.response_body(), None);
    }

    #[tokio::test]
    async fn test_check_status() {
        let studio = MockStudio::start().await;
        let status = client_for(&studio).check_status().await.unwrap();
        assert_eq!(status["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_normalizes_wrapped_and_bare() {
        let studio = MockStudio::start().await;
        let client = client_for(&studio);
        client
            .create_agent(&AgentSpec::new("Macro", "Economist", "Explain", "Veteran"))
            .await
            .unwrap();
        client
            .create_agent(&AgentSpec::new("Crypto", "Analyst", "Dig", "Miner"))
            .await
            .unwrap();

        let bare = client.list_agents().await.unwrap();
        studio.wrap_lists(true);
        let wrapped = client.list_agents().await.unwrap();

        let ids = |agents: &[crate::types::Agent]| agents.iter().map(|a| a.id.clone()).collect::<Vec<_>>();
        assert_eq!(bare.len(), 2);
        assert_eq!(ids(&bare), ids(&wrapped));
        assert_eq!(wrapped[1].role, "Analyst");
    }

    #[tokio::test]
    async fn test_list_tolerates_null_fields() {
        let studio = MockStudio::start().await;
        studio.seed(
            "agents",
            vec![
                json!({"id": "A1", "name": "Macro", "role": null, "goal": null, "allow_delegation": null}),
                json!({"agent_id": 2, "role": "Editor", "backstory": null, "tools": null}),
            ],
        );
        studio.seed("crews", vec![json!({"id": "C1", "name": null, "agent_ids": null, "verbose": null})]);
        let client = client_for(&studio);

        let agents = client.list_agents().await.unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].role, "");
        assert_eq!(agents[0].label(), "Macro");
        assert_eq!(agents[1].id, Some(ResourceId::Numeric(2)));
        assert!(agents[1].tools.is_empty());

        let crews = client.list_crews().await.unwrap();
        assert_eq!(crews[0].name, "");
        assert!(crews[0].agent_ids.is_empty());
        assert_eq!(crews[0].verbose, None);
    }

    #[tokio::test]
    async fn test_create_and_delete_resources() {
        let studio = MockStudio::start().await;
        let client = client_for(&studio);

        let agent = client
            .create_agent(&AgentSpec::new("Macro", "Economist", "Explain", "Veteran").with_llm("openai:gpt-4"))
            .await
            .unwrap();
        assert_eq!(agent.id, Some(ResourceId::from("A1")));
        assert_eq!(agent.llm.as_deref(), Some("openai:gpt-4"));

        let task = client
            .create_task(&TaskSpec::new("Analyse", "A memo", ResourceId::from("A1")))
            .await
            .unwrap();
        assert_eq!(task.id, Some(ResourceId::from("T1")));
        assert_eq!(task.agent_id, Some(ResourceId::from("A1")));
        assert_eq!(client.list_tasks().await.unwrap().len(), 1);

        client.delete_agent(&ResourceId::from("A1")).await.unwrap();
        assert!(client.list_agents().await.unwrap().is_empty());

        let err = client.delete_agent(&ResourceId::from("A1")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_update_crew_replaces_associations() {
        let studio = MockStudio::start().await;
        studio.persist_crew_links(false);
        let client = client_for(&studio);

        let spec = CrewSpec::new("Desk", "Newsroom")
            .with_members(vec![ResourceId::from("A1")], vec![ResourceId::from("T1")]);
        let crew = client.create_crew(&spec).await.unwrap();
        let crew_id = crew.id.clone().unwrap();
        assert!(client.get_crew(&crew_id).await.unwrap().agent_ids.is_empty());

        let updated = client.update_crew(&crew_id, &spec).await.unwrap();
        assert_eq!(updated.agent_ids, vec![ResourceId::from("A1")]);
        let fetched = client.get_crew(&crew_id).await.unwrap();
        assert!(fetched.has_members(&spec.agent_ids, &spec.task_ids));
    }

    #[tokio::test]
    async fn test_list_tools() {
        let studio = MockStudio::start().await;
        let tools = client_for(&studio).list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search", "file_search"]);
    }

    #[tokio::test]
    async fn test_submit_and_await_stops_at_completed() {
        let studio = MockStudio::start().await;
        studio.script_run(vec![
            json!({"status": "pending"}),
            json!({"status": "completed", "result": {"results": {"T1": "hello"}}}),
            json!({"status": "pending"}),
        ]);
        let client = StudioClient::new(studio.config().with_poll_interval(Duration::from_millis(20))).unwrap();

        let result = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.polls, 2);
        assert_eq!(studio.status_polls(), 2);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(studio.status_polls(), 2, "no polling after a terminal state");
    }

    #[tokio::test]
    async fn test_submit_and_await_returns_failed_runs() {
        let studio = MockStudio::start().await;
        studio.script_run(vec![json!({"status": "error", "error": "context must be a list"})]);
        let client = StudioClient::new(studio.config().with_poll_interval(Duration::from_millis(10))).unwrap();

        let result = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("context must be a list"));
    }

    #[tokio::test]
    async fn test_submit_and_await_times_out_at_fixed_interval() {
        let studio = MockStudio::start().await;
        studio.script_run(vec![json!({"status": "pending"})]);
        // Scaled down from a 2 s interval and a 5 s budget.
        let client = StudioClient::new(studio.config().with_poll_interval(Duration::from_millis(200))).unwrap();

        let err = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "{err:?}");
        let polls = studio.status_polls();
        assert!((2..=3).contains(&polls), "polled {polls} times");
        match err {
            OrchestrationApiError::Timeout { polls: reported, .. } => assert_eq!(reported as usize, polls),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let studio = MockStudio::start().await;
        studio.script_run(vec![
            json!({"state": "weird"}),
            json!({"status": "paused"}),
            json!({"status": "success", "result": {"output": "done"}}),
        ]);
        let client = StudioClient::new(studio.config().with_poll_interval(Duration::from_millis(10))).unwrap();
        let result = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.output.as_deref(), Some("done"));
        assert_eq!(result.polls, 3);
    }

    #[tokio::test]
    async fn test_transient_status_failures_are_absorbed() {
        let studio = MockStudio::start().await;
        studio.fail_status_checks(2);
        studio.script_run(vec![json!({"status": "completed", "results": {"T1": "ok"}})]);
        let client = StudioClient::new(
            studio
                .config()
                .with_poll_interval(Duration::from_millis(10))
                .with_max_poll_failures(2),
        )
        .unwrap();

        let result = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.section("T1"), Some("ok"));
        assert_eq!(result.polls, 3);
    }

    #[tokio::test]
    async fn test_consecutive_status_failures_are_capped() {
        let studio = MockStudio::start().await;
        studio.fail_status_checks(10);
        studio.script_run(vec![json!({"status": "completed"})]);
        let client = StudioClient::new(
            studio
                .config()
                .with_poll_interval(Duration::from_millis(10))
                .with_max_poll_failures(2),
        )
        .unwrap();

        let err = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            OrchestrationApiError::PollingFailed { failures, last, .. } => {
                assert_eq!(failures, 3);
                assert_eq!(last.status(), Some(503));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(studio.status_polls(), 3);
    }

    #[tokio::test]
    async fn test_submit_without_job_id_is_missing_field() {
        let studio = MockStudio::start().await;
        studio.omit_job_id(true);
        let client = client_for(&studio);
        let err = client
            .submit_and_await(&ResourceId::from("C1"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationApiError::MissingField { ref field, .. } if field == "id"), "{err:?}");
    }

    #[tokio::test]
    async fn test_execute_schema_round_trip() {
        let studio = MockStudio::start().await;
        studio.script_run(vec![
            json!({"status": "running"}),
            json!({"status": "completed", "result": {"results": {"draft": "text"}}}),
        ]);
        let client = StudioClient::new(
            studio
                .config()
                .with_schema(ApiSchema::Execute)
                .with_poll_interval(Duration::from_millis(10)),
        )
        .unwrap();

        let mut inputs = Map::new();
        inputs.insert("topic".to_string(), json!("rates"));
        let result = client
            .submit_and_await_with_inputs(&ResourceId::Numeric(7), &inputs, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.section("draft"), Some("text"));
        assert_eq!(studio.last_submit()["command"], "run_crew");
        assert_eq!(studio.last_submit()["crew_id"], 7);
    }

    #[tokio::test]
    async fn test_end_to_end_crew_run() {
        let studio = MockStudio::start().await;
        studio.script_run(vec![
            json!({"status": "pending"}),
            json!({"status": "completed", "result": {"results": {"T1": "hello"}}}),
        ]);
        let client = StudioClient::new(studio.config().with_poll_interval(Duration::from_millis(10))).unwrap();

        let agent = client
            .create_agent(&AgentSpec::new("Writer", "Writer", "Write", "Writes"))
            .await
            .unwrap();
        let agent_id = agent.id.unwrap();
        assert_eq!(agent_id, ResourceId::from("A1"));

        let task = client
            .create_task(&TaskSpec::new("Greet", "A greeting", agent_id.clone()))
            .await
            .unwrap();
        let task_id = task.id.unwrap();
        assert_eq!(task_id, ResourceId::from("T1"));

        let crew = client
            .create_crew(&CrewSpec::new("Greeters", "Says hello").with_members(vec![agent_id], vec![task_id]))
            .await
            .unwrap();
        let crew_id = crew.id.unwrap();
        assert_eq!(crew_id, ResourceId::from("C1"));

        let result = client.submit_and_await(&crew_id, Duration::from_secs(30)).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.section("T1"), Some("hello"));
        assert_eq!(studio.last_submit()["crew_id"], "C1");
    }
}
