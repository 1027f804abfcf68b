use imagegen::{
    ClientConfig, FailureKind, HttpImageClient, OrchestratorState, RequestOrchestrator,
    TriggerOutcome,
};
use mockito::Matcher;
use serde_json::json;

const PATH: &str = "/api/generate-image";

fn orchestrator_for(server: &mockito::ServerGuard) -> RequestOrchestrator<HttpImageClient> {
    let client =
        HttpImageClient::new(ClientConfig::new().with_endpoint(format!("{}{}", server.url(), PATH)))
            .unwrap();
    RequestOrchestrator::new(client)
}

async fn mock_prompt(
    server: &mut mockito::ServerGuard,
    prompt: &str,
    status: usize,
    body: &str,
) -> mockito::Mock {
    server
        .mock("POST", PATH)
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "prompt": prompt })))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn bicycles_accumulate_in_history() {
    let mut server = mockito::Server::new_async().await;
    let red = mock_prompt(&mut server, "a red bicycle", 200, r#"{"message":"https://cdn/a1.png"}"#).await;
    let blue =
        mock_prompt(&mut server, "a blue bicycle", 200, r#"{"message":"https://cdn/a2.png"}"#).await;
    let orchestrator = orchestrator_for(&server);

    assert!(orchestrator.trigger("a red bicycle").await.is_completed());
    let state = orchestrator.get_state();
    assert_eq!(state.latest_image_url.as_deref(), Some("https://cdn/a1.png"));
    assert_eq!(state.history.len(), 1);

    assert!(orchestrator.trigger("a blue bicycle").await.is_completed());
    let state = orchestrator.get_state();
    let entries: Vec<(&str, &str)> = state
        .history
        .iter()
        .map(|r| (r.image_url(), r.prompt()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("https://cdn/a1.png", "a red bicycle"),
            ("https://cdn/a2.png", "a blue bicycle"),
        ]
    );
    assert!(!state.is_loading);
    assert_eq!(state.error, None);

    red.assert_async().await;
    blue.assert_async().await;
}

#[tokio::test]
async fn server_error_keeps_previous_generation() {
    let mut server = mockito::Server::new_async().await;
    let _cat = mock_prompt(&mut server, "cat", 200, r#"{"message":"https://x/img.png"}"#).await;
    let _dog = mock_prompt(&mut server, "dog", 500, r#"{"error":"model overloaded"}"#).await;
    let orchestrator = orchestrator_for(&server);

    orchestrator.trigger("cat").await;
    let before = orchestrator.get_state();

    let outcome = orchestrator.trigger("dog").await;
    assert!(matches!(
        outcome,
        TriggerOutcome::Failed {
            kind: FailureKind::ResponseStatus,
            ..
        }
    ));

    let state = orchestrator.get_state();
    assert!(!state.is_loading);
    assert!(state.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert_eq!(state.history, before.history);
    assert_eq!(state.latest_image_url.as_deref(), Some("https://x/img.png"));
}

#[tokio::test]
async fn blank_prompt_never_reaches_the_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let never = server
        .mock("POST", PATH)
        .expect(0)
        .create_async()
        .await;
    let orchestrator = orchestrator_for(&server);

    assert_eq!(orchestrator.trigger("   ").await, TriggerOutcome::Skipped);
    assert_eq!(orchestrator.get_state(), OrchestratorState::default());
    never.assert_async().await;
}
