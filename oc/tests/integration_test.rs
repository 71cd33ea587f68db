//! Integration tests for orchconsole
//!
//! These tests drive the controller and HTTP client against a mock
//! orchestrator endpoint.

use std::sync::Arc;
use std::time::Duration;

use orchconsole::config::OrchestratorConfig;
use orchconsole::lifecycle::{LifecycleController, RecordState, RecordUpdate, SubmitRejected};
use orchconsole::session::{ApplyOutcome, SessionLog, SessionToken};
use orchconsole::transport::{FailureKind, OrchestratorClient, PolicyStatus, RequestEnvelope, Transport};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller_for(server: &MockServer, timeout_ms: u64) -> LifecycleController {
    let config = OrchestratorConfig {
        base_url: server.uri(),
        endpoint_path: "/orchestrate".to_string(),
        timeout_ms,
    };
    LifecycleController::from_config(&config).expect("Failed to create controller")
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_a_ping_pong() {
    let server = MockServer::start().await;
    let token = SessionToken::from("session-a");

    Mock::given(method("POST"))
        .and(path("/orchestrate"))
        .and(body_json(json!({"session_id": "session-a", "message": "ping"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "r1",
            "result": {
                "agent_name": "echo",
                "output": "pong",
                "confidence": 0.9,
                "metadata": {}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server, 30_000);
    let record = controller.submit(&token, "ping").unwrap().settle().await;

    assert_eq!(record.state(), RecordState::Succeeded);
    assert!(record.error().is_none());
    let response = record.response().expect("response should be set");
    assert_eq!(response.primary_text, "pong");
    assert_eq!(response.metadata.confidence, Some(0.9));
    assert_eq!(response.metadata.tier, "default");
    assert_eq!(response.metadata.cost_estimate, "N/A");
    assert_eq!(response.metadata.routing_reason, "N/A");
    assert_eq!(response.metadata.policy_status, PolicyStatus::Pass);
}

#[tokio::test]
async fn test_scenario_b_server_error_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orchestrate"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "overload"})))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server, 30_000);
    let record = controller
        .submit(&SessionToken::from("s"), "ping")
        .unwrap()
        .settle()
        .await;

    assert_eq!(record.state(), RecordState::Failed);
    assert!(record.response().is_none());
    let error = record.error().unwrap();
    assert_eq!(error.kind, FailureKind::ServerError);
    assert_eq!(error.message, "overload");
    assert_eq!(error.status_code, Some(500));
}

#[tokio::test]
async fn test_scenario_c_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orchestrate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "too late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let controller = controller_for(&server, 50);
    let record = controller
        .submit(&SessionToken::from("s"), "ping")
        .unwrap()
        .settle()
        .await;

    assert_eq!(record.state(), RecordState::Failed);
    assert_eq!(record.error().unwrap().kind, FailureKind::Timeout);
    assert_eq!(record.error().unwrap().message, "Request timed out. Please try again.");

    let duration = record.duration().unwrap();
    assert!(duration >= Duration::from_millis(50), "duration {:?}", duration);
    assert!(duration < Duration::from_millis(1000), "duration {:?}", duration);
    assert!(!controller.is_in_flight());
}

#[tokio::test]
async fn test_scenario_d_blank_input_is_noop() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller_for(&server, 30_000);
    let mut log = SessionLog::new();
    let (tx, mut rx) = mpsc::channel(4);

    let result = controller.submit_streaming(log.token(), "   \n", tx).await;

    assert_eq!(result.err(), Some(SubmitRejected::EmptyInput));
    while let Some(update) = rx.recv().await {
        log.apply(update);
    }
    assert!(log.is_empty());
}

// =============================================================================
// Transport classification
// =============================================================================

#[tokio::test]
async fn test_error_status_without_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = OrchestratorClient::new(format!("{}/orchestrate", server.uri())).unwrap();
    let err = client
        .send(&RequestEnvelope::new("s", "ping"), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::ServerError);
    assert_eq!(err.user_message(), "Request failed with status 502");
}

#[tokio::test]
async fn test_success_with_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let controller = controller_for(&server, 30_000);
    let record = controller
        .submit(&SessionToken::from("s"), "ping")
        .unwrap()
        .settle()
        .await;

    assert_eq!(record.state(), RecordState::Failed);
    assert_eq!(record.error().unwrap().kind, FailureKind::MalformedResponse);
    assert!(!record.error().unwrap().message.is_empty());
}

#[tokio::test]
async fn test_success_with_unknown_shape_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "pong"})))
        .mount(&server)
        .await;

    let client = OrchestratorClient::new(format!("{}/orchestrate", server.uri())).unwrap();
    let err = client
        .send(&RequestEnvelope::new("s", "ping"), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn test_connection_refused_is_network_unreachable() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = OrchestratorConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        ..OrchestratorConfig::default()
    };
    let controller = LifecycleController::from_config(&config).unwrap();

    let record = controller
        .submit(&SessionToken::from("s"), "ping")
        .unwrap()
        .settle()
        .await;

    assert_eq!(record.state(), RecordState::Failed);
    assert_eq!(record.error().unwrap().kind, FailureKind::NetworkUnreachable);
    assert_eq!(
        record.error().unwrap().message,
        "Unable to connect to server. Please check your connection."
    );
}

#[tokio::test]
async fn test_flat_and_nested_shapes_over_http_normalize_identically() {
    let nested = MockServer::start().await;
    let flat = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "r7",
            "result": {
                "agent_name": "sql",
                "output": "42 rows",
                "confidence": 0.6,
                "metadata": {
                    "routing": {"reason": "structured query", "policy_influenced": false},
                    "latency_ms": 88,
                    "sla_tier": "standard"
                }
            }
        })))
        .mount(&nested)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "execution_id": "r7",
            "status": "success",
            "result": {"output": "42 rows"},
            "metadata": {
                "agent": "sql",
                "routing_reason": "structured query",
                "policy_status": "PASS",
                "latency_ms": 88,
                "sla_tier": "standard",
                "confidence": 0.6
            }
        })))
        .mount(&flat)
        .await;

    let request = RequestEnvelope::new("s", "count rows");
    let a = OrchestratorClient::new(format!("{}/orchestrate", nested.uri()))
        .unwrap()
        .send(&request, Duration::from_secs(5))
        .await
        .unwrap();
    let b = OrchestratorClient::new(format!("{}/orchestrate", flat.uri()))
        .unwrap()
        .send(&request, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(a, b);
}

// =============================================================================
// Session flow
// =============================================================================

#[tokio::test]
async fn test_streaming_updates_fold_into_session_log() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_id": "x", "response": "hello"})))
        .mount(&server)
        .await;

    let controller = Arc::new(controller_for(&server, 30_000));
    let mut log = SessionLog::new();

    for message in ["one", "two", "three"] {
        let (tx, mut rx) = mpsc::channel(4);
        let token = log.token().clone();
        let ctrl = controller.clone();
        let handle = tokio::spawn(async move { ctrl.submit_streaming(&token, message, tx).await });

        let mut outcomes = Vec::new();
        while let Some(update) = rx.recv().await {
            if let RecordUpdate::Pending(_) = &update {
                assert!(log.records().iter().all(|r| !r.is_pending()));
            }
            outcomes.push(log.apply(update));
        }
        handle.await.unwrap().unwrap();

        assert_eq!(outcomes, vec![ApplyOutcome::Appended, ApplyOutcome::Settled]);
    }

    let messages: Vec<&str> = log.records().iter().map(|r| r.request().message.as_str()).collect();
    assert_eq!(messages, vec!["one", "two", "three"]);
    assert!(log.records().iter().all(|r| r.state() == RecordState::Succeeded));
    assert!(!log.has_pending());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn test_failures_render_inline_and_session_continues() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"session_id": "s", "message": "bad"})))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({"session_id": "s", "message": "good"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "fine"})))
        .mount(&server)
        .await;

    let controller = controller_for(&server, 30_000);
    let mut log = SessionLog::with_token(SessionToken::from("s"));

    for message in ["bad", "good"] {
        let submission = controller.submit(log.token(), message).unwrap();
        log.apply(RecordUpdate::Pending(submission.pending().clone()));
        let settled = submission.settle().await;
        log.apply(RecordUpdate::Settled(settled));
    }

    assert_eq!(log.records()[0].state(), RecordState::Failed);
    assert_eq!(log.records()[0].error().unwrap().message, "Request failed with status 503");
    assert_eq!(log.records()[1].state(), RecordState::Succeeded);
    assert_eq!(log.records()[1].response().unwrap().primary_text, "fine");
}
