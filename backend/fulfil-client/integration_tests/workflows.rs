use crate::support::client_for;

use fulfil_client::{AsyncResult, FulfilError, TaskState};

use serde_json::{Map, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn given_report_when_executed_then_objects_and_data_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/report/account.invoice"))
        .and(body_json(json!({"objects": [1, 2], "data": {}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["pdf", "JVBERi0=", false, "Invoice"])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client
        .report("account.invoice")
        .execute(&[1, 2], Map::new(), &Map::new())
        .await
        .unwrap();

    assert_eq!(result[0], "pdf");
}

#[tokio::test]
async fn given_interactive_report_when_executed_then_params_wrapped_in_list() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/report.sales/execute"))
        .and(body_json(json!([{"start_date": "2024-01-01"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut params = Map::new();
    params.insert(String::from("start_date"), json!("2024-01-01"));

    let result = client
        .interactive_report("report.sales")
        .execute(params, &Map::new())
        .await
        .unwrap();

    assert_eq!(result["rows"], json!([]));
}

// ============================================================================
// Wizards
// ============================================================================

/// **VALUE**: Verifies a wizard session walks from its start state through a view to
/// the end state, carrying view defaults forward.
///
/// **BUG THIS CATCHES**: Would catch view defaults being dropped, so the second step
/// submits an empty form, or the session never reaching its end state.
#[tokio::test]
async fn given_wizard_with_one_view_when_driven_then_defaults_carried_to_next_step() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/wizard/stock.split/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([7, "start", "end"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/wizard/stock.split/execute"))
        .and(body_json(json!([7, {}, "start"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "view": {"state": "split", "defaults": {"quantity": 1}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/wizard/stock.split/execute"))
        .and(body_json(json!([7, {"split": {"quantity": 1}}, "split"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"actions": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/wizard/stock.split/delete"))
        .and(body_json(json!([7])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let mut session = client.wizard("stock.split").start().await.unwrap();
    assert!(!session.is_finished());
    assert_eq!(session.data()["split"]["quantity"], json!(1));
    session.execute("split", &Map::new()).await.unwrap();

    // THEN
    assert!(session.is_finished());
    assert_eq!(session.last_result(), &json!({"actions": []}));
    assert_eq!(session.execute("end", &Map::new()).await.unwrap(), json!(null));
    session.finish().await.unwrap();
}

// ============================================================================
// Async results
// ============================================================================

/// **VALUE**: Verifies a finished task is polled once and then served from memory.
///
/// **BUG THIS CATCHES**: Would catch every `ready()` call hitting the server even
/// after the task left the pending states.
#[tokio::test]
async fn given_successful_task_when_polled_twice_then_one_request() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/async-result"))
        .and(body_json(json!({"tasks": [["t-1", "tok"]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [{"state": "SUCCESS", "result": 42}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut task = AsyncResult::new("t-1", "tok");

    // WHEN
    let ready = task.ready(&client).await.unwrap();
    let failed = task.failed(&client).await.unwrap();

    // THEN
    assert!(ready);
    assert!(!failed);
    assert_eq!(task.result(), Some(&json!(42)));
}

#[tokio::test]
async fn given_failed_task_when_polled_then_error_and_failure_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/async-result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [{"error": "division by zero"}]
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut task = AsyncResult::new("t-2", "tok");

    let result = task.refresh_if_needed(&client).await;

    assert!(matches!(result, Err(FulfilError::AsyncResult { .. })));
    assert_eq!(task.state(), TaskState::Failure);
}

#[tokio::test]
async fn given_missing_task_when_polled_then_async_result_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/async-result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": []})))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut task = AsyncResult::new("t-3", "tok");

    let result = task.ready(&client).await;

    assert_eq!(result.unwrap_err().error_category(), "async_result");
    assert_eq!(task.state(), TaskState::Pending);
}
