use crate::support::{API_KEY, client_for};

use fulfil_client::{FulfilError, ModelApi};

use common::HttpStatusCode;

use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Raw requests and error mapping
// ============================================================================

/// **VALUE**: Verifies the raw entry point attaches auth, user agent and query.
///
/// **BUG THIS CATCHES**: Would catch `prepare_request` being skipped on the raw path,
/// sending unauthenticated requests.
#[tokio::test]
async fn given_raw_request_when_sent_then_auth_and_user_agent_attached() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/model/ir.model"))
        .and(header("x-api-key", API_KEY))
        .and(header("user-agent", fulfil_client::DEFAULT_USER_AGENT))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let result = client
        .request(
            Method::GET,
            "model/ir.model",
            &[(String::from("per_page"), String::from("1"))],
            None,
        )
        .await
        .unwrap();

    // THEN
    assert_eq!(result, json!([{"id": 1}]));
}

/// **VALUE**: Verifies a non-2xx status carries the code, the body and the sentry id.
///
/// **BUG THIS CATCHES**: Would catch the HTTP client's own error path being used,
/// which throws away the body.
#[tokio::test]
async fn given_server_error_when_called_then_status_error_with_sentry_id() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/sale.sale/confirm"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("X-Sentry-ID", "sentry-42")
                .set_body_string("Internal Server Error"),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let result = client.model("sale.sale").call("confirm", vec![json!([1])]).await;

    // THEN
    match result {
        Err(FulfilError::Server {
            status_code,
            sentry_id,
            ..
        }) => {
            assert_eq!(status_code, HttpStatusCode(500));
            assert_eq!(sentry_id.as_deref(), Some("sentry-42"));
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a 2xx with a broken body is a decoding error.
///
/// **BUG THIS CATCHES**: Would catch malformed bodies decoding to `null` and being
/// reported as an empty result.
#[tokio::test]
async fn given_malformed_success_body_when_called_then_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/model/product.product/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client.model("product.product").get(1).await;

    assert!(matches!(result, Err(FulfilError::Json { .. })));
}

#[tokio::test]
async fn given_connection_refused_when_called_then_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let result = client.model("product.product").get(1).await;

    match result {
        Err(error @ FulfilError::Http { .. }) => assert!(error.status_code().is_none()),
        other => panic!("expected Http error, got {other:?}"),
    }
}

// ============================================================================
// Session helpers
// ============================================================================

/// **VALUE**: Verifies login performs one call and returns session credentials.
///
/// **BUG THIS CATCHES**: Would catch login posting to the API root instead of the
/// host root, or storing the session on the client behind the caller's back.
#[tokio::test]
async fn given_valid_credentials_when_login_then_session_auth_returned() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_json(json!({
            "method": "common.db.login",
            "params": ["admin", "hunter2"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": [7, "sess-1"]})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let session = client.login("admin", "hunter2").await.unwrap();

    // THEN
    assert_eq!(session.login, "admin");
    assert_eq!(session.user_id, 7);
    assert_eq!(session.session.expose(), "sess-1");
    assert_eq!(client.auth().map(|a| a.kind()), Some("api_key"));
}

#[tokio::test]
async fn given_rejected_credentials_when_login_then_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": false})))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client.login("admin", "wrong").await;

    assert!(matches!(result, Err(FulfilError::Authentication { .. })));
}

/// **VALUE**: Verifies dead credentials read as `false`, not as an error.
///
/// **BUG THIS CATCHES**: Would catch 401s propagating out of `is_auth_alive`, which
/// callers use precisely to detect them.
#[tokio::test]
async fn given_expired_credentials_when_checked_then_auth_not_alive() {
    for status in [401, 403] {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v2/model/ir.model/search"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "nope"})))
            .mount(&server)
            .await;
        let client = client_for(&server);

        assert!(!client.is_auth_alive().await.unwrap(), "status {status}");
    }
}

/// **VALUE**: Verifies a 400 whose body carries `"code": 403` reads as dead auth.
///
/// **WHY THIS MATTERS**: Fulfil reports some permission failures as a plain 400 with
/// the real status inside the error body.
///
/// **BUG THIS CATCHES**: Would catch `is_auth_alive` only looking at the HTTP status
/// and surfacing these as client errors.
#[tokio::test]
async fn given_bad_request_with_forbidden_code_when_auth_checked_then_not_alive() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/ir.model/search"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"code": 403, "message": "Forbidden"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let alive = client.is_auth_alive().await;

    // THEN
    assert_eq!(alive.ok(), Some(false));
}

#[tokio::test]
async fn given_bad_request_with_other_code_when_auth_checked_then_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/ir.model/search"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"code": 422, "message": "Bad domain"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client.is_auth_alive().await;

    assert!(matches!(result, Err(FulfilError::Client { .. })));
}

#[tokio::test]
async fn given_server_error_when_auth_checked_then_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/ir.model/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let client = client_for(&server);

    assert!(client.is_auth_alive().await.is_err());
}

#[tokio::test]
async fn given_preferences_when_context_refreshed_then_client_context_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/res.user/get_preferences"))
        .and(body_json(json!([true])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"language": "en", "company": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let mut client = client_for(&server);

    client.refresh_context().await.unwrap();

    assert_eq!(client.context().get("company"), Some(&json!(1)));
}
