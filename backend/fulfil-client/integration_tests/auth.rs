use crate::support::{API_KEY, client_for};

use fulfil_client::{Auth, ModelApi};

use chrono::NaiveDate;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies swapping auth changes only the credential headers.
///
/// **WHY THIS MATTERS**: Auth strategies are interchangeable; the same call must hit
/// the same path with the same body whichever is attached.
///
/// **BUG THIS CATCHES**: Would catch a stale `x-api-key` riding along after switching
/// to bearer, or a scheme altering the URL.
#[tokio::test]
async fn given_same_call_when_auth_swapped_then_only_headers_differ() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/ir.date/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "__class__": "date", "year": 2024, "month": 1, "day": 1,
        })))
        .mount(&server)
        .await;
    let mut client = client_for(&server);

    // WHEN
    let today = client.today().await.unwrap();
    client.set_auth(Some(Auth::bearer("bearer-token")));
    client.today().await.unwrap();
    client.set_auth(Some(Auth::session("admin", 1, "abc123")));
    client.today().await.unwrap();

    // THEN
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    for request in &requests[1..] {
        assert_eq!(request.url, requests[0].url);
        assert_eq!(request.body, requests[0].body);
        assert!(request.headers.get("x-api-key").is_none());
    }
    assert_eq!(today, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(requests[0].headers.get("x-api-key").unwrap(), API_KEY);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[1].headers.get("authorization").unwrap(),
        "Bearer bearer-token"
    );
    assert_eq!(
        requests[2].headers.get("authorization").unwrap(),
        "Session YWRtaW46MTphYmMxMjM="
    );
}

#[tokio::test]
async fn given_no_auth_when_called_then_no_credential_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/model/product.product/1"))
        .and(header("user-agent", "acme-sync/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    let mut client = client_for(&server);
    client.set_auth(None);
    client.set_user_agent("acme-sync/1.0");

    client.model("product.product").get(1).await.unwrap();

    let request = &server.received_requests().await.unwrap()[0];
    assert!(request.headers.get("x-api-key").is_none());
    assert!(request.headers.get("authorization").is_none());
}
