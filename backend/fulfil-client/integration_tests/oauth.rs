use fulfil_client::{Auth, FulfilConfig, FulfilError, OAuthSession};

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies the authorization URL carries every parameter and a fresh state.
///
/// **WHY THIS MATTERS**: The state is the CSRF guard of the redirect; reusing it
/// across sessions defeats it.
///
/// **BUG THIS CATCHES**: Would catch scopes being comma-joined or the state being
/// constant.
#[test]
fn given_session_when_authorization_url_created_then_params_and_unique_state() {
    // GIVEN
    let session = OAuthSession::new("acme", "client-1", "secret-1").unwrap();

    // WHEN
    let first = session
        .create_authorization_url("https://app.example/cb", &["user_session", "sale.sale:read"])
        .unwrap();
    let second = session
        .create_authorization_url("https://app.example/cb", &["user_session"])
        .unwrap();

    // THEN
    assert_eq!(first.url.host_str(), Some("acme.fulfil.io"));
    assert_eq!(first.url.path(), "/oauth/authorize");
    let params: Vec<(String, String)> = first.url.query_pairs().into_owned().collect();
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("response_type"), Some("code"));
    assert_eq!(get("client_id"), Some("client-1"));
    assert_eq!(get("redirect_uri"), Some("https://app.example/cb"));
    assert_eq!(get("scope"), Some("user_session sale.sale:read"));
    assert_eq!(get("state"), Some(first.state.as_str()));
    assert!(first.matches_state(&first.state));
    assert_ne!(first.state, second.state);
}

#[test]
fn given_returned_state_when_compared_then_only_exact_match_accepted() {
    let session = OAuthSession::new("acme", "client-1", "secret-1").unwrap();
    let authorization = session
        .create_authorization_url("https://app.example/cb", &["user_session"])
        .unwrap();

    assert!(authorization.matches_state(&authorization.state));
    assert!(!authorization.matches_state(""));
    assert!(!authorization.matches_state(&authorization.state[1..]));
    assert!(!authorization.matches_state(&format!("{}x", authorization.state)));
}

/// **VALUE**: Verifies a session on a non-default domain talks to that domain.
///
/// **BUG THIS CATCHES**: Would catch the OAuth host being pinned to fulfil.io while
/// the API client follows the configured domain.
#[test]
fn given_custom_domain_when_session_created_then_host_follows_domain() {
    // GIVEN
    let config =
        FulfilConfig::from_toml_str("subdomain = \"acme\"\ndomain = \"fulfil.dev\"\n").unwrap();

    // WHEN
    let from_config = config.oauth_session("client-1", "secret-1").unwrap();
    let direct = OAuthSession::new("acme", "client-1", "secret-1")
        .unwrap()
        .with_domain("fulfil.dev")
        .unwrap();

    // THEN
    assert_eq!(from_config.host().as_str(), "https://acme.fulfil.dev/");
    assert_eq!(direct.host(), from_config.host());
}

#[test]
fn given_zero_timeout_when_session_configured_then_validation_error() {
    let session = OAuthSession::new("acme", "client-1", "secret-1").unwrap();

    assert!(matches!(
        session.with_timeout(Duration::ZERO),
        Err(FulfilError::Validation { .. })
    ));
}

/// **VALUE**: Verifies the configured timeout applies to the token exchange.
///
/// **BUG THIS CATCHES**: Would catch the session keeping the 30 s default whatever
/// `timeout_secs` says.
#[tokio::test]
async fn given_short_configured_timeout_when_token_slow_then_timeout_error() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let config = FulfilConfig::from_toml_str(&format!(
        "host = \"{}\"\ntimeout_secs = 1\n",
        server.uri()
    ))
    .unwrap();
    let session = config.oauth_session("client-1", "secret-1").unwrap();

    // WHEN
    let result = session.get_token("code-1", "https://app.example/cb").await;

    // THEN
    assert!(matches!(
        result,
        Err(FulfilError::Http { is_timeout: true, .. })
    ));
}

#[test]
fn given_empty_credentials_when_session_created_then_validation_error() {
    assert!(matches!(
        OAuthSession::new("acme", "", "secret"),
        Err(FulfilError::Validation { .. })
    ));
    assert!(matches!(
        OAuthSession::new("acme", "client", "  "),
        Err(FulfilError::Validation { .. })
    ));
}

/// **VALUE**: Verifies the code exchange posts a form and yields a bearer auth.
///
/// **BUG THIS CATCHES**: Would catch the exchange being sent as JSON, which the token
/// endpoint rejects, or the client secret being omitted.
#[tokio::test]
async fn given_authorization_code_when_token_requested_then_bearer_auth_returned() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("client_secret=secret-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let session = OAuthSession::new("acme", "client-1", "secret-1")
        .unwrap()
        .with_host(&server.uri())
        .unwrap();

    // WHEN
    let token = session
        .get_token("auth-code", "https://app.example/cb")
        .await
        .unwrap();

    // THEN
    assert_eq!(token.expires_in, Some(3600));
    assert!(token.refresh_token.is_some());
    assert_eq!(token.into_auth(), Auth::bearer("access-1"));
}

#[tokio::test]
async fn given_rejected_code_when_token_requested_then_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;
    let session = OAuthSession::new("acme", "client-1", "secret-1")
        .unwrap()
        .with_host(&server.uri())
        .unwrap();

    let result = session.get_token("bad", "https://app.example/cb").await;

    assert_eq!(result.unwrap_err().status_code(), Some(400));
}
