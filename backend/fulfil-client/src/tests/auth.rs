use crate::auth::{API_KEY_HEADER, AUTHORIZATION_HEADER, Auth, SessionAuth};

use common::RedactedSecret;

/// **VALUE**: Verifies each auth scheme produces the exact header Fulfil expects.
///
/// **WHY THIS MATTERS**: The header is the only thing that differs between schemes.
/// A wrong name or prefix is a 401 on every request.
///
/// **BUG THIS CATCHES**: Would catch the API key being sent as a bearer token or the
/// session triple being joined in the wrong order.
#[test]
fn given_each_auth_scheme_when_header_built_then_matches_wire_format() {
    // GIVEN
    let api_key = Auth::api_key("key-123");
    let bearer = Auth::bearer("tok-456");
    let session = Auth::session("admin", 1, "abc123");

    // WHEN / THEN
    assert_eq!(
        api_key.header(),
        (API_KEY_HEADER, String::from("key-123"))
    );
    assert_eq!(
        bearer.header(),
        (AUTHORIZATION_HEADER, String::from("Bearer tok-456"))
    );
    // base64("admin:1:abc123")
    assert_eq!(
        session.header(),
        (AUTHORIZATION_HEADER, String::from("Session YWRtaW46MTphYmMxMjM="))
    );
}

/// **VALUE**: Verifies credentials never leak through Debug output.
///
/// **BUG THIS CATCHES**: Would catch a plain `String` replacing `RedactedSecret` in
/// any auth variant; clients are logged with `{:?}`.
#[test]
fn given_auth_when_debug_formatted_then_secret_is_hidden() {
    let auths = [
        Auth::api_key("very-secret-key"),
        Auth::bearer("very-secret-key"),
        Auth::session("admin", 7, "very-secret-key"),
    ];

    for auth in auths {
        let debug = format!("{auth:?}");
        assert!(!debug.contains("very-secret-key"), "leaked in {debug}");
    }
}

#[test]
fn given_session_auth_when_converted_then_becomes_session_variant() {
    let session = SessionAuth {
        login: String::from("admin"),
        user_id: 3,
        session: RedactedSecret::new("s"),
    };

    let auth = Auth::from(session.clone());

    assert_eq!(auth, Auth::Session(session));
    assert_eq!(auth.kind(), "session");
}
