use crate::client::resolve_host;
use crate::{Auth, Client, DEFAULT_USER_AGENT, FulfilError};

use std::time::Duration;

/// **VALUE**: Verifies host and base URL are a pure function of the subdomain.
///
/// **WHY THIS MATTERS**: Every request path is joined onto the base URL; a missing
/// trailing slash silently drops the `v2` segment.
///
/// **BUG THIS CATCHES**: Would catch `Url::join` eating the last path segment.
#[test]
fn given_subdomain_when_client_built_then_base_url_is_tenant_api_root() {
    // GIVEN / WHEN
    let client = Client::new("acme").unwrap();

    // THEN
    assert_eq!(client.host().as_str(), "https://acme.fulfil.io/");
    assert_eq!(client.base_url().as_str(), "https://acme.fulfil.io/api/v2/");
    assert_eq!(
        client.base_url().join("model/sale.sale").unwrap().as_str(),
        "https://acme.fulfil.io/api/v2/model/sale.sale"
    );
}

#[test]
fn given_localhost_when_host_resolved_then_uses_local_dev_server() {
    let host = resolve_host("localhost", "fulfil.io").unwrap();

    assert_eq!(host.as_str(), "http://localhost:8000/");
}

/// **VALUE**: Verifies malformed subdomains are rejected before any URL is built.
///
/// **BUG THIS CATCHES**: Would catch a subdomain like `evil.com/` being spliced into
/// the host and redirecting credentials elsewhere.
#[test]
fn given_invalid_subdomain_when_host_resolved_then_validation_error() {
    for subdomain in ["", "evil.com/", "-acme", "ac me", "acme-"] {
        let result = resolve_host(subdomain, "fulfil.io");
        assert!(
            matches!(result, Err(FulfilError::Validation { .. })),
            "'{subdomain}' should be rejected"
        );
    }
}

#[test]
fn given_custom_domain_when_host_resolved_then_domain_is_used() {
    let host = resolve_host("acme", "fulfil.dev").unwrap();

    assert_eq!(host.as_str(), "https://acme.fulfil.dev/");
}

/// **VALUE**: Verifies a host override keeps its path prefix.
///
/// **BUG THIS CATCHES**: Would catch `http://proxy/fulfil` losing `fulfil` when the
/// API path is joined.
#[test]
fn given_host_override_without_trailing_slash_when_built_then_prefix_is_kept() {
    let client = Client::builder("acme")
        .host("http://127.0.0.1:9000/fulfil")
        .build()
        .unwrap();

    assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9000/fulfil/api/v2/");
}

#[test]
fn given_zero_timeout_when_built_then_validation_error() {
    let result = Client::builder("acme").timeout(Duration::ZERO).build();

    assert!(matches!(result, Err(FulfilError::Validation { .. })));
}

/// **VALUE**: Verifies construction defaults and auth replacement.
///
/// **BUG THIS CATCHES**: Would catch `set_auth(None)` leaving the old credentials in place.
#[test]
fn given_client_when_auth_swapped_then_new_auth_is_visible() {
    // GIVEN
    let mut client = Client::builder("acme").api_key("k").build().unwrap();
    assert_eq!(client.user_agent(), DEFAULT_USER_AGENT);
    assert_eq!(client.auth().map(Auth::kind), Some("api_key"));

    // WHEN
    client.set_auth(Some(Auth::bearer("t")));

    // THEN
    assert_eq!(client.auth().map(Auth::kind), Some("bearer"));

    client.set_auth(None);
    assert!(client.auth().is_none());
}
