use crate::RedactedSecret;

/// **VALUE**: Verifies secrets never appear in Debug or Display output.
///
/// **WHY THIS MATTERS**: Clients and auth values get logged with `{:?}` all the time.
/// An API key in a log file is a credential leak.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug sneaking back in.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    let secret = RedactedSecret::new("sk-super-secret-value");

    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    assert!(!debug.contains("super-secret"));
    assert!(!display.contains("super-secret"));
    assert!(debug.contains("REDACTED"));
}

/// **VALUE**: Verifies serialization is refused outright.
///
/// **BUG THIS CATCHES**: Would catch if a config or auth struct containing a secret
/// is accidentally written to disk as JSON.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    let secret = RedactedSecret::new("token");

    let result = serde_json::to_string(&secret);

    assert!(result.is_err());
}

#[test]
fn given_secret_when_exposed_then_returns_raw_value() {
    let secret = RedactedSecret::from("abc123");

    assert_eq!(secret.expose(), "abc123");
    assert_eq!(secret.len(), 6);
    assert!(!secret.is_empty());
}

/// **VALUE**: Verifies `len` and `is_empty` agree, with blankness checked separately.
///
/// **BUG THIS CATCHES**: Would catch a whitespace-only secret reporting a non-zero
/// length while also claiming to be empty.
#[test]
fn given_whitespace_secret_when_measured_then_not_empty_but_blank() {
    // GIVEN
    let blank = RedactedSecret::from("   ");
    let empty = RedactedSecret::from("");

    // WHEN / THEN
    assert_eq!(blank.len(), 3);
    assert!(!blank.is_empty());
    assert!(blank.is_blank());
    assert!(empty.is_empty());
    assert!(empty.is_blank());
    assert!(!RedactedSecret::from("abc").is_blank());
}

#[test]
fn given_json_string_when_deserialized_then_wraps_value() {
    let secret: RedactedSecret = serde_json::from_str("\"tok-123\"").unwrap();

    assert_eq!(secret.expose(), "tok-123");
}
