use crate::config::SUBDOMAIN_ENV;
use crate::{ConfigError, FulfilConfig};

use std::fs;

use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

/// **VALUE**: Verifies a minimal file picks up every default.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` turning an omitted
/// key into a parse failure.
#[test]
fn given_minimal_toml_when_parsed_then_defaults_fill_the_rest() {
    // GIVEN / WHEN
    let config = FulfilConfig::from_toml_str(r#"subdomain = "acme""#).unwrap();

    // THEN
    assert_eq!(config.subdomain, "acme");
    assert_eq!(config.domain, "fulfil.io");
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.api_key_env, "FULFIL_API_KEY");
    assert!(config.context.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn given_context_table_when_parsed_then_becomes_json_context() {
    let config = FulfilConfig::from_toml_str(
        r#"
subdomain = "acme"

[context]
company = 1
language = "en_US"
"#,
    )
    .unwrap();

    assert_eq!(config.context.get("company"), Some(&json!(1)));
    assert_eq!(config.context.get("language"), Some(&json!("en_US")));
}

/// **VALUE**: Verifies a missing config file is not an error.
///
/// **WHY THIS MATTERS**: First runs have no file; subdomain can still come from the
/// environment or the command line.
#[test]
fn given_missing_file_when_loaded_then_defaults() {
    let dir = TempDir::new().unwrap();

    let config = FulfilConfig::load(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config, FulfilConfig::default());
}

/// **VALUE**: Verifies a corrupt file reports the offending path.
///
/// **BUG THIS CATCHES**: Would catch parse errors losing the path, leaving users
/// guessing which file is broken.
#[test]
fn given_corrupt_file_when_loaded_then_parse_error_names_path() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "subdomain = [unclosed").unwrap();

    // WHEN
    let result = FulfilConfig::load(&path);

    // THEN
    match result {
        Err(ConfigError::ParseError { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    let cases = [
        FulfilConfig::default(),
        FulfilConfig {
            subdomain: String::from("not a subdomain"),
            ..FulfilConfig::default()
        },
        FulfilConfig {
            subdomain: String::from("acme"),
            timeout_secs: 0,
            ..FulfilConfig::default()
        },
        FulfilConfig {
            subdomain: String::from("acme"),
            api_key_env: String::from(" "),
            ..FulfilConfig::default()
        },
    ];

    for config in cases {
        assert!(
            matches!(config.validate(), Err(ConfigError::ValidationError { .. })),
            "{config:?} should be rejected"
        );
    }
}

/// **VALUE**: Verifies the environment overrides the file's subdomain.
///
/// **BUG THIS CATCHES**: Would catch the override being applied before loading and
/// then clobbered by the file.
#[test]
#[serial]
fn given_subdomain_env_when_overrides_applied_then_env_wins() {
    // GIVEN
    let mut config = FulfilConfig::from_toml_str(r#"subdomain = "from-file""#).unwrap();
    // SAFETY: serialised with every other test touching the environment.
    unsafe { std::env::set_var(SUBDOMAIN_ENV, "from-env") };

    // WHEN
    let result = config.apply_env_overrides();
    unsafe { std::env::remove_var(SUBDOMAIN_ENV) };

    // THEN
    result.unwrap();
    assert_eq!(config.subdomain, "from-env");
}

#[test]
#[serial]
fn given_api_key_env_when_loaded_then_key_is_wrapped() {
    let config = FulfilConfig {
        subdomain: String::from("acme"),
        api_key_env: String::from("FULFIL_TEST_API_KEY_LOAD"),
        ..FulfilConfig::default()
    };
    // SAFETY: serialised with every other test touching the environment.
    unsafe { std::env::set_var("FULFIL_TEST_API_KEY_LOAD", "secret-key") };

    let key = config.load_api_key();
    unsafe { std::env::remove_var("FULFIL_TEST_API_KEY_LOAD") };

    let key = key.unwrap().expect("key should be present");
    assert_eq!(key.expose(), "secret-key");
}

#[test]
#[serial]
fn given_unset_api_key_env_when_loaded_then_none() {
    let config = FulfilConfig {
        subdomain: String::from("acme"),
        api_key_env: String::from("FULFIL_TEST_API_KEY_UNSET"),
        ..FulfilConfig::default()
    };

    assert!(config.load_api_key().unwrap().is_none());
}

#[test]
fn given_valid_config_when_client_built_then_settings_carry_over() {
    let config = FulfilConfig::from_toml_str(
        r#"
subdomain = "acme"
user_agent = "acme-sync/1.0"

[context]
company = 2
"#,
    )
    .unwrap();

    let client = config.build_client(Some("k".into())).unwrap();

    assert_eq!(client.base_url().as_str(), "https://acme.fulfil.io/api/v2/");
    assert_eq!(client.user_agent(), "acme-sync/1.0");
    assert_eq!(client.context().get("company"), Some(&json!(2)));
    assert!(client.auth().is_some());
}
