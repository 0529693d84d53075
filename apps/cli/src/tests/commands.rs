use crate::cli::{Cli, Command};
use crate::commands::{parse_json, resolve_config, run_model_command, run_oauth_command};
use crate::error::CliError;

use fulfil_client::{FulfilApi, FulfilConfig, MockFulfil};

use std::fs;

use clap::Parser;
use serde_json::{Value, json};
use tempfile::TempDir;

/// **VALUE**: Verifies the `call` command forwards parsed arguments verbatim.
///
/// **BUG THIS CATCHES**: Would catch the JSON args being wrapped in another array.
#[tokio::test]
async fn given_call_command_when_run_on_mock_then_args_forwarded() {
    // GIVEN
    let fulfil = MockFulfil::new();
    fulfil
        .model("sale.sale")
        .return_value("confirm", json!(true));
    let command = Command::Call {
        model: String::from("sale.sale"),
        method: String::from("confirm"),
        args: String::from("[[1, 2]]"),
    };

    // WHEN
    let output = run_model_command(&fulfil, &command).await.unwrap();

    // THEN
    assert_eq!(output, json!(true));
    fulfil
        .model("sale.sale")
        .assert_called_with("confirm", &[json!([1, 2])]);
}

#[tokio::test]
async fn given_non_array_args_when_call_run_then_cli_error() {
    let fulfil = MockFulfil::new();
    let command = Command::Call {
        model: String::from("sale.sale"),
        method: String::from("confirm"),
        args: String::from(r#"{"id": 1}"#),
    };

    let result = run_model_command(&fulfil, &command).await;

    assert!(matches!(result, Err(CliError::Cli { .. })));
    fulfil.model("sale.sale").assert_not_called("confirm");
}

#[tokio::test]
async fn given_search_read_all_command_when_run_then_records_collected() {
    let fulfil = MockFulfil::new();
    fulfil
        .model("product.product")
        .return_value("search_read_all", json!([{"id": 1}, {"id": 2}]));
    let command = Command::SearchReadAll {
        model: String::from("product.product"),
        domain: String::from(r#"[["salable", "=", true]]"#),
        fields: vec![String::from("id")],
        order: None,
        batch_size: Some(100),
    };

    let output = run_model_command(&fulfil, &command).await.unwrap();

    assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
    fulfil.model("product.product").assert_called_with(
        "search_read_all",
        &[json!([["salable", "=", true]]), Value::Null, json!(["id"])],
    );
}

#[tokio::test]
async fn given_oauth_command_when_run_as_model_command_then_cli_error() {
    let fulfil = MockFulfil::new();

    let result = run_model_command(&fulfil, &Command::AuthStatus).await;

    assert!(matches!(result, Err(CliError::Cli { .. })));
}

#[test]
fn given_invalid_json_when_parsed_then_error_names_argument() {
    let error = parse_json("filter", "[unclosed").unwrap_err();

    assert!(error.to_string().contains("filter"));
}

/// **VALUE**: Verifies file settings are kept while the flag overrides the subdomain.
///
/// **BUG THIS CATCHES**: Would catch `--subdomain` being applied before loading the
/// file, where the file value would clobber it.
#[test]
fn given_config_file_and_subdomain_flag_when_resolved_then_flag_wins() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "subdomain = \"from-file\"\nuser_agent = \"file-agent\"\n").unwrap();
    let cli = Cli::try_parse_from([
        "fulfil",
        "--config",
        path.to_str().unwrap(),
        "--subdomain",
        "from-flag",
        "auth-status",
    ])
    .unwrap();

    // WHEN
    let config = resolve_config(&cli).unwrap();

    // THEN
    assert_eq!(config.subdomain, "from-flag");
    assert_eq!(config.user_agent, "file-agent");
}

#[test]
fn given_invalid_subdomain_flag_when_resolved_then_config_error() {
    let dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "fulfil",
        "--config",
        dir.path().join("missing.toml").to_str().unwrap(),
        "--subdomain",
        "not valid",
        "auth-status",
    ])
    .unwrap();

    assert!(matches!(resolve_config(&cli), Err(CliError::Config { .. })));
}

/// **VALUE**: Verifies OAuth commands target the same tenant host as model commands.
///
/// **WHY THIS MATTERS**: A user on a non-default domain would otherwise authorize
/// against a different server than the one their API calls go to.
///
/// **BUG THIS CATCHES**: Would catch the OAuth session ignoring the configured
/// `domain` and falling back to fulfil.io.
#[tokio::test]
async fn given_custom_domain_when_authorize_url_run_then_url_uses_domain() {
    // GIVEN
    let config = FulfilConfig::from_toml_str("subdomain = \"acme\"\ndomain = \"fulfil.dev\"\n").unwrap();
    let command = Command::AuthorizeUrl {
        client_id: String::from("app-id"),
        client_secret: String::from("app-secret"),
        redirect_uri: String::from("https://app.example.com/callback"),
        scopes: vec![String::from("user_session")],
    };

    // WHEN
    let output = run_oauth_command(&config, &command).await.unwrap();

    // THEN
    let url = output["url"].as_str().unwrap();
    assert!(
        url.starts_with("https://acme.fulfil.dev/oauth/authorize?"),
        "unexpected url {url}"
    );
}

#[tokio::test]
async fn given_host_override_when_authorize_url_run_then_url_uses_host() {
    let config = FulfilConfig::from_toml_str("host = \"http://127.0.0.1:8000\"\n").unwrap();
    let command = Command::AuthorizeUrl {
        client_id: String::from("app-id"),
        client_secret: String::from("app-secret"),
        redirect_uri: String::from("https://app.example.com/callback"),
        scopes: vec![String::from("user_session")],
    };

    let output = run_oauth_command(&config, &command).await.unwrap();

    assert!(
        output["url"]
            .as_str()
            .unwrap()
            .starts_with("http://127.0.0.1:8000/oauth/authorize?")
    );
}
