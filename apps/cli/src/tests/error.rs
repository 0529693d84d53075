use crate::error::CliError;

use fulfil_client::{ConfigError, FulfilError};

use common::ErrorLocation;

/// **VALUE**: Verifies API failures keep their category when wrapped for the CLI.
///
/// **BUG THIS CATCHES**: Would catch the conversion collapsing every failure into a
/// generic message, hiding auth problems behind "error".
#[test]
fn given_fulfil_error_when_converted_then_category_and_message_kept() {
    let error = CliError::from(FulfilError::validation("Invalid subdomain: 'x y'"));

    match error {
        CliError::Fulfil {
            message, category, ..
        } => {
            assert_eq!(category, "validation");
            assert!(message.contains("Invalid subdomain"));
        }
        other => panic!("expected Fulfil error, got {other:?}"),
    }
}

#[test]
fn given_config_error_when_converted_then_config_variant() {
    let error = CliError::from(ConfigError::ValidationError {
        location: ErrorLocation::caller(),
        reason: String::from("timeout"),
    });

    assert!(matches!(error, CliError::Config { .. }));
    assert!(error.to_string().contains("timeout"));
}
