//! Command execution. Every command produces one JSON value for stdout.

use crate::cli::{Cli, Command};
use crate::error::CliError;

use fulfil_client::{Client, FindQuery, FulfilApi, FulfilConfig, ModelApi};

use futures_util::TryStreamExt;
use log::{debug, info};
use serde_json::{Value, json};

/// Resolve the effective configuration: file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<FulfilConfig, CliError> {
    let mut config = match cli.config.clone().or_else(FulfilConfig::default_path) {
        Some(path) => FulfilConfig::load(&path)?,
        None => FulfilConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(subdomain) = &cli.subdomain {
        config.subdomain = subdomain.clone();
    }
    config.validate()?;
    Ok(config)
}

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let config = resolve_config(cli)?;

    if !cli.command.needs_client() {
        return run_oauth_command(&config, &cli.command).await;
    }

    let api_key = config.load_api_key()?;
    let client = config.build_client(api_key)?;
    run_client_command(&client, &cli.command).await
}

async fn run_client_command(client: &Client, command: &Command) -> Result<Value, CliError> {
    match command {
        Command::AuthStatus => {
            let alive = client.is_auth_alive().await?;
            info!("Auth for '{}' alive: {alive}", client.subdomain());
            Ok(json!({ "subdomain": client.subdomain(), "alive": alive }))
        }
        other => run_model_command(client, other).await,
    }
}

/// Run a model command against any [`FulfilApi`].
pub async fn run_model_command<F: FulfilApi>(api: &F, command: &Command) -> Result<Value, CliError> {
    match command {
        Command::Find {
            model,
            filter,
            page,
            per_page,
            fields,
            order,
        } => {
            let mut query = FindQuery::new(parse_json("filter", filter)?)
                .page(*page)
                .per_page(*per_page)
                .fields(fields.iter().cloned());
            if let Some(order) = order {
                query = query.order(parse_json("order", order)?);
            }
            let records = api.model(model).find(&query).await?;
            debug!("find on {model} returned {} records", records.len());
            Ok(Value::Array(records))
        }
        Command::Get { model, id } => Ok(api.model(model).get(*id).await?),
        Command::Call {
            model,
            method,
            args,
        } => {
            let args = match parse_json("args", args)? {
                Value::Array(args) => args,
                other => {
                    return Err(CliError::cli(format!(
                        "args must be a JSON array, got {other}"
                    )));
                }
            };
            Ok(api.model(model).call(method, args).await?)
        }
        Command::SearchReadAll {
            model,
            domain,
            fields,
            order,
            batch_size,
        } => {
            let order = order
                .as_deref()
                .map(|order| parse_json("order", order))
                .transpose()?;
            let proxy = api.model(model);
            let records: Vec<Value> = proxy
                .search_read_all(parse_json("domain", domain)?, order, fields.clone(), *batch_size)
                .try_collect()
                .await?;
            info!("search_read_all on {model} returned {} records", records.len());
            Ok(Value::Array(records))
        }
        other => Err(CliError::cli(format!("Not a model command: {}", other.name()))),
    }
}

pub async fn run_oauth_command(config: &FulfilConfig, command: &Command) -> Result<Value, CliError> {
    match command {
        Command::AuthorizeUrl {
            client_id,
            client_secret,
            redirect_uri,
            scopes,
        } => {
            let session = config.oauth_session(client_id, client_secret)?;
            let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
            let authorization = session.create_authorization_url(redirect_uri, &scopes)?;
            Ok(json!({
                "url": authorization.url.as_str(),
                "state": authorization.state,
            }))
        }
        Command::Token {
            client_id,
            client_secret,
            redirect_uri,
            code,
        } => {
            let session = config.oauth_session(client_id, client_secret)?;
            let token = session.get_token(code, redirect_uri).await?;
            Ok(json!({
                "access_token": token.access_token.expose(),
                "token_type": token.token_type,
                "expires_in": token.expires_in,
                "scope": token.scope,
            }))
        }
        other => Err(CliError::cli(format!("Not an OAuth command: {}", other.name()))),
    }
}

#[track_caller]
pub fn parse_json(name: &str, raw: &str) -> Result<Value, CliError> {
    serde_json::from_str(raw).map_err(|e| CliError::cli(format!("Invalid JSON for {name}: {e}")))
}
