//! Project Tracker command-line client.

#![forbid(unsafe_code)]

mod cli_config;
mod commands;

use std::sync::Arc;

use clap::Parser;
use projecttracker_application::{
    AccessPolicy, AuthenticatedClient, ClientConfig, SessionService, TokenStore,
};
use projecttracker_core::AppError;
use projecttracker_domain::PermissionResolver;
use projecttracker_infrastructure::{
    JsonFileKeyValueStorage, ReqwestHttpTransport, WatchNavigator,
};
use tracing::{info, warn};

use crate::cli_config::{CliConfig, init_tracing};
use crate::commands::{Cli, CommandContext};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CliConfig::load()?;

    let client_config = ClientConfig::default().with_login_location(config.login_location.clone());
    let storage = Arc::new(JsonFileKeyValueStorage::new(config.token_file.clone()));
    let transport = Arc::new(ReqwestHttpTransport::with_timeout(
        config.api_base_url.as_str(),
        config.http_timeout,
    )?);
    let navigator = Arc::new(WatchNavigator::new());

    let client = AuthenticatedClient::new(
        transport,
        TokenStore::new(storage, &client_config),
        navigator.clone(),
        client_config,
    );

    info!(
        api_base_url = %config.api_base_url,
        token_file = %config.token_file.display(),
        "project tracker client ready"
    );

    let context = CommandContext {
        sessions: SessionService::new(client.clone()),
        policy: AccessPolicy::new(PermissionResolver::new()),
        client,
    };
    let result = commands::run(cli.command, &context).await;

    if let Some(location) = navigator.current() {
        warn!(location = %location, "session ended, sign in again with `projecttracker login`");
    }

    result
}
