use std::env;
use std::path::PathBuf;
use std::time::Duration;

use projecttracker_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_TOKEN_FILE: &str = ".projecttracker/session.json";
const DEFAULT_LOGIN_LOCATION: &str = "/login";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub token_file: PathBuf,
    pub login_location: String,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_base_url = non_empty("PROJECTTRACKER_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let http_timeout_secs = match non_empty("PROJECTTRACKER_HTTP_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid PROJECTTRACKER_HTTP_TIMEOUT_SECS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "PROJECTTRACKER_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        let token_file = non_empty("PROJECTTRACKER_TOKEN_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from);

        let login_location = non_empty("PROJECTTRACKER_LOGIN_PATH")
            .unwrap_or_else(|| DEFAULT_LOGIN_LOCATION.to_owned());

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            token_file,
            login_location,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
