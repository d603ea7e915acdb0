use std::time::Duration;

use async_trait::async_trait;
use projecttracker_application::{ApiRequest, ApiResponse, HttpTransport};
use projecttracker_core::{AppError, AppResult};
use tracing::debug;
use url::Url;

/// `reqwest` implementation of the API transport.
///
/// Request paths are resolved against the base URL. Every response is
/// returned whatever its status.
#[derive(Clone)]
pub struct ReqwestHttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ReqwestHttpTransport {
    /// Creates a transport over an existing client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url: with_trailing_slash(base_url),
        }
    }

    /// Builds a client with the given request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid API base URL '{base_url}': {error}"))
        })?;
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self::new(http_client, base_url))
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| AppError::Validation(format!("invalid API path '{path}': {error}")))
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        let url = self.endpoint(request.path.as_str())?;

        let mut builder = self
            .http_client
            .request(request.method.clone(), url.clone())
            .headers(request.headers.clone());
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            AppError::Transport(format!(
                "{} {url} failed{}: {error}",
                request.method,
                if error.is_timeout() { " (timeout)" } else { "" }
            ))
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|error| {
            AppError::Transport(format!("failed to read response body from {url}: {error}"))
        })?;

        debug!(
            request_id = %request.request_id,
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            "api request completed"
        );

        let mut api_response = ApiResponse::new(status, body.to_vec());
        api_response.headers = headers;
        Ok(api_response)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(path.as_str());
    }
    url
}
