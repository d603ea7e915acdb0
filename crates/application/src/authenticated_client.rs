//! HTTP client wrapper that attaches session credentials and recovers from
//! access-token expiry.
//!
//! A `401` on a first attempt suspends the request until the client has
//! obtained a new access token, then replays it once. Only one refresh call
//! is in flight per client; every `401` that arrives meanwhile waits for that
//! same refresh. When the refresh fails the session is torn down: tokens are
//! cleared, waiting requests fail, and the navigator is sent to login.

use std::sync::Arc;

use http::StatusCode;
use http::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use projecttracker_core::{AppError, AppResult};

use crate::{ApiRequest, ApiResponse, ClientConfig, HttpTransport, Navigator, TokenStore};

mod refresh;

/// Refresh state of an [`AuthenticatedClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No refresh call is in flight.
    Idle,
    /// A refresh call is in flight; `401`s are queued behind it.
    Refreshing,
}

struct RefreshState {
    status: ClientState,
    generation: u64,
    pending: Vec<oneshot::Sender<String>>,
}

struct ClientInner {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    config: ClientConfig,
    refresh: Mutex<RefreshState>,
}

/// API client that authenticates requests with the stored session.
///
/// Cloning is cheap; clones share tokens and refresh state.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

impl AuthenticatedClient {
    /// Creates a client over the given collaborators.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                tokens,
                navigator,
                config,
                refresh: Mutex::new(RefreshState {
                    status: ClientState::Idle,
                    generation: 0,
                    pending: Vec::new(),
                }),
            }),
        }
    }

    /// Returns the session token store used by the client.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the current refresh state.
    pub async fn state(&self) -> ClientState {
        self.inner.refresh.lock().await.status
    }

    /// Sends a request with the stored access token attached.
    ///
    /// Responses other than `401` are returned whatever their status. A `401`
    /// triggers (or joins) a token refresh and a single replay; a `401` on the
    /// replay is returned as [`AppError::Unauthorized`]. Transport failures
    /// are returned unchanged.
    ///
    /// When the stored access token changed while the request was in flight,
    /// the replay uses it directly instead of refreshing again.
    pub async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let sent_with = self.inner.tokens.access_token().await?;
        let response = self.dispatch(&request, sent_with.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let access_token = match self.inner.tokens.access_token().await? {
            Some(current) if sent_with.as_deref() != Some(current.as_str()) => {
                debug!(
                    request_id = %request.request_id,
                    path = %request.path,
                    "access token rotated while request was in flight, replaying"
                );
                current
            }
            _ => {
                debug!(
                    request_id = %request.request_id,
                    method = %request.method,
                    path = %request.path,
                    "request unauthorized, waiting for token refresh"
                );
                self.wait_for_fresh_token().await?
            }
        };

        let replayed = self.dispatch(&request, Some(access_token.as_str())).await?;
        if replayed.status == StatusCode::UNAUTHORIZED {
            warn!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                "request unauthorized after token refresh"
            );
            let body = replayed.text();
            return Err(AppError::Unauthorized(if body.is_empty() {
                format!(
                    "{} {} was rejected after token refresh",
                    request.method, request.path
                )
            } else {
                body
            }));
        }

        Ok(replayed)
    }

    /// Sends a request without credentials and without `401` recovery.
    ///
    /// Used for endpoints that establish a session, where a `401` means bad
    /// credentials rather than an expired token.
    pub async fn send_anonymous(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        self.inner.transport.send(&request).await
    }

    /// Sends the navigator to the login entry point.
    pub fn redirect_to_login(&self) {
        info!(location = %self.inner.config.login_location, "redirecting to login");
        self.inner
            .navigator
            .redirect(self.inner.config.login_location.as_str());
    }

    /// Sends a `GET` and decodes a successful JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(ApiRequest::get(path))
            .await?
            .error_for_status()?
            .json()
    }

    /// Sends a `POST` with a JSON body and decodes a successful JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send_json(http::Method::POST, path, body).await
    }

    /// Sends a `PUT` with a JSON body and decodes a successful JSON response.
    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send_json(http::Method::PUT, path, body).await
    }

    /// Sends a `PATCH` with a JSON body and decodes a successful JSON response.
    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send_json(http::Method::PATCH, path, body).await
    }

    /// Sends a `DELETE` and checks for a successful status.
    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.send(ApiRequest::delete(path))
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: http::Method,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let request = ApiRequest::new(method, path).with_json(body)?;
        self.send(request).await?.error_for_status()?.json()
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> AppResult<ApiResponse> {
        let mut outbound = request.clone();
        if let Some(token) = access_token {
            let mut value =
                HeaderValue::from_str(format!("{} {token}", self.inner.config.token_type).as_str())
                    .map_err(|error| {
                        AppError::Validation(format!("access token is not a valid header: {error}"))
                    })?;
            value.set_sensitive(true);
            outbound.headers.insert(AUTHORIZATION, value);
        }

        self.inner.transport.send(&outbound).await
    }
}

#[cfg(test)]
mod tests;
