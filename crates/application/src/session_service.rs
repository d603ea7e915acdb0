//! Session lifecycle: login, registration, logout and the stored profile.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use projecttracker_core::{AppError, AppResult, NonEmptyString};
use projecttracker_domain::{SessionTokens, SessionUser, TokenPayload};

use crate::{ApiRequest, ApiResponse, AuthenticatedClient};

/// Account fields accepted by the registration endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub password_confirm: String,
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default)]
    tokens: Option<TokenPayload>,
}

/// Application service for establishing and ending sessions.
#[derive(Clone)]
pub struct SessionService {
    client: AuthenticatedClient,
}

impl SessionService {
    /// Creates a session service on top of an authenticated client.
    #[must_use]
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Logs in with a username or an email address.
    ///
    /// Identifiers containing `@` are sent as `email`, anything else as
    /// `username`. On success the tokens and the profile are stored.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<SessionUser> {
        let identifier = NonEmptyString::new(identifier.trim())?;
        let payload = if identifier.as_str().contains('@') {
            json!({ "email": identifier.as_str(), "password": password })
        } else {
            json!({ "username": identifier.as_str(), "password": password })
        };

        let response = self
            .client
            .send_anonymous(ApiRequest::post(
                self.client.config().login_path.as_str(),
                payload,
            ))
            .await?;
        if !response.is_success() {
            return Err(rejection("login", &response));
        }

        let user = self.establish(&response).await?.ok_or_else(|| {
            AppError::Unauthorized("invalid login response: missing tokens".to_owned())
        })?;
        info!(user_id = user.id, role = ?user.role_str(), "session established");
        Ok(user)
    }

    /// Registers an account and stores the session when the API returns one.
    pub async fn register(&self, request: &RegistrationRequest) -> AppResult<Option<SessionUser>> {
        if request.password != request.password_confirm {
            return Err(AppError::Validation(
                "password confirmation does not match".to_owned(),
            ));
        }

        let response = self
            .client
            .send_anonymous(
                ApiRequest::new(
                    http::Method::POST,
                    self.client.config().register_path.as_str(),
                )
                .with_json(request)?,
            )
            .await?;
        if !response.is_success() {
            return Err(rejection("registration", &response));
        }

        let user = self.establish(&response).await?;
        if let Some(user) = user.as_ref() {
            info!(user_id = user.id, "registered and signed in");
        }
        Ok(user)
    }

    /// Ends the session.
    ///
    /// The server is told about the logout when a refresh token is stored;
    /// a failure there is logged and does not stop the local teardown.
    pub async fn logout(&self) -> AppResult<()> {
        if let Some(refresh_token) = self.client.tokens().refresh_token().await? {
            let request = ApiRequest::post(
                self.client.config().logout_path.as_str(),
                json!({ "refresh_token": refresh_token }),
            );
            match self.client.send(request).await {
                Ok(response) if !response.is_success() => {
                    warn!(status = response.status.as_u16(), "logout call rejected");
                }
                Ok(_) => {}
                Err(error) => warn!(error = %error, "logout call failed"),
            }
        }

        self.client.tokens().clear().await?;
        info!("session cleared");
        self.client.redirect_to_login();
        Ok(())
    }

    /// Returns the stored user profile.
    pub async fn current_user(&self) -> AppResult<Option<SessionUser>> {
        self.client.tokens().user().await
    }

    /// Returns whether both a profile and an access token are stored.
    pub async fn is_authenticated(&self) -> AppResult<bool> {
        let has_user = self.current_user().await?.is_some();
        let has_token = self.client.tokens().access_token().await?.is_some();
        Ok(has_user && has_token)
    }

    async fn establish(&self, response: &ApiResponse) -> AppResult<Option<SessionUser>> {
        let body = response.json::<SessionResponse>()?;
        let (Some(user), Some(tokens)) = (body.user, body.tokens) else {
            return Ok(None);
        };

        let tokens = SessionTokens::new(tokens.access, tokens.refresh);
        let store = self.client.tokens();
        store.store_tokens(&tokens).await?;
        store.store_user(&user).await?;
        Ok(Some(user))
    }
}

fn rejection(operation: &str, response: &ApiResponse) -> AppError {
    let message = response
        .json::<Value>()
        .ok()
        .and_then(|body| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_owned))
        })
        .unwrap_or_else(|| format!("{operation} failed"));

    match response.status {
        // The login endpoint answers bad credentials with 400.
        StatusCode::BAD_REQUEST if operation == "login" => AppError::Unauthorized(message),
        StatusCode::BAD_REQUEST => AppError::Validation(message),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        status => AppError::Http {
            status: status.as_u16(),
            message,
        },
    }
}
