use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use projecttracker_core::{AppError, AppResult};

/// Outbound API request, independent of the HTTP library doing the I/O.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Correlation id used in logs.
    pub request_id: Uuid,
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base URL, e.g. `projects/12/`.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates a request without body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Creates a `POST` request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    /// Serializes and attaches a JSON body.
    pub fn with_json<B: Serialize>(self, body: &B) -> AppResult<Self> {
        let body = serde_json::to_value(body).map_err(|error| {
            AppError::Validation(format!("failed to serialize request body: {error}"))
        })?;
        Ok(self.with_body(body))
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header, replacing an existing value with the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Response returned by an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response from status and raw body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response carrying a JSON body.
    #[must_use]
    pub fn json_body(status: StatusCode, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Returns whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_slice(&self.body).map_err(|error| {
            AppError::Internal(format!(
                "failed to parse response body with status {}: {error}",
                self.status.as_u16()
            ))
        })
    }

    /// Converts a non-2xx response into [`AppError::Http`].
    pub fn error_for_status(self) -> AppResult<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let body = self.text();
        Err(AppError::Http {
            status: self.status.as_u16(),
            message: if body.is_empty() {
                self.status
                    .canonical_reason()
                    .unwrap_or("<body unavailable>")
                    .to_owned()
            } else {
                body
            },
        })
    }
}

/// Port performing raw HTTP I/O against the API.
///
/// Implementations return every response, whatever its status. Only failures
/// to obtain a response at all are reported as [`AppError::Transport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request and returns its response.
    async fn send(&self, request: &ApiRequest) -> AppResult<ApiResponse>;
}

/// Port over the host's durable string key-value storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Writes a value.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Deletes a value. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Port over the host's navigation.
pub trait Navigator: Send + Sync {
    /// Sends the user to the given location.
    fn redirect(&self, location: &str);
}
