use std::collections::HashMap;

use async_trait::async_trait;
use http::StatusCode;
use projecttracker_core::{AppError, AppResult};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{ApiRequest, ApiResponse, HttpTransport, KeyValueStorage, Navigator};

#[derive(Default)]
pub(crate) struct FakeStorage {
    values: Mutex<HashMap<String, String>>,
}

impl FakeStorage {
    pub(crate) fn seeded(access: &str, refresh: &str) -> Self {
        Self {
            values: Mutex::new(HashMap::from([
                ("accessToken".to_owned(), access.to_owned()),
                ("refreshToken".to_owned(), refresh.to_owned()),
            ])),
        }
    }

    pub(crate) async fn value(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStorage for FakeStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeNavigator {
    locations: std::sync::Mutex<Vec<String>>,
}

impl FakeNavigator {
    pub(crate) fn locations(&self) -> Vec<String> {
        self.locations
            .lock()
            .ok()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Navigator for FakeNavigator {
    fn redirect(&self, location: &str) {
        if let Ok(mut guard) = self.locations.lock() {
            guard.push(location.to_owned());
        }
    }
}

/// Transport answering each path with a fixed response.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: HashMap<String, Result<ApiResponse, String>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn respond(mut self, path: &str, status: StatusCode, body: &Value) -> Self {
        self.responses.insert(
            path.to_owned(),
            Ok(ApiResponse::json_body(status, body)),
        );
        self
    }

    pub(crate) fn fail(mut self, path: &str, message: &str) -> Self {
        self.responses
            .insert(path.to_owned(), Err(message.to_owned()));
        self
    }

    pub(crate) async fn sent(&self, path: &str) -> Vec<ApiRequest> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        self.sent.lock().await.push(request.clone());
        match self.responses.get(&request.path) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(AppError::Transport(message.clone())),
            None => Ok(ApiResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}
