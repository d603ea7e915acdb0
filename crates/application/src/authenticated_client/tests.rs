use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use http::header::AUTHORIZATION;
use projecttracker_core::{AppError, AppResult};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::test_support::{FakeNavigator, FakeStorage};
use crate::{ApiRequest, ApiResponse, ClientConfig, HttpTransport, KeyValueStorage, TokenStore};

use super::{AuthenticatedClient, ClientState};

const REFRESH_PATH: &str = "authentication/refresh/";

#[derive(Debug, Clone)]
struct RecordedRequest {
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

/// API double: accepts one access token, mints it on refresh.
struct FakeApi {
    accepted_token: String,
    refresh_response: ApiResponse,
    refresh_delay: Duration,
    always_unauthorized: Vec<String>,
    server_error_paths: Vec<String>,
    unreachable_paths: Vec<String>,
    slow_paths: Vec<String>,
    panic_on_refresh: bool,
    refresh_calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            accepted_token: "fresh-access".to_owned(),
            refresh_response: ApiResponse::json_body(
                StatusCode::OK,
                &json!({
                    "message": "Token refreshed successfully",
                    "tokens": { "access": "fresh-access", "refresh": "refresh-2" }
                }),
            ),
            refresh_delay: Duration::from_millis(100),
            always_unauthorized: Vec::new(),
            server_error_paths: Vec::new(),
            unreachable_paths: Vec::new(),
            slow_paths: Vec::new(),
            panic_on_refresh: false,
            refresh_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn recorded(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeApi {
    async fn send(&self, request: &ApiRequest) -> AppResult<ApiResponse> {
        let authorization = request
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        self.requests.lock().await.push(RecordedRequest {
            path: request.path.clone(),
            authorization: authorization.clone(),
            body: request.body.clone(),
        });

        if self.unreachable_paths.contains(&request.path) {
            return Err(AppError::Transport("connection refused".to_owned()));
        }

        if request.path == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.refresh_delay).await;
            assert!(!self.panic_on_refresh, "refresh endpoint crashed");
            return Ok(self.refresh_response.clone());
        }

        if self.slow_paths.contains(&request.path) {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        if self.server_error_paths.contains(&request.path) {
            return Ok(ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
        }

        let expected = format!("Bearer {}", self.accepted_token);
        if self.always_unauthorized.contains(&request.path)
            || authorization.as_deref() != Some(expected.as_str())
        {
            return Ok(ApiResponse::json_body(
                StatusCode::UNAUTHORIZED,
                &json!({ "detail": "Given token not valid for any token type" }),
            ));
        }

        Ok(ApiResponse::json_body(
            StatusCode::OK,
            &json!({ "path": request.path }),
        ))
    }
}

struct Harness {
    api: Arc<FakeApi>,
    storage: Arc<FakeStorage>,
    navigator: Arc<FakeNavigator>,
    client: AuthenticatedClient,
}

fn harness(api: FakeApi, storage: FakeStorage) -> Harness {
    let api = Arc::new(api);
    let storage = Arc::new(storage);
    let navigator = Arc::new(FakeNavigator::default());
    let config = ClientConfig::default();
    let client = AuthenticatedClient::new(
        api.clone(),
        TokenStore::new(storage.clone(), &config),
        navigator.clone(),
        config,
    );

    Harness {
        api,
        storage,
        navigator,
        client,
    }
}

#[tokio::test]
async fn attaches_stored_access_token() {
    let harness = harness(
        FakeApi::new(),
        FakeStorage::seeded("fresh-access", "refresh-1"),
    );

    let response = harness.client.send(ApiRequest::get("projects/")).await;
    assert!(matches!(response, Ok(ref response) if response.status == StatusCode::OK));

    let recorded = harness.api.recorded("projects/").await;
    assert_eq!(
        recorded[0].authorization.as_deref(),
        Some("Bearer fresh-access")
    );
    assert_eq!(harness.api.refresh_calls(), 0);
}

#[tokio::test]
async fn sends_without_authorization_when_no_token_is_stored() {
    let harness = harness(FakeApi::new(), FakeStorage::default());

    let response = harness
        .client
        .send(ApiRequest::get("authentication/register/"))
        .await;
    assert!(response.is_err());

    let recorded = harness.api.recorded("authentication/register/").await;
    assert!(recorded[0].authorization.is_none());
}

#[tokio::test(start_paused = true)]
async fn three_concurrent_unauthorized_requests_share_one_refresh() {
    let harness = harness(
        FakeApi::new(),
        FakeStorage::seeded("stale-access", "refresh-1"),
    );

    let (projects, tasks, users) = tokio::join!(
        harness.client.send(ApiRequest::get("projects/")),
        harness.client.send(ApiRequest::get("tasks/")),
        harness.client.send(ApiRequest::get("users/")),
    );

    assert_eq!(harness.api.refresh_calls(), 1);
    for response in [projects, tasks, users] {
        assert!(matches!(response, Ok(ref response) if response.status == StatusCode::OK));
    }

    let refresh_requests = harness.api.recorded(REFRESH_PATH).await;
    assert_eq!(refresh_requests.len(), 1);
    assert_eq!(
        refresh_requests[0].body,
        Some(json!({ "refresh": "refresh-1" }))
    );
    assert!(refresh_requests[0].authorization.is_none());

    let replayed = harness.api.recorded("tasks/").await;
    assert_eq!(replayed.len(), 2);
    assert_eq!(
        replayed[1].authorization.as_deref(),
        Some("Bearer fresh-access")
    );
    assert_eq!(harness.client.state().await, ClientState::Idle);
}

#[tokio::test(start_paused = true)]
async fn many_concurrent_unauthorized_requests_all_resume() {
    let harness = harness(
        FakeApi::new(),
        FakeStorage::seeded("stale-access", "refresh-1"),
    );

    let mut handles = Vec::new();
    for index in 0..8 {
        let client = harness.client.clone();
        handles.push(tokio::spawn(async move {
            client
                .send(ApiRequest::get(format!("projects/{index}/")))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if let Ok(Ok(response)) = handle.await
            && response.status == StatusCode::OK
        {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 8);
    assert_eq!(harness.api.refresh_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn successful_refresh_stores_rotated_tokens() {
    let harness = harness(
        FakeApi::new(),
        FakeStorage::seeded("stale-access", "refresh-1"),
    );

    let response = harness.client.send(ApiRequest::get("projects/")).await;
    assert!(response.is_ok());
    assert_eq!(
        harness.storage.value("accessToken").await.as_deref(),
        Some("fresh-access")
    );
    assert_eq!(
        harness.storage.value("refreshToken").await.as_deref(),
        Some("refresh-2")
    );
    assert!(harness.navigator.locations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn refresh_without_rotation_keeps_refresh_token() {
    let mut api = FakeApi::new();
    api.refresh_response =
        ApiResponse::json_body(StatusCode::OK, &json!({ "access": "fresh-access" }));
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let response = harness.client.send(ApiRequest::get("projects/")).await;
    assert!(response.is_ok());
    assert_eq!(
        harness.storage.value("refreshToken").await.as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test(start_paused = true)]
async fn refresh_failure_clears_session_and_redirects_once() {
    let mut api = FakeApi::new();
    api.refresh_response = ApiResponse::json_body(
        StatusCode::UNAUTHORIZED,
        &json!({ "message": "Invalid refresh token" }),
    );
    let storage = FakeStorage::seeded("stale-access", "refresh-1");
    storage
        .set("userData", r#"{"id":4,"username":"lea","role":"developer"}"#)
        .await
        .unwrap_or_default();
    let harness = harness(api, storage);

    let (projects, tasks) = tokio::join!(
        harness.client.send(ApiRequest::get("projects/")),
        harness.client.send(ApiRequest::get("tasks/")),
    );

    assert!(matches!(projects, Err(AppError::Unauthorized(_))));
    assert!(matches!(tasks, Err(AppError::Unauthorized(_))));
    assert_eq!(harness.api.refresh_calls(), 1);
    assert_eq!(harness.navigator.locations(), vec!["/login".to_owned()]);
    assert_eq!(harness.storage.value("accessToken").await, None);
    assert_eq!(harness.storage.value("refreshToken").await, None);
    assert_eq!(harness.storage.value("userData").await, None);
    assert_eq!(harness.client.state().await, ClientState::Idle);

    let after_logout = harness.client.send(ApiRequest::get("health/")).await;
    assert!(after_logout.is_err());
    let recorded = harness.api.recorded("health/").await;
    assert!(recorded[0].authorization.is_none());
}

#[tokio::test]
async fn missing_refresh_token_ends_session() {
    let storage = FakeStorage::default();
    storage
        .set("accessToken", "stale-access")
        .await
        .unwrap_or_default();
    let harness = harness(FakeApi::new(), storage);

    let response = harness.client.send(ApiRequest::get("projects/")).await;

    assert!(matches!(response, Err(AppError::Unauthorized(_))));
    assert_eq!(harness.api.refresh_calls(), 0);
    assert_eq!(harness.navigator.locations(), vec!["/login".to_owned()]);
    assert_eq!(harness.storage.value("accessToken").await, None);
}

#[tokio::test(start_paused = true)]
async fn refresh_transport_error_ends_session() {
    let mut api = FakeApi::new();
    api.unreachable_paths.push(REFRESH_PATH.to_owned());
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let response = harness.client.send(ApiRequest::get("projects/")).await;

    assert!(matches!(response, Err(AppError::Unauthorized(_))));
    assert_eq!(harness.navigator.locations(), vec!["/login".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn malformed_refresh_body_ends_session() {
    let mut api = FakeApi::new();
    api.refresh_response = ApiResponse::json_body(StatusCode::OK, &json!({ "ok": true }));
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let response = harness.client.send(ApiRequest::get("projects/")).await;

    assert!(response.is_err());
    assert_eq!(harness.storage.value("refreshToken").await, None);
    assert_eq!(harness.navigator.locations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_unauthorized_is_returned_without_another_refresh() {
    let mut api = FakeApi::new();
    api.always_unauthorized.push("admin/audit/".to_owned());
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let response = harness.client.send(ApiRequest::get("admin/audit/")).await;

    let error = response.err();
    assert_eq!(error.as_ref().and_then(AppError::status), Some(401));
    assert!(
        error
            .map(|error| error.to_string().contains("Given token not valid"))
            .unwrap_or(false)
    );
    assert_eq!(harness.api.refresh_calls(), 1);
    assert_eq!(harness.api.recorded("admin/audit/").await.len(), 2);
    assert!(harness.navigator.locations().is_empty());
    assert_eq!(
        harness.storage.value("accessToken").await.as_deref(),
        Some("fresh-access")
    );
}

#[tokio::test]
async fn server_errors_are_returned_untouched() {
    let mut api = FakeApi::new();
    api.server_error_paths.push("dashboard/".to_owned());
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let response = harness.client.send(ApiRequest::get("dashboard/")).await;

    assert!(
        matches!(response, Ok(ref response) if response.status == StatusCode::INTERNAL_SERVER_ERROR)
    );
    assert_eq!(harness.api.refresh_calls(), 0);
}

#[tokio::test]
async fn transport_errors_propagate_without_refresh() {
    let mut api = FakeApi::new();
    api.unreachable_paths.push("projects/".to_owned());
    let harness = harness(api, FakeStorage::seeded("fresh-access", "refresh-1"));

    let response = harness.client.send(ApiRequest::get("projects/")).await;

    assert!(matches!(response, Err(AppError::Transport(_))));
    assert_eq!(harness.api.refresh_calls(), 0);
    assert!(harness.navigator.locations().is_empty());
}

#[tokio::test]
async fn get_json_decodes_success_and_reports_http_errors() {
    let mut api = FakeApi::new();
    api.server_error_paths.push("calendar/".to_owned());
    let harness = harness(api, FakeStorage::seeded("fresh-access", "refresh-1"));

    let body: AppResult<Value> = harness.client.get_json("projects/").await;
    assert_eq!(body.ok(), Some(json!({ "path": "projects/" })));

    let failure: AppResult<Value> = harness.client.get_json("calendar/").await;
    assert!(matches!(failure, Err(AppError::Http { status: 500, .. })));
}

#[tokio::test]
async fn delete_checks_status() {
    let harness = harness(
        FakeApi::new(),
        FakeStorage::seeded("fresh-access", "refresh-1"),
    );

    assert!(harness.client.delete("tasks/4/").await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn queue_drains_when_triggering_request_is_dropped() {
    let harness = harness(
        FakeApi::new(),
        FakeStorage::seeded("stale-access", "refresh-1"),
    );

    let trigger = {
        let client = harness.client.clone();
        tokio::spawn(async move { client.send(ApiRequest::get("projects/")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.client.state().await, ClientState::Refreshing);
    trigger.abort();

    let follower = harness.client.send(ApiRequest::get("tasks/")).await;

    assert!(matches!(follower, Ok(ref response) if response.status == StatusCode::OK));
    assert_eq!(harness.api.refresh_calls(), 1);
    assert_eq!(harness.client.state().await, ClientState::Idle);
}

#[tokio::test(start_paused = true)]
async fn panicking_refresh_releases_waiters_and_allows_a_new_refresh() {
    let mut api = FakeApi::new();
    api.panic_on_refresh = true;
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let first = tokio::time::timeout(
        Duration::from_secs(60),
        harness.client.send(ApiRequest::get("projects/")),
    )
    .await;
    assert!(matches!(first, Ok(Err(AppError::Unauthorized(_)))));
    assert_eq!(harness.client.state().await, ClientState::Idle);

    let second = tokio::time::timeout(
        Duration::from_secs(60),
        harness.client.send(ApiRequest::get("tasks/")),
    )
    .await;
    assert!(matches!(second, Ok(Err(AppError::Unauthorized(_)))));
    assert_eq!(harness.api.refresh_calls(), 2);
    assert_eq!(harness.client.state().await, ClientState::Idle);
}

#[tokio::test(start_paused = true)]
async fn late_unauthorized_reuses_token_from_finished_refresh() {
    let mut api = FakeApi::new();
    api.slow_paths.push("reports/".to_owned());
    let harness = harness(api, FakeStorage::seeded("stale-access", "refresh-1"));

    let (slow, fast) = tokio::join!(
        harness.client.send(ApiRequest::get("reports/")),
        harness.client.send(ApiRequest::get("projects/")),
    );

    assert!(matches!(slow, Ok(ref response) if response.status == StatusCode::OK));
    assert!(matches!(fast, Ok(ref response) if response.status == StatusCode::OK));
    assert_eq!(harness.api.refresh_calls(), 1);

    let reports = harness.api.recorded("reports/").await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].authorization.as_deref(), Some("Bearer stale-access"));
    assert_eq!(reports[1].authorization.as_deref(), Some("Bearer fresh-access"));
}
