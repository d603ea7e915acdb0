use projecttracker_domain::{SessionTokens, TokenResponse};

use super::*;

impl AuthenticatedClient {
    /// Waits for the outcome of the current refresh, starting one if idle.
    pub(super) async fn wait_for_fresh_token(&self) -> AppResult<String> {
        let (sender, receiver) = oneshot::channel();

        let start_refresh = {
            let mut state = self.inner.refresh.lock().await;
            state.pending.push(sender);
            match state.status {
                ClientState::Idle => {
                    state.status = ClientState::Refreshing;
                    state.generation += 1;
                    Some(state.generation)
                }
                ClientState::Refreshing => {
                    debug!(
                        queued = state.pending.len(),
                        "request queued behind in-flight token refresh"
                    );
                    None
                }
            }
        };

        if let Some(generation) = start_refresh {
            self.spawn_refresh(generation);
        }

        receiver.await.map_err(|_| {
            AppError::Unauthorized("session expired: access token could not be refreshed".to_owned())
        })
    }

    /// Runs the refresh on its own task. If that task panics or is cancelled,
    /// the client returns to idle and the queued requests fail.
    fn spawn_refresh(&self, generation: u64) {
        let worker = self.clone();
        let refresh = tokio::spawn(async move { worker.run_refresh().await });

        let supervisor = self.clone();
        tokio::spawn(async move {
            if let Err(error) = refresh.await {
                warn!(error = %error, "token refresh task did not complete");
                supervisor.abandon_refresh(generation).await;
            }
        });
    }

    async fn abandon_refresh(&self, generation: u64) {
        let pending = {
            let mut state = self.inner.refresh.lock().await;
            if state.status != ClientState::Refreshing || state.generation != generation {
                return;
            }
            state.status = ClientState::Idle;
            std::mem::take(&mut state.pending)
        };
        debug!(discarded = pending.len(), "discarding requests queued behind failed refresh");
    }

    async fn run_refresh(&self) {
        info!("refreshing access token");

        match self.request_new_tokens().await {
            Ok(tokens) => {
                let pending = self.finish_refresh().await;
                info!(resumed = pending.len(), "access token refreshed");
                for waiter in pending {
                    // A waiter whose request was dropped no longer listens.
                    let _ = waiter.send(tokens.access.clone());
                }
            }
            Err(error) => {
                warn!(error = %error, "token refresh failed, ending session");
                if let Err(clear_error) = self.inner.tokens.clear().await {
                    warn!(error = %clear_error, "failed to clear session storage");
                }

                let pending = self.finish_refresh().await;
                debug!(discarded = pending.len(), "discarding queued requests");
                drop(pending);

                self.redirect_to_login();
            }
        }
    }

    async fn request_new_tokens(&self) -> AppResult<SessionTokens> {
        let refresh_token = self
            .inner
            .tokens
            .refresh_token()
            .await?
            .ok_or_else(|| AppError::Unauthorized("no refresh token stored".to_owned()))?;

        let request = ApiRequest::post(
            self.inner.config.refresh_path.as_str(),
            serde_json::json!({ "refresh": refresh_token }),
        );
        let response = self
            .inner
            .transport
            .send(&request)
            .await?
            .error_for_status()?;

        let tokens = SessionTokens::from(response.json::<TokenResponse>()?);
        self.inner.tokens.store_tokens(&tokens).await?;
        Ok(tokens)
    }

    async fn finish_refresh(&self) -> Vec<oneshot::Sender<String>> {
        let mut state = self.inner.refresh.lock().await;
        state.status = ClientState::Idle;
        std::mem::take(&mut state.pending)
    }
}
