use std::sync::Arc;

use projecttracker_core::{AppError, AppResult};
use projecttracker_domain::{SessionTokens, SessionUser};

use crate::{ClientConfig, KeyValueStorage};

/// Session state kept in durable storage under well-known keys.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    access_token_key: String,
    refresh_token_key: String,
    user_key: String,
}

impl TokenStore {
    /// Creates a store using the keys from the client configuration.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &ClientConfig) -> Self {
        Self {
            storage,
            access_token_key: config.access_token_key.clone(),
            refresh_token_key: config.refresh_token_key.clone(),
            user_key: config.user_key.clone(),
        }
    }

    /// Returns the stored access token.
    pub async fn access_token(&self) -> AppResult<Option<String>> {
        self.non_empty(self.access_token_key.as_str()).await
    }

    /// Returns the stored refresh token.
    pub async fn refresh_token(&self) -> AppResult<Option<String>> {
        self.non_empty(self.refresh_token_key.as_str()).await
    }

    /// Stores a token pair. A missing refresh token keeps the stored one.
    pub async fn store_tokens(&self, tokens: &SessionTokens) -> AppResult<()> {
        self.storage
            .set(self.access_token_key.as_str(), tokens.access.as_str())
            .await?;

        if let Some(refresh) = tokens.refresh.as_deref() {
            self.storage
                .set(self.refresh_token_key.as_str(), refresh)
                .await?;
        }

        Ok(())
    }

    /// Returns the stored user profile.
    ///
    /// A profile that no longer parses is removed and reported as absent.
    pub async fn user(&self) -> AppResult<Option<SessionUser>> {
        let Some(raw) = self.storage.get(self.user_key.as_str()).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<SessionUser>(raw.as_str()) {
            Ok(user) => Ok(Some(user)),
            Err(error) => {
                tracing::warn!(error = %error, "discarding unreadable stored user profile");
                self.storage.remove(self.user_key.as_str()).await?;
                Ok(None)
            }
        }
    }

    /// Stores the user profile as JSON.
    pub async fn store_user(&self, user: &SessionUser) -> AppResult<()> {
        let raw = serde_json::to_string(user).map_err(|error| {
            AppError::Internal(format!("failed to serialize user profile: {error}"))
        })?;
        self.storage.set(self.user_key.as_str(), raw.as_str()).await
    }

    /// Removes both tokens and the user profile.
    ///
    /// Every key is attempted; the first failure is returned.
    pub async fn clear(&self) -> AppResult<()> {
        let mut first_error = None;
        for key in [
            self.access_token_key.as_str(),
            self.refresh_token_key.as_str(),
            self.user_key.as_str(),
        ] {
            if let Err(error) = self.storage.remove(key).await {
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn non_empty(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self
            .storage
            .get(key)
            .await?
            .filter(|value| !value.trim().is_empty()))
    }
}
