use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use projecttracker_application::KeyValueStorage;
use projecttracker_core::{AppError, AppResult};
use tokio::sync::Mutex;
use tracing::warn;

/// Storage adapter persisting all keys in one JSON object file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target. A file that does not parse is treated as empty and replaced on
/// the next write.
#[derive(Debug)]
pub struct JsonFileKeyValueStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileKeyValueStorage {
    /// Creates a storage backed by the given file. The file is created lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn load(&self) -> AppResult<BTreeMap<String, String>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read session file '{}': {error}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(values) => Ok(values),
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "ignoring unreadable session file");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn save(&self, values: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create session directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let raw = serde_json::to_vec_pretty(values).map_err(|error| {
            AppError::Internal(format!("failed to serialize session file: {error}"))
        })?;
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, raw).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write session file '{}': {error}",
                staging.display()
            ))
        })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace session file '{}': {error}",
                    self.path.display()
                ))
            })
    }
}

#[async_trait]
impl KeyValueStorage for JsonFileKeyValueStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_owned(), value.to_owned());
        self.save(&values).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.save(&values).await
    }
}
