use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::DatasetStore;
use crate::{
    error::AppResult,
    models::{UserDataset, Username},
};

const EXTENSION: &str = "json";

/// Dataset store writing one pretty-printed JSON document per user
///
/// Layout: `<data_dir>/<username>.json`. The directory is created on first write.
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, username: &Username) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", username.as_str(), EXTENSION))
    }
}

#[async_trait::async_trait]
impl DatasetStore for JsonFileStore {
    async fn get(&self, username: &Username) -> AppResult<Option<UserDataset>> {
        let path = self.path_for(username);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let dataset = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Stored dataset is unreadable");
            e
        })?;

        Ok(Some(dataset))
    }

    async fn put(&self, username: &Username, dataset: &UserDataset) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let path = self.path_for(username);
        let tmp_path = self.data_dir.join(format!(
            "{}.{}.tmp",
            username.as_str(),
            uuid::Uuid::new_v4()
        ));
        let json = serde_json::to_vec_pretty(dataset)?;

        // Each writer stages its own file; the rename is the only shared step
        let staged = match tokio::fs::write(&tmp_path, json).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(user = %username, path = %path.display(), "Dataset written");

        Ok(())
    }

    async fn delete(&self, username: &Username) -> AppResult<bool> {
        match tokio::fs::remove_file(self.path_for(username)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> AppResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
