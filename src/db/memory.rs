use std::collections::HashMap;

use tokio::sync::RwLock;

use super::DatasetStore;
use crate::{
    error::AppResult,
    models::{UserDataset, Username},
};

/// Dataset store kept entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<Username, UserDataset>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DatasetStore for MemoryStore {
    async fn get(&self, username: &Username) -> AppResult<Option<UserDataset>> {
        Ok(self.datasets.read().await.get(username).cloned())
    }

    async fn put(&self, username: &Username, dataset: &UserDataset) -> AppResult<()> {
        self.datasets
            .write()
            .await
            .insert(username.clone(), dataset.clone());
        Ok(())
    }

    async fn delete(&self, username: &Username) -> AppResult<bool> {
        Ok(self.datasets.write().await.remove(username).is_some())
    }

    async fn list(&self) -> AppResult<Vec<String>> {
        let mut names: Vec<String> = self
            .datasets
            .read()
            .await
            .keys()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}
