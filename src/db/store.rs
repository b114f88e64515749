use crate::{
    error::AppResult,
    models::{UserDataset, Username},
};

/// Keyed durable storage for per-user datasets
///
/// Implementations overwrite on `put`; the last writer for a user wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DatasetStore: Send + Sync {
    /// Loads a user's dataset, `None` when the user has never uploaded
    async fn get(&self, username: &Username) -> AppResult<Option<UserDataset>>;

    /// Stores a user's dataset, replacing any previous upload
    async fn put(&self, username: &Username, dataset: &UserDataset) -> AppResult<()>;

    /// Removes a user's dataset, returning whether one existed
    async fn delete(&self, username: &Username) -> AppResult<bool>;

    /// Lists stored usernames in ascending order
    async fn list(&self) -> AppResult<Vec<String>>;
}
