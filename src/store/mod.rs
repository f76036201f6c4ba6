//! Survey persistence behind the [`SurveyRepository`] trait.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::survey::transitions::TransitionError;
use crate::survey::types::{Survey, SurveyFilter, SurveyPage, SurveyStatus};

pub use memory::MemorySurveyStore;
pub use sqlite::SqliteSurveyStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unable to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored survey '{id}' is corrupt: {source}")]
    Corrupt {
        id: String,
        source: TransitionError,
    },

    #[error("Survey '{0}' already exists")]
    Duplicate(String),

    #[error("Survey store lock poisoned")]
    Poisoned,

    #[error("Survey store task failed: {0}")]
    Task(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Survey>, StoreError>;

    /// Surveys matching `filter` in creation order, paged by `skip`/`limit`,
    /// together with the number of matches before paging.
    async fn list(
        &self,
        filter: SurveyFilter,
        skip: usize,
        limit: usize,
    ) -> Result<SurveyPage, StoreError>;

    async fn insert(&self, survey: Survey) -> Result<(), StoreError>;

    /// Replaces the stored survey with the same id. Returns `false` when no
    /// such survey exists.
    async fn update(&self, survey: Survey) -> Result<bool, StoreError>;

    /// Like `update`, but only while the stored status is still `expected`.
    async fn update_if_status(
        &self,
        survey: Survey,
        expected: SurveyStatus,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
