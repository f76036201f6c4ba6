use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::survey::types::{Survey, SurveyFilter, SurveyPage, SurveyStatus};

use super::{StoreError, SurveyRepository};

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySurveyStore {
    surveys: RwLock<Vec<Survey>>,
}

impl MemorySurveyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SurveyRepository for MemorySurveyStore {
    async fn get(&self, id: &str) -> Result<Option<Survey>, StoreError> {
        let surveys = self.surveys.read().await;
        Ok(surveys.iter().find(|s| s.id == id).cloned())
    }

    async fn list(
        &self,
        filter: SurveyFilter,
        skip: usize,
        limit: usize,
    ) -> Result<SurveyPage, StoreError> {
        let surveys = self.surveys.read().await;
        let matching = surveys
            .iter()
            .filter(|s| filter.matches(s))
            .collect::<Vec<&Survey>>();
        Ok(SurveyPage {
            total: matching.len(),
            surveys: matching.into_iter().skip(skip).take(limit).cloned().collect(),
        })
    }

    async fn insert(&self, survey: Survey) -> Result<(), StoreError> {
        let mut surveys = self.surveys.write().await;
        if surveys.iter().any(|s| s.id == survey.id) {
            return Err(StoreError::Duplicate(survey.id));
        }
        surveys.push(survey);
        Ok(())
    }

    async fn update(&self, survey: Survey) -> Result<bool, StoreError> {
        let mut surveys = self.surveys.write().await;
        match surveys.iter_mut().find(|s| s.id == survey.id) {
            Some(slot) => {
                *slot = survey;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_if_status(
        &self,
        survey: Survey,
        expected: SurveyStatus,
    ) -> Result<bool, StoreError> {
        let mut surveys = self.surveys.write().await;
        match surveys
            .iter_mut()
            .find(|s| s.id == survey.id && s.status == expected)
        {
            Some(slot) => {
                *slot = survey;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut surveys = self.surveys.write().await;
        let before = surveys.len();
        surveys.retain(|s| s.id != id);
        Ok(surveys.len() != before)
    }
}
