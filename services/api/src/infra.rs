use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use perf_review::review::{
    ReviewId, ReviewSubmitter, ScoreSheet, ScoreStore, StoreError, SubmitError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the review backend's score endpoints.
#[derive(Default, Clone)]
pub(crate) struct InMemoryScoreStore {
    sheets: Arc<Mutex<HashMap<ReviewId, ScoreSheet>>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryScoreStore {
    pub(crate) fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn load(&self, review_id: &ReviewId) -> Result<ScoreSheet, StoreError> {
        let guard = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(review_id).cloned().unwrap_or_default())
    }

    async fn save(&self, review_id: &ReviewId, changes: &ScoreSheet) -> Result<(), StoreError> {
        let mut guard = self.sheets.lock().unwrap_or_else(PoisonError::into_inner);
        let sheet = guard.entry(review_id.clone()).or_default();
        for record in &changes.goal_scores {
            sheet
                .goal_scores
                .retain(|existing| existing.goal_id != record.goal_id);
            sheet.goal_scores.push(record.clone());
        }
        for record in &changes.competency_scores {
            sheet
                .competency_scores
                .retain(|existing| existing.competency_id != record.competency_id);
            sheet.competency_scores.push(record.clone());
        }
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmitter {
    submitted: Arc<Mutex<Vec<ReviewId>>>,
}

impl InMemorySubmitter {
    pub(crate) fn submitted(&self) -> Vec<ReviewId> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ReviewSubmitter for InMemorySubmitter {
    async fn submit(&self, review_id: &ReviewId) -> Result<(), SubmitError> {
        let mut guard = self.submitted.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.contains(review_id) {
            return Err(SubmitError::InvalidTransition(
                "review already submitted".to_string(),
            ));
        }
        guard.push(review_id.clone());
        info!(review_id = %review_id.0, "review moved to calibration");
        Ok(())
    }
}
