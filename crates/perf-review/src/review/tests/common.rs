use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::time::Instant;

use crate::config::ScoringConfig;
use crate::review::domain::{
    CompetencyId, CompetencyScoreItem, GoalDefinition, GoalId, GoalScoreItem, GoalType,
    ReviewId, ScoreSheet,
};
use crate::review::repository::{ReviewSubmitter, ScoreStore, StoreError, SubmitError};
use crate::review::ScoringStateManager;

pub(super) const DEBOUNCE: Duration = Duration::from_millis(1000);

pub(super) fn goal(id: &str, score: i32, weight: i32, goal_type: GoalType) -> GoalScoreItem {
    GoalScoreItem {
        id: GoalId::from(id),
        score,
        weight,
        goal_type,
    }
}

pub(super) fn competency(id: &str, score: i32) -> CompetencyScoreItem {
    CompetencyScoreItem {
        id: CompetencyId::from(id),
        score,
    }
}

pub(super) fn competencies(scores: &[i32]) -> Vec<CompetencyScoreItem> {
    scores
        .iter()
        .enumerate()
        .map(|(index, score)| competency(&format!("c-{index}"), *score))
        .collect()
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Two goals (60/40, one SCF) and two competencies, all required.
pub(super) fn goal_definitions() -> Vec<GoalDefinition> {
    vec![
        GoalDefinition {
            id: GoalId::from("revenue"),
            weight: 60,
            goal_type: GoalType::Standard,
        },
        GoalDefinition {
            id: GoalId::from("safety"),
            weight: 40,
            goal_type: GoalType::Scf,
        },
    ]
}

pub(super) fn competency_ids() -> Vec<CompetencyId> {
    vec![CompetencyId::from("ownership"), CompetencyId::from("teamwork")]
}

pub(super) fn review_id() -> ReviewId {
    ReviewId::from("review-2025-042")
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        save_debounce: DEBOUNCE,
    }
}

pub(super) fn build_manager(store: Arc<MemoryStore>) -> ScoringStateManager<MemoryStore> {
    let manager = ScoringStateManager::new(review_id(), store, scoring_config());
    let definitions = goal_definitions();
    manager.set_required_goals(definitions.iter().map(|definition| definition.id.clone()));
    manager.set_goal_definitions(definitions);
    manager.set_required_competencies(competency_ids());
    manager
}

#[derive(Debug, Clone)]
pub(super) struct RecordedSave {
    pub(super) review_id: ReviewId,
    pub(super) sheet: ScoreSheet,
    pub(super) at: Instant,
}

/// Store double recording saves, optionally slow or failing.
#[derive(Default)]
pub(super) struct MemoryStore {
    persisted: Mutex<ScoreSheet>,
    saves: Mutex<Vec<RecordedSave>>,
    save_latency: Mutex<Duration>,
    fail_saves: Mutex<bool>,
    fail_loads: Mutex<bool>,
}

impl MemoryStore {
    pub(super) fn with_persisted(sheet: ScoreSheet) -> Self {
        Self {
            persisted: Mutex::new(sheet),
            ..Self::default()
        }
    }

    pub(super) fn saves(&self) -> Vec<RecordedSave> {
        self.saves.lock().expect("store mutex poisoned").clone()
    }

    /// Each save waits this long before landing (or failing).
    pub(super) fn slow_saves(&self, latency: Duration) {
        *self.save_latency.lock().expect("store mutex poisoned") = latency;
    }

    pub(super) fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().expect("store mutex poisoned") = fail;
    }

    pub(super) fn fail_loads(&self, fail: bool) {
        *self.fail_loads.lock().expect("store mutex poisoned") = fail;
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn load(&self, _review_id: &ReviewId) -> Result<ScoreSheet, StoreError> {
        if *self.fail_loads.lock().expect("store mutex poisoned") {
            return Err(StoreError::Unavailable("backend offline".to_string()));
        }
        Ok(self.persisted.lock().expect("store mutex poisoned").clone())
    }

    async fn save(&self, review_id: &ReviewId, changes: &ScoreSheet) -> Result<(), StoreError> {
        let latency = *self.save_latency.lock().expect("store mutex poisoned");
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if *self.fail_saves.lock().expect("store mutex poisoned") {
            return Err(StoreError::Unavailable("backend offline".to_string()));
        }
        self.saves
            .lock()
            .expect("store mutex poisoned")
            .push(RecordedSave {
                review_id: review_id.clone(),
                sheet: changes.clone(),
                at: Instant::now(),
            });
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemorySubmitter {
    submitted: Mutex<Vec<ReviewId>>,
}

impl MemorySubmitter {
    pub(super) fn submitted(&self) -> Vec<ReviewId> {
        self.submitted.lock().expect("submitter mutex poisoned").clone()
    }
}

#[async_trait]
impl ReviewSubmitter for MemorySubmitter {
    async fn submit(&self, review_id: &ReviewId) -> Result<(), SubmitError> {
        self.submitted
            .lock()
            .expect("submitter mutex poisoned")
            .push(review_id.clone());
        Ok(())
    }
}

pub(super) struct ClosedSubmitter;

#[async_trait]
impl ReviewSubmitter for ClosedSubmitter {
    async fn submit(&self, _review_id: &ReviewId) -> Result<(), SubmitError> {
        Err(SubmitError::InvalidTransition("calibration locked".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
