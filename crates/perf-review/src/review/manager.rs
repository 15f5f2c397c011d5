use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::domain::{CompetencyId, GoalDefinition, GoalId, ReviewId};
use super::repository::{ReviewSubmitter, SaveOutcome, ScoreStore, StoreError, SubmitError};
use super::scoring::GridCell;
use super::session::{AxisProgress, AxisSummary, ScoringSession};
use crate::config::ScoringConfig;

/// Progress of the initial fetch of persisted scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    NotLoaded,
    Loading,
    Ready,
    Failed { message: String },
}

/// Progress of debounced persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    /// An edit is waiting for the quiet period to elapse.
    Pending,
    Saving,
    Saved { at: DateTime<Utc> },
    NoChanges,
    Failed { message: String },
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "Idle",
            SaveStatus::Pending => "Unsaved changes",
            SaveStatus::Saving => "Saving",
            SaveStatus::Saved { .. } => "Saved",
            SaveStatus::NoChanges => "No changes",
            SaveStatus::Failed { .. } => "Save failed",
        }
    }
}

/// Derived state published after every change to a review's scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringSnapshot {
    pub review_id: ReviewId,
    pub what: AxisSummary,
    pub how: AxisSummary,
    /// Present once both axes are complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<GridCell>,
    pub all_scores_complete: bool,
    pub completed_count: usize,
    pub required_count: usize,
    pub goal_weight_total: i64,
    pub load_status: LoadStatus,
    pub save_status: SaveStatus,
}

impl ScoringSnapshot {
    pub fn veto_active(&self) -> bool {
        self.what.result.veto_active || self.how.result.veto_active
    }
}

/// Error raised by the scoring state manager.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("failed to load scores: {0}")]
    Load(#[source] StoreError),
    #[error("failed to save scores: {0}")]
    Save(#[source] StoreError),
    #[error("review is not fully scored: {} goal(s) and {} competency score(s) missing", .missing_goals.len(), .missing_competencies.len())]
    Incomplete {
        missing_goals: Vec<GoalId>,
        missing_competencies: Vec<CompetencyId>,
    },
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Items edited since the last successful save.
#[derive(Debug, Default)]
struct DirtyItems {
    goals: BTreeSet<GoalId>,
    competencies: BTreeSet<CompetencyId>,
}

impl DirtyItems {
    fn absorb(&mut self, other: DirtyItems) {
        self.goals.extend(other.goals);
        self.competencies.extend(other.competencies);
    }
}

struct ManagerState {
    session: ScoringSession,
    dirty: DirtyItems,
    load_status: LoadStatus,
    save_status: SaveStatus,
}

/// State reachable from the debounce task.
struct Shared<S> {
    review_id: ReviewId,
    store: Arc<S>,
    state: Mutex<ManagerState>,
    snapshots: watch::Sender<ScoringSnapshot>,
    /// Held for the whole of a save so the backend sees saves one at a time, in order.
    save_gate: tokio::sync::Mutex<()>,
}

impl<S> Shared<S>
where
    S: ScoreStore + 'static,
{
    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_of(&self, state: &ManagerState) -> ScoringSnapshot {
        build_snapshot(&self.review_id, state)
    }

    fn publish(&self, state: &ManagerState) {
        self.snapshots.send_replace(self.snapshot_of(state));
    }

    async fn flush(&self) -> Result<SaveOutcome, StoreError> {
        let _gate = self.save_gate.lock().await;

        let (changes, in_flight) = {
            let mut state = self.lock();
            let in_flight = std::mem::take(&mut state.dirty);
            let changes = state
                .session
                .changes_for(&in_flight.goals, &in_flight.competencies);

            let edited = in_flight.goals.len() + in_flight.competencies.len();
            let kept = changes.goal_scores.len() + changes.competency_scores.len();
            if kept < edited {
                debug!(
                    review_id = %self.review_id.0,
                    dropped = edited - kept,
                    "edits without a score or text are not persisted"
                );
            }

            if changes.is_empty() {
                debug!(review_id = %self.review_id.0, "no score changes to persist");
                state.save_status = SaveStatus::NoChanges;
                self.publish(&state);
                return Ok(SaveOutcome::NoChanges);
            }

            state.save_status = SaveStatus::Saving;
            self.publish(&state);
            (changes, in_flight)
        };

        match self.store.save(&self.review_id, &changes).await {
            Ok(()) => {
                let mut state = self.lock();
                // A newer edit keeps the status at Pending until its own save lands.
                // Saves never overlap, so Saving here always belongs to this save.
                if state.save_status == SaveStatus::Saving {
                    state.save_status = SaveStatus::Saved { at: Utc::now() };
                }
                self.publish(&state);
                info!(
                    review_id = %self.review_id.0,
                    goals = changes.goal_scores.len(),
                    competencies = changes.competency_scores.len(),
                    "scores saved"
                );
                Ok(SaveOutcome::Saved)
            }
            Err(err) => {
                let mut state = self.lock();
                state.dirty.absorb(in_flight);
                state.save_status = SaveStatus::Failed {
                    message: err.to_string(),
                };
                self.publish(&state);
                warn!(review_id = %self.review_id.0, error = %err, "failed to save scores");
                Err(err)
            }
        }
    }
}

fn build_snapshot(review_id: &ReviewId, state: &ManagerState) -> ScoringSnapshot {
    let session = &state.session;
    let what = session.what_summary();
    let how = session.how_summary();
    let cell = match (what.grid_position, how.grid_position) {
        (Some(what), Some(how)) => Some(GridCell { what, how }),
        _ => None,
    };

    ScoringSnapshot {
        review_id: review_id.clone(),
        what,
        how,
        cell,
        all_scores_complete: session.all_scores_complete(),
        completed_count: what.scored + how.scored,
        required_count: session.required_count(),
        goal_weight_total: session.goal_weight_total(),
        load_status: state.load_status.clone(),
        save_status: state.save_status.clone(),
    }
}

/// Owns one review's scores while they are entered, publishing derived state and
/// persisting edits after a quiet period.
///
/// Must be driven from inside a Tokio runtime: every edit spawns the debounce timer.
pub struct ScoringStateManager<S>
where
    S: ScoreStore + 'static,
{
    shared: Arc<Shared<S>>,
    debounce: Duration,
    pending_save: Mutex<Option<AbortHandle>>,
}

impl<S> ScoringStateManager<S>
where
    S: ScoreStore + 'static,
{
    pub fn new(review_id: ReviewId, store: Arc<S>, config: ScoringConfig) -> Self {
        let state = ManagerState {
            session: ScoringSession::new(),
            dirty: DirtyItems::default(),
            load_status: LoadStatus::NotLoaded,
            save_status: SaveStatus::Idle,
        };
        let (snapshots, _) = watch::channel(build_snapshot(&review_id, &state));

        Self {
            shared: Arc::new(Shared {
                review_id,
                store,
                state: Mutex::new(state),
                snapshots,
                save_gate: tokio::sync::Mutex::new(()),
            }),
            debounce: config.save_debounce,
            pending_save: Mutex::new(None),
        }
    }

    pub fn review_id(&self) -> &ReviewId {
        &self.shared.review_id
    }

    /// Recomputes the derived state from the full session.
    pub fn snapshot(&self) -> ScoringSnapshot {
        let state = self.shared.lock();
        self.shared.snapshot_of(&state)
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ScoringSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn all_scores_complete(&self) -> bool {
        self.shared.lock().session.all_scores_complete()
    }

    pub fn axis_progress(&self) -> (AxisProgress, AxisProgress) {
        let state = self.shared.lock();
        (
            state.session.what_summary().progress,
            state.session.how_summary().progress,
        )
    }

    pub fn set_goal_definitions(&self, definitions: Vec<GoalDefinition>) {
        self.configure(|session| session.set_goal_definitions(definitions));
    }

    pub fn set_required_goals<I>(&self, ids: I)
    where
        I: IntoIterator<Item = GoalId>,
    {
        self.configure(|session| session.set_required_goals(ids));
    }

    pub fn set_required_competencies<I>(&self, ids: I)
    where
        I: IntoIterator<Item = CompetencyId>,
    {
        self.configure(|session| session.set_required_competencies(ids));
    }

    pub fn set_goal_score(&self, goal_id: &GoalId, score: i32) {
        debug!(review_id = %self.shared.review_id.0, goal_id = %goal_id.0, score, "goal scored");
        self.edit(|session, dirty| {
            session.set_goal_score(goal_id, Some(score));
            dirty.goals.insert(goal_id.clone());
        });
    }

    /// Removes the score locally.
    ///
    /// A goal left with neither score nor feedback is filtered out of the next save, so
    /// the store keeps its previous score and a later `load_scores` brings it back.
    pub fn clear_goal_score(&self, goal_id: &GoalId) {
        debug!(review_id = %self.shared.review_id.0, goal_id = %goal_id.0, "goal score cleared");
        self.edit(|session, dirty| {
            session.set_goal_score(goal_id, None);
            dirty.goals.insert(goal_id.clone());
        });
    }

    pub fn set_goal_feedback(&self, goal_id: &GoalId, feedback: impl Into<String>) {
        let feedback = feedback.into();
        self.edit(|session, dirty| {
            session.set_goal_feedback(goal_id, feedback);
            dirty.goals.insert(goal_id.clone());
        });
    }

    pub fn set_competency_score(&self, competency_id: &CompetencyId, score: i32) {
        debug!(
            review_id = %self.shared.review_id.0,
            competency_id = %competency_id.0,
            score,
            "competency scored"
        );
        self.edit(|session, dirty| {
            session.set_competency_score(competency_id, Some(score));
            dirty.competencies.insert(competency_id.clone());
        });
    }

    /// Removes the score locally. Competency records without a score are never saved,
    /// so the store keeps its previous score.
    pub fn clear_competency_score(&self, competency_id: &CompetencyId) {
        self.edit(|session, dirty| {
            session.set_competency_score(competency_id, None);
            dirty.competencies.insert(competency_id.clone());
        });
    }

    pub fn set_competency_notes(&self, competency_id: &CompetencyId, notes: impl Into<String>) {
        let notes = notes.into();
        self.edit(|session, dirty| {
            session.set_competency_notes(competency_id, notes);
            dirty.competencies.insert(competency_id.clone());
        });
    }

    /// Fetches persisted scores and lets them overwrite local values for the same items.
    ///
    /// Callers await this before treating the review as ready and must not overlap calls.
    pub async fn load_scores(&self) -> Result<(), ScoringError> {
        {
            let mut state = self.shared.lock();
            state.load_status = LoadStatus::Loading;
            self.shared.publish(&state);
        }

        match self.shared.store.load(&self.shared.review_id).await {
            Ok(sheet) => {
                let mut state = self.shared.lock();
                let (goals, competencies) = state.session.merge(sheet);
                for goal_id in &goals {
                    state.dirty.goals.remove(goal_id);
                }
                for competency_id in &competencies {
                    state.dirty.competencies.remove(competency_id);
                }
                state.load_status = LoadStatus::Ready;
                self.shared.publish(&state);
                info!(
                    review_id = %self.shared.review_id.0,
                    goals = goals.len(),
                    competencies = competencies.len(),
                    "persisted scores loaded"
                );
                Ok(())
            }
            Err(err) => {
                let mut state = self.shared.lock();
                state.load_status = LoadStatus::Failed {
                    message: err.to_string(),
                };
                self.shared.publish(&state);
                warn!(review_id = %self.shared.review_id.0, error = %err, "failed to load scores");
                Err(ScoringError::Load(err))
            }
        }
    }

    /// Skips the quiet period and persists pending edits now.
    ///
    /// Waits for a debounced save that is already in flight first, so a returned
    /// `Ok` means every edit made before the call has reached the store.
    pub async fn save_now(&self) -> Result<SaveOutcome, ScoringError> {
        self.cancel_pending_save();
        self.shared.flush().await.map_err(ScoringError::Save)
    }

    /// Flushes pending edits and hands the review to the workflow backend.
    ///
    /// Refused while any required goal or competency is unscored.
    pub async fn submit<T>(&self, submitter: &T) -> Result<(), ScoringError>
    where
        T: ReviewSubmitter + ?Sized,
    {
        let (missing_goals, missing_competencies) = {
            let state = self.shared.lock();
            (
                state.session.missing_goals(),
                state.session.missing_competencies(),
            )
        };

        if !missing_goals.is_empty() || !missing_competencies.is_empty() {
            warn!(
                review_id = %self.shared.review_id.0,
                missing_goals = missing_goals.len(),
                missing_competencies = missing_competencies.len(),
                "submission blocked until all scores are entered"
            );
            return Err(ScoringError::Incomplete {
                missing_goals,
                missing_competencies,
            });
        }

        self.save_now().await?;
        submitter.submit(&self.shared.review_id).await?;
        info!(review_id = %self.shared.review_id.0, "review submitted");
        Ok(())
    }

    /// Drops any pending debounced save. Called on teardown.
    pub fn close(&self) {
        if self.cancel_pending_save() {
            debug!(review_id = %self.shared.review_id.0, "pending save cancelled on close");
        }
    }

    fn configure<F>(&self, apply: F)
    where
        F: FnOnce(&mut ScoringSession),
    {
        let mut state = self.shared.lock();
        apply(&mut state.session);
        self.shared.publish(&state);
    }

    fn edit<F>(&self, apply: F)
    where
        F: FnOnce(&mut ScoringSession, &mut DirtyItems),
    {
        {
            let mut state = self.shared.lock();
            let ManagerState { session, dirty, .. } = &mut *state;
            apply(session, dirty);
            state.save_status = SaveStatus::Pending;
            self.shared.publish(&state);
        }
        self.schedule_save();
    }

    fn pending_timer(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.pending_save
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_save(&self) {
        let shared = Arc::clone(&self.shared);
        let delay = self.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so that a later edit only ever cancels the wait, never the save.
            tokio::spawn(async move {
                let _ = shared.flush().await;
            });
        });

        if let Some(previous) = self.pending_timer().replace(timer.abort_handle()) {
            previous.abort();
        }
    }

    fn cancel_pending_save(&self) -> bool {
        match self.pending_timer().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl<S> Drop for ScoringStateManager<S>
where
    S: ScoreStore + 'static,
{
    fn drop(&mut self) {
        self.cancel_pending_save();
    }
}
