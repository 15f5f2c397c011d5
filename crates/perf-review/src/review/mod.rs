//! Performance review scoring: axis calculators, the per-review scoring session, and the
//! debounced state manager that persists scores through a [`ScoreStore`].

pub mod domain;
pub mod manager;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    CompetencyId, CompetencyScoreItem, CompetencyScoreRecord, GoalDefinition, GoalId,
    GoalScoreItem, GoalScoreRecord, GoalType, ReviewId, ScoreSheet,
};
pub use manager::{LoadStatus, SaveStatus, ScoringError, ScoringSnapshot, ScoringStateManager};
pub use repository::{ReviewSubmitter, SaveOutcome, ScoreStore, StoreError, SubmitError};
pub use router::scoring_router;
pub use scoring::{
    calculate_how_score, calculate_what_score, grid_position, AxisScoreResult, GridCell,
    PerformanceGrid, ScoreCard, VetoReason,
};
pub use session::{AxisProgress, AxisSummary, ScoringSession};
