//! Pure calculators turning item scores into WHAT/HOW axis results and grid cells.
//!
//! Every function here is referentially transparent: the state manager calls them on the
//! full item set after each edit and relies on identical inputs giving identical results.

mod grid;
mod veto;

pub use grid::{grid_position, GridCell, GridPlacement, PerformanceGrid};
pub use veto::{check_competency_veto, check_kar_veto, check_scf_veto, KarVetoCheck, VetoCheck};

use super::domain::{CompetencyScoreItem, GoalScoreItem};
use serde::{Deserialize, Serialize};

/// Rule that pinned an axis to 1.00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VetoReason {
    Scf,
    Kar,
    Competency,
}

impl VetoReason {
    pub fn summary(&self) -> &'static str {
        match self {
            VetoReason::Scf => "success critical factor goal scored 1",
            VetoReason::Kar => "uncompensated key achievement goal scored 1",
            VetoReason::Competency => "competency scored 1",
        }
    }
}

/// Composite score for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScoreResult {
    pub score: f64,
    pub veto_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veto_reason: Option<VetoReason>,
}

impl AxisScoreResult {
    /// Result for an axis with no scored items.
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            veto_active: false,
            veto_reason: None,
        }
    }

    fn vetoed(reason: VetoReason) -> Self {
        Self {
            score: 1.0,
            veto_active: true,
            veto_reason: Some(reason),
        }
    }

    fn scored(score: f64) -> Self {
        Self {
            score: round_to_hundredths(score),
            veto_active: false,
            veto_reason: None,
        }
    }

    pub fn grid_position(&self) -> u8 {
        grid_position(self.score)
    }
}

/// Rounds half away from zero on the value scaled by 100.
pub(crate) fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// WHAT axis: SCF VETO, then KAR VETO, then the weight-normalized average.
pub fn calculate_what_score(goals: &[GoalScoreItem]) -> AxisScoreResult {
    if goals.is_empty() {
        return AxisScoreResult::empty();
    }

    if check_scf_veto(goals).active {
        return AxisScoreResult::vetoed(VetoReason::Scf);
    }

    if check_kar_veto(goals).active {
        return AxisScoreResult::vetoed(VetoReason::Kar);
    }

    let (weighted_sum, total_weight) =
        goals
            .iter()
            .fold((0.0_f64, 0.0_f64), |(weighted, total), goal| {
                (
                    weighted + f64::from(goal.score) * f64::from(goal.weight),
                    total + f64::from(goal.weight),
                )
            });

    if total_weight == 0.0 {
        return AxisScoreResult::scored(0.0);
    }

    AxisScoreResult::scored(weighted_sum / total_weight)
}

/// HOW axis: competency VETO, then the unweighted mean.
pub fn calculate_how_score(competencies: &[CompetencyScoreItem]) -> AxisScoreResult {
    if competencies.is_empty() {
        return AxisScoreResult::empty();
    }

    if check_competency_veto(competencies).active {
        return AxisScoreResult::vetoed(VetoReason::Competency);
    }

    let sum: f64 = competencies
        .iter()
        .map(|competency| f64::from(competency.score))
        .sum();

    AxisScoreResult::scored(sum / competencies.len() as f64)
}

/// Both axis results for one review plus its grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub what: AxisScoreResult,
    pub how: AxisScoreResult,
    pub cell: GridCell,
}

impl ScoreCard {
    pub fn compute(goals: &[GoalScoreItem], competencies: &[CompetencyScoreItem]) -> Self {
        let what = calculate_what_score(goals);
        let how = calculate_how_score(competencies);
        Self {
            what,
            how,
            cell: GridCell::from_results(&what, &how),
        }
    }

    pub fn veto_reasons(&self) -> Vec<VetoReason> {
        [self.what.veto_reason, self.how.veto_reason]
            .into_iter()
            .flatten()
            .collect()
    }
}
