use super::super::domain::{CompetencyId, CompetencyScoreItem, GoalId, GoalScoreItem, GoalType};
use serde::Serialize;

/// Score that trips every VETO rule. Compared by exact equality.
const VETO_SCORE: i32 = 1;
/// KAR score that offsets one failing KAR goal.
const COMPENSATING_SCORE: i32 = 3;

/// Outcome of a single-trigger VETO scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VetoCheck<Id> {
    pub active: bool,
    pub trigger: Option<Id>,
}

impl<Id> VetoCheck<Id> {
    fn inactive() -> Self {
        Self {
            active: false,
            trigger: None,
        }
    }

    fn triggered_by(id: Id) -> Self {
        Self {
            active: true,
            trigger: Some(id),
        }
    }
}

/// Outcome of the KAR scan, including one-for-one compensation details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KarVetoCheck {
    pub active: bool,
    pub trigger: Option<GoalId>,
    pub compensated: bool,
    pub compensating_goal: Option<GoalId>,
    /// Failing KAR goals left over after each KAR 3 cancels one KAR 1.
    pub uncompensated: i64,
}

/// First SCF goal scoring exactly 1 vetoes the WHAT axis.
pub fn check_scf_veto(goals: &[GoalScoreItem]) -> VetoCheck<GoalId> {
    goals
        .iter()
        .find(|goal| goal.goal_type == GoalType::Scf && goal.score == VETO_SCORE)
        .map(|goal| VetoCheck::triggered_by(goal.id.clone()))
        .unwrap_or_else(VetoCheck::inactive)
}

pub fn check_kar_veto(goals: &[GoalScoreItem]) -> KarVetoCheck {
    let kar = || goals.iter().filter(|goal| goal.goal_type == GoalType::Kar);
    let failing: Vec<&GoalScoreItem> = kar().filter(|goal| goal.score == VETO_SCORE).collect();
    let exceeding: Vec<&GoalScoreItem> = kar()
        .filter(|goal| goal.score == COMPENSATING_SCORE)
        .collect();

    let uncompensated = failing.len() as i64 - exceeding.len() as i64;

    if uncompensated > 0 {
        return KarVetoCheck {
            active: true,
            trigger: failing.first().map(|goal| goal.id.clone()),
            compensated: false,
            compensating_goal: None,
            uncompensated,
        };
    }

    // Only a VETO that was actually triggered can count as compensated.
    let compensating_goal = if failing.is_empty() {
        None
    } else {
        exceeding.first().map(|goal| goal.id.clone())
    };

    KarVetoCheck {
        active: false,
        trigger: None,
        compensated: compensating_goal.is_some(),
        compensating_goal,
        uncompensated,
    }
}

pub fn check_competency_veto(competencies: &[CompetencyScoreItem]) -> VetoCheck<CompetencyId> {
    competencies
        .iter()
        .find(|competency| competency.score == VETO_SCORE)
        .map(|competency| VetoCheck::triggered_by(competency.id.clone()))
        .unwrap_or_else(VetoCheck::inactive)
}
