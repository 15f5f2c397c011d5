use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::domain::{
    CompetencyId, CompetencyScoreItem, CompetencyScoreRecord, GoalDefinition, GoalId,
    GoalScoreItem, GoalScoreRecord, ScoreSheet,
};
use super::scoring::{calculate_how_score, calculate_what_score, AxisScoreResult};

/// Recorded score and feedback for one goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalEntry {
    pub score: Option<i32>,
    pub feedback: Option<String>,
}

/// Recorded score and notes for one competency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompetencyEntry {
    pub score: Option<i32>,
    pub notes: Option<String>,
}

/// Per-axis feedback state. VETO is carried by the axis result, not by this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AxisProgress {
    Empty,
    Partial,
    Complete,
}

impl AxisProgress {
    fn from_counts(scored_any: usize, scored_required: usize, required: usize) -> Self {
        if scored_any == 0 {
            AxisProgress::Empty
        } else if scored_required < required {
            AxisProgress::Partial
        } else {
            AxisProgress::Complete
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AxisProgress::Empty => "Not started",
            AxisProgress::Partial => "In progress",
            AxisProgress::Complete => "Complete",
        }
    }
}

/// Derived view of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisSummary {
    pub result: AxisScoreResult,
    pub progress: AxisProgress,
    /// Required items that carry a score.
    pub scored: usize,
    pub required: usize,
    /// Only placed once the axis is complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_position: Option<u8>,
}

impl AxisSummary {
    fn new(result: AxisScoreResult, scored_any: usize, scored: usize, required: usize) -> Self {
        let progress = AxisProgress::from_counts(scored_any, scored, required);
        let grid_position = match progress {
            AxisProgress::Complete => Some(result.grid_position()),
            _ => None,
        };
        Self {
            result,
            progress,
            scored,
            required,
            grid_position,
        }
    }
}

/// Mutable score state for one review while it is being scored.
#[derive(Debug, Clone, Default)]
pub struct ScoringSession {
    goal_definitions: Vec<GoalDefinition>,
    goal_scores: BTreeMap<GoalId, GoalEntry>,
    competency_scores: BTreeMap<CompetencyId, CompetencyEntry>,
    required_goals: BTreeSet<GoalId>,
    required_competencies: BTreeSet<CompetencyId>,
}

impl ScoringSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_goal_definitions(&mut self, definitions: Vec<GoalDefinition>) {
        self.goal_definitions = definitions;
    }

    pub fn set_required_goals<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = GoalId>,
    {
        self.required_goals = ids.into_iter().collect();
    }

    pub fn set_required_competencies<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = CompetencyId>,
    {
        self.required_competencies = ids.into_iter().collect();
    }

    pub fn set_goal_score(&mut self, goal_id: &GoalId, score: Option<i32>) {
        self.goal_scores.entry(goal_id.clone()).or_default().score = score;
    }

    pub fn set_goal_feedback(&mut self, goal_id: &GoalId, feedback: String) {
        self.goal_scores.entry(goal_id.clone()).or_default().feedback = Some(feedback);
    }

    pub fn set_competency_score(&mut self, competency_id: &CompetencyId, score: Option<i32>) {
        self.competency_scores
            .entry(competency_id.clone())
            .or_default()
            .score = score;
    }

    pub fn set_competency_notes(&mut self, competency_id: &CompetencyId, notes: String) {
        self.competency_scores
            .entry(competency_id.clone())
            .or_default()
            .notes = Some(notes);
    }

    pub fn goal_entry(&self, goal_id: &GoalId) -> Option<&GoalEntry> {
        self.goal_scores.get(goal_id)
    }

    pub fn competency_entry(&self, competency_id: &CompetencyId) -> Option<&CompetencyEntry> {
        self.competency_scores.get(competency_id)
    }

    /// Scored goals in definition order. Scores for undefined goals carry no weight and
    /// are left out.
    pub fn goal_items(&self) -> Vec<GoalScoreItem> {
        self.goal_definitions
            .iter()
            .filter_map(|definition| {
                let score = self.goal_scores.get(&definition.id)?.score?;
                Some(GoalScoreItem {
                    id: definition.id.clone(),
                    score,
                    weight: definition.weight,
                    goal_type: definition.goal_type,
                })
            })
            .collect()
    }

    pub fn competency_items(&self) -> Vec<CompetencyScoreItem> {
        self.competency_scores
            .iter()
            .filter_map(|(id, entry)| {
                entry.score.map(|score| CompetencyScoreItem {
                    id: id.clone(),
                    score,
                })
            })
            .collect()
    }

    pub fn goal_weight_total(&self) -> i64 {
        self.goal_definitions
            .iter()
            .map(|definition| i64::from(definition.weight))
            .sum()
    }

    pub fn what_summary(&self) -> AxisSummary {
        let items = self.goal_items();
        let scored = self
            .required_goals
            .iter()
            .filter(|id| self.goal_is_scored(id))
            .count();
        let scored_any = self
            .goal_scores
            .values()
            .filter(|entry| entry.score.is_some())
            .count();
        AxisSummary::new(
            calculate_what_score(&items),
            scored_any,
            scored,
            self.required_goals.len(),
        )
    }

    pub fn how_summary(&self) -> AxisSummary {
        let items = self.competency_items();
        let scored = self
            .required_competencies
            .iter()
            .filter(|id| self.competency_is_scored(id))
            .count();
        AxisSummary::new(
            calculate_how_score(&items),
            items.len(),
            scored,
            self.required_competencies.len(),
        )
    }

    pub fn missing_goals(&self) -> Vec<GoalId> {
        self.required_goals
            .iter()
            .filter(|id| !self.goal_is_scored(id))
            .cloned()
            .collect()
    }

    pub fn missing_competencies(&self) -> Vec<CompetencyId> {
        self.required_competencies
            .iter()
            .filter(|id| !self.competency_is_scored(id))
            .cloned()
            .collect()
    }

    pub fn all_scores_complete(&self) -> bool {
        self.required_goals.iter().all(|id| self.goal_is_scored(id))
            && self
                .required_competencies
                .iter()
                .all(|id| self.competency_is_scored(id))
    }

    pub fn required_count(&self) -> usize {
        self.required_goals.len() + self.required_competencies.len()
    }

    /// Overwrites local entries with the persisted ones. Returns the ids that were loaded.
    pub fn merge(&mut self, sheet: ScoreSheet) -> (Vec<GoalId>, Vec<CompetencyId>) {
        let mut goals = Vec::with_capacity(sheet.goal_scores.len());
        for record in sheet.goal_scores {
            self.goal_scores.insert(
                record.goal_id.clone(),
                GoalEntry {
                    score: record.score,
                    feedback: record.feedback,
                },
            );
            goals.push(record.goal_id);
        }

        let mut competencies = Vec::with_capacity(sheet.competency_scores.len());
        for record in sheet.competency_scores {
            self.competency_scores.insert(
                record.competency_id.clone(),
                CompetencyEntry {
                    score: record.score,
                    notes: record.notes,
                },
            );
            competencies.push(record.competency_id);
        }

        (goals, competencies)
    }

    /// Builds the save payload for the given items, dropping no-op records.
    pub fn changes_for(
        &self,
        goals: &BTreeSet<GoalId>,
        competencies: &BTreeSet<CompetencyId>,
    ) -> ScoreSheet {
        let goal_scores = goals
            .iter()
            .filter_map(|id| {
                self.goal_scores.get(id).map(|entry| GoalScoreRecord {
                    goal_id: id.clone(),
                    score: entry.score,
                    feedback: entry.feedback.clone(),
                })
            })
            .collect();

        let competency_scores = competencies
            .iter()
            .filter_map(|id| {
                self.competency_scores
                    .get(id)
                    .map(|entry| CompetencyScoreRecord {
                        competency_id: id.clone(),
                        score: entry.score,
                        notes: entry.notes.clone(),
                    })
            })
            .collect();

        ScoreSheet {
            goal_scores,
            competency_scores,
        }
        .without_empty_records()
    }

    fn goal_is_scored(&self, goal_id: &GoalId) -> bool {
        self.goal_scores
            .get(goal_id)
            .map(|entry| entry.score.is_some())
            .unwrap_or(false)
    }

    fn competency_is_scored(&self, competency_id: &CompetencyId) -> bool {
        self.competency_scores
            .get(competency_id)
            .map(|entry| entry.score.is_some())
            .unwrap_or(false)
    }
}
