use serde::{Deserialize, Serialize};

/// Identifier wrapper for a performance review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub String);

/// Identifier wrapper for a weighted objective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub String);

/// Identifier wrapper for a behavioral competency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetencyId(pub String);

impl From<&str> for ReviewId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for GoalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for CompetencyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Goal category controlling which VETO rules apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    #[default]
    Standard,
    /// Key Achievement Required: a 1 vetoes unless offset by another KAR scoring 3.
    Kar,
    /// Success Critical Factor: a 1 always vetoes.
    Scf,
}

impl GoalType {
    pub fn label(&self) -> &'static str {
        match self {
            GoalType::Standard => "Standard",
            GoalType::Kar => "Key Achievement Required",
            GoalType::Scf => "Success Critical Factor",
        }
    }
}

/// One scored, weighted objective as fed to the WHAT calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalScoreItem {
    pub id: GoalId,
    pub score: i32,
    /// Percent share of the review; a review's goals should add up to 100.
    pub weight: i32,
    #[serde(default)]
    pub goal_type: GoalType,
}

/// One scored competency as fed to the HOW calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyScoreItem {
    pub id: CompetencyId,
    pub score: i32,
}

/// Catalogue entry for a goal, owned by goal management and consumed while scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub id: GoalId,
    pub weight: i32,
    #[serde(default)]
    pub goal_type: GoalType,
}

/// Persisted score for one goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalScoreRecord {
    pub goal_id: GoalId,
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl GoalScoreRecord {
    /// Whether the record carries anything worth sending to the backend.
    pub fn has_content(&self) -> bool {
        self.score.is_some()
            || self
                .feedback
                .as_deref()
                .map(|feedback| !feedback.is_empty())
                .unwrap_or(false)
    }
}

/// Persisted score for one competency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyScoreRecord {
    pub competency_id: CompetencyId,
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompetencyScoreRecord {
    /// Notes only travel alongside a score.
    pub fn has_content(&self) -> bool {
        self.score.is_some()
    }
}

/// Load/Save payload exchanged with the review backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSheet {
    #[serde(default)]
    pub goal_scores: Vec<GoalScoreRecord>,
    #[serde(default)]
    pub competency_scores: Vec<CompetencyScoreRecord>,
}

impl ScoreSheet {
    pub fn is_empty(&self) -> bool {
        self.goal_scores.is_empty() && self.competency_scores.is_empty()
    }

    /// Drops records that would be no-ops for the backend.
    pub fn without_empty_records(mut self) -> Self {
        self.goal_scores.retain(GoalScoreRecord::has_content);
        self.competency_scores
            .retain(CompetencyScoreRecord::has_content);
        self
    }
}
