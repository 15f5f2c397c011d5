use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::domain::{CompetencyScoreItem, GoalScoreItem, ReviewId};
use super::scoring::{
    calculate_how_score, calculate_what_score, AxisScoreResult, GridPlacement, PerformanceGrid,
    ScoreCard,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatScoreRequest {
    pub goals: Vec<GoalScoreItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HowScoreRequest {
    pub competencies: Vec<CompetencyScoreItem>,
}

/// Item scores for one review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreCardRequest {
    #[serde(default)]
    pub goals: Vec<GoalScoreItem>,
    #[serde(default)]
    pub competencies: Vec<CompetencyScoreItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewScores {
    pub review_id: ReviewId,
    #[serde(flatten)]
    pub scores: ScoreCardRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGridRequest {
    pub reviews: Vec<ReviewScores>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGridResponse {
    pub grid: PerformanceGrid,
    pub placements: Vec<GridPlacement>,
    /// Reviews where either axis was pinned by a VETO.
    pub vetoed: Vec<ReviewId>,
}

impl TeamGridResponse {
    pub fn from_reviews(reviews: &[ReviewScores]) -> Self {
        let mut grid = PerformanceGrid::default();
        let mut placements = Vec::with_capacity(reviews.len());
        let mut vetoed = Vec::new();

        for review in reviews {
            let card = ScoreCard::compute(&review.scores.goals, &review.scores.competencies);
            grid.record(card.cell);
            if !card.veto_reasons().is_empty() {
                vetoed.push(review.review_id.clone());
            }
            placements.push(GridPlacement {
                review_id: review.review_id.clone(),
                cell: card.cell,
            });
        }

        Self {
            grid,
            placements,
            vetoed,
        }
    }
}

/// Router builder exposing the stateless calculators over HTTP.
pub fn scoring_router() -> Router {
    Router::new()
        .route("/api/v1/scoring/what", post(what_handler))
        .route("/api/v1/scoring/how", post(how_handler))
        .route("/api/v1/scoring/scorecard", post(scorecard_handler))
        .route("/api/v1/scoring/grid", post(grid_handler))
}

pub(crate) async fn what_handler(Json(request): Json<WhatScoreRequest>) -> Json<AxisScoreResult> {
    Json(calculate_what_score(&request.goals))
}

pub(crate) async fn how_handler(Json(request): Json<HowScoreRequest>) -> Json<AxisScoreResult> {
    Json(calculate_how_score(&request.competencies))
}

pub(crate) async fn scorecard_handler(Json(request): Json<ScoreCardRequest>) -> Json<ScoreCard> {
    Json(ScoreCard::compute(&request.goals, &request.competencies))
}

pub(crate) async fn grid_handler(Json(request): Json<TeamGridRequest>) -> Response {
    if request.reviews.is_empty() {
        let payload = json!({
            "error": "at least one review is required to build a grid",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let response = TeamGridResponse::from_reviews(&request.reviews);
    debug!(
        reviews = request.reviews.len(),
        vetoed = response.vetoed.len(),
        "team grid computed"
    );
    (StatusCode::OK, Json(response)).into_response()
}
