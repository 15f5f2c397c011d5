use super::common::*;
use crate::review::domain::{GoalId, GoalType};
use crate::review::scoring::{
    calculate_how_score, calculate_what_score, check_competency_veto, check_kar_veto,
    check_scf_veto, grid_position, AxisScoreResult, GridCell, PerformanceGrid, ScoreCard,
    VetoReason,
};

#[test]
fn empty_inputs_score_zero_without_veto() {
    assert_eq!(calculate_what_score(&[]), AxisScoreResult::empty());
    assert_eq!(calculate_how_score(&[]), AxisScoreResult::empty());
    assert_eq!(AxisScoreResult::empty().score, 0.0);
    assert!(!AxisScoreResult::empty().veto_active);
}

#[test]
fn what_score_is_weight_normalized_average() {
    let goals = vec![
        goal("g-1", 3, 30, GoalType::Standard),
        goal("g-2", 2, 70, GoalType::Standard),
    ];

    let result = calculate_what_score(&goals);

    assert_close(result.score, 2.3);
    assert!(!result.veto_active);
    assert_eq!(result.veto_reason, None);
}

#[test]
fn what_score_divides_by_actual_weight_total() {
    let goals = vec![
        goal("g-1", 3, 20, GoalType::Standard),
        goal("g-2", 2, 20, GoalType::Standard),
        goal("g-3", 2, 20, GoalType::Standard),
    ];

    assert_close(calculate_what_score(&goals).score, 2.33);
}

#[test]
fn what_score_rounds_half_away_from_zero() {
    // 2.125 is exact in binary, so scaling by 100 lands on the midpoint.
    let goals = vec![
        goal("g-1", 3, 1, GoalType::Standard),
        goal("g-2", 2, 7, GoalType::Standard),
    ];

    assert_close(calculate_what_score(&goals).score, 2.13);
}

#[test]
fn zero_total_weight_scores_zero() {
    let goals = vec![
        goal("g-1", 3, 0, GoalType::Standard),
        goal("g-2", 2, 0, GoalType::Kar),
    ];

    let result = calculate_what_score(&goals);

    assert_eq!(result.score, 0.0);
    assert!(!result.veto_active);
}

#[test]
fn standard_goal_scoring_one_only_lowers_the_average() {
    let goals = vec![
        goal("g-1", 1, 50, GoalType::Standard),
        goal("g-2", 3, 50, GoalType::Standard),
    ];

    let result = calculate_what_score(&goals);

    assert_close(result.score, 2.0);
    assert!(!result.veto_active);
}

#[test]
fn scf_goal_scoring_one_overrides_everything() {
    let goals = vec![
        goal("g-1", 1, 50, GoalType::Scf),
        goal("g-2", 3, 50, GoalType::Standard),
    ];

    let result = calculate_what_score(&goals);

    assert_eq!(
        result,
        AxisScoreResult {
            score: 1.0,
            veto_active: true,
            veto_reason: Some(VetoReason::Scf),
        }
    );
}

#[test]
fn scf_takes_precedence_over_kar() {
    let goals = vec![
        goal("kar", 1, 30, GoalType::Kar),
        goal("scf", 1, 10, GoalType::Scf),
        goal("std", 3, 60, GoalType::Standard),
    ];

    assert_eq!(
        calculate_what_score(&goals).veto_reason,
        Some(VetoReason::Scf)
    );
}

#[test]
fn scf_check_reports_first_match_in_list_order() {
    let goals = vec![
        goal("passing", 2, 20, GoalType::Scf),
        goal("first-fail", 1, 40, GoalType::Scf),
        goal("second-fail", 1, 40, GoalType::Scf),
    ];

    let check = check_scf_veto(&goals);

    assert!(check.active);
    assert_eq!(check.trigger, Some(GoalId::from("first-fail")));
}

#[test]
fn veto_checks_use_exact_equality() {
    let goals = vec![
        goal("below", 0, 50, GoalType::Scf),
        goal("negative", -1, 50, GoalType::Kar),
    ];

    assert!(!check_scf_veto(&goals).active);
    assert!(!check_kar_veto(&goals).active);
    assert!(!check_competency_veto(&competencies(&[0, 2, 5])).active);
}

#[test]
fn uncompensated_kar_vetoes() {
    let goals = vec![
        goal("kar-1", 1, 40, GoalType::Kar),
        goal("kar-2", 1, 30, GoalType::Kar),
        goal("kar-3", 3, 30, GoalType::Kar),
    ];

    let check = check_kar_veto(&goals);
    assert!(check.active);
    assert!(!check.compensated);
    assert_eq!(check.trigger, Some(GoalId::from("kar-1")));
    assert_eq!(check.uncompensated, 1);

    assert_eq!(
        calculate_what_score(&goals),
        AxisScoreResult {
            score: 1.0,
            veto_active: true,
            veto_reason: Some(VetoReason::Kar),
        }
    );
}

#[test]
fn compensated_kar_falls_back_to_weighted_average() {
    let goals = vec![
        goal("kar-1", 1, 50, GoalType::Kar),
        goal("kar-2", 3, 50, GoalType::Kar),
    ];

    let check = check_kar_veto(&goals);
    assert!(!check.active);
    assert!(check.compensated);
    assert_eq!(check.compensating_goal, Some(GoalId::from("kar-2")));

    let result = calculate_what_score(&goals);
    assert_close(result.score, 2.0);
    assert!(!result.veto_active);
}

#[test]
fn kar_without_failures_is_not_compensated() {
    let goals = vec![
        goal("kar-1", 3, 50, GoalType::Kar),
        goal("kar-2", 2, 50, GoalType::Kar),
    ];

    let check = check_kar_veto(&goals);

    assert!(!check.active);
    assert!(!check.compensated);
    assert_eq!(check.compensating_goal, None);
    assert_eq!(check.uncompensated, -1);
}

#[test]
fn kar_veto_is_active_iff_failures_outnumber_compensations() {
    for failing in 0..4 {
        for exceeding in 0..4 {
            let mut goals = Vec::new();
            for index in 0..failing {
                goals.push(goal(&format!("f-{index}"), 1, 10, GoalType::Kar));
            }
            for index in 0..exceeding {
                goals.push(goal(&format!("e-{index}"), 3, 10, GoalType::Kar));
            }
            goals.push(goal("std", 2, 10, GoalType::Standard));

            let check = check_kar_veto(&goals);
            assert_eq!(check.active, failing > exceeding, "n={failing} m={exceeding}");
            assert_eq!(
                check.compensated,
                failing > 0 && failing <= exceeding,
                "n={failing} m={exceeding}"
            );
        }
    }
}

#[test]
fn kar_compensation_ignores_other_goal_types() {
    let goals = vec![
        goal("kar", 1, 50, GoalType::Kar),
        goal("std", 3, 25, GoalType::Standard),
        goal("scf", 3, 25, GoalType::Scf),
    ];

    assert!(check_kar_veto(&goals).active);
}

#[test]
fn how_score_is_plain_mean() {
    let result = calculate_how_score(&competencies(&[2, 3, 2, 2, 3, 2]));

    assert_close(result.score, 2.33);
    assert!(!result.veto_active);
}

#[test]
fn any_competency_scoring_one_vetoes_how() {
    let scores = competencies(&[1, 2, 3, 2, 1, 3]);

    let check = check_competency_veto(&scores);
    assert!(check.active);
    assert_eq!(check.trigger.map(|id| id.0), Some("c-0".to_string()));

    assert_eq!(
        calculate_how_score(&scores),
        AxisScoreResult {
            score: 1.0,
            veto_active: true,
            veto_reason: Some(VetoReason::Competency),
        }
    );
}

#[test]
fn calculators_are_idempotent() {
    let goals = vec![
        goal("g-1", 3, 33, GoalType::Kar),
        goal("g-2", 2, 33, GoalType::Standard),
        goal("g-3", 1, 34, GoalType::Kar),
    ];
    let scores = competencies(&[3, 2, 2]);

    let first = calculate_what_score(&goals);
    let second = calculate_what_score(&goals);
    assert_eq!(first.score.to_bits(), second.score.to_bits());
    assert_eq!(first, second);

    let first = calculate_how_score(&scores);
    let second = calculate_how_score(&scores);
    assert_eq!(first.score.to_bits(), second.score.to_bits());
}

#[test]
fn grid_position_rounds_and_clamps() {
    assert_eq!(grid_position(1.0), 1);
    assert_eq!(grid_position(1.49), 1);
    assert_eq!(grid_position(1.5), 2);
    assert_eq!(grid_position(2.49), 2);
    assert_eq!(grid_position(2.5), 3);
    assert_eq!(grid_position(3.0), 3);
    assert_eq!(grid_position(0.0), 1);
    assert_eq!(grid_position(7.2), 3);
    assert_eq!(grid_position(f64::NAN), 1);
}

#[test]
fn grid_position_stays_on_the_grid_across_the_score_range() {
    let mut score = 1.0;
    while score <= 3.0 {
        let position = grid_position(score);
        assert!((1..=3).contains(&position), "{score} -> {position}");
        assert_eq!(f64::from(position), score.round());
        score += 0.01;
    }
}

#[test]
fn scorecard_places_vetoed_reviews_in_the_bottom_column() {
    let goals = vec![
        goal("scf", 1, 50, GoalType::Scf),
        goal("std", 3, 50, GoalType::Standard),
    ];
    let card = ScoreCard::compute(&goals, &competencies(&[3, 3, 2]));

    assert_eq!(card.cell, GridCell { what: 1, how: 3 });
    assert_eq!(card.veto_reasons(), vec![VetoReason::Scf]);
}

#[test]
fn performance_grid_counts_cells() {
    let grid = PerformanceGrid::from_cells(vec![
        GridCell { what: 2, how: 2 },
        GridCell { what: 2, how: 2 },
        GridCell { what: 3, how: 1 },
        GridCell { what: 0, how: 4 },
    ]);

    assert_eq!(grid.count(2, 2), 2);
    assert_eq!(grid.count(3, 1), 1);
    assert_eq!(grid.count(1, 1), 0);
    assert_eq!(grid.cells[0][2], 1);
    assert_eq!(grid.total(), 3);
}
