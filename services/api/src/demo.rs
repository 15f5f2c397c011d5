use crate::infra::{InMemoryScoreStore, InMemorySubmitter};
use clap::Args;
use perf_review::config::ScoringConfig;
use perf_review::error::AppError;
use perf_review::review::router::{ReviewScores, ScoreCardRequest, TeamGridResponse};
use perf_review::review::{
    AxisSummary, CompetencyId, CompetencyScoreItem, GoalDefinition, GoalId, GoalScoreItem,
    GoalType, PerformanceGrid, ReviewId, SaveStatus, ScoreCard, ScoringError, ScoringSnapshot,
    ScoringStateManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Quiet period before edits are saved, in milliseconds (defaults to 1000).
    #[arg(long)]
    pub(crate) debounce_ms: Option<u64>,
    /// Skip the team grid portion of the demo.
    #[arg(long)]
    pub(crate) skip_team_grid: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file with `goals` and `competencies` arrays
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the score card as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let request: ScoreCardRequest = serde_json::from_str(&raw)?;
    let card = ScoreCard::compute(&request.goals, &request.competencies);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&card)?);
        return Ok(());
    }

    println!("Score card for {}", args.input.display());
    println!(
        "- WHAT {:.2}{} from {} goal(s)",
        card.what.score,
        veto_suffix(card.what.veto_reason.map(|reason| reason.summary())),
        request.goals.len()
    );
    println!(
        "- HOW  {:.2}{} from {} competency score(s)",
        card.how.score,
        veto_suffix(card.how.veto_reason.map(|reason| reason.summary())),
        request.competencies.len()
    );
    println!("- Grid cell: WHAT {} / HOW {}", card.cell.what, card.cell.how);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = args
        .debounce_ms
        .map(|millis| ScoringConfig {
            save_debounce: Duration::from_millis(millis),
        })
        .unwrap_or_default();
    let settle = config.save_debounce + Duration::from_millis(50);

    let store = Arc::new(InMemoryScoreStore::default());
    let submitter = InMemorySubmitter::default();
    let manager = ScoringStateManager::new(
        ReviewId::from("review-2025-demo"),
        store.clone(),
        config,
    );

    let definitions = demo_goals();
    manager.set_required_goals(definitions.iter().map(|goal| goal.id.clone()));
    manager.set_goal_definitions(definitions);
    manager.set_required_competencies(demo_competencies());

    println!("Performance review scoring demo");
    println!(
        "Save window: {} ms after the last edit",
        config.save_debounce.as_millis()
    );
    manager.load_scores().await?;
    render_snapshot("Loaded review", &manager.snapshot());

    println!("\nManager scores goals (one burst of edits)");
    manager.set_goal_score(&GoalId::from("platform-launch"), 1);
    manager.set_goal_feedback(&GoalId::from("platform-launch"), "Launch slipped a quarter");
    render_snapshot("After launch score", &manager.snapshot());
    manager.set_goal_score(&GoalId::from("cost-reduction"), 3);
    render_snapshot("After cost score", &manager.snapshot());
    manager.set_goal_score(&GoalId::from("incident-free"), 2);
    manager.set_goal_score(&GoalId::from("mentoring"), 2);
    render_snapshot("After remaining goals", &manager.snapshot());

    tokio::time::sleep(settle).await;
    println!(
        "  Saves sent so far: {} ({})",
        store.save_count(),
        save_label(&manager.snapshot().save_status)
    );

    match manager.submit(&submitter).await {
        Err(ScoringError::Incomplete {
            missing_goals,
            missing_competencies,
        }) => println!(
            "  Submission blocked: {} goal(s), {} competency score(s) missing",
            missing_goals.len(),
            missing_competencies.len()
        ),
        Err(err) => return Err(err.into()),
        Ok(()) => println!("  Submission unexpectedly accepted"),
    }

    println!("\nManager scores competencies");
    for (competency, score) in demo_competencies().iter().zip([3, 2, 3, 2]) {
        manager.set_competency_score(competency, score);
    }
    manager.set_competency_notes(&CompetencyId::from("collaboration"), "Pairs well across teams");
    render_snapshot("All scores entered", &manager.snapshot());

    manager.submit(&submitter).await?;
    println!(
        "  Submitted: {} | saves sent: {}",
        submitter
            .submitted()
            .iter()
            .map(|id| id.0.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        store.save_count()
    );
    manager.close();

    if args.skip_team_grid {
        return Ok(());
    }

    println!("\nTeam grid");
    let team = demo_team();
    let response = TeamGridResponse::from_reviews(&team);
    render_grid(&response.grid);
    if !response.vetoed.is_empty() {
        println!(
            "  VETO placements: {}",
            response
                .vetoed
                .iter()
                .map(|id| id.0.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

fn veto_suffix(summary: Option<&'static str>) -> String {
    summary
        .map(|summary| format!(" (VETO: {summary})"))
        .unwrap_or_default()
}

fn save_label(status: &SaveStatus) -> String {
    match status {
        SaveStatus::Saved { at } => format!("saved at {}", at.format("%H:%M:%S%.3f")),
        SaveStatus::Failed { message } => format!("save failed: {message}"),
        other => other.label().to_lowercase(),
    }
}

fn render_axis(name: &str, axis: &AxisSummary) -> String {
    let veto = veto_suffix(axis.result.veto_reason.map(|reason| reason.summary()));
    let position = axis
        .grid_position
        .map(|position| format!(", grid {position}"))
        .unwrap_or_default();
    format!(
        "{name} {:.2}{veto} [{} {}/{}{position}]",
        axis.result.score,
        axis.progress.label(),
        axis.scored,
        axis.required
    )
}

fn render_snapshot(title: &str, snapshot: &ScoringSnapshot) {
    println!("- {title}");
    println!(
        "    {} | {}",
        render_axis("WHAT", &snapshot.what),
        render_axis("HOW", &snapshot.how)
    );
    println!(
        "    {}/{} required scores entered | weights total {}% | {}",
        snapshot.completed_count,
        snapshot.required_count,
        snapshot.goal_weight_total,
        save_label(&snapshot.save_status)
    );
    if let Some(cell) = snapshot.cell {
        println!("    Grid cell: WHAT {} / HOW {}", cell.what, cell.how);
    }
}

fn render_grid(grid: &PerformanceGrid) {
    println!("  HOW \\ WHAT    1    2    3");
    for how in (1..=3u8).rev() {
        let row: Vec<String> = (1..=3u8)
            .map(|what| format!("{:>4}", grid.count(what, how)))
            .collect();
        println!("  {:>10} {}", how, row.join(" "));
    }
    println!("  {} review(s) placed", grid.total());
}

fn demo_goals() -> Vec<GoalDefinition> {
    vec![
        GoalDefinition {
            id: GoalId::from("platform-launch"),
            weight: 35,
            goal_type: GoalType::Kar,
        },
        GoalDefinition {
            id: GoalId::from("cost-reduction"),
            weight: 25,
            goal_type: GoalType::Kar,
        },
        GoalDefinition {
            id: GoalId::from("incident-free"),
            weight: 20,
            goal_type: GoalType::Scf,
        },
        GoalDefinition {
            id: GoalId::from("mentoring"),
            weight: 20,
            goal_type: GoalType::Standard,
        },
    ]
}

fn demo_competencies() -> Vec<CompetencyId> {
    ["collaboration", "customer-focus", "ownership", "communication"]
        .into_iter()
        .map(CompetencyId::from)
        .collect()
}

fn review_scores(
    review_id: &str,
    goals: &[(i32, i32, GoalType)],
    competencies: &[i32],
) -> ReviewScores {
    ReviewScores {
        review_id: ReviewId::from(review_id),
        scores: ScoreCardRequest {
            goals: goals
                .iter()
                .enumerate()
                .map(|(index, (score, weight, goal_type))| GoalScoreItem {
                    id: GoalId(format!("{review_id}-goal-{index}")),
                    score: *score,
                    weight: *weight,
                    goal_type: *goal_type,
                })
                .collect(),
            competencies: competencies
                .iter()
                .enumerate()
                .map(|(index, score)| CompetencyScoreItem {
                    id: CompetencyId(format!("{review_id}-competency-{index}")),
                    score: *score,
                })
                .collect(),
        },
    }
}

fn demo_team() -> Vec<ReviewScores> {
    vec![
        review_scores(
            "avery",
            &[(3, 50, GoalType::Kar), (3, 50, GoalType::Standard)],
            &[3, 3, 2, 3],
        ),
        review_scores(
            "blake",
            &[(2, 60, GoalType::Standard), (2, 40, GoalType::Scf)],
            &[2, 2, 2, 3],
        ),
        review_scores(
            "casey",
            &[(1, 40, GoalType::Scf), (3, 60, GoalType::Standard)],
            &[3, 2, 3, 3],
        ),
        review_scores(
            "devon",
            &[(1, 50, GoalType::Kar), (3, 50, GoalType::Kar)],
            &[2, 1, 3, 3],
        ),
        review_scores(
            "emery",
            &[(2, 100, GoalType::Standard)],
            &[2, 2, 2, 2],
        ),
    ]
}
