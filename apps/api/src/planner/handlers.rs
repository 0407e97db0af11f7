//! Axum route handlers for the Career Plan API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::planner::pipeline::{self, PipelineError};
use crate::planner::stages::Stage;
use crate::planner::state::{PipelineState, StageOutput};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CareerPlanRequest {
    pub user_profile: Map<String, Value>,
    pub skills: Vec<String>,
    pub target_roles: Vec<String>,
}

/// Only the four analysis fields are exposed; inputs are not echoed back.
#[derive(Debug, Serialize)]
pub struct CareerPlanResponse {
    pub skill_analysis: StageOutput,
    pub market_analysis: StageOutput,
    pub strategy_analysis: StageOutput,
    pub roadmap: StageOutput,
}

impl From<PipelineState> for CareerPlanResponse {
    fn from(state: PipelineState) -> Self {
        Self {
            skill_analysis: state.skill_analysis,
            market_analysis: state.market_analysis,
            strategy_analysis: state.strategy_analysis,
            roadmap: state.roadmap,
        }
    }
}

/// POST /career-plan
///
/// Runs skill → market → strategy → roadmap analysis and returns all four results.
/// Any well-formed body is accepted; empty skill or role lists still run every stage.
pub async fn handle_career_plan(
    State(state): State<AppState>,
    Json(request): Json<CareerPlanRequest>,
) -> Result<Json<CareerPlanResponse>, AppError> {
    let initial = PipelineState::new(request.user_profile, request.skills, request.target_roles);
    let final_state = pipeline::run(state.llm.as_ref(), initial)
        .await
        .map_err(|e| {
            warn!(
                stage = %e.stage,
                completed = completed_stages(&e),
                "Career plan aborted, partial result discarded"
            );
            AppError::Llm(e.to_string())
        })?;

    Ok(Json(final_state.into()))
}

/// Number of stages that finished before the run failed.
fn completed_stages(err: &PipelineError) -> usize {
    Stage::ORDER
        .iter()
        .take_while(|&&stage| !err.partial.output(stage).is_empty())
        .count()
}
