//! Pipeline orchestrator — runs the four stages in fixed order over one state.
//!
//! Flow: skill_analysis → market_analysis → strategy_analysis → roadmap.
//! Each result is stamped with `generated_at` and written to its own field.
//! A generation failure stops the run; later stages never execute.

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::llm_client::{LlmError, TextGenerator};
use crate::planner::stages::Stage;
use crate::planner::state::PipelineState;

/// A run that stopped because the generator failed on `stage`.
///
/// `partial` holds the state as of the failure: earlier stages populated,
/// the failed stage and everything after it still empty.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: LlmError,
    pub partial: Box<PipelineState>,
}

/// Runs every stage once, in `Stage::ORDER`, and returns the populated state.
pub async fn run(
    llm: &dyn TextGenerator,
    state: PipelineState,
) -> Result<PipelineState, PipelineError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("career_plan", %run_id);
    run_stages(llm, state).instrument(span).await
}

async fn run_stages(
    llm: &dyn TextGenerator,
    mut state: PipelineState,
) -> Result<PipelineState, PipelineError> {
    info!(
        skills = state.skills.len(),
        target_roles = state.target_roles.len(),
        "Starting career plan pipeline"
    );

    for stage in Stage::ORDER {
        info!(%stage, "Running stage");

        let mut output = match stage.execute(llm, &state).await {
            Ok(output) => output,
            Err(source) => {
                error!(%stage, "Generation failed: {source}");
                return Err(PipelineError {
                    stage,
                    source,
                    partial: Box::new(state),
                });
            }
        };

        output.stamp(Utc::now());
        *state.output_mut(stage) = output;
    }

    info!("Career plan pipeline complete");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::{Reply, ScriptedGenerator};
    use crate::planner::normalize::INVALID_JSON_MESSAGE;
    use crate::planner::state::GENERATED_AT;
    use serde_json::{json, Map, Value};

    fn initial_state() -> PipelineState {
        let profile = json!({"resume_text": "Built REST APIs with Python; deployed on AWS."});
        PipelineState::new(
            profile.as_object().cloned().unwrap(),
            vec!["python".into()],
            vec!["Backend Engineer".into()],
        )
    }

    fn text(s: &str) -> Reply {
        Reply::Text(s.to_string())
    }

    fn well_formed_script() -> Vec<Reply> {
        vec![
            text(r#"{"summary": "Strong Python", "strengths": ["python"], "gaps": ["go"], "role_fit": []}"#),
            text(r#"```json
{"in_demand_skills": ["kubernetes"], "emerging_skills": [], "skill_gaps": "go", "market_summary": "Hot market"}
```"#),
            text(r#"{"recommended_role": "Backend Engineer", "alternative_roles": ["SRE"], "decision_rationale": "Best fit", "priority_focus_areas": ["go", "k8s"]}"#),
            text(r#"{"duration_months": "4", "phases": [{"name": "Foundations"}], "weekly_plan": [{"week": 1}], "final_outcome": "Job ready"}"#),
        ]
    }

    #[tokio::test]
    async fn test_non_json_service_fills_every_stage_with_defaults() {
        let llm = ScriptedGenerator::always("I'm sorry, I can't produce JSON today.");
        let state = run(&llm, initial_state()).await.unwrap();

        assert_eq!(state.skill_analysis.text("summary"), Some(INVALID_JSON_MESSAGE));
        assert_eq!(state.skill_analysis.get("strengths"), Some(&json!([])));
        assert_eq!(state.market_analysis.text("market_summary"), Some(INVALID_JSON_MESSAGE));
        assert_eq!(state.market_analysis.get("in_demand_skills"), Some(&json!([])));
        assert_eq!(state.strategy_analysis.text("recommended_role"), Some(""));
        assert_eq!(
            state.strategy_analysis.text("decision_rationale"),
            Some(INVALID_JSON_MESSAGE)
        );
        assert_eq!(state.roadmap.text("duration_months"), Some(""));
        assert_eq!(state.roadmap.text("final_outcome"), Some(INVALID_JSON_MESSAGE));

        for stage in Stage::ORDER {
            let output = state.output(stage);
            assert!(output.generated_at().is_some(), "{stage} missing generated_at");
            // Schema fields plus the timestamp.
            assert_eq!(output.keys().count(), stage.schema().fields.len() + 1);
        }
        assert_eq!(llm.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_timestamps_non_decreasing_in_stage_order() {
        let llm = ScriptedGenerator::script(well_formed_script());
        let state = run(&llm, initial_state()).await.unwrap();

        let stamps: Vec<_> = Stage::ORDER
            .iter()
            .map(|&s| state.output(s).generated_at().unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "{stamps:?}");
    }

    #[tokio::test]
    async fn test_well_formed_run_merges_each_stage() {
        let llm = ScriptedGenerator::script(well_formed_script());
        let state = run(&llm, initial_state()).await.unwrap();

        assert_eq!(state.skill_analysis.text("summary"), Some("Strong Python"));
        assert_eq!(state.market_analysis.get("skill_gaps"), Some(&json!(["go"])));
        assert_eq!(
            state.strategy_analysis.text("recommended_role"),
            Some("Backend Engineer")
        );
        assert_eq!(state.roadmap.text("duration_months"), Some("4"));
        assert!(state.roadmap.text(GENERATED_AT).is_some());
    }

    #[tokio::test]
    async fn test_later_stages_see_earlier_results() {
        let llm = ScriptedGenerator::script(well_formed_script());
        run(&llm, initial_state()).await.unwrap();

        let calls = llm.calls();
        assert!(!calls[0][1].content.contains("Strong Python"));
        // Market has no dependency on skill analysis.
        assert!(!calls[1][1].content.contains("Strong Python"));
        assert!(calls[2][1].content.contains("Strong Python"));
        assert!(calls[2][1].content.contains("Hot market"));
        assert!(calls[3][1].content.contains("Best fit"));
        assert!(calls[3][1].content.contains("Strong Python"));
    }

    #[tokio::test]
    async fn test_inputs_are_untouched_by_run() {
        let llm = ScriptedGenerator::script(well_formed_script());
        let before = initial_state();
        let after = run(&llm, before.clone()).await.unwrap();

        assert_eq!(after.user_profile, before.user_profile);
        assert_eq!(after.skills, before.skills);
        assert_eq!(after.target_roles, before.target_roles);
    }

    #[tokio::test]
    async fn test_each_stage_writes_only_its_own_field() {
        let llm = ScriptedGenerator::always("{}");
        let mut state = initial_state();

        for (i, stage) in Stage::ORDER.into_iter().enumerate() {
            let before = state.clone();
            let output = stage.execute(&llm, &state).await.unwrap();
            *state.output_mut(stage) = output;

            for (j, other) in Stage::ORDER.into_iter().enumerate() {
                if j == i {
                    assert!(!state.output(other).is_empty());
                } else {
                    assert_eq!(state.output(other), before.output(other));
                }
            }
            assert_eq!(state.user_profile, before.user_profile);
            assert_eq!(state.skills, before.skills);
            assert_eq!(state.target_roles, before.target_roles);
        }
    }

    #[tokio::test]
    async fn test_market_failure_stops_run_with_partial_state() {
        let llm = ScriptedGenerator::script(vec![
            text(r#"{"summary": "ok", "strengths": [], "gaps": [], "role_fit": []}"#),
            Reply::Fail,
        ]);
        let err = run(&llm, initial_state()).await.unwrap_err();

        assert_eq!(err.stage, Stage::Market);
        assert!(matches!(err.source, LlmError::Api { status: 503, .. }));
        assert_eq!(err.partial.skill_analysis.text("summary"), Some("ok"));
        assert!(err.partial.skill_analysis.generated_at().is_some());
        assert!(err.partial.market_analysis.is_empty());
        assert!(err.partial.strategy_analysis.is_empty());
        assert!(err.partial.roadmap.is_empty());
        // Strategy and roadmap were never attempted.
        assert_eq!(llm.calls().len(), 2);
        assert_eq!(err.to_string(), "market_analysis stage failed: API error (status 503): service unavailable");
    }

    #[tokio::test]
    async fn test_empty_inputs_still_run_all_stages() {
        let llm = ScriptedGenerator::always("{}");
        let state = run(&llm, PipelineState::new(Map::new(), vec![], vec![]))
            .await
            .unwrap();
        assert_eq!(state.skill_analysis.get("summary"), Some(&Value::String(String::new())));
        assert_eq!(llm.calls().len(), 4);
    }
}
