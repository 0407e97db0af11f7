//! Stage executors — one per analysis step.
//!
//! Each stage reads a fixed set of fields from `PipelineState`, builds its
//! prompt, calls the generator once, and returns its normalized output.
//! Only a generation failure is an error; malformed text degrades to defaults.

use std::fmt;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_RULES;
use crate::llm_client::{LlmError, PromptMessage, TextGenerator};
use crate::planner::extract::extract_json;
use crate::planner::normalize::{normalize, FieldKind, StageSchema};
use crate::planner::prompts::{
    render, CAREER_STRATEGY_PROMPT, CAREER_STRATEGY_SYSTEM, MARKET_INTELLIGENCE_PROMPT,
    MARKET_INTELLIGENCE_SYSTEM, ROADMAP_PLANNER_PROMPT, ROADMAP_PLANNER_SYSTEM,
    SKILL_ANALYZER_PROMPT, SKILL_ANALYZER_SYSTEM,
};
use crate::planner::state::{PipelineState, StageOutput};

/// Duration window handed to the roadmap planner.
const ROADMAP_DURATION_MONTHS: &str = "3-6";

static SKILL_SCHEMA: StageSchema = StageSchema {
    fields: &[
        ("summary", FieldKind::Text),
        ("strengths", FieldKind::List),
        ("gaps", FieldKind::List),
        ("role_fit", FieldKind::List),
    ],
    diagnostic_field: "summary",
};

static MARKET_SCHEMA: StageSchema = StageSchema {
    fields: &[
        ("in_demand_skills", FieldKind::List),
        ("emerging_skills", FieldKind::List),
        ("skill_gaps", FieldKind::List),
        ("market_summary", FieldKind::Text),
    ],
    diagnostic_field: "market_summary",
};

static STRATEGY_SCHEMA: StageSchema = StageSchema {
    fields: &[
        ("recommended_role", FieldKind::Text),
        ("alternative_roles", FieldKind::List),
        ("decision_rationale", FieldKind::Text),
        ("priority_focus_areas", FieldKind::List),
    ],
    diagnostic_field: "decision_rationale",
};

// duration_months is kept as a string; the prompt asks for one too.
static ROADMAP_SCHEMA: StageSchema = StageSchema {
    fields: &[
        ("duration_months", FieldKind::Text),
        ("phases", FieldKind::List),
        ("weekly_plan", FieldKind::List),
        ("final_outcome", FieldKind::Text),
    ],
    diagnostic_field: "final_outcome",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Skill,
    Market,
    Strategy,
    Roadmap,
}

impl Stage {
    /// Execution order. Every run visits all four, in this order, once.
    pub const ORDER: [Stage; 4] = [Stage::Skill, Stage::Market, Stage::Strategy, Stage::Roadmap];

    /// The `PipelineState` field this stage writes.
    pub fn state_key(self) -> &'static str {
        match self {
            Stage::Skill => "skill_analysis",
            Stage::Market => "market_analysis",
            Stage::Strategy => "strategy_analysis",
            Stage::Roadmap => "roadmap",
        }
    }

    pub fn schema(self) -> &'static StageSchema {
        match self {
            Stage::Skill => &SKILL_SCHEMA,
            Stage::Market => &MARKET_SCHEMA,
            Stage::Strategy => &STRATEGY_SCHEMA,
            Stage::Roadmap => &ROADMAP_SCHEMA,
        }
    }

    /// Reads this stage's inputs from `state` and runs it.
    pub async fn execute(
        self,
        llm: &dyn TextGenerator,
        state: &PipelineState,
    ) -> Result<StageOutput, LlmError> {
        match self {
            Stage::Skill => analyze_skills(llm, &SkillInputs::from_state(state)).await,
            Stage::Market => analyze_market(llm, &MarketInputs::from_state(state)).await,
            Stage::Strategy => analyze_strategy(llm, &StrategyInputs::from_state(state)).await,
            Stage::Roadmap => analyze_roadmap(llm, &RoadmapInputs::from_state(state)).await,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_key())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Typed inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SkillInputs<'a> {
    pub resume_text: &'a str,
    pub skills: &'a [String],
    pub target_roles: &'a [String],
}

impl<'a> SkillInputs<'a> {
    pub fn from_state(state: &'a PipelineState) -> Self {
        Self {
            resume_text: state.profile_text("resume_text"),
            skills: &state.skills,
            target_roles: &state.target_roles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketInputs<'a> {
    pub target_roles: &'a [String],
    pub skills: &'a [String],
    pub location: Option<&'a str>,
    pub experience_level: Option<&'a str>,
}

impl<'a> MarketInputs<'a> {
    /// Location and experience level come from the profile when it has them.
    pub fn from_state(state: &'a PipelineState) -> Self {
        let non_empty = |s: &'a str| Some(s).filter(|s| !s.trim().is_empty());
        Self {
            target_roles: &state.target_roles,
            skills: &state.skills,
            location: non_empty(state.profile_text("location")),
            experience_level: non_empty(state.profile_text("experience_level")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyInputs<'a> {
    pub skill_analysis: &'a StageOutput,
    pub market_analysis: &'a StageOutput,
    pub target_roles: &'a [String],
}

impl<'a> StrategyInputs<'a> {
    pub fn from_state(state: &'a PipelineState) -> Self {
        Self {
            skill_analysis: &state.skill_analysis,
            market_analysis: &state.market_analysis,
            target_roles: &state.target_roles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoadmapInputs<'a> {
    pub strategy_analysis: &'a StageOutput,
    pub skill_analysis: &'a StageOutput,
    pub target_roles: &'a [String],
}

impl<'a> RoadmapInputs<'a> {
    pub fn from_state(state: &'a PipelineState) -> Self {
        Self {
            strategy_analysis: &state.strategy_analysis,
            skill_analysis: &state.skill_analysis,
            target_roles: &state.target_roles,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Executors
// ────────────────────────────────────────────────────────────────────────────

/// Skill gap analysis: summary, strengths, gaps, role_fit.
pub async fn analyze_skills(
    llm: &dyn TextGenerator,
    inputs: &SkillInputs<'_>,
) -> Result<StageOutput, LlmError> {
    let messages = vec![
        system_message(SKILL_ANALYZER_SYSTEM),
        PromptMessage::human(render(
            SKILL_ANALYZER_PROMPT,
            &[
                ("user_profile", json!({ "resume_text": inputs.resume_text }).to_string()),
                ("skills", json!(inputs.skills).to_string()),
                ("target_roles", json!(inputs.target_roles).to_string()),
            ],
        )),
    ];
    run_stage(llm, Stage::Skill, &messages).await
}

/// Market intelligence: in-demand and emerging skills, gaps, summary.
pub async fn analyze_market(
    llm: &dyn TextGenerator,
    inputs: &MarketInputs<'_>,
) -> Result<StageOutput, LlmError> {
    let messages = vec![
        system_message(MARKET_INTELLIGENCE_SYSTEM),
        PromptMessage::human(render(
            MARKET_INTELLIGENCE_PROMPT,
            &[
                ("target_roles", json!(inputs.target_roles).to_string()),
                ("skills", json!(inputs.skills).to_string()),
                ("location", json!(inputs.location.unwrap_or_default()).to_string()),
                (
                    "experience_level",
                    json!(inputs.experience_level.unwrap_or_default()).to_string(),
                ),
            ],
        )),
    ];
    run_stage(llm, Stage::Market, &messages).await
}

pub async fn analyze_strategy(
    llm: &dyn TextGenerator,
    inputs: &StrategyInputs<'_>,
) -> Result<StageOutput, LlmError> {
    let messages = vec![
        system_message(CAREER_STRATEGY_SYSTEM),
        PromptMessage::human(render(
            CAREER_STRATEGY_PROMPT,
            &[
                ("user_profile", Value::Object(Map::new()).to_string()),
                ("target_roles", json!(inputs.target_roles).to_string()),
                ("skill_analysis", json!(inputs.skill_analysis).to_string()),
                ("market_analysis", json!(inputs.market_analysis).to_string()),
            ],
        )),
    ];
    run_stage(llm, Stage::Strategy, &messages).await
}

pub async fn analyze_roadmap(
    llm: &dyn TextGenerator,
    inputs: &RoadmapInputs<'_>,
) -> Result<StageOutput, LlmError> {
    let constraints = json!({
        "target_roles": inputs.target_roles,
        "duration_months": ROADMAP_DURATION_MONTHS,
    });
    let messages = vec![
        system_message(ROADMAP_PLANNER_SYSTEM),
        PromptMessage::human(render(
            ROADMAP_PLANNER_PROMPT,
            &[
                ("strategy_analysis", json!(inputs.strategy_analysis).to_string()),
                ("skill_analysis", json!(inputs.skill_analysis).to_string()),
                ("market_analysis", Value::Object(Map::new()).to_string()),
                ("constraints", constraints.to_string()),
            ],
        )),
    ];
    run_stage(llm, Stage::Roadmap, &messages).await
}

fn system_message(template: &str) -> PromptMessage {
    PromptMessage::system(render(template, &[("json_rules", JSON_ONLY_RULES.to_string())]))
}

async fn run_stage(
    llm: &dyn TextGenerator,
    stage: Stage,
    messages: &[PromptMessage],
) -> Result<StageOutput, LlmError> {
    let raw_text = llm.generate(messages).await?;

    let extracted = extract_json(&raw_text);
    if !extracted.is_parsed() {
        warn!(
            %stage,
            response_len = raw_text.len(),
            "Model output contained no JSON object, using defaults"
        );
    }

    let output = normalize(&extracted, stage.schema());
    info!(%stage, "Stage output normalized");
    Ok(output)
}
