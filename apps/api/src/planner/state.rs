//! Pipeline state — the single record threaded through all four stages.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::planner::stages::Stage;

/// Key under which the orchestrator stamps each stage result.
pub const GENERATED_AT: &str = "generated_at";

/// Normalized output of one stage: a JSON object holding exactly the stage's
/// schema fields, plus `generated_at` once the orchestrator has stamped it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageOutput(Map<String, Value>);

impl StageOutput {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records when this result was produced, as ISO-8601 UTC.
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.0.insert(
            GENERATED_AT.to_string(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
    }
}

#[cfg(test)]
impl StageOutput {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn list(&self, field: &str) -> Option<&Vec<Value>> {
        self.0.get(field).and_then(Value::as_array)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.text(GENERATED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl From<Map<String, Value>> for StageOutput {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Inputs supplied by the caller plus the four accumulated stage results.
///
/// The analysis fields start empty and each is written once, by its own stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub user_profile: Map<String, Value>,
    pub skills: Vec<String>,
    pub target_roles: Vec<String>,
    #[serde(default)]
    pub skill_analysis: StageOutput,
    #[serde(default)]
    pub market_analysis: StageOutput,
    #[serde(default)]
    pub strategy_analysis: StageOutput,
    #[serde(default)]
    pub roadmap: StageOutput,
}

impl PipelineState {
    pub fn new(
        user_profile: Map<String, Value>,
        skills: Vec<String>,
        target_roles: Vec<String>,
    ) -> Self {
        Self {
            user_profile,
            skills,
            target_roles,
            ..Self::default()
        }
    }

    /// A string-valued profile attribute, or `""` when absent or not a string.
    pub fn profile_text(&self, key: &str) -> &str {
        self.user_profile
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn output(&self, stage: Stage) -> &StageOutput {
        match stage {
            Stage::Skill => &self.skill_analysis,
            Stage::Market => &self.market_analysis,
            Stage::Strategy => &self.strategy_analysis,
            Stage::Roadmap => &self.roadmap,
        }
    }

    /// The one field `stage` is allowed to write.
    pub(super) fn output_mut(&mut self, stage: Stage) -> &mut StageOutput {
        match stage {
            Stage::Skill => &mut self.skill_analysis,
            Stage::Market => &mut self.market_analysis,
            Stage::Strategy => &mut self.strategy_analysis,
            Stage::Roadmap => &mut self.roadmap,
        }
    }
}
