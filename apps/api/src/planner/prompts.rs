// All LLM prompt templates for the career planner stages.
// Placeholders are `{name}` and are replaced with compact JSON before sending.

pub const SKILL_ANALYZER_SYSTEM: &str = "\
You are a precise skill analysis engine for career planning.

Rules:
{json_rules}
- Include a short reasoning field that summarizes key logic in 1-3 sentences.
- Be consistent and structured.";

pub const SKILL_ANALYZER_PROMPT: &str = r#"Analyze the user's skills against target roles.

Inputs (JSON):
- user_profile: {user_profile}
- skills: {skills}
- target_roles: {target_roles}

Output JSON schema:
{
  "summary": string,
  "strengths": string[],
  "gaps": string[],
  "missing_skills": string[],
  "role_fit": [{ "role": string, "fit_score": number, "notes": string }],
  "reasoning": string
}"#;

pub const MARKET_INTELLIGENCE_SYSTEM: &str = "\
You are a market intelligence engine focused on hiring trends.

Rules:
{json_rules}
- Include a short reasoning field that summarizes key logic in 1-3 sentences.
- Be concise and actionable.";

pub const MARKET_INTELLIGENCE_PROMPT: &str = r#"Provide market intelligence for the target roles based on skills and location.

Inputs (JSON):
- target_roles: {target_roles}
- skills: {skills}
- location: {location}
- experience_level: {experience_level}

Output JSON schema:
{
  "in_demand_skills": string[],
  "emerging_skills": string[],
  "skill_gaps": string[],
  "market_summary": string,
  "reasoning": string
}"#;

pub const CAREER_STRATEGY_SYSTEM: &str = "\
You are a career strategist. You must make a decision.

Rules:
{json_rules}
- Do NOT leave any field empty.
- If unsure, choose the closest-fit role.";

pub const CAREER_STRATEGY_PROMPT: &str = r#"Create a decisive career strategy based on skill and market analysis.

Inputs (JSON):
- user_profile: {user_profile}
- target_roles: {target_roles}
- skill_analysis: {skill_analysis}
- market_analysis: {market_analysis}

Output JSON schema (must be complete):
{
  "recommended_role": string,
  "alternative_roles": string[],
  "decision_rationale": string,
  "priority_focus_areas": string[]
}

Constraints:
- Recommend exactly one role in recommended_role.
- Provide a clear decision_rationale.
- Include at least 2 items in priority_focus_areas."#;

pub const ROADMAP_PLANNER_SYSTEM: &str = "\
You are a roadmap planning engine for career growth.

Rules:
{json_rules}
- Do NOT leave any field empty.
- If uncertain, make reasonable assumptions.";

pub const ROADMAP_PLANNER_PROMPT: &str = r#"Generate a roadmap from the strategy and analyses.

Inputs (JSON):
- strategy_analysis: {strategy_analysis}
- skill_analysis: {skill_analysis}
- market_analysis: {market_analysis}
- constraints: {constraints}

Output JSON schema (must be complete):
{
  "duration_months": string,
  "phases": [{ "name": string, "focus": string, "weeks": number[] }],
  "weekly_plan": [{ "week": number, "tasks": string[] }],
  "final_outcome": string
}

Constraints:
- duration_months is a string holding a whole number between 3 and 6 (inclusive), e.g. "4".
- Create at least 3 phases.
- Generate a week-by-week plan with a minimum of 4 weeks.
- Ensure the roadmap aligns with recommended_role and priority_focus_areas in strategy_analysis."#;

/// Fills `{key}` placeholders in `template` in a single pass.
///
/// Only template text is scanned; inserted values are copied verbatim, so a
/// value containing `{key}` is never substituted again. Braces that do not
/// name a known key (the JSON schemas) are left as they are.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let found = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (value, close))
        });

        match found {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_all_placeholders() {
        let out = render(
            "a={a}, b={b}, a again={a}",
            &[("a", "1".to_string()), ("b", "[\"x\"]".to_string())],
        );
        assert_eq!(out, "a=1, b=[\"x\"], a again=1");
    }

    #[test]
    fn test_render_leaves_schema_braces_alone() {
        let out = render(SKILL_ANALYZER_PROMPT, &[("skills", "[]".to_string())]);
        assert!(out.contains("\"summary\": string"));
        assert!(out.contains("- skills: []"));
        assert!(out.contains("- target_roles: {target_roles}"));
    }

    #[test]
    fn test_render_does_not_substitute_inside_values() {
        let out = render(
            "a={a}; b={b}",
            &[("a", "{b}".to_string()), ("b", "{a}".to_string())],
        );
        assert_eq!(out, "a={b}; b={a}");
    }

    #[test]
    fn test_render_handles_unclosed_and_unknown_braces() {
        let out = render("{x} {unknown} {", &[("x", "1".to_string())]);
        assert_eq!(out, "1 {unknown} {");
    }
}
