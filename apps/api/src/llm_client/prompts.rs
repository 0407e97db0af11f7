// Cross-cutting prompt fragments and the role-tagged message type.
// Each planner stage defines its own templates in planner/prompts.rs.

/// Rules shared by every analysis prompt: JSON only, nothing around it.
pub const JSON_ONLY_RULES: &str = "\
- Return JSON only, no markdown, no prose.
- Do not wrap the JSON in code fences.";

/// Who a prompt message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    Human,
}

impl Role {
    /// Role name on the chat-completions wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Human => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }
}
