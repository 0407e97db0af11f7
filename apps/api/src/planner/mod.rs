// Career planner: skill → market → strategy → roadmap.
// Every stage goes through llm_client::TextGenerator; no direct HTTP calls here.

pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod stages;
pub mod state;
