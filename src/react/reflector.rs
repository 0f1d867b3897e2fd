//! Reflector：评估刚执行的动作是否恰当

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::browser::{ActionIntent, ExecutionOutcome, PageState};
use crate::core::AgentError;
use crate::llm::{complete_structured, LlmClient};
use crate::react::prompts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReflectionVerdict {
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub suggested_next_action: String,
}

pub struct Reflector {
    llm: Arc<dyn LlmClient>,
}

impl Reflector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn reflect(
        &self,
        task: &str,
        action: &ActionIntent,
        outcome: &ExecutionOutcome,
        page: &PageState,
    ) -> Result<ReflectionVerdict, AgentError> {
        let prompt = prompts::reflection_prompt(task, action, outcome, page);
        let verdict: ReflectionVerdict = complete_structured(self.llm.as_ref(), &prompt).await?;
        tracing::debug!(is_correct = verdict.is_correct, feedback = %verdict.feedback, "reflection");
        Ok(verdict)
    }
}
