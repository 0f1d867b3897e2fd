//! Reasoner：根据任务与当前页面决定下一步动作

use std::sync::Arc;

use crate::browser::{ActionIntent, PageState};
use crate::core::{AgentError, HistoryEntry};
use crate::llm::{complete_structured, LlmClient};
use crate::memory::MemoryItem;
use crate::react::prompts;

pub struct Reasoner {
    llm: Arc<dyn LlmClient>,
}

impl Reasoner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 一次结构化请求，返回恰好一个动作
    pub async fn decide(
        &self,
        task: &str,
        page: &PageState,
        history: &[HistoryEntry],
        recalled: &[MemoryItem],
    ) -> Result<ActionIntent, AgentError> {
        let prompt = prompts::reasoning_prompt(task, page, history, recalled);
        let action: ActionIntent = complete_structured(self.llm.as_ref(), &prompt).await?;
        tracing::debug!(action = %action.action, "reasoner decided");
        Ok(action)
    }
}
