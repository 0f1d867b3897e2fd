//! Corrector：依据反思反馈给出一个替代动作（只生成，不执行）

use std::sync::Arc;

use crate::browser::{ActionIntent, ExecutionOutcome};
use crate::core::AgentError;
use crate::llm::{complete_structured, LlmClient};
use crate::react::prompts;

pub struct Corrector {
    llm: Arc<dyn LlmClient>,
}

impl Corrector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn correct(
        &self,
        task: &str,
        failed_action: &ActionIntent,
        outcome: &ExecutionOutcome,
        feedback: &str,
    ) -> Result<ActionIntent, AgentError> {
        let prompt = prompts::correction_prompt(task, failed_action, outcome, feedback);
        let action: ActionIntent = complete_structured(self.llm.as_ref(), &prompt).await?;
        tracing::debug!(from = %failed_action.action, to = %action.action, "corrected action");
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::PageState;
    use crate::llm::MockLlmClient;
    use crate::react::Reflector;
    use serde_json::json;

    #[tokio::test]
    async fn test_reflect_then_correct() {
        let llm = Arc::new(
            MockLlmClient::new()
                .with_response(json!({"is_correct": false, "feedback": "wrong button"}))
                .with_response(json!({"action": "click", "parameters": {"element_id": "cart"}})),
        );
        let failed = ActionIntent::click("buy");
        let outcome = ExecutionOutcome::failure("Element buy not found");

        let verdict = Reflector::new(llm.clone())
            .reflect("buy", &failed, &outcome, &PageState::default())
            .await
            .unwrap();
        assert!(!verdict.is_correct);
        assert_eq!(verdict.suggested_next_action, "");

        let corrected = Corrector::new(llm.clone())
            .correct("buy", &failed, &outcome, &verdict.feedback)
            .await
            .unwrap();
        assert_eq!(corrected, ActionIntent::click("cart"));
        assert!(llm.prompts()[1].contains("Feedback: wrong button"));
    }
}
