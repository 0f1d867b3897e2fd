//! Planner：一次性生成完整计划
//!
//! 计划在任何执行之前生成一次，之后严格按顺序执行，不重新规划。

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::browser::ActionIntent;
use crate::core::AgentError;
use crate::llm::{complete_structured, LlmClient};
use crate::react::prompts;

/// 计划中的一步：动作字段平铺（{"action", "parameters", "description"}）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanStep {
    #[serde(flatten)]
    pub action: ActionIntent,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub struct Planner {
    llm: Arc<dyn LlmClient>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn create_plan(&self, task: &str) -> Result<Plan, AgentError> {
        let plan: Plan = complete_structured(self.llm.as_ref(), &prompts::planning_prompt(task)).await?;
        tracing::info!(steps = plan.len(), "plan created");
        Ok(plan)
    }
}
