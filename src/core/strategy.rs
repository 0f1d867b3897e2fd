//! 决策策略：编排器骨架中可替换的「决定」部分
//!
//! - Reactive：每步问 Reasoner 要一个动作
//! - PlanAndExecute：先生成完整计划，失败步骤交给 RecoveryHandler
//! - Reflection：在 Reactive 基础上，每步执行后反思，判错则修正一次
//!
//! 编排器只依赖 DecisionStrategy；plan / recover / reflect / correct 都有默认实现，策略按需覆盖。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::browser::{ActionIntent, ExecutionOutcome, PageState};
use crate::config::AgentSection;
use crate::core::{recovery_from_retries, AgentError, HistoryEntry, RecoveryAction, RecoveryHandler};
use crate::llm::LlmClient;
use crate::memory::MemoryItem;
use crate::react::{Corrector, Plan, PlanStep, Planner, Reasoner, ReflectionVerdict, Reflector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Reactive,
    PlanAndExecute,
    Reflection,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Reactive => "reactive",
            StrategyKind::PlanAndExecute => "plan_and_execute",
            StrategyKind::Reflection => "reflection",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reactive" | "react" => Ok(StrategyKind::Reactive),
            "plan" | "plan_and_execute" => Ok(StrategyKind::PlanAndExecute),
            "reflection" | "reflect" => Ok(StrategyKind::Reflection),
            other => Err(AgentError::Config(format!("Unknown strategy: {}", other))),
        }
    }
}

/// 单步决策的输入
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub task: &'a str,
    /// 本步开始时拉取的页面
    pub page: &'a PageState,
    pub history: &'a [HistoryEntry],
    /// 运行开始时从长期记忆召回的条目
    pub recalled: &'a [MemoryItem],
    pub step: usize,
}

#[async_trait]
pub trait DecisionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// 可选的一次性计划；返回 Some 时编排器按计划执行，不再调用 decide_next
    async fn plan(&self, _task: &str) -> Result<Option<Plan>, AgentError> {
        Ok(None)
    }

    async fn decide_next(&self, ctx: &DecisionContext<'_>) -> Result<ActionIntent, AgentError>;

    /// 计划步骤失败后的恢复；默认不恢复
    fn recover(&self, _step: &PlanStep, outcome: &ExecutionOutcome, _attempt: usize) -> RecoveryAction {
        RecoveryAction::Abort(outcome.message.clone())
    }

    /// 执行后的反思；默认不反思
    async fn reflect(
        &self,
        _ctx: &DecisionContext<'_>,
        _action: &ActionIntent,
        _outcome: &ExecutionOutcome,
    ) -> Result<Option<ReflectionVerdict>, AgentError> {
        Ok(None)
    }

    /// 反思判错后给出一个替代动作
    async fn correct(
        &self,
        _task: &str,
        _action: &ActionIntent,
        _outcome: &ExecutionOutcome,
        _feedback: &str,
    ) -> Result<ActionIntent, AgentError> {
        Err(AgentError::Strategy(format!(
            "{} strategy does not support correction",
            self.kind()
        )))
    }
}

pub struct ReactiveStrategy {
    reasoner: Reasoner,
}

impl ReactiveStrategy {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            reasoner: Reasoner::new(llm),
        }
    }
}

#[async_trait]
impl DecisionStrategy for ReactiveStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Reactive
    }

    async fn decide_next(&self, ctx: &DecisionContext<'_>) -> Result<ActionIntent, AgentError> {
        self.reasoner
            .decide(ctx.task, ctx.page, ctx.history, ctx.recalled)
            .await
    }
}

pub struct PlanAndExecuteStrategy {
    planner: Planner,
    recovery: Box<dyn RecoveryHandler>,
}

impl PlanAndExecuteStrategy {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_recovery(llm, recovery_from_retries(0))
    }

    pub fn with_recovery(llm: Arc<dyn LlmClient>, recovery: Box<dyn RecoveryHandler>) -> Self {
        Self {
            planner: Planner::new(llm),
            recovery,
        }
    }
}

#[async_trait]
impl DecisionStrategy for PlanAndExecuteStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PlanAndExecute
    }

    async fn plan(&self, task: &str) -> Result<Option<Plan>, AgentError> {
        self.planner.create_plan(task).await.map(Some)
    }

    async fn decide_next(&self, _ctx: &DecisionContext<'_>) -> Result<ActionIntent, AgentError> {
        Err(AgentError::Strategy(
            "plan_and_execute strategy executes its plan and never decides step by step".to_string(),
        ))
    }

    fn recover(&self, step: &PlanStep, outcome: &ExecutionOutcome, attempt: usize) -> RecoveryAction {
        self.recovery.handle(step, outcome, attempt)
    }
}

pub struct ReflectionStrategy {
    reasoner: Reasoner,
    reflector: Reflector,
    corrector: Corrector,
    /// 只保存，不限制修正次数（步数上限仍由 max_steps 决定）
    max_reflections: usize,
}

impl ReflectionStrategy {
    pub fn new(llm: Arc<dyn LlmClient>, max_reflections: usize) -> Self {
        Self {
            reasoner: Reasoner::new(llm.clone()),
            reflector: Reflector::new(llm.clone()),
            corrector: Corrector::new(llm),
            max_reflections,
        }
    }

    pub fn max_reflections(&self) -> usize {
        self.max_reflections
    }
}

#[async_trait]
impl DecisionStrategy for ReflectionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Reflection
    }

    async fn decide_next(&self, ctx: &DecisionContext<'_>) -> Result<ActionIntent, AgentError> {
        self.reasoner
            .decide(ctx.task, ctx.page, ctx.history, ctx.recalled)
            .await
    }

    async fn reflect(
        &self,
        ctx: &DecisionContext<'_>,
        action: &ActionIntent,
        outcome: &ExecutionOutcome,
    ) -> Result<Option<ReflectionVerdict>, AgentError> {
        self.reflector
            .reflect(ctx.task, action, outcome, ctx.page)
            .await
            .map(Some)
    }

    async fn correct(
        &self,
        task: &str,
        action: &ActionIntent,
        outcome: &ExecutionOutcome,
        feedback: &str,
    ) -> Result<ActionIntent, AgentError> {
        self.corrector.correct(task, action, outcome, feedback).await
    }
}

/// 按 [agent] 配置构造策略
pub fn create_strategy(
    section: &AgentSection,
    llm: Arc<dyn LlmClient>,
) -> Result<Box<dyn DecisionStrategy>, AgentError> {
    let strategy: Box<dyn DecisionStrategy> = match section.strategy.parse::<StrategyKind>()? {
        StrategyKind::Reactive => Box::new(ReactiveStrategy::new(llm)),
        StrategyKind::PlanAndExecute => Box::new(PlanAndExecuteStrategy::with_recovery(
            llm,
            recovery_from_retries(section.plan_retries),
        )),
        StrategyKind::Reflection => Box::new(ReflectionStrategy::new(llm, section.max_reflections)),
    };
    Ok(strategy)
}
