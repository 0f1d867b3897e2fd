//! 核心编排层：错误与恢复、运行阶段、历史记录、决策策略、编排器

pub mod error;
pub mod history;
pub mod orchestrator;
pub mod recovery;
pub mod state;
pub mod strategy;

pub use error::{AgentError, RecoveryAction};
pub use history::{HistoryEntry, HistoryLog};
pub use orchestrator::{Orchestrator, RunResult, COMPLETED_MESSAGE};
pub use recovery::{recovery_from_retries, NoRecovery, RecoveryHandler, RetryRecovery};
pub use state::RunPhase;
pub use strategy::{
    create_strategy, DecisionContext, DecisionStrategy, PlanAndExecuteStrategy,
    ReactiveStrategy, ReflectionStrategy, StrategyKind,
};
