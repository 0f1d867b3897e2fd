//! 计划步骤的错误恢复
//!
//! 步骤执行失败后，编排器反复询问 RecoveryHandler：Retry 则重新派发同一动作（不写历史），
//! Abort 则以 "Failed to execute step {i}: {msg}" 中止运行。

use crate::browser::ExecutionOutcome;
use crate::core::RecoveryAction;
use crate::react::PlanStep;

pub trait RecoveryHandler: Send + Sync {
    /// attempt 为已重试次数（首次失败时为 0），outcome 为最近一次执行结果
    fn handle(&self, step: &PlanStep, outcome: &ExecutionOutcome, attempt: usize) -> RecoveryAction;
}

/// 不恢复：直接以失败消息中止
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecovery;

impl RecoveryHandler for NoRecovery {
    fn handle(&self, _step: &PlanStep, outcome: &ExecutionOutcome, _attempt: usize) -> RecoveryAction {
        RecoveryAction::Abort(outcome.message.clone())
    }
}

/// 最多重试 attempts 次，仍失败则以最后一次的消息中止
#[derive(Debug, Clone, Copy)]
pub struct RetryRecovery {
    pub attempts: usize,
}

impl RetryRecovery {
    pub fn new(attempts: usize) -> Self {
        Self { attempts }
    }
}

impl RecoveryHandler for RetryRecovery {
    fn handle(&self, step: &PlanStep, outcome: &ExecutionOutcome, attempt: usize) -> RecoveryAction {
        if attempt < self.attempts {
            tracing::debug!(
                action = %step.action.action,
                attempt = attempt + 1,
                max = self.attempts,
                "retrying failed plan step"
            );
            RecoveryAction::Retry
        } else {
            RecoveryAction::Abort(outcome.message.clone())
        }
    }
}

/// 按配置的重试次数选择处理器：0 为不恢复
pub fn recovery_from_retries(plan_retries: usize) -> Box<dyn RecoveryHandler> {
    if plan_retries == 0 {
        Box::new(NoRecovery)
    } else {
        Box::new(RetryRecovery::new(plan_retries))
    }
}
