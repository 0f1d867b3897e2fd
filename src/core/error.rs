//! 智能体错误类型与计划恢复动作
//!
//! AgentError 只表示会中止本次运行的错误（会话状态、LLM / 浏览器后端故障、配置、策略误用）。
//! 缺参数、未知动作、安全拒绝都不是错误，它们落为失败的 ExecutionOutcome 写入历史。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// 会话外调用观察 / 执行
    #[error("No active browser session: {0}")]
    SessionState(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Browser backend error: {0}")]
    Browser(String),

    #[error("Config error: {0}")]
    Config(String),

    /// 策略被要求做它不支持的事（如计划策略被要求逐步决策）
    #[error("Strategy error: {0}")]
    Strategy(String),
}

/// 计划步骤失败后，恢复处理器给出的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 重新派发同一动作（重试不写入历史）
    Retry,
    /// 放弃；消息写入 "Failed to execute step {i}: {msg}"
    Abort(String),
}
