//! 运行阶段：observe → decide → execute → record → 终止检查
//!
//! 初始为 Observing；Done（选择了 stop、计划执行完或步数用完）与 Failed（不可恢复错误、计划中止）为终态。

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Observing,
    Deciding,
    Executing,
    Recording,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Observing => "observing",
            RunPhase::Deciding => "deciding",
            RunPhase::Executing => "executing",
            RunPhase::Recording => "recording",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_is_observing() {
        assert_eq!(RunPhase::default(), RunPhase::Observing);
        assert!(!RunPhase::default().is_terminal());
        assert!(RunPhase::Failed.is_terminal());
    }
}
