//! 运行过程事件：供前端 / 日志订阅者展示步数、动作、结果、反思与修正

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// 步数更新（从 0 开始）
    StepUpdate { step: usize, max_steps: usize },
    /// 计划已生成（步骤描述）
    PlanCreated { steps: Vec<String> },
    /// 决定执行的动作
    ActionChosen {
        action: String,
        parameters: serde_json::Value,
    },
    /// 安全闸门拒绝
    ActionDenied { label: String },
    /// 动作执行结果
    Outcome {
        action: String,
        success: bool,
        message: String,
    },
    /// 反思结论
    Reflection { is_correct: bool, feedback: String },
    /// 修正后的动作
    Correction { action: String },
    /// 运行结束
    Finished { success: bool, message: String },
    /// 终止运行的错误
    Error { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let ev = RunEvent::StepUpdate { step: 2, max_steps: 10 };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "step_update");
        assert_eq!(v["max_steps"], 10);
    }
}
