//! 安全策略：HITL 开关、超时与敏感关键字
//!
//! 闸门构造后策略不可变。敏感判定为大小写不敏感的子串匹配（"removeItem" 命中 "remove"）。

use serde::Deserialize;

/// 默认敏感关键字
pub const DEFAULT_SENSITIVE_ACTIONS: [&str; 9] = [
    "payment", "purchase", "checkout", "login", "delete", "remove", "cancel", "2fa", "captcha",
];

/// [security] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    /// 关闭后所有动作直接放行
    pub hitl_enabled: bool,
    /// 预留：人工确认失败后的重试次数，目前不使用
    pub max_retries: u32,
    /// 人工输入等待秒数，超时即拒绝
    pub timeout_seconds: u64,
    pub sensitive_actions: Vec<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            hitl_enabled: true,
            max_retries: 3,
            timeout_seconds: 30,
            sensitive_actions: DEFAULT_SENSITIVE_ACTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SecurityPolicy {
    /// 关闭 HITL 的策略（无人值守运行 / 测试）
    pub fn permissive() -> Self {
        Self {
            hitl_enabled: false,
            ..Self::default()
        }
    }

    /// 任一关键字（小写）是动作名（小写）的子串即为敏感
    pub fn is_sensitive(&self, action: &str) -> bool {
        let action = action.to_lowercase();
        self.sensitive_actions
            .iter()
            .any(|keyword| action.contains(&keyword.to_lowercase()))
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}
