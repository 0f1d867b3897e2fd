//! 人在回路（HITL）：敏感动作确认、2FA 验证码、CAPTCHA
//!
//! 所有人工读取都带 policy.timeout_seconds 超时；确认超时视为拒绝，验证码超时返回 None。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::security::{HumanInput, SecurityPolicy};

/// 确认回复只接受 y / yes / true / 1（大小写不敏感，去除首尾空白）
pub fn is_affirmative(reply: &str) -> bool {
    matches!(
        reply.trim().to_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

/// CAPTCHA 描述：类型与可选图片地址
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptchaInfo {
    pub captcha_type: Option<String>,
    pub image_url: Option<String>,
}

impl CaptchaInfo {
    /// 从挑战详情中读取 "type" 与 "image_url"
    pub fn from_details(details: &BTreeMap<String, Value>) -> Self {
        let text = |key: &str| details.get(key).and_then(|v| v.as_str()).map(String::from);
        Self {
            captcha_type: text("type"),
            image_url: text("image_url"),
        }
    }
}

pub struct HumanInTheLoop {
    policy: SecurityPolicy,
    human: Arc<dyn HumanInput>,
}

impl HumanInTheLoop {
    pub fn new(policy: SecurityPolicy, human: Arc<dyn HumanInput>) -> Self {
        Self { policy, human }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// 阻塞式确认；timeout 为 None 时使用策略超时
    pub async fn request_confirmation(
        &self,
        action: &str,
        details: &BTreeMap<String, Value>,
        timeout_seconds: Option<u64>,
    ) -> bool {
        let timeout = timeout_seconds.unwrap_or(self.policy.timeout_seconds);
        let details_text = serde_json::to_string(details).unwrap_or_default();
        self.human
            .notify("\nSECURITY ALERT: Action requires confirmation");
        self.human.notify(&format!("Action: {}", action));
        self.human.notify(&format!("Details: {}", details_text));

        match self
            .human
            .read_line(
                "Allow this action? (y/n): ",
                std::time::Duration::from_secs(timeout),
            )
            .await
        {
            Some(reply) => is_affirmative(&reply),
            None => {
                self.human.notify(&format!(
                    "\nTimeout: No response within {} seconds",
                    timeout
                ));
                false
            }
        }
    }

    pub async fn handle_2fa_request(&self) -> Option<String> {
        self.human.notify("\nTwo-factor authentication required");
        match self
            .human
            .read_line("Enter 2FA code: ", self.policy.timeout())
            .await
        {
            Some(code) => Some(code.trim().to_string()),
            None => {
                self.human.notify(&format!(
                    "\nTimeout: 2FA code not provided within {} seconds",
                    self.policy.timeout_seconds
                ));
                None
            }
        }
    }

    pub async fn handle_captcha_request(&self, info: &CaptchaInfo) -> Option<String> {
        self.human.notify("\nCAPTCHA challenge detected");
        self.human.notify(&format!(
            "CAPTCHA type: {}",
            info.captcha_type.as_deref().unwrap_or("unknown")
        ));
        if let Some(url) = info.image_url.as_deref().filter(|u| !u.is_empty()) {
            self.human.notify(&format!("CAPTCHA image: {}", url));
        }

        match self
            .human
            .read_line("Enter CAPTCHA solution: ", self.policy.timeout())
            .await
        {
            Some(solution) => Some(solution.trim().to_string()),
            None => {
                self.human.notify(&format!(
                    "\nTimeout: CAPTCHA not solved within {} seconds",
                    self.policy.timeout_seconds
                ));
                None
            }
        }
    }

    /// HITL 关闭或非敏感动作直接放行，敏感动作走人工确认
    pub async fn handle_sensitive_action(
        &self,
        action: &str,
        details: &BTreeMap<String, Value>,
    ) -> bool {
        if !self.policy.hitl_enabled {
            return true;
        }
        if self.policy.is_sensitive(action) {
            return self.request_confirmation(action, details, None).await;
        }
        true
    }
}
