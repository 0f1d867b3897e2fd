//! 安全闸门：动作台账 + HITL + 认证挑战 + 凭据
//!
//! 编排器在派发每个动作前调用 check_action_allowed；返回 false 时该动作记为失败结果而不派发。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::security::{
    CaptchaInfo, Credential, CredentialManager, HumanInTheLoop, HumanInput, SecurityPolicy,
};

/// 台账条目：每次检查都会追加，无论是否放行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub action: String,
    pub details: BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

pub struct SecurityGate {
    hitl: HumanInTheLoop,
    credentials: CredentialManager,
    action_history: Mutex<Vec<ActionRecord>>,
}

impl SecurityGate {
    pub fn new(policy: SecurityPolicy, human: Arc<dyn HumanInput>) -> Self {
        Self::with_credentials(policy, human, CredentialManager::new())
    }

    /// 使用自定义凭据管理器（如接入真实加密 codec）
    pub fn with_credentials(
        policy: SecurityPolicy,
        human: Arc<dyn HumanInput>,
        credentials: CredentialManager,
    ) -> Self {
        Self {
            hitl: HumanInTheLoop::new(policy, human),
            credentials,
            action_history: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        self.hitl.policy()
    }

    fn ledger(&self) -> MutexGuard<'_, Vec<ActionRecord>> {
        self.action_history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 先记台账，再交给 HITL 决定是否放行
    pub async fn check_action_allowed(
        &self,
        action: &str,
        details: &BTreeMap<String, Value>,
    ) -> bool {
        self.ledger().push(ActionRecord {
            action: action.to_string(),
            details: details.clone(),
            timestamp: Utc::now(),
        });

        let allowed = self.hitl.handle_sensitive_action(action, details).await;
        if !allowed {
            let mut event = BTreeMap::new();
            event.insert("action".to_string(), Value::from(action));
            self.log_security_event("action_denied", &event);
        }
        allowed
    }

    /// "2fa" / "captcha"（大小写不敏感）；其它类型记警告并返回 None
    pub async fn handle_authentication_challenge(
        &self,
        challenge_type: &str,
        details: &BTreeMap<String, Value>,
    ) -> Option<String> {
        match challenge_type.to_lowercase().as_str() {
            "2fa" => self.hitl.handle_2fa_request().await,
            "captcha" => {
                self.hitl
                    .handle_captcha_request(&CaptchaInfo::from_details(details))
                    .await
            }
            other => {
                tracing::warn!(challenge_type = other, "Unknown challenge type");
                None
            }
        }
    }

    pub fn store_credentials(&self, service: &str, username: &str, password: &str) {
        self.credentials.store_credential(service, username, password);
    }

    pub fn get_credentials(&self, service: &str) -> Option<Credential> {
        self.credentials.get_credential(service)
    }

    pub fn log_security_event(&self, event_type: &str, details: &BTreeMap<String, Value>) {
        let details = serde_json::to_string(details).unwrap_or_default();
        tracing::warn!(event_type, details = %details, "Security event");
    }

    /// 台账快照（按检查顺序）
    pub fn action_history(&self) -> Vec<ActionRecord> {
        self.ledger().clone()
    }
}
