//! 动作意图与浏览器命令
//!
//! LLM 输出 ActionIntent（{"action": "click", "parameters": {...}}）；执行前经 to_command 解析为
//! 封闭的 BrowserCommand，缺参数或未知动作在这里转为 ActionError，由执行器落为失败结果而不是崩溃。

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 动作种类：六种已知动作；无法识别的标签保留在 Unknown 中，反序列化不会因此失败
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Click,
    Type,
    Scroll,
    Goto,
    Wait,
    Stop,
    Unknown(String),
}

/// 提示词与 JSON Schema 中列出的已知动作
pub const KNOWN_ACTIONS: [&str; 6] = ["click", "type", "scroll", "goto", "wait", "stop"];

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Scroll => "scroll",
            ActionKind::Goto => "goto",
            ActionKind::Wait => "wait",
            ActionKind::Stop => "stop",
            ActionKind::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ActionKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "click" => ActionKind::Click,
            "type" => ActionKind::Type,
            "scroll" => ActionKind::Scroll,
            "goto" => ActionKind::Goto,
            "wait" => ActionKind::Wait,
            "stop" => ActionKind::Stop,
            _ => ActionKind::Unknown(raw),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for ActionKind {
    fn schema_name() -> String {
        "ActionKind".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            enum_values: Some(KNOWN_ACTIONS.iter().map(|a| Value::from(*a)).collect()),
            ..Default::default()
        }
        .into()
    }
}

/// 单个动作意图：种类 + 参数映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionIntent {
    pub action: ActionKind,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

/// 解析动作参数时的可恢复错误（执行器将其转为失败的 ExecutionOutcome）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Missing {param} parameter for {action} action")]
    MissingParameter { action: String, param: String },

    #[error("Invalid {param} parameter for {action} action: {reason}")]
    InvalidParameter {
        action: String,
        param: String,
        reason: String,
    },

    #[error("Unknown action: {0}")]
    UnknownKind(String),
}

/// 解析后的浏览器命令（封闭枚举，执行器对其穷尽匹配）
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserCommand {
    Click { element_id: String },
    Type { element_id: String, text: String },
    Scroll { direction: ScrollDirection },
    Goto { url: String },
    Wait { duration: Duration },
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
        }
    }
}

impl ActionIntent {
    pub fn new(action: ActionKind) -> Self {
        Self {
            action,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn click(element_id: impl Into<String>) -> Self {
        Self::new(ActionKind::Click).with_param("element_id", element_id.into())
    }

    pub fn type_text(element_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(ActionKind::Type)
            .with_param("element_id", element_id.into())
            .with_param("text", text.into())
    }

    pub fn scroll(direction: ScrollDirection) -> Self {
        Self::new(ActionKind::Scroll).with_param("direction", direction.as_str())
    }

    pub fn goto(url: impl Into<String>) -> Self {
        Self::new(ActionKind::Goto).with_param("url", url.into())
    }

    pub fn wait(seconds: f64) -> Self {
        Self::new(ActionKind::Wait).with_param("seconds", seconds)
    }

    pub fn stop() -> Self {
        Self::new(ActionKind::Stop)
    }

    pub fn is_stop(&self) -> bool {
        self.action == ActionKind::Stop
    }

    /// 安全闸门使用的动作名：种类 + 参数值（如 "click checkout-button"）
    ///
    /// 输入文本（text）不进入动作名：它会出现在日志、审计记录与记忆中，可能是密码。
    /// 完整参数仍通过 details 交给闸门。
    pub fn security_label(&self) -> String {
        let mut label = self.action.as_str().to_string();
        for (name, value) in &self.parameters {
            if name == "text" {
                continue;
            }
            label.push(' ');
            match value {
                Value::String(s) => label.push_str(s),
                other => label.push_str(&other.to_string()),
            }
        }
        label
    }

    /// 字符串参数；数字 ID 也接受（LLM 常把元素 ID 写成数字）
    fn string_param(&self, name: &str) -> Option<String> {
        match self.parameters.get(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn required(&self, name: &str) -> Result<String, ActionError> {
        self.string_param(name)
            .ok_or_else(|| ActionError::MissingParameter {
                action: self.action.to_string(),
                param: name.to_string(),
            })
    }

    /// 解析为可执行命令：click/type 需要 element_id，type 需要 text，goto 需要 url
    pub fn to_command(&self) -> Result<BrowserCommand, ActionError> {
        match &self.action {
            ActionKind::Click => Ok(BrowserCommand::Click {
                element_id: self.required("element_id")?,
            }),
            ActionKind::Type => Ok(BrowserCommand::Type {
                element_id: self.required("element_id")?,
                text: self.required("text")?,
            }),
            ActionKind::Scroll => {
                let direction = match self.string_param("direction").as_deref() {
                    None => ScrollDirection::Down,
                    Some(d) if d.eq_ignore_ascii_case("down") => ScrollDirection::Down,
                    Some(d) if d.eq_ignore_ascii_case("up") => ScrollDirection::Up,
                    Some(other) => {
                        return Err(ActionError::InvalidParameter {
                            action: "scroll".to_string(),
                            param: "direction".to_string(),
                            reason: format!("expected up or down, got {}", other),
                        })
                    }
                };
                Ok(BrowserCommand::Scroll { direction })
            }
            ActionKind::Goto => Ok(BrowserCommand::Goto {
                url: self.required("url")?,
            }),
            ActionKind::Wait => {
                let seconds = match self.parameters.get("seconds") {
                    None => 1.0,
                    Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0),
                    Some(Value::String(s)) => {
                        s.trim().parse::<f64>().map_err(|e| ActionError::InvalidParameter {
                            action: "wait".to_string(),
                            param: "seconds".to_string(),
                            reason: e.to_string(),
                        })?
                    }
                    Some(other) => {
                        return Err(ActionError::InvalidParameter {
                            action: "wait".to_string(),
                            param: "seconds".to_string(),
                            reason: format!("expected a number, got {}", other),
                        })
                    }
                };
                // 负数、NaN 与超出 Duration 范围的值都在这里拒绝
                let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
                    ActionError::InvalidParameter {
                        action: "wait".to_string(),
                        param: "seconds".to_string(),
                        reason: format!("{} is not a valid duration", seconds),
                    }
                })?;
                Ok(BrowserCommand::Wait { duration })
            }
            ActionKind::Stop => Ok(BrowserCommand::Stop),
            ActionKind::Unknown(raw) => Err(ActionError::UnknownKind(raw.clone())),
        }
    }
}
