//! 结构化输出 LLM 抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Gemini / Mock）实现 LlmClient::complete_json：给定提示词与 JSON Schema，
//! 返回 JSON 值。complete_structured 在其上按 schemars 生成的 Schema 解析出具体类型。
//! 调用失败、输出不是 JSON、不满足 Schema 都原样向上传播，由编排器终止本次运行。

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM API error: {0}")]
    Api(String),

    #[error("Malformed LLM output: {0}")]
    MalformedOutput(String),

    #[error("LLM output does not match schema: {0}")]
    SchemaValidation(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    /// Mock 客户端脚本已耗尽
    #[error("No scripted LLM response left")]
    Exhausted,
}

/// 结构化输出 LLM 客户端：一个后端一个实现，在构造时选定
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 按给定 JSON Schema 生成一个 JSON 值
    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError>;

    /// 后端名（日志用）
    fn name(&self) -> &str {
        "llm"
    }
}

/// 结构化完成：由 T 的 JsonSchema 生成 Schema，调用后端并反序列化为 T
pub async fn complete_structured<T>(llm: &dyn LlmClient, prompt: &str) -> Result<T, LlmError>
where
    T: JsonSchema + DeserializeOwned,
{
    let schema = serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| LlmError::SchemaValidation(e.to_string()))?;
    tracing::debug!(backend = llm.name(), prompt_chars = prompt.len(), "structured completion");
    let raw = llm.complete_json(prompt, &schema).await?;
    serde_json::from_value(raw.clone())
        .map_err(|e| LlmError::SchemaValidation(format!("{}: {}", e, raw)))
}

/// 从模型文本中提取 JSON（```json ... ```、``` ... ``` 或首个 { 到最后一个 }）
pub fn extract_json(output: &str) -> Result<Value, LlmError> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start <= end {
            &trimmed[start..=end]
        } else {
            trimmed
        }
    } else {
        trimmed
    };

    serde_json::from_str(json_str)
        .map_err(|e| LlmError::MalformedOutput(format!("{}: {}", e, json_str)))
}
