//! 后端选择：按配置在构造时选定一个 LlmClient 实现
//!
//! DeepSeek 与 Gemini 都提供 OpenAI 兼容接口，复用 OpenAiClient，只是 base_url / Key 来源不同。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use crate::config::LlmSection;
use crate::core::AgentError;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

/// 支持的 LLM 后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    DeepSeek,
    Gemini,
    Mock,
}

impl FromStr for LlmProvider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            "gemini" => Ok(LlmProvider::Gemini),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(AgentError::Config(format!("Unsupported provider: {}", other))),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::DeepSeek => "deepseek",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Mock => "mock",
        };
        f.write_str(s)
    }
}

/// 创建 DeepSeek 客户端：Key 优先取配置，其次 DEEPSEEK_API_KEY
pub fn create_deepseek_client(model: Option<&str>, api_key: Option<&str>) -> OpenAiClient {
    let api_key = api_key
        .map(String::from)
        .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok());
    OpenAiClient::new(
        Some(DEEPSEEK_BASE_URL),
        model.unwrap_or(DEEPSEEK_CHAT),
        api_key.as_deref(),
    )
}

/// 创建 Gemini 客户端（OpenAI 兼容端点）；没有 Key 时报错
pub fn create_gemini_client(model: &str, api_key: Option<&str>) -> Result<OpenAiClient, AgentError> {
    let api_key = api_key
        .map(String::from)
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .ok_or_else(|| AgentError::Config("Gemini API key is required".to_string()))?;
    Ok(OpenAiClient::new(
        Some(GEMINI_OPENAI_BASE_URL),
        model,
        Some(api_key.as_str()),
    ))
}

/// 根据 [llm] 段创建后端
pub fn create_llm_from_config(section: &LlmSection) -> Result<Arc<dyn LlmClient>, AgentError> {
    let provider: LlmProvider = section.provider.parse()?;
    let api_key = section.api_key.as_deref();
    let client: Arc<dyn LlmClient> = match provider {
        LlmProvider::OpenAi => Arc::new(
            OpenAiClient::new(section.base_url.as_deref(), &section.model, api_key).with_generation(
                section.max_tokens,
                section.temperature,
                section.request_timeout_secs,
            ),
        ),
        LlmProvider::DeepSeek => Arc::new(create_deepseek_client(Some(&section.model), api_key).with_generation(
            section.max_tokens,
            section.temperature,
            section.request_timeout_secs,
        )),
        LlmProvider::Gemini => Arc::new(create_gemini_client(&section.model, api_key)?.with_generation(
            section.max_tokens,
            section.temperature,
            section.request_timeout_secs,
        )),
        // 演练模式：每次决策都直接 stop
        LlmProvider::Mock => Arc::new(MockLlmClient::always(json!({"action": "stop", "parameters": {}}))),
    };
    tracing::info!(provider = %provider, model = %section.model, "LLM backend selected");
    Ok(client)
}
