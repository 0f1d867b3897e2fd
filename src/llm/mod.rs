//! LLM 层：结构化输出抽象与实现（OpenAI 兼容 / DeepSeek / Gemini / Mock）

pub mod mock;
pub mod openai;
pub mod providers;
pub mod traits;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use providers::{
    create_deepseek_client, create_gemini_client, create_llm_from_config, LlmProvider,
    DEEPSEEK_BASE_URL, DEEPSEEK_CHAT, GEMINI_OPENAI_BASE_URL,
};
pub use traits::{complete_structured, extract_json, LlmClient, LlmError};
