//! Mock LLM 客户端（用于测试与演练，无需 API）
//!
//! 按顺序返回预先排队的 JSON（或错误）；队列耗尽后返回 fallback，未设置 fallback 则返回 LlmError::Exhausted。
//! 记录收到的每条提示词，便于断言调用次数与内容。

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{LlmClient, LlmError};

#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<Value, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    fallback: Option<Value>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 队列耗尽后始终返回 value
    pub fn always(value: Value) -> Self {
        Self {
            fallback: Some(value),
            ..Self::default()
        }
    }

    pub fn with_response(self, value: Value) -> Self {
        self.push_response(value);
        self
    }

    pub fn with_error(self, error: LlmError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    pub fn push_response(&self, value: Value) {
        lock(&self.responses).push_back(Ok(value));
    }

    /// 已收到的提示词（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete_json(&self, prompt: &str, _schema: &Value) -> Result<Value, LlmError> {
        lock(&self.prompts).push(prompt.to_string());
        match lock(&self.responses).pop_front() {
            Some(next) => next,
            None => self.fallback.clone().ok_or(LlmError::Exhausted),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_returns_in_order_then_exhausts() {
        let llm = MockLlmClient::new()
            .with_response(json!({"n": 1}))
            .with_error(LlmError::Api("boom".to_string()));
        assert_eq!(llm.complete_json("a", &json!({})).await, Ok(json!({"n": 1})));
        assert_eq!(
            llm.complete_json("b", &json!({})).await,
            Err(LlmError::Api("boom".to_string()))
        );
        assert_eq!(llm.complete_json("c", &json!({})).await, Err(LlmError::Exhausted));
        assert_eq!(llm.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_mock_fallback() {
        let llm = MockLlmClient::always(json!({"action": "stop"}));
        assert_eq!(
            llm.complete_json("x", &json!({})).await,
            Ok(json!({"action": "stop"}))
        );
        assert_eq!(llm.calls(), 1);
    }
}
