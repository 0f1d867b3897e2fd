//! 记忆管理器：短期 + 长期
//!
//! 编排器在任务开始时写入短期上下文、召回长期记忆，结束时把任务结果写入长期记忆。
//! 写入都是直接追加，调用方不等待任何索引。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::MemorySection;
use crate::memory::{InMemoryLongTerm, LongTermStore, MemoryItem, ShortTermMemory};

/// 交互记录默认重要度
pub const INTERACTION_IMPORTANCE: f64 = 0.5;
/// 任务结果默认重要度
pub const TASK_RESULT_IMPORTANCE: f64 = 0.8;
/// 用户偏好默认重要度
pub const PREFERENCE_IMPORTANCE: f64 = 0.9;

pub struct MemoryManager {
    short_term: ShortTermMemory,
    long_term: Arc<dyn LongTermStore>,
}

impl MemoryManager {
    pub fn new(short_term_max_items: usize, embedding_model: Option<String>) -> Self {
        Self::with_store(
            short_term_max_items,
            Arc::new(InMemoryLongTerm::new(embedding_model)),
        )
    }

    /// 使用自定义长期记忆后端（可在多个管理器间共享）
    pub fn with_store(short_term_max_items: usize, long_term: Arc<dyn LongTermStore>) -> Self {
        Self {
            short_term: ShortTermMemory::new(short_term_max_items),
            long_term,
        }
    }

    pub fn from_config(section: &MemorySection) -> Self {
        Self::new(section.short_term_max_items, section.embedding_model.clone())
    }

    pub fn short_term(&self) -> &ShortTermMemory {
        &self.short_term
    }

    pub fn long_term(&self) -> &Arc<dyn LongTermStore> {
        &self.long_term
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.long_term.embedding_model()
    }

    // ---------- 短期 ----------

    pub fn add_to_short_term(&mut self, item: MemoryItem) {
        self.short_term.push(item);
    }

    /// 当前上下文的拷贝
    pub fn get_context(&self) -> HashMap<String, Value> {
        self.short_term.context().clone()
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.short_term.context().get(key)
    }

    pub fn update_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.short_term.set_context(key, value.into());
    }

    pub fn get_recent_history(&self, count: usize) -> Vec<MemoryItem> {
        self.short_term.recent(count)
    }

    // ---------- 长期 ----------

    pub fn add_to_long_term(&self, item: MemoryItem) {
        self.long_term.save(item);
    }

    pub fn search_long_term(&self, query: &str, top_k: usize) -> Vec<MemoryItem> {
        self.long_term.search(query, top_k)
    }

    pub fn update_memory_importance(&self, memory_id: &str, importance: f64) -> bool {
        self.long_term.update_importance(memory_id, importance)
    }

    /// 记录一次交互（用户输入 + 智能体回复 + 可选页面状态），返回条目 id
    pub fn save_interaction_to_long_term(
        &self,
        user_input: &str,
        agent_response: &str,
        page_state: Option<&str>,
        importance: Option<f64>,
    ) -> String {
        let page_state = page_state.unwrap_or("");
        let mut metadata = BTreeMap::new();
        metadata.insert("user_input".to_string(), json!(user_input));
        metadata.insert("agent_response".to_string(), json!(agent_response));
        metadata.insert("page_state".to_string(), json!(page_state));

        let item = MemoryItem::new(
            format!(
                "User: {}\nAgent: {}\nPage: {}",
                user_input, agent_response, page_state
            ),
            metadata,
            importance.unwrap_or(INTERACTION_IMPORTANCE),
        );
        let id = item.id().to_string();
        self.add_to_long_term(item);
        id
    }

    /// 记录一次任务结果，返回条目 id
    pub fn save_task_result_to_long_term(
        &self,
        task: &str,
        result: &str,
        success: bool,
        importance: Option<f64>,
    ) -> String {
        let mut metadata = BTreeMap::new();
        metadata.insert("task".to_string(), json!(task));
        metadata.insert("result".to_string(), json!(result));
        metadata.insert("success".to_string(), json!(success));

        let item = MemoryItem::new(
            format!("Task: {}\nResult: {}\nSuccess: {}", task, result, success),
            metadata,
            importance.unwrap_or(TASK_RESULT_IMPORTANCE),
        );
        let id = item.id().to_string();
        tracing::debug!(memory_id = %id, success, "task result saved to long-term memory");
        self.add_to_long_term(item);
        id
    }

    /// 记录一条用户偏好（内容含 "preference"，metadata.preferences 为 {key: value}）
    pub fn save_user_preference(
        &self,
        key: &str,
        value: impl Into<Value>,
        importance: Option<f64>,
    ) -> String {
        let value = value.into();
        let mut metadata = BTreeMap::new();
        metadata.insert("preferences".to_string(), json!({ key: value.clone() }));

        let item = MemoryItem::new(
            format!("User preference: {} = {}", key, value),
            metadata,
            importance.unwrap_or(PREFERENCE_IMPORTANCE),
        );
        let id = item.id().to_string();
        self.add_to_long_term(item);
        id
    }

    /// 汇总偏好：按检索结果顺序合并各条目的 metadata.preferences，后出现的覆盖先出现的
    pub fn get_user_preferences(&self) -> BTreeMap<String, Value> {
        let mut preferences = BTreeMap::new();
        for memory in self.search_long_term("preference", 10) {
            if !memory.content().to_lowercase().contains("preference") {
                continue;
            }
            if let Some(Value::Object(prefs)) = memory.metadata().get("preferences") {
                for (k, v) in prefs {
                    preferences.insert(k.clone(), v.clone());
                }
            }
        }
        preferences
    }

    /// 常见任务：匹配 "task" 的条目中 metadata.task 的去重集合
    pub fn get_common_tasks(&self) -> HashSet<String> {
        self.search_long_term("task", 20)
            .iter()
            .filter_map(|m| m.metadata().get("task").and_then(|t| t.as_str()))
            .map(String::from)
            .collect()
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(50, None)
    }
}
