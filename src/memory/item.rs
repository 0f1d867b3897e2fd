//! 记忆条目
//!
//! id / timestamp / content / metadata 写入后不可变；只有 importance 可以按 id 更新（始终夹在 [0, 1]）。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    id: String,
    timestamp: DateTime<Utc>,
    content: String,
    metadata: BTreeMap<String, Value>,
    importance: f64,
}

fn clamp_importance(importance: f64) -> f64 {
    if importance.is_nan() {
        0.0
    } else {
        importance.clamp(0.0, 1.0)
    }
}

impl MemoryItem {
    /// 新条目：随机 UUID + 当前时间
    pub fn new(content: impl Into<String>, metadata: BTreeMap<String, Value>, importance: f64) -> Self {
        Self::with_id(
            uuid::Uuid::new_v4().to_string(),
            Utc::now(),
            content,
            metadata,
            importance,
        )
    }

    /// 指定 id 与时间（导入 / 测试用）
    pub fn with_id(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        content: impl Into<String>,
        metadata: BTreeMap<String, Value>,
        importance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            content: content.into(),
            metadata,
            importance: clamp_importance(importance),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn importance(&self) -> f64 {
        self.importance
    }

    pub(crate) fn set_importance(&mut self, importance: f64) {
        self.importance = clamp_importance(importance);
    }
}
