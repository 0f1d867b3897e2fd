//! 短期记忆：当前运行内的最近条目 + 临时上下文
//!
//! 条目超过 max_items 时淘汰最旧的一条（FIFO）；context 是键值草稿区，后写覆盖先写。

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use crate::memory::MemoryItem;

#[derive(Clone, Debug)]
pub struct ShortTermMemory {
    history: VecDeque<MemoryItem>,
    context: HashMap<String, Value>,
    max_items: usize,
}

impl ShortTermMemory {
    pub fn new(max_items: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(max_items.min(1024)),
            context: HashMap::new(),
            max_items,
        }
    }

    pub fn push(&mut self, item: MemoryItem) {
        self.history.push_back(item);
        while self.history.len() > self.max_items {
            self.history.pop_front();
        }
    }

    /// 最近 count 条，按写入顺序
    pub fn recent(&self, count: usize) -> Vec<MemoryItem> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn items(&self) -> impl Iterator<Item = &MemoryItem> {
        self.history.iter()
    }

    pub fn context(&self) -> &HashMap<String, Value> {
        &self.context
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: Value) {
        self.context.insert(key.into(), value);
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new(50)
    }
}
