//! 长期记忆：跨运行的事件日志，按查询检索
//!
//! LongTermStore 是可插拔的存储/检索后端；当前实现为 InMemoryLongTerm（大小写不敏感的子串匹配，
//! 命中后按 importance 降序稳定排序），后续可接真实向量库而不改读写契约。

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::memory::MemoryItem;

/// 长期记忆后端：只追加；除按 id 更新 importance 外不修改已有条目
pub trait LongTermStore: Send + Sync {
    /// 追加一条（不等待任何索引）
    fn save(&self, item: MemoryItem);

    /// 按查询检索最相关的 top_k 条
    fn search(&self, query: &str, top_k: usize) -> Vec<MemoryItem>;

    /// 更新指定 id 的 importance；找到返回 true
    fn update_importance(&self, id: &str, importance: f64) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 向量后端使用的 embedding 模型名；子串检索实现只保存不使用
    fn embedding_model(&self) -> Option<&str> {
        None
    }
}

/// 进程内实现：子串匹配，无持久化
#[derive(Debug, Default)]
pub struct InMemoryLongTerm {
    memories: RwLock<Vec<MemoryItem>>,
    embedding_model: Option<String>,
}

impl InMemoryLongTerm {
    pub fn new(embedding_model: Option<String>) -> Self {
        Self {
            memories: RwLock::new(Vec::new()),
            embedding_model,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<MemoryItem>> {
        self.memories.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<MemoryItem>> {
        self.memories.write().unwrap_or_else(|e| e.into_inner())
    }

    /// 全部条目的快照（按写入顺序）
    pub fn snapshot(&self) -> Vec<MemoryItem> {
        self.read().clone()
    }
}

impl LongTermStore for InMemoryLongTerm {
    fn save(&self, item: MemoryItem) {
        self.write().push(item);
    }

    fn search(&self, query: &str, top_k: usize) -> Vec<MemoryItem> {
        let query_lower = query.to_lowercase();
        let mut results: Vec<MemoryItem> = self
            .read()
            .iter()
            .filter(|m| m.content().to_lowercase().contains(&query_lower))
            .cloned()
            .collect();
        // sort_by 是稳定排序：importance 相同的保持写入顺序
        results.sort_by(|a, b| b.importance().total_cmp(&a.importance()));
        results.truncate(top_k);
        results
    }

    fn update_importance(&self, id: &str, importance: f64) -> bool {
        let mut memories = self.write();
        match memories.iter_mut().find(|m| m.id() == id) {
            Some(item) => {
                item.set_importance(importance);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }
}
