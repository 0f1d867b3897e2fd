//! 运行历史：只追加的 (动作, 结果) 序列
//!
//! 追加顺序就是执行顺序；不提供修改或删除接口。

use serde::Serialize;

use crate::browser::{ActionIntent, ExecutionOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// 从 0 开始的序号
    pub position: usize,
    pub action: ActionIntent,
    pub outcome: ExecutionOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条，返回它的序号
    pub fn append(&mut self, action: ActionIntent, outcome: ExecutionOutcome) -> usize {
        let position = self.entries.len();
        self.entries.push(HistoryEntry {
            position,
            action,
            outcome,
        });
        position
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_append_order() {
        let mut log = HistoryLog::new();
        assert_eq!(log.append(ActionIntent::goto("https://a.test"), ExecutionOutcome::success("ok", None)), 0);
        assert_eq!(log.append(ActionIntent::click("b"), ExecutionOutcome::failure("Element b not found")), 1);

        let entries = log.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].position, 1);
        assert!(!entries[1].outcome.success);
    }
}
