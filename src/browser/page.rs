//! 页面状态与执行结果

use serde::{Deserialize, Serialize};

/// 每步从观察者拉取的页面快照，不跨步缓存
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    pub title: String,
    pub content: String,
}

impl PageState {
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// 供提示词使用的多行摘要
    pub fn describe(&self) -> String {
        format!(
            "- URL: {}\n- Title: {}\n- Content: {}",
            self.url, self.title, self.content
        )
    }
}

/// 单次动作执行的结果；创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    pub page: Option<PageState>,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, page: Option<PageState>) -> Self {
        Self {
            success: true,
            message: message.into(),
            page,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            page: None,
        }
    }
}
