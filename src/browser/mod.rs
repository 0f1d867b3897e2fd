//! 浏览器边界：观察（observe）、执行（execute）与会话生命周期
//!
//! 编排器只依赖 BrowserBackend trait；真实实现（headless_chrome，feature "browser"）与
//! 脚本化实现（测试 / 演练）在构造时选定。

pub mod action;
#[cfg(feature = "browser")]
pub mod chrome;
pub mod mock;
pub mod page;

use async_trait::async_trait;

use crate::core::AgentError;

pub use action::{ActionError, ActionIntent, ActionKind, BrowserCommand, ScrollDirection, KNOWN_ACTIONS};
#[cfg(feature = "browser")]
pub use chrome::ChromeBrowser;
pub use mock::ScriptedBrowser;
pub use page::{ExecutionOutcome, PageState};

/// 浏览器后端：每个编排器实例独占一个，会话在 run 开始时打开、在所有退出路径上关闭
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    /// 打开会话
    async fn start_session(&self) -> Result<(), AgentError>;

    /// 关闭会话；会话未打开时为空操作
    async fn end_session(&self) -> Result<(), AgentError>;

    /// 拉取当前页面状态；会话外调用返回 AgentError::SessionState，空白页不报错
    async fn observe(&self) -> Result<PageState, AgentError>;

    /// 执行动作：缺参数、未知动作、元素找不到等都返回失败的 ExecutionOutcome，
    /// 只有会话缺失或后端本身崩溃才返回 Err
    async fn execute(&self, action: &ActionIntent) -> Result<ExecutionOutcome, AgentError>;
}
