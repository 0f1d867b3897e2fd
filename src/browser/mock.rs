//! 脚本化浏览器（用于测试与演练，无需 Chrome）
//!
//! 在内存中维护 url / title / content；goto 切换到预先登记的页面，点击登记为失败的元素 ID 时返回失败结果。

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::browser::{ActionIntent, BrowserBackend, BrowserCommand, ExecutionOutcome, PageState};
use crate::core::AgentError;

#[derive(Debug, Default)]
struct ScriptedState {
    active: bool,
    current: PageState,
    executed: Vec<ActionIntent>,
    sessions_started: usize,
    sessions_ended: usize,
    /// 元素 ID -> 剩余失败次数
    flaky: HashMap<String, usize>,
}

/// 脚本化后端：记录执行过的动作与会话开关次数，便于断言
#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    state: Mutex<ScriptedState>,
    pages: HashMap<String, PageState>,
    failing_elements: HashSet<String>,
    fail_start: bool,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个页面；goto 到该 URL 后 observe 返回它
    pub fn with_page(mut self, url: &str, title: &str, content: &str) -> Self {
        self.pages
            .insert(url.to_string(), PageState::new(url, title, content));
        self
    }

    /// 点击 / 输入该元素 ID 时返回失败结果
    pub fn with_failing_element(mut self, element_id: &str) -> Self {
        self.failing_elements.insert(element_id.to_string());
        self
    }

    /// 前 failures 次点击 / 输入该元素失败，之后成功
    pub fn with_flaky_element(self, element_id: &str, failures: usize) -> Self {
        self.lock().flaky.insert(element_id.to_string(), failures);
        self
    }

    /// start_session 直接失败（模拟浏览器启动失败）
    pub fn with_start_failure(mut self) -> Self {
        self.fail_start = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn sessions_started(&self) -> usize {
        self.lock().sessions_started
    }

    pub fn sessions_ended(&self) -> usize {
        self.lock().sessions_ended
    }

    /// 按顺序返回已派发的动作（含失败的）
    pub fn executed(&self) -> Vec<ActionIntent> {
        self.lock().executed.clone()
    }

    fn element_fails(&self, state: &mut ScriptedState, element_id: &str) -> bool {
        if self.failing_elements.contains(element_id) {
            return true;
        }
        match state.flaky.get_mut(element_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn ensure_active(state: &ScriptedState) -> Result<(), AgentError> {
        if state.active {
            Ok(())
        } else {
            Err(AgentError::SessionState(
                "Browser session not active. Call start_session() first.".to_string(),
            ))
        }
    }
}

#[async_trait]
impl BrowserBackend for ScriptedBrowser {
    async fn start_session(&self) -> Result<(), AgentError> {
        if self.fail_start {
            return Err(AgentError::Browser("Chrome launch failed (scripted)".to_string()));
        }
        let mut state = self.lock();
        state.active = true;
        state.sessions_started += 1;
        state.current = PageState::new("about:blank", "", "");
        Ok(())
    }

    async fn end_session(&self) -> Result<(), AgentError> {
        let mut state = self.lock();
        if state.active {
            state.active = false;
            state.sessions_ended += 1;
        }
        Ok(())
    }

    async fn observe(&self) -> Result<PageState, AgentError> {
        let state = self.lock();
        Self::ensure_active(&state)?;
        Ok(state.current.clone())
    }

    async fn execute(&self, action: &ActionIntent) -> Result<ExecutionOutcome, AgentError> {
        let command = {
            let mut state = self.lock();
            Self::ensure_active(&state)?;
            state.executed.push(action.clone());
            match action.to_command() {
                Ok(c) => c,
                Err(e) => return Ok(ExecutionOutcome::failure(e.to_string())),
            }
        };

        if let BrowserCommand::Wait { duration } = command {
            tokio::time::sleep(duration).await;
        }

        let mut state = self.lock();
        let outcome = match command {
            BrowserCommand::Click { element_id } => {
                if self.element_fails(&mut state, &element_id) {
                    ExecutionOutcome::failure(format!("Element {} not found", element_id))
                } else {
                    ExecutionOutcome::success(
                        format!("Clicked element {}", element_id),
                        Some(state.current.clone()),
                    )
                }
            }
            BrowserCommand::Type { element_id, text } => {
                if self.element_fails(&mut state, &element_id) {
                    ExecutionOutcome::failure(format!("Element {} not found", element_id))
                } else {
                    ExecutionOutcome::success(
                        format!("Typed '{}' into element {}", text, element_id),
                        Some(state.current.clone()),
                    )
                }
            }
            BrowserCommand::Scroll { direction } => ExecutionOutcome::success(
                format!("Scrolled {}", direction.as_str()),
                Some(state.current.clone()),
            ),
            BrowserCommand::Goto { url } => {
                state.current = self
                    .pages
                    .get(&url)
                    .cloned()
                    .unwrap_or_else(|| PageState::new(url.as_str(), url.as_str(), ""));
                ExecutionOutcome::success(
                    format!("Navigated to {}", url),
                    Some(state.current.clone()),
                )
            }
            BrowserCommand::Wait { duration } => ExecutionOutcome::success(
                format!("Waited for {} seconds", duration.as_secs_f64()),
                Some(state.current.clone()),
            ),
            BrowserCommand::Stop => {
                ExecutionOutcome::success("Stop action received", Some(state.current.clone()))
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ActionKind;

    #[tokio::test]
    async fn test_observe_outside_session_is_session_error() {
        let browser = ScriptedBrowser::new();
        let err = browser.observe().await.unwrap_err();
        assert!(matches!(err, AgentError::SessionState(_)));
        let err = browser.execute(&ActionIntent::stop()).await.unwrap_err();
        assert!(matches!(err, AgentError::SessionState(_)));
    }

    #[tokio::test]
    async fn test_missing_parameters_are_failed_outcomes() {
        let browser = ScriptedBrowser::new();
        browser.start_session().await.unwrap();

        let outcome = browser
            .execute(&ActionIntent::new(ActionKind::Goto))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("url"));

        let outcome = browser
            .execute(&ActionIntent::new(ActionKind::Unknown("hover".to_string())))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Unknown action: hover");
    }

    #[tokio::test]
    async fn test_goto_switches_page() {
        let browser = ScriptedBrowser::new().with_page("https://shop.test", "Shop", "Welcome");
        browser.start_session().await.unwrap();
        let outcome = browser
            .execute(&ActionIntent::goto("https://shop.test"))
            .await
            .unwrap();
        assert!(outcome.success);
        let page = browser.observe().await.unwrap();
        assert_eq!(page.title, "Shop");
        assert_eq!(outcome.page, Some(page));
    }

    #[tokio::test]
    async fn test_failing_element() {
        let browser = ScriptedBrowser::new().with_failing_element("buy");
        browser.start_session().await.unwrap();
        let outcome = browser.execute(&ActionIntent::click("buy")).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(browser.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_flaky_element_recovers() {
        let browser = ScriptedBrowser::new().with_flaky_element("buy", 1);
        browser.start_session().await.unwrap();
        assert!(!browser.execute(&ActionIntent::click("buy")).await.unwrap().success);
        assert!(browser.execute(&ActionIntent::click("buy")).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_end_session_counts_once() {
        let browser = ScriptedBrowser::new();
        browser.start_session().await.unwrap();
        browser.end_session().await.unwrap();
        browser.end_session().await.unwrap();
        assert_eq!(browser.sessions_started(), 1);
        assert_eq!(browser.sessions_ended(), 1);
        assert!(!browser.is_active());
    }
}
