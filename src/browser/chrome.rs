//! Chrome 后端：使用 Headless Chrome 观察页面与执行动作
//!
//! 需启用 feature "browser" 且系统已安装 Chrome/Chromium。
//! headless_chrome 是同步 API，所有调用都放进 spawn_blocking，避免阻塞运行时。

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::browser::{ActionIntent, BrowserBackend, BrowserCommand, ExecutionOutcome, PageState};
use crate::config::BrowserSection;
use crate::core::AgentError;

/// 会话：浏览器进程 + 当前 Tab（Browser 被 drop 时关闭 Chrome）
struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

/// 一个编排器实例独占一个 ChromeBrowser
pub struct ChromeBrowser {
    headless: bool,
    max_content_chars: usize,
    settle: Duration,
    session: Arc<Mutex<Option<ChromeSession>>>,
}

/// element_id 既可以是 CSS 选择器，也可以是裸 id
fn selector_for(element_id: &str) -> String {
    let id = element_id.trim();
    if id.starts_with(['#', '.', '[']) || id.contains([' ', '>', ':']) {
        id.to_string()
    } else {
        format!("[id=\"{}\"]", id.replace('"', "\\\""))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect::<String>() + "\n...[truncated]"
    } else {
        text.to_string()
    }
}

impl ChromeBrowser {
    pub fn new(headless: bool, max_content_chars: usize) -> Self {
        Self {
            headless,
            max_content_chars,
            settle: Duration::from_millis(500),
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(section: &BrowserSection) -> Self {
        let mut browser = Self::new(section.headless, section.max_content_chars);
        browser.settle = Duration::from_millis(section.navigation_settle_ms);
        browser
    }

    fn ensure_active(&self) -> Result<(), AgentError> {
        let guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            Ok(())
        } else {
            Err(AgentError::SessionState(
                "Browser session not active. Call start_session() first.".to_string(),
            ))
        }
    }

    /// 在阻塞线程中取当前 Tab 执行 f：外层 Err 表示会话缺失或任务崩溃，内层 Err 是动作本身的失败
    async fn with_tab<T, F>(&self, f: F) -> Result<anyhow::Result<T>, AgentError>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let tab = {
                let guard = session.lock().unwrap_or_else(|e| e.into_inner());
                match guard.as_ref() {
                    Some(s) => Arc::clone(&s.tab),
                    None => {
                        return Err(AgentError::SessionState(
                            "Browser session not active. Call start_session() first.".to_string(),
                        ))
                    }
                }
            };
            Ok(f(&tab))
        })
        .await
        .map_err(|e| AgentError::Browser(format!("Task join: {}", e)))?
    }
}

#[async_trait]
impl BrowserBackend for ChromeBrowser {
    async fn start_session(&self) -> Result<(), AgentError> {
        let headless = self.headless;
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = session.lock().unwrap_or_else(|e| e.into_inner());
            if guard.is_some() {
                return Ok(());
            }
            let options = LaunchOptions {
                headless,
                ..Default::default()
            };
            let browser = Browser::new(options)
                .map_err(|e| AgentError::Browser(format!("Chrome launch failed: {}", e)))?;
            let tab = browser
                .new_tab()
                .map_err(|e| AgentError::Browser(format!("Browser tab failed: {}", e)))?;
            *guard = Some(ChromeSession {
                _browser: browser,
                tab,
            });
            Ok(())
        })
        .await
        .map_err(|e| AgentError::Browser(format!("Task join: {}", e)))??;
        tracing::info!(headless, "browser session started");
        Ok(())
    }

    async fn end_session(&self) -> Result<(), AgentError> {
        let closed = {
            let mut guard = self.session.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        if let Some(session) = closed {
            tokio::task::spawn_blocking(move || drop(session))
                .await
                .map_err(|e| AgentError::Browser(format!("Task join: {}", e)))?;
            tracing::info!("browser session closed");
        }
        Ok(())
    }

    async fn observe(&self) -> Result<PageState, AgentError> {
        let max_chars = self.max_content_chars;
        let page = self
            .with_tab(move |tab| {
                let url = tab.get_url();
                let title = tab.get_title()?;
                let body = tab.evaluate("document.body ? document.body.innerText : ''", false)?;
                let content = body
                    .value
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default();
                Ok(PageState {
                    url,
                    title,
                    content: truncate_chars(&content, max_chars),
                })
            })
            .await?;
        page.map_err(|e| AgentError::Browser(format!("Observe failed: {}", e)))
    }

    async fn execute(&self, action: &ActionIntent) -> Result<ExecutionOutcome, AgentError> {
        self.ensure_active()?;
        let command = match action.to_command() {
            Ok(c) => c,
            Err(e) => return Ok(ExecutionOutcome::failure(e.to_string())),
        };
        let start = Instant::now();
        let settle = self.settle;

        let result: anyhow::Result<String> = match command {
            BrowserCommand::Wait { duration } => {
                tokio::time::sleep(duration).await;
                Ok(format!("Waited for {} seconds", duration.as_secs_f64()))
            }
            BrowserCommand::Stop => Ok("Stop action received".to_string()),
            BrowserCommand::Goto { url } => {
                self.with_tab(move |tab| {
                    tab.navigate_to(&url)?;
                    tab.wait_until_navigated()?;
                    std::thread::sleep(settle);
                    Ok(format!("Navigated to {}", url))
                })
                .await?
            }
            BrowserCommand::Click { element_id } => {
                self.with_tab(move |tab| {
                    tab.wait_for_element(&selector_for(&element_id))?.click()?;
                    std::thread::sleep(settle);
                    Ok(format!("Clicked element {}", element_id))
                })
                .await?
            }
            BrowserCommand::Type { element_id, text } => {
                self.with_tab(move |tab| {
                    tab.wait_for_element(&selector_for(&element_id))?.click()?;
                    tab.type_str(&text)?;
                    Ok(format!("Typed '{}' into element {}", text, element_id))
                })
                .await?
            }
            BrowserCommand::Scroll { direction } => {
                self.with_tab(move |tab| {
                    let amount = match direction {
                        crate::browser::ScrollDirection::Up => -500,
                        crate::browser::ScrollDirection::Down => 500,
                    };
                    tab.evaluate(&format!("window.scrollBy(0, {})", amount), false)?;
                    Ok(format!("Scrolled {}", direction.as_str()))
                })
                .await?
            }
        };

        let audit = serde_json::json!({
            "event": "browser_action",
            "action": action.action.as_str(),
            "ok": result.is_ok(),
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        tracing::info!(audit = %audit.to_string(), "action");

        match result {
            Ok(message) => {
                let page = self.observe().await.ok();
                Ok(ExecutionOutcome::success(message, page))
            }
            Err(e) => Ok(ExecutionOutcome::failure(format!(
                "Error executing action {}: {}",
                action.action, e
            ))),
        }
    }
}
