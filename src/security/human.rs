//! 人工输入边界
//!
//! HumanInput 只有两个能力：向人展示消息、在超时内读一行回复。None 表示超时（或输入流已关闭）。

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[async_trait]
pub trait HumanInput: Send + Sync {
    /// 展示一条消息（不等待回复）
    fn notify(&self, message: &str);

    /// 展示 prompt 并读取一行；超时返回 None
    async fn read_line(&self, prompt: &str, timeout: Duration) -> Option<String>;
}

/// 终端实现：stdout 输出，tokio stdin 读取
pub struct ConsoleHuman {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleHuman {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for ConsoleHuman {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HumanInput for ConsoleHuman {
    fn notify(&self, message: &str) {
        println!("{}", message);
    }

    async fn read_line(&self, prompt: &str, timeout: Duration) -> Option<String> {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(prompt.as_bytes()).await;
        let _ = stdout.flush().await;

        let mut lines = self.lines.lock().await;
        match tokio::time::timeout(timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => Some(line),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!("Failed to read from stdin: {}", e);
                None
            }
            Err(_) => None,
        }
    }
}

/// 脚本化实现：按顺序返回预设回复（None 模拟超时），记录所有提示与通知
#[derive(Debug, Default)]
pub struct ScriptedHuman {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl ScriptedHuman {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: &str) -> Self {
        lock(&self.replies).push_back(Some(reply.to_string()));
        self
    }

    /// 下一次读取视为超时
    pub fn with_timeout(self) -> Self {
        lock(&self.replies).push_back(None);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        lock(&self.notifications).clone()
    }
}

#[async_trait]
impl HumanInput for ScriptedHuman {
    fn notify(&self, message: &str) {
        lock(&self.notifications).push(message.to_string());
    }

    async fn read_line(&self, prompt: &str, _timeout: Duration) -> Option<String> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.replies).pop_front().flatten()
    }
}
