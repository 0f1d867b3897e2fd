//! webpilot - 浏览器自动化智能体命令行
//!
//! 用法：webpilot [--config path/to/config.toml] <任务描述>
//! 入口：初始化日志、加载配置、组装浏览器 / LLM / 安全闸门 / 记忆，执行一次任务并打印结果。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use webpilot::browser::ChromeBrowser;
use webpilot::config::load_config;
use webpilot::llm::create_llm_from_config;
use webpilot::security::ConsoleHuman;
use webpilot::Orchestrator;

fn parse_args() -> anyhow::Result<(Option<PathBuf>, String)> {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            let path = args.next().context("--config requires a path")?;
            config_path = Some(PathBuf::from(path));
        } else {
            words.push(arg);
        }
    }
    let task = words.join(" ");
    if task.trim().is_empty() {
        bail!("usage: webpilot [--config <file>] <task>");
    }
    Ok((config_path, task))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    webpilot::observability::init();

    let (config_path, task) = parse_args()?;
    let config = load_config(config_path).context("Failed to load config")?;

    let llm = create_llm_from_config(&config.llm).context("Failed to create LLM backend")?;
    let backend = Arc::new(ChromeBrowser::from_config(&config.browser));
    let mut orchestrator = Orchestrator::from_config(&config, backend, llm, Arc::new(ConsoleHuman::new()))
        .context("Failed to create orchestrator")?;

    let result = orchestrator.run_task(&task).await;

    println!("\nResult: {}", result.message);
    for entry in &result.history {
        println!(
            "  {}. {} -> {} ({})",
            entry.position + 1,
            entry.action.security_label(),
            if entry.outcome.success { "ok" } else { "failed" },
            entry.outcome.message
        );
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
