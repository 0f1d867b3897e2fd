//! webpilot - Rust 浏览器自动化智能体
//!
//! 模块划分：
//! - **browser**: 外部浏览器边界（动作意图、页面状态、执行结果、后端 trait 与实现）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排器、三种决策策略、运行阶段、历史记录、错误与恢复
//! - **llm**: 结构化输出 LLM 抽象与实现（OpenAI 兼容 / DeepSeek / Gemini / Mock）
//! - **memory**: 短期 / 长期记忆
//! - **observability**: 日志初始化
//! - **react**: Reasoner、Planner、Reflector、Corrector 与提示词
//! - **security**: 敏感动作闸门、人工确认、2FA / CAPTCHA、凭据管理

pub mod browser;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod security;

pub use crate::core::{Orchestrator, RunResult, StrategyKind};
