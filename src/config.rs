//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WEBPILOT__*` 覆盖（双下划线表示嵌套，如 `WEBPILOT__AGENT__STRATEGY=reflection`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::security::SecurityPolicy;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentSection,
    pub llm: LlmSection,
    pub browser: BrowserSection,
    pub memory: MemorySection,
    pub security: SecurityPolicy,
}

/// [agent] 段：策略选择与步数预算
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// reactive / plan / reflection
    pub strategy: String,
    pub max_steps: usize,
    /// 反思重试上限：只保留配置项，循环不强制执行（见 DESIGN.md）
    pub max_reflections: usize,
    /// 计划步骤失败后的重试次数；0 表示不恢复
    pub plan_retries: usize,
    /// 每次运行开始时从长期记忆召回的条数
    pub recall_top_k: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            strategy: "reactive".to_string(),
            max_steps: 50,
            max_reflections: 3,
            plan_retries: 0,
            recall_top_k: 3,
        }
    }
}

/// [llm] 段：后端选择与生成参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// openai / deepseek / gemini / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            base_url: None,
            api_key: None,
            max_tokens: 1000,
            temperature: 0.1,
            request_timeout_secs: 60,
        }
    }
}

/// [browser] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub headless: bool,
    /// 页面正文截断长度（字符）
    pub max_content_chars: usize,
    /// 导航 / 点击后等待页面稳定的毫秒数
    pub navigation_settle_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: true,
            max_content_chars: 4000,
            navigation_settle_ms: 500,
        }
    }
}

/// [memory] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub short_term_max_items: usize,
    /// 预留给向量检索后端；默认子串检索不使用
    pub embedding_model: Option<String>,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            short_term_max_items: 50,
            embedding_model: None,
        }
    }
}

/// 从 config 目录加载配置，环境变量 WEBPILOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WEBPILOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WEBPILOT")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("security.sensitive_actions")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
