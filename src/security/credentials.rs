//! 凭据管理
//!
//! 密码经 SecretCodec 编码后保存在内存中。默认的 PlaceholderCodec 只加 "encrypted_" 前缀，
//! 不是加密；接入真实加密时替换 codec 即可。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// 密码编解码
pub trait SecretCodec: Send + Sync {
    fn encode(&self, secret: &str) -> String;
    fn decode(&self, stored: &str) -> String;
}

/// 占位编码：加 / 去 "encrypted_" 前缀
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCodec;

const PLACEHOLDER_PREFIX: &str = "encrypted_";

impl SecretCodec for PlaceholderCodec {
    fn encode(&self, secret: &str) -> String {
        format!("{}{}", PLACEHOLDER_PREFIX, secret)
    }

    fn decode(&self, stored: &str) -> String {
        stored
            .strip_prefix(PLACEHOLDER_PREFIX)
            .unwrap_or(stored)
            .to_string()
    }
}

/// 取回的凭据；Debug 输出不含密码
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub struct CredentialManager {
    credentials: Mutex<HashMap<String, Credential>>,
    codec: Box<dyn SecretCodec>,
}

impl CredentialManager {
    pub fn new() -> Self {
        Self::with_codec(Box::new(PlaceholderCodec))
    }

    pub fn with_codec(codec: Box<dyn SecretCodec>) -> Self {
        Self {
            credentials: Mutex::new(HashMap::new()),
            codec,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Credential>> {
        self.credentials.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 同一 service 再次写入会覆盖
    pub fn store_credential(&self, service: &str, username: &str, password: &str) {
        let stored = Credential {
            username: username.to_string(),
            password: self.codec.encode(password),
        };
        self.lock().insert(service.to_string(), stored);
    }

    pub fn get_credential(&self, service: &str) -> Option<Credential> {
        self.lock().get(service).map(|c| Credential {
            username: c.username.clone(),
            password: self.codec.decode(&c.password),
        })
    }

    /// 存储中的原始（已编码）密码
    pub fn stored_secret(&self, service: &str) -> Option<String> {
        self.lock().get(service).map(|c| c.password.clone())
    }
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::new()
    }
}
