//! 安全层：敏感动作闸门、人工确认（HITL）、2FA / CAPTCHA、凭据管理

pub mod credentials;
pub mod gate;
pub mod hitl;
pub mod human;
pub mod policy;

pub use credentials::{Credential, CredentialManager, PlaceholderCodec, SecretCodec};
pub use gate::{ActionRecord, SecurityGate};
pub use hitl::{is_affirmative, CaptchaInfo, HumanInTheLoop};
pub use human::{ConsoleHuman, HumanInput, ScriptedHuman};
pub use policy::{SecurityPolicy, DEFAULT_SENSITIVE_ACTIONS};
