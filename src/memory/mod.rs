//! 记忆层：短期（当前运行的最近条目与上下文）、长期（跨运行检索）

pub mod item;
pub mod long_term;
pub mod manager;
pub mod short_term;

pub use item::MemoryItem;
pub use long_term::{InMemoryLongTerm, LongTermStore};
pub use manager::{MemoryManager, INTERACTION_IMPORTANCE, PREFERENCE_IMPORTANCE, TASK_RESULT_IMPORTANCE};
pub use short_term::ShortTermMemory;
