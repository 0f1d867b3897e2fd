//! 认知层：Reasoner、Planner、Reflector、Corrector、提示词与运行事件

pub mod corrector;
pub mod events;
pub mod planner;
pub mod prompts;
pub mod reasoner;
pub mod reflector;

pub use corrector::Corrector;
pub use events::RunEvent;
pub use planner::{Plan, PlanStep, Planner};
pub use reasoner::Reasoner;
pub use reflector::{ReflectionVerdict, Reflector};
