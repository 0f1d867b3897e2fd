//! 编排器：驱动一次任务运行从开始到终态
//!
//! 共享骨架 observe → decide → execute → record → 终止检查，受 max_steps 约束；
//! 决策部分由 DecisionStrategy 提供。会话在运行开始时打开，在所有退出路径上关闭。
//! 可选：SecurityGate（每次派发前检查）、MemoryManager（开始时召回、结束时写入）、事件通道。

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::browser::{ActionIntent, BrowserBackend, ExecutionOutcome};
use crate::config::AppConfig;
use crate::core::{
    create_strategy, AgentError, DecisionContext, DecisionStrategy, HistoryEntry, HistoryLog,
    RecoveryAction, RunPhase,
};
use crate::llm::LlmClient;
use crate::memory::{MemoryItem, MemoryManager};
use crate::react::{Plan, RunEvent};
use crate::security::{HumanInput, SecurityGate};

/// 步数用完或计划执行完时的结果消息
pub const COMPLETED_MESSAGE: &str = "Task completed successfully";

/// 每次运行都返回：成功标志 + 可读消息 + 完整历史
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub success: bool,
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// 策略驱动的正常结束（错误走 Err）
enum RunEnd {
    Completed(String),
    Aborted(String),
}

pub struct Orchestrator {
    backend: Arc<dyn BrowserBackend>,
    strategy: Box<dyn DecisionStrategy>,
    max_steps: usize,
    security: Option<SecurityGate>,
    memory: Option<MemoryManager>,
    event_tx: Option<UnboundedSender<RunEvent>>,
    recall_top_k: usize,
    phase: RunPhase,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn BrowserBackend>,
        strategy: Box<dyn DecisionStrategy>,
        max_steps: usize,
    ) -> Self {
        Self {
            backend,
            strategy,
            max_steps,
            security: None,
            memory: None,
            event_tx: None,
            recall_top_k: 3,
            phase: RunPhase::Observing,
        }
    }

    /// 按配置组装：策略、安全闸门、记忆
    pub fn from_config(
        config: &AppConfig,
        backend: Arc<dyn BrowserBackend>,
        llm: Arc<dyn LlmClient>,
        human: Arc<dyn HumanInput>,
    ) -> Result<Self, AgentError> {
        let strategy = create_strategy(&config.agent, llm)?;
        Ok(Self::new(backend, strategy, config.agent.max_steps)
            .with_security(SecurityGate::new(config.security.clone(), human))
            .with_memory(MemoryManager::from_config(&config.memory))
            .with_recall_top_k(config.agent.recall_top_k))
    }

    pub fn with_security(mut self, gate: SecurityGate) -> Self {
        self.security = Some(gate);
        self
    }

    pub fn with_memory(mut self, memory: MemoryManager) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_event_tx(mut self, tx: UnboundedSender<RunEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn with_recall_top_k(mut self, top_k: usize) -> Self {
        self.recall_top_k = top_k;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn strategy(&self) -> &dyn DecisionStrategy {
        self.strategy.as_ref()
    }

    pub fn security(&self) -> Option<&SecurityGate> {
        self.security.as_ref()
    }

    pub fn memory(&self) -> Option<&MemoryManager> {
        self.memory.as_ref()
    }

    fn emit(&self, ev: RunEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }

    fn set_phase(&mut self, phase: RunPhase) {
        tracing::debug!(from = self.phase.as_str(), to = phase.as_str(), "phase");
        self.phase = phase;
    }

    /// 执行一次任务；任何退出路径都会关闭会话并返回 RunResult
    pub async fn run_task(&mut self, task: &str) -> RunResult {
        self.phase = RunPhase::Observing;
        tracing::info!(strategy = %self.strategy.kind(), max_steps = self.max_steps, task, "run started");

        let mut history = HistoryLog::new();
        let outcome = match self.backend.start_session().await {
            Ok(()) => {
                let recalled = self.prepare_memory(task);
                self.drive(task, &recalled, &mut history).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = self.backend.end_session().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        let (success, message) = match outcome {
            Ok(RunEnd::Completed(message)) => {
                self.set_phase(RunPhase::Done);
                (true, message)
            }
            Ok(RunEnd::Aborted(message)) => {
                self.set_phase(RunPhase::Failed);
                (false, message)
            }
            Err(e) => {
                self.set_phase(RunPhase::Failed);
                tracing::error!("Run failed: {}", e);
                self.emit(RunEvent::Error { text: e.to_string() });
                (false, format!("Error: {}", e))
            }
        };

        if let Some(memory) = &self.memory {
            memory.save_task_result_to_long_term(task, &message, success, None);
        }
        self.emit(RunEvent::Finished {
            success,
            message: message.clone(),
        });
        tracing::info!(success, steps = history.len(), message = %message, "run finished");

        RunResult {
            success,
            message,
            history: history.into_entries(),
        }
    }

    /// 写入短期上下文并召回相关长期记忆
    fn prepare_memory(&mut self, task: &str) -> Vec<MemoryItem> {
        let top_k = self.recall_top_k;
        let Some(memory) = self.memory.as_mut() else {
            return Vec::new();
        };
        memory.update_context("current_task", task);
        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert("task".to_string(), Value::from(task));
        memory.add_to_short_term(MemoryItem::new(format!("Task: {}", task), metadata, 0.5));

        let recalled = memory.search_long_term(task, top_k);
        if !recalled.is_empty() {
            tracing::debug!(count = recalled.len(), "recalled long-term memories");
        }
        recalled
    }

    async fn drive(
        &mut self,
        task: &str,
        recalled: &[MemoryItem],
        history: &mut HistoryLog,
    ) -> Result<RunEnd, AgentError> {
        self.set_phase(RunPhase::Deciding);
        match self.strategy.plan(task).await? {
            Some(plan) => self.execute_plan(plan, history).await,
            None => self.step_loop(task, recalled, history).await,
        }
    }

    /// 按计划顺序执行；失败步骤交给恢复处理，恢复失败即中止
    async fn execute_plan(
        &mut self,
        plan: Plan,
        history: &mut HistoryLog,
    ) -> Result<RunEnd, AgentError> {
        self.emit(RunEvent::PlanCreated {
            steps: plan.steps.iter().map(|s| s.description.clone()).collect(),
        });
        if plan.len() > self.max_steps {
            tracing::warn!(
                steps = plan.len(),
                max_steps = self.max_steps,
                "plan longer than step budget, extra steps are skipped"
            );
        }

        for (index, step) in plan.steps.iter().enumerate().take(self.max_steps) {
            self.emit(RunEvent::StepUpdate {
                step: index,
                max_steps: self.max_steps,
            });
            self.set_phase(RunPhase::Observing);
            let _page = self.backend.observe().await?;

            self.set_phase(RunPhase::Executing);
            let outcome = self.dispatch(&step.action).await?;
            self.set_phase(RunPhase::Recording);
            history.append(step.action.clone(), outcome.clone());
            self.remember_step(&step.action, &outcome);

            if !outcome.success {
                let mut last = outcome;
                let mut attempt = 0;
                loop {
                    match self.strategy.recover(step, &last, attempt) {
                        RecoveryAction::Retry => {
                            attempt += 1;
                            self.set_phase(RunPhase::Executing);
                            last = self.dispatch(&step.action).await?;
                            if last.success {
                                tracing::info!(step = index, attempt, "plan step recovered");
                                break;
                            }
                        }
                        RecoveryAction::Abort(message) => {
                            return Ok(RunEnd::Aborted(format!(
                                "Failed to execute step {}: {}",
                                index, message
                            )));
                        }
                    }
                }
            }

            if step.action.is_stop() {
                break;
            }
        }
        Ok(RunEnd::Completed(COMPLETED_MESSAGE.to_string()))
    }

    /// Reactive / Reflection 共享的逐步循环
    async fn step_loop(
        &mut self,
        task: &str,
        recalled: &[MemoryItem],
        history: &mut HistoryLog,
    ) -> Result<RunEnd, AgentError> {
        for step in 0..self.max_steps {
            self.emit(RunEvent::StepUpdate {
                step,
                max_steps: self.max_steps,
            });
            self.set_phase(RunPhase::Observing);
            let page = self.backend.observe().await?;

            self.set_phase(RunPhase::Deciding);
            let action = {
                let ctx = DecisionContext {
                    task,
                    page: &page,
                    history: history.entries(),
                    recalled,
                    step,
                };
                self.strategy.decide_next(&ctx).await?
            };
            self.emit(RunEvent::ActionChosen {
                action: action.action.to_string(),
                parameters: serde_json::to_value(&action.parameters).unwrap_or(Value::Null),
            });

            self.set_phase(RunPhase::Executing);
            let outcome = self.dispatch(&action).await?;
            self.set_phase(RunPhase::Recording);
            history.append(action.clone(), outcome.clone());
            self.remember_step(&action, &outcome);

            // stop 也要先反思；反思失败按运行错误处理
            let verdict = {
                let ctx = DecisionContext {
                    task,
                    page: &page,
                    history: history.entries(),
                    recalled,
                    step,
                };
                self.strategy.reflect(&ctx, &action, &outcome).await?
            };
            if let Some(verdict) = &verdict {
                self.emit(RunEvent::Reflection {
                    is_correct: verdict.is_correct,
                    feedback: verdict.feedback.clone(),
                });
            }

            if action.is_stop() {
                return Ok(RunEnd::Completed(COMPLETED_MESSAGE.to_string()));
            }

            let Some(verdict) = verdict else {
                continue;
            };
            if verdict.is_correct {
                continue;
            }

            self.set_phase(RunPhase::Deciding);
            let corrected = self
                .strategy
                .correct(task, &action, &outcome, &verdict.feedback)
                .await?;
            self.emit(RunEvent::Correction {
                action: corrected.action.to_string(),
            });
            self.set_phase(RunPhase::Executing);
            let corrected_outcome = self.dispatch(&corrected).await?;
            if corrected_outcome.success {
                self.set_phase(RunPhase::Recording);
                self.remember_step(&corrected, &corrected_outcome);
                history.append(corrected, corrected_outcome);
            }
        }

        tracing::warn!(
            max_steps = self.max_steps,
            "step budget exhausted without a stop action"
        );
        Ok(RunEnd::Completed(COMPLETED_MESSAGE.to_string()))
    }

    /// 派发一个动作：先过安全闸门，被拒绝则返回失败结果而不执行
    async fn dispatch(&self, action: &ActionIntent) -> Result<ExecutionOutcome, AgentError> {
        if let Some(gate) = &self.security {
            let label = action.security_label();
            if !gate.check_action_allowed(&label, &action.parameters).await {
                tracing::warn!(label = %label, "action denied by security gate");
                self.emit(RunEvent::ActionDenied {
                    label: label.clone(),
                });
                return Ok(ExecutionOutcome::failure(format!(
                    "Action denied by security gate: {}",
                    label
                )));
            }
        }

        let outcome = self.backend.execute(action).await?;
        tracing::debug!(action = %action.action, success = outcome.success, message = %outcome.message, "dispatched");
        self.emit(RunEvent::Outcome {
            action: action.action.to_string(),
            success: outcome.success,
            message: outcome.message.clone(),
        });
        Ok(outcome)
    }

    fn remember_step(&mut self, action: &ActionIntent, outcome: &ExecutionOutcome) {
        if let Some(memory) = self.memory.as_mut() {
            let mut metadata = std::collections::BTreeMap::new();
            metadata.insert("action".to_string(), Value::from(action.action.as_str()));
            metadata.insert("success".to_string(), Value::from(outcome.success));
            memory.add_to_short_term(MemoryItem::new(
                format!("Action: {} -> {}", action.security_label(), outcome.message),
                metadata,
                0.5,
            ));
        }
    }
}
