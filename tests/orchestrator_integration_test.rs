//! 编排器集成测试：脚本化浏览器 + Mock LLM + 脚本化人工输入

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use webpilot::browser::{
        ActionIntent, ActionKind, BrowserBackend, ExecutionOutcome, PageState, ScriptedBrowser,
    };
    use webpilot::core::{
        AgentError, Orchestrator, PlanAndExecuteStrategy, ReactiveStrategy, ReflectionStrategy, RetryRecovery,
        RunPhase, COMPLETED_MESSAGE,
    };
    use webpilot::llm::{LlmClient, LlmError, MockLlmClient};
    use webpilot::memory::MemoryManager;
    use webpilot::react::RunEvent;
    use webpilot::security::{ScriptedHuman, SecurityGate, SecurityPolicy};

    fn shop() -> Arc<ScriptedBrowser> {
        Arc::new(
            ScriptedBrowser::new()
                .with_page("https://shop.test", "Burger Shop", "Classic burger $5")
                .with_failing_element("buy"),
        )
    }

    fn scripted_llm(responses: Vec<serde_json::Value>) -> Arc<MockLlmClient> {
        let llm = MockLlmClient::new();
        for r in responses {
            llm.push_response(r);
        }
        Arc::new(llm)
    }

    fn as_client(llm: &Arc<MockLlmClient>) -> Arc<dyn LlmClient> {
        llm.clone()
    }

    fn goto(url: &str) -> serde_json::Value {
        json!({"action": "goto", "parameters": {"url": url}})
    }

    fn click(id: &str) -> serde_json::Value {
        json!({"action": "click", "parameters": {"element_id": id}})
    }

    fn stop() -> serde_json::Value {
        json!({"action": "stop", "parameters": {}})
    }

    fn verdict(is_correct: bool, feedback: &str) -> serde_json::Value {
        json!({"is_correct": is_correct, "feedback": feedback})
    }

    /// start_session 不打开内部会话的后端；observe_blank 时观察不经过会话检查
    struct DetachedBrowser {
        inner: ScriptedBrowser,
        observe_blank: bool,
    }

    #[async_trait]
    impl BrowserBackend for DetachedBrowser {
        async fn start_session(&self) -> Result<(), AgentError> {
            Ok(())
        }

        async fn end_session(&self) -> Result<(), AgentError> {
            self.inner.end_session().await
        }

        async fn observe(&self) -> Result<PageState, AgentError> {
            if self.observe_blank {
                Ok(PageState::default())
            } else {
                self.inner.observe().await
            }
        }

        async fn execute(&self, action: &ActionIntent) -> Result<ExecutionOutcome, AgentError> {
            self.inner.execute(action).await
        }
    }

    #[tokio::test]
    async fn test_reactive_three_step_script() {
        let browser = shop();
        let llm = scripted_llm(vec![goto("https://shop.test"), click("burger"), stop()]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Order a burger").await;

        assert!(result.success);
        assert_eq!(result.message, COMPLETED_MESSAGE);
        assert_eq!(result.history.len(), 3);
        assert!(result.history.iter().all(|e| e.outcome.success));
        assert_eq!(result.history[2].action.action, ActionKind::Stop);
        let positions: Vec<usize> = result.history.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(orchestrator.phase(), RunPhase::Done);
        assert_eq!(browser.sessions_started(), 1);
        assert_eq!(browser.sessions_ended(), 1);
        // 第二步的提示词看到了导航后的页面
        assert!(llm.prompts()[1].contains("Burger Shop"));
    }

    #[tokio::test]
    async fn test_stop_ends_run_on_that_step() {
        let browser = shop();
        let llm = scripted_llm(vec![goto("https://shop.test"), stop(), click("burger")]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            50,
        );

        let result = orchestrator.run_task("Look at the shop").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
        assert_eq!(llm.remaining(), 1);
        assert_eq!(browser.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_budget_exhausted_reports_success() {
        let browser = shop();
        let llm = Arc::new(MockLlmClient::always(json!({"action": "scroll", "parameters": {"direction": "down"}})));
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            4,
        );

        let result = orchestrator.run_task("Scroll forever").await;

        assert!(result.success);
        assert_eq!(result.message, "Task completed successfully");
        assert_eq!(result.history.len(), 4);
        assert_eq!(browser.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn test_failed_and_unknown_actions_do_not_abort() {
        let browser = shop();
        let llm = scripted_llm(vec![
            click("buy"),
            json!({"action": "hover", "parameters": {"element_id": "menu"}}),
            json!({"action": "goto", "parameters": {}}),
            stop(),
        ]);
        let mut orchestrator = Orchestrator::new(
            browser,
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Poke around").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 4);
        assert_eq!(result.history[0].outcome.message, "Element buy not found");
        assert_eq!(result.history[1].outcome.message, "Unknown action: hover");
        assert!(!result.history[2].outcome.success);
        assert!(result.history[3].outcome.success);
    }

    #[tokio::test]
    async fn test_llm_failure_aborts_with_partial_history() {
        let browser = shop();
        let llm = Arc::new(
            MockLlmClient::new()
                .with_response(goto("https://shop.test"))
                .with_error(LlmError::Api("service unavailable".to_string())),
        );
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Order a burger").await;

        assert!(!result.success);
        assert!(result.message.starts_with("Error: "));
        assert!(result.message.contains("service unavailable"));
        assert_eq!(result.history.len(), 1);
        assert_eq!(orchestrator.phase(), RunPhase::Failed);
        assert!(!browser.is_active());
        assert_eq!(browser.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn test_session_start_failure() {
        let browser = Arc::new(ScriptedBrowser::new().with_start_failure());
        let llm = scripted_llm(vec![stop()]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("anything").await;

        assert!(!result.success);
        assert!(result.message.starts_with("Error: "));
        assert!(result.history.is_empty());
        assert_eq!(llm.calls(), 0);
        assert!(!browser.is_active());
    }

    #[tokio::test]
    async fn test_plan_step_zero_fails_without_recovery() {
        let browser = shop();
        let llm = scripted_llm(vec![json!({
            "steps": [
                {"action": "click", "parameters": {"element_id": "buy"}, "description": "Buy"},
                {"action": "click", "parameters": {"element_id": "confirm"}, "description": "Confirm"}
            ]
        })]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(PlanAndExecuteStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Buy a burger").await;

        assert!(!result.success);
        assert_eq!(result.message, "Failed to execute step 0: Element buy not found");
        assert_eq!(result.history.len(), 1);
        assert_eq!(browser.executed().len(), 1);
        assert_eq!(llm.calls(), 1);
        assert_eq!(browser.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn test_plan_retry_recovery_is_not_recorded() {
        let browser = Arc::new(ScriptedBrowser::new().with_flaky_element("buy", 1));
        let llm = scripted_llm(vec![json!({
            "steps": [
                {"action": "goto", "parameters": {"url": "https://shop.test"}, "description": "Open"},
                {"action": "click", "parameters": {"element_id": "buy"}, "description": "Buy"}
            ]
        })]);
        let strategy = PlanAndExecuteStrategy::with_recovery(as_client(&llm), Box::new(RetryRecovery::new(2)));
        let mut orchestrator = Orchestrator::new(browser.clone(), Box::new(strategy), 10);

        let result = orchestrator.run_task("Buy a burger").await;

        assert!(result.success);
        assert_eq!(result.message, COMPLETED_MESSAGE);
        assert_eq!(result.history.len(), 2);
        assert!(!result.history[1].outcome.success);
        assert_eq!(browser.executed().len(), 3);
    }

    #[tokio::test]
    async fn test_plan_respects_step_budget() {
        let browser = shop();
        let llm = scripted_llm(vec![json!({
            "steps": [
                {"action": "wait", "parameters": {"seconds": 0}},
                {"action": "wait", "parameters": {"seconds": 0}},
                {"action": "wait", "parameters": {"seconds": 0}}
            ]
        })]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(PlanAndExecuteStrategy::new(as_client(&llm))),
            2,
        );

        let result = orchestrator.run_task("Wait around").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
    }

    #[tokio::test]
    async fn test_reflection_correction_appends_second_entry() {
        let browser = shop();
        let llm = scripted_llm(vec![
            click("buy"),
            json!({"is_correct": false, "feedback": "The buy button does not exist, use cart", "suggested_next_action": "click cart"}),
            click("cart"),
            stop(),
            verdict(true, "done"),
        ]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReflectionStrategy::new(as_client(&llm), 3)),
            10,
        );

        let result = orchestrator.run_task("Buy a burger").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 3);
        assert_eq!(result.history[0].action, ActionIntent::click("buy"));
        assert!(!result.history[0].outcome.success);
        assert_eq!(result.history[1].action, ActionIntent::click("cart"));
        assert!(result.history[1].outcome.success);
        assert_eq!(result.history[2].action.action, ActionKind::Stop);
        assert_eq!(llm.calls(), 5);
        assert_eq!(llm.remaining(), 0);
        assert!(llm.prompts()[2].contains("Feedback: The buy button does not exist, use cart"));
    }

    #[tokio::test]
    async fn test_reflection_failed_correction_is_dropped() {
        let browser = shop();
        let llm = scripted_llm(vec![
            click("buy"),
            json!({"is_correct": false, "feedback": "try again"}),
            click("buy"),
            stop(),
            verdict(true, "done"),
        ]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReflectionStrategy::new(as_client(&llm), 3)),
            10,
        );

        let result = orchestrator.run_task("Buy a burger").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
        assert_eq!(browser.executed().len(), 3);
    }

    #[tokio::test]
    async fn test_reflection_correct_verdict_skips_corrector() {
        let browser = shop();
        let llm = scripted_llm(vec![
            goto("https://shop.test"),
            json!({"is_correct": true, "feedback": "fine"}),
            stop(),
            verdict(true, "done"),
        ]);
        let mut orchestrator = Orchestrator::new(
            browser,
            Box::new(ReflectionStrategy::new(as_client(&llm), 3)),
            10,
        );

        let result = orchestrator.run_task("Open the shop").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn test_reflection_failure_on_stop_step_aborts() {
        let browser = shop();
        let llm = Arc::new(
            MockLlmClient::new()
                .with_response(stop())
                .with_error(LlmError::Api("reflector down".to_string())),
        );
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReflectionStrategy::new(as_client(&llm), 3)),
            10,
        );

        let result = orchestrator.run_task("Stop right away").await;

        assert!(!result.success);
        assert!(result.message.starts_with("Error: "));
        assert!(result.message.contains("reflector down"));
        assert_eq!(result.history.len(), 1);
        assert!(result.history[0].action.is_stop());
        assert_eq!(llm.calls(), 2);
        assert_eq!(browser.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn test_reflection_history_bounded_by_twice_max_steps() {
        let browser = shop();
        let mut responses = Vec::new();
        for _ in 0..3 {
            responses.push(click("menu"));
            responses.push(verdict(false, "open the cart instead"));
            responses.push(click("cart"));
        }
        let llm = scripted_llm(responses);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReflectionStrategy::new(as_client(&llm), 1)),
            3,
        );

        let result = orchestrator.run_task("Find the cart").await;

        assert!(result.success);
        assert_eq!(result.message, COMPLETED_MESSAGE);
        assert_eq!(result.history.len(), 6);
        let positions: Vec<usize> = result.history.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.history[1].action, ActionIntent::click("cart"));
        assert_eq!(browser.executed().len(), 6);
        assert_eq!(llm.remaining(), 0);
    }

    #[tokio::test]
    async fn test_corrected_action_goes_through_security_gate() {
        let browser = shop();
        let llm = scripted_llm(vec![
            click("buy"),
            verdict(false, "go straight to checkout"),
            click("checkout"),
            stop(),
            verdict(true, "done"),
        ]);
        let human = Arc::new(ScriptedHuman::new().with_reply("no"));
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReflectionStrategy::new(as_client(&llm), 3)),
            10,
        )
        .with_security(SecurityGate::new(SecurityPolicy::default(), human.clone()));

        let result = orchestrator.run_task("Buy a burger").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history[0].action, ActionIntent::click("buy"));
        assert!(result.history[1].action.is_stop());
        let executed = browser.executed();
        assert_eq!(executed.len(), 2);
        assert!(!executed.contains(&ActionIntent::click("checkout")));
        assert_eq!(human.prompts().len(), 1);

        let ledger = orchestrator.security().unwrap().action_history();
        let labels: Vec<&str> = ledger.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(labels, vec!["click buy", "click checkout", "stop"]);
    }

    #[tokio::test]
    async fn test_security_denial_is_recorded_not_dispatched() {
        let browser = shop();
        let llm = scripted_llm(vec![click("checkout-button"), stop()]);
        let human = Arc::new(ScriptedHuman::new().with_reply("n"));
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        )
        .with_security(SecurityGate::new(SecurityPolicy::default(), human.clone()));

        let result = orchestrator.run_task("Check out").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
        assert!(!result.history[0].outcome.success);
        assert_eq!(
            result.history[0].outcome.message,
            "Action denied by security gate: click checkout-button"
        );
        let executed = browser.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].is_stop());
        assert_eq!(human.prompts().len(), 1);

        let ledger = orchestrator.security().unwrap().action_history();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].action, "click checkout-button");
    }

    #[tokio::test]
    async fn test_typed_text_stays_out_of_gate_label() {
        let browser = shop();
        let llm = scripted_llm(vec![
            json!({"action": "type", "parameters": {"element_id": "login-password", "text": "hunter2"}}),
            stop(),
        ]);
        let human = Arc::new(ScriptedHuman::new().with_reply("n"));
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        )
        .with_security(SecurityGate::new(SecurityPolicy::default(), human.clone()));

        let result = orchestrator.run_task("Log in").await;

        assert_eq!(
            result.history[0].outcome.message,
            "Action denied by security gate: type login-password"
        );
        let ledger = orchestrator.security().unwrap().action_history();
        assert_eq!(ledger[0].action, "type login-password");
        assert!(human.prompts().iter().all(|p| !p.contains("hunter2")));
    }

    #[tokio::test]
    async fn test_hitl_disabled_allows_sensitive_actions() {
        let browser = shop();
        let llm = scripted_llm(vec![click("checkout-button"), stop()]);
        let human = Arc::new(ScriptedHuman::new());
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        )
        .with_security(SecurityGate::new(SecurityPolicy::permissive(), human.clone()));

        let result = orchestrator.run_task("Check out").await;

        assert!(result.history[0].outcome.success);
        assert_eq!(browser.executed().len(), 2);
        assert!(human.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_huge_wait_fails_without_crashing() {
        let browser = shop();
        let llm = scripted_llm(vec![
            json!({"action": "wait", "parameters": {"seconds": 1e20}}),
            stop(),
        ]);
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Wait a very long time").await;

        assert!(result.success);
        assert_eq!(result.history.len(), 2);
        assert!(!result.history[0].outcome.success);
        assert!(result.history[0].outcome.message.contains("seconds"));
        assert_eq!(browser.sessions_ended(), 1);
    }

    #[tokio::test]
    async fn test_observe_outside_session_is_run_error() {
        let browser = Arc::new(DetachedBrowser {
            inner: ScriptedBrowser::new(),
            observe_blank: false,
        });
        let llm = scripted_llm(vec![stop()]);
        let mut orchestrator = Orchestrator::new(
            browser,
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Look around").await;

        assert!(!result.success);
        assert!(result.message.starts_with("Error: No active browser session"));
        assert!(result.history.is_empty());
        assert_eq!(llm.calls(), 0);
        assert_eq!(orchestrator.phase(), RunPhase::Failed);
    }

    #[tokio::test]
    async fn test_execute_outside_session_is_run_error() {
        let browser = Arc::new(DetachedBrowser {
            inner: ScriptedBrowser::new(),
            observe_blank: true,
        });
        let llm = scripted_llm(vec![goto("https://shop.test"), stop()]);
        let mut orchestrator = Orchestrator::new(
            browser,
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        );

        let result = orchestrator.run_task("Open the shop").await;

        assert!(!result.success);
        assert!(result.message.starts_with("Error: No active browser session"));
        assert!(result.history.is_empty());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_memory_written_and_recalled_across_runs() {
        let browser = shop();
        let llm = Arc::new(MockLlmClient::always(stop()));
        let mut orchestrator = Orchestrator::new(
            browser.clone(),
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        )
        .with_memory(MemoryManager::default());

        let first = orchestrator.run_task("Order a burger").await;
        assert!(first.success);
        assert!(!llm.prompts()[0].contains("Relevant memories"));

        let memory = orchestrator.memory().unwrap();
        assert_eq!(memory.context_value("current_task"), Some(&json!("Order a burger")));
        assert!(memory.get_common_tasks().contains("Order a burger"));

        orchestrator.run_task("Order a burger").await;
        assert!(llm.prompts()[1].contains("Relevant memories from previous tasks"));
        assert_eq!(browser.sessions_started(), 2);
        assert_eq!(browser.sessions_ended(), 2);
    }

    #[tokio::test]
    async fn test_events_stream() {
        let browser = shop();
        let llm = scripted_llm(vec![goto("https://shop.test"), stop()]);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut orchestrator = Orchestrator::new(
            browser,
            Box::new(ReactiveStrategy::new(as_client(&llm))),
            10,
        )
        .with_event_tx(tx);

        orchestrator.run_task("Open the shop").await;

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        assert_eq!(events.first(), Some(&RunEvent::StepUpdate { step: 0, max_steps: 10 }));
        assert!(matches!(events.last(), Some(RunEvent::Finished { success: true, .. })));
        let outcomes = events
            .iter()
            .filter(|e| matches!(e, RunEvent::Outcome { .. }))
            .count();
        assert_eq!(outcomes, 2);
    }
}
