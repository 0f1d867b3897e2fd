//! 提示词模板
//!
//! 四类请求各一个构造函数；页面状态、历史与召回的记忆都在这里拼入文本。

use crate::browser::{ActionIntent, ExecutionOutcome, PageState};
use crate::core::HistoryEntry;
use crate::memory::MemoryItem;

/// 推理提示词中附带的最近历史条数
pub const RECENT_HISTORY_IN_PROMPT: usize = 5;

const AVAILABLE_ACTIONS: &str = "\
- click(element_id): Click on an element with the given ID
- type(element_id, text): Type text into an element with the given ID
- scroll(direction): Scroll up/down
- goto(url): Navigate to a URL
- wait(seconds): Wait for specified seconds
- stop: Stop the task execution";

fn render_action(action: &ActionIntent) -> String {
    let params = serde_json::to_string(&action.parameters).unwrap_or_default();
    format!("{} with parameters {}", action.action, params)
}

fn render_history(history: &[HistoryEntry]) -> String {
    let skip = history.len().saturating_sub(RECENT_HISTORY_IN_PROMPT);
    history
        .iter()
        .skip(skip)
        .map(|e| {
            format!(
                "{}. {} -> {} ({})",
                e.position + 1,
                render_action(&e.action),
                if e.outcome.success { "ok" } else { "failed" },
                e.outcome.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_memories(memories: &[MemoryItem]) -> String {
    memories
        .iter()
        .map(|m| format!("- {}", m.content().replace('\n', " | ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 逐步推理：任务 + 当前页面 + 可用动作（+ 最近历史、相关记忆）
pub fn reasoning_prompt(
    task: &str,
    page: &PageState,
    history: &[HistoryEntry],
    recalled: &[MemoryItem],
) -> String {
    let mut prompt = format!(
        "You are a browser automation agent. Your task is: {}\n\n\
         Current page state:\n{}\n\n\
         Available actions:\n{}\n",
        task,
        page.describe(),
        AVAILABLE_ACTIONS
    );
    if !history.is_empty() {
        prompt.push_str(&format!(
            "\nActions taken so far:\n{}\n",
            render_history(history)
        ));
    }
    if !recalled.is_empty() {
        prompt.push_str(&format!(
            "\nRelevant memories from previous tasks:\n{}\n",
            render_memories(recalled)
        ));
    }
    prompt.push_str(
        "\nPlease provide the next action to take in JSON format:\n\
         {\"action\": \"...\", \"parameters\": {}}",
    );
    prompt
}

/// 一次性规划
pub fn planning_prompt(task: &str) -> String {
    format!(
        "You are a browser automation planner. Create a detailed plan to complete this task: {}\n\n\
         Return the plan as a list of steps, each with an action and parameters.\n\
         Available actions: click, type, scroll, goto, wait, stop\n\n\
         Example format:\n\
         {{\"steps\": [\n  \
         {{\"action\": \"goto\", \"parameters\": {{\"url\": \"https://example.com\"}}, \"description\": \"Navigate to example.com\"}},\n  \
         {{\"action\": \"click\", \"parameters\": {{\"element_id\": \"search-box\"}}, \"description\": \"Click search box\"}}\n\
         ]}}",
        task
    )
}

/// 执行后反思：动作是否恰当、是否成功
pub fn reflection_prompt(
    task: &str,
    action: &ActionIntent,
    outcome: &ExecutionOutcome,
    page: &PageState,
) -> String {
    format!(
        "Task: {}\n\
         Action taken: {}\n\
         Execution result: {}\n\
         Current page state:\n{}\n\n\
         Was this action appropriate for the task? Did it succeed? What should be done next?\n\n\
         Return in JSON format:\n\
         {{\"is_correct\": true/false, \"feedback\": \"explanation of what happened and what should be done\", \
         \"suggested_next_action\": \"what action to take next\"}}",
        task,
        render_action(action),
        outcome.message,
        page.describe()
    )
}

/// 依据反思反馈给出修正动作
pub fn correction_prompt(
    task: &str,
    failed_action: &ActionIntent,
    outcome: &ExecutionOutcome,
    feedback: &str,
) -> String {
    format!(
        "Task: {}\n\
         Failed action: {}\n\
         Execution result: {}\n\
         Feedback: {}\n\n\
         Based on the feedback, what should be the correct action to take?\n\n\
         Return in JSON format:\n\
         {{\"action\": \"...\", \"parameters\": {{}}}}",
        task,
        render_action(failed_action),
        outcome.message,
        feedback
    )
}
