mod common;

use common::*;
use serde_json::json;
use tempfile::TempDir;
use traceview_sessions::{aggregate, event_duration, Event, SessionStore};

fn durations(events: &[Event]) -> Vec<Option<f64>> {
    events
        .iter()
        .enumerate()
        .map(|(i, e)| event_duration(e, i.checked_sub(1).map(|p| &events[p]), events))
        .collect()
}

/// Helper: a session delegating to an "Explore" sub-agent, plus its trace.
fn create_subagent_session(dir: &TempDir, reported_usage: bool) -> SessionStore {
    let project = project_dir(dir.path(), "-home-user-app");

    let mut result = json!({
        "uuid": "u2", "type": "user", "timestamp": ts(20),
        "message": {"role": "user", "content": [
            {"type": "tool_result", "tool_use_id": "toolu_t1", "content": "report"}
        ]},
        "toolUseResult": {"agentId": "ag1", "status": "completed"}
    });
    if reported_usage {
        result["toolUseResult"]["usage"] = json!({
            "input_tokens": 40,
            "cache_creation_input_tokens": 500,
            "cache_read_input_tokens": 2000,
            "output_tokens": 300
        });
    }

    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            user("u1", 0, "explore the repo"),
            task_call("a1", 2, "toolu_t1", "Explore"),
            line(result),
            tool_call("a2", 22, "toolu_b", "Bash"),
            tool_result("u3", 25, "toolu_b"),
            assistant_with_usage("a3", 26, 9000, 50),
        ],
    );
    write_jsonl(
        &project,
        "agent-ag1.jsonl",
        &[
            user("x1", 3, "find the config loader"),
            tool_call("x2", 4, "toolu_x", "Grep"),
            tool_result("x3", 6, "toolu_x"),
            tool_call("x4", 7, "toolu_y", "Read"),
            tool_result("x5", 8, "toolu_y"),
            assistant_with_usage("x6", 15, 1200, 80),
        ],
    );

    SessionStore::with_dir(dir.path().to_path_buf())
}

// ============================================================
// Token and time totals
// ============================================================

#[test]
fn test_five_event_example() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            user("u1", 0, "hello"),
            assistant_with_usage("a1", 1, 0, 10),
            tool_call("a2", 2, "abc", "Read"),
            tool_result("u2", 5, "abc"),
            assistant_with_usage("a3", 6, 100, 5),
        ],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());
    let events = store.timeline("s1").unwrap();

    assert_eq!(
        durations(&events),
        vec![None, Some(1.0), Some(1.0), Some(3.0), Some(1.0)]
    );

    let stats = aggregate(&events);
    assert_eq!(stats.output_tokens, 15);
    assert_eq!(stats.input_tokens, 100);
    assert_eq!(stats.total_tokens, 115);
    assert_eq!(stats.active_time_secs, 6.0);
    assert_eq!(stats.tool_counts.get("Read"), Some(&1));
    assert!(stats.subagents.is_empty());
}

#[test]
fn test_input_tokens_from_last_usage_including_cache() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            assistant_with_usage("a1", 1, 5000, 10),
            line(json!({
                "uuid": "a2", "type": "assistant", "timestamp": ts(2),
                "message": {"content": [{"type": "text", "text": "x"}], "usage": {
                    "input_tokens": 3,
                    "cache_creation_input_tokens": 200,
                    "cache_read_input_tokens": 4000,
                    "output_tokens": 20
                }}
            })),
            user("u1", 3, "thanks"),
        ],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.input_tokens, 4203);
    assert_eq!(stats.output_tokens, 30);
}

#[test]
fn test_negative_durations_ignored() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            user("u1", 10, "go"),
            assistant("a1", 5, "clock skew"),
            assistant("a2", 8, "recovering"),
        ],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.active_time_secs, 3.0);
}

#[test]
fn test_empty_timeline() {
    let stats = aggregate(&[]);
    assert_eq!(stats.total_tokens, 0);
    assert_eq!(stats.active_time_secs, 0.0);
    assert!(stats.tool_counts.is_empty());
}

// ============================================================
// Tool counts and sub-agent summaries
// ============================================================

#[test]
fn test_main_tool_counts_exclude_subagent_calls() {
    let dir = TempDir::new().unwrap();
    let store = create_subagent_session(&dir, true);

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.tool_counts.len(), 2);
    assert_eq!(stats.tool_counts.get("Task"), Some(&1));
    assert_eq!(stats.tool_counts.get("Bash"), Some(&1));
    assert_eq!(stats.tool_counts.get("Grep"), None);
}

#[test]
fn test_output_tokens_include_subagent_turns() {
    let dir = TempDir::new().unwrap();
    let store = create_subagent_session(&dir, true);

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.output_tokens, 130);
    assert_eq!(stats.input_tokens, 9000);
}

#[test]
fn test_subagent_summary_prefers_reported_usage() {
    let dir = TempDir::new().unwrap();
    let store = create_subagent_session(&dir, true);

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.subagents.len(), 1);
    let agent = &stats.subagents[0];
    assert_eq!(agent.agent_id, "ag1");
    assert_eq!(agent.subagent_type, "Explore");
    assert_eq!(agent.input_tokens, 2540);
    assert_eq!(agent.output_tokens, 300);
    assert_eq!(agent.total_tokens, 2840);
    assert_eq!(agent.tool_counts.get("Grep"), Some(&1));
    assert_eq!(agent.tool_counts.get("Read"), Some(&1));
    // x1 at 3s through x6 at 15s
    assert_eq!(agent.active_time_secs, 12.0);
}

#[test]
fn test_subagent_summary_falls_back_to_event_usage() {
    let dir = TempDir::new().unwrap();
    let store = create_subagent_session(&dir, false);

    let stats = store.statistics("s1").unwrap();

    let agent = &stats.subagents[0];
    assert_eq!(agent.input_tokens, 1200);
    assert_eq!(agent.output_tokens, 80);
    assert_eq!(agent.total_tokens, 1280);
}

#[test]
fn test_subagent_result_duration_spans_inlined_block() {
    let dir = TempDir::new().unwrap();
    let store = create_subagent_session(&dir, true);
    let events = store.timeline("s1").unwrap();

    let detail = store.event("s1", "u2").unwrap();

    // previous event is the sub-agent's last turn at 15s
    assert_eq!(detail.previous.as_ref().map(|e| e.id.as_str()), Some("x6"));
    assert_eq!(detail.duration_secs, Some(5.0));
    assert_eq!(events.iter().filter(|e| e.level == 1).count(), 7);
}

#[test]
fn test_resumed_agent_single_summary() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            task_call("a1", 1, "toolu_t1", "Plan"),
            agent_result("u1", 10, "toolu_t1", "ag1"),
            task_call("a2", 20, "toolu_t2", "Plan"),
            agent_result("u2", 30, "toolu_t2", "ag1"),
        ],
    );
    write_jsonl(
        &project,
        "agent-ag1.jsonl",
        &[user("x1", 2, "plan it"), tool_call("x2", 5, "toolu_x", "Read")],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.tool_counts.get("Task"), Some(&2));
    assert_eq!(stats.subagents.len(), 1);
    assert_eq!(stats.subagents[0].agent_id, "ag1");
    assert_eq!(stats.subagents[0].active_time_secs, 3.0);
    assert_eq!(stats.subagents[0].tool_counts.get("Read"), Some(&1));
}

#[test]
fn test_replayed_pair_produces_no_duplicate_summary() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    let call = task_call("a1", 1, "toolu_t1", "Explore");
    let result = agent_result("u1", 10, "toolu_t1", "ag1");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[call.clone(), result.clone(), call, result],
    );
    write_jsonl(&project, "agent-ag1.jsonl", &[user("x1", 2, "look")]);
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.subagents.len(), 1);
    assert_eq!(stats.tool_counts.get("Task"), Some(&1));
}

#[test]
fn test_unfinished_accumulator_discarded_on_new_task() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            task_call("a1", 1, "toolu_lost", "Explore"),
            task_call("a2", 2, "toolu_t2", "Plan"),
            agent_result("u2", 10, "toolu_t2", "ag2"),
        ],
    );
    write_jsonl(&project, "agent-ag2.jsonl", &[user("x1", 3, "plan")]);
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.subagents.len(), 1);
    assert_eq!(stats.subagents[0].subagent_type, "Plan");
    assert_eq!(stats.subagents[0].agent_id, "ag2");
}

#[test]
fn test_nested_agent_result_does_not_close_outer_run() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            task_call("a1", 1, "toolu_outer", "Plan"),
            agent_result("u1", 20, "toolu_outer", "outer"),
        ],
    );
    write_jsonl(
        &project,
        "agent-outer.jsonl",
        &[
            user("x1", 2, "plan it"),
            task_call("x2", 3, "toolu_inner", "Explore"),
            agent_result("x3", 8, "toolu_inner", "inner"),
            assistant_with_usage("x4", 12, 700, 40),
        ],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.subagents.len(), 1);
    let agent = &stats.subagents[0];
    assert_eq!(agent.agent_id, "outer");
    assert_eq!(agent.subagent_type, "Plan");
    assert_eq!(agent.tool_counts.get("Task"), Some(&1));
    assert_eq!(agent.input_tokens, 700);
    // x1 at 2s through x4 at 12s
    assert_eq!(agent.active_time_secs, 10.0);
}

#[test]
fn test_result_with_non_string_agent_id_is_not_a_subagent() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[
            task_call("a1", 1, "toolu_t1", "Explore"),
            line(json!({
                "uuid": "u1", "type": "user", "timestamp": ts(4),
                "message": {"content": [
                    {"type": "tool_result", "tool_use_id": "toolu_t1", "content": "done"}
                ]},
                "toolUseResult": {"agentId": 7}
            })),
        ],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();
    let events = store.timeline("s1").unwrap();

    assert!(stats.subagents.is_empty());
    assert!(events.iter().all(|e| e.level == 0));
}

#[test]
fn test_partial_usage_still_counted() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(dir.path(), "-p");
    write_jsonl(
        &project,
        "s1.jsonl",
        &[line(json!({
            "uuid": "a1", "type": "assistant", "timestamp": ts(1),
            "message": {"content": [{"type": "text", "text": "x"}], "usage": {
                "input_tokens": 5,
                "output_tokens": 10,
                "cache_creation_input_tokens": null
            }}
        }))],
    );
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let stats = store.statistics("s1").unwrap();

    assert_eq!(stats.output_tokens, 10);
    assert_eq!(stats.input_tokens, 5);
    assert_eq!(stats.total_tokens, 15);
}
