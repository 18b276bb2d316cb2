//! JSONL fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// Timestamp `secs` seconds after a fixed base, in UTC.
pub fn ts(secs: u32) -> String {
    format!("2025-03-01T10:{:02}:{:02}Z", secs / 60, secs % 60)
}

pub fn line(value: Value) -> String {
    serde_json::to_string(&value).unwrap()
}

pub fn user(uuid: &str, secs: u32, text: &str) -> String {
    line(json!({
        "uuid": uuid, "type": "user", "timestamp": ts(secs),
        "message": {"role": "user", "content": text}
    }))
}

pub fn assistant(uuid: &str, secs: u32, text: &str) -> String {
    line(json!({
        "uuid": uuid, "type": "assistant", "timestamp": ts(secs),
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    }))
}

pub fn assistant_with_usage(uuid: &str, secs: u32, input: u64, output: u64) -> String {
    line(json!({
        "uuid": uuid, "type": "assistant", "timestamp": ts(secs),
        "message": {
            "role": "assistant",
            "content": [{"type": "text", "text": "ok"}],
            "usage": {"input_tokens": input, "output_tokens": output}
        }
    }))
}

pub fn tool_call(uuid: &str, secs: u32, tool_id: &str, name: &str) -> String {
    line(json!({
        "uuid": uuid, "type": "assistant", "timestamp": ts(secs),
        "message": {"role": "assistant", "content": [
            {"type": "tool_use", "id": tool_id, "name": name, "input": {}}
        ]}
    }))
}

pub fn task_call(uuid: &str, secs: u32, tool_id: &str, subagent_type: &str) -> String {
    line(json!({
        "uuid": uuid, "type": "assistant", "timestamp": ts(secs),
        "message": {"role": "assistant", "content": [
            {"type": "tool_use", "id": tool_id, "name": "Task",
             "input": {"subagent_type": subagent_type, "prompt": "look around"}}
        ]}
    }))
}

pub fn tool_result(uuid: &str, secs: u32, tool_id: &str) -> String {
    line(json!({
        "uuid": uuid, "type": "user", "timestamp": ts(secs),
        "message": {"role": "user", "content": [
            {"type": "tool_result", "tool_use_id": tool_id, "content": "done"}
        ]}
    }))
}

pub fn agent_result(uuid: &str, secs: u32, tool_id: &str, agent_id: &str) -> String {
    line(json!({
        "uuid": uuid, "type": "user", "timestamp": ts(secs),
        "message": {"role": "user", "content": [
            {"type": "tool_result", "tool_use_id": tool_id, "content": "report"}
        ]},
        "toolUseResult": {"agentId": agent_id, "status": "completed"}
    }))
}

pub fn snapshot() -> String {
    line(json!({"type": "file-history-snapshot", "messageId": "m1", "snapshot": {}}))
}

/// Write `lines` as a JSONL file and return its path.
pub fn write_jsonl(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

/// Create `<root>/<project>` and return it.
pub fn project_dir(root: &Path, project: &str) -> PathBuf {
    let dir = root.join(project);
    fs::create_dir_all(&dir).unwrap();
    dir
}
