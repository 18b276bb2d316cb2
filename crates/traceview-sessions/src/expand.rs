//! Inlining of sub-agent traces into their parent timeline.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::parser::parse_agent_file;
use crate::types::Event;

/// Nesting level given to inlined sub-agent events.
pub const SUBAGENT_LEVEL: u32 = 1;

/// Path of the trace file for `agent_id` inside a project directory.
pub fn agent_file_path(project_dir: &Path, agent_id: &str) -> PathBuf {
    project_dir.join(format!("agent-{}.jsonl", agent_id))
}

/// Splice each sub-agent's events in front of the tool result that closed it.
///
/// A resumed agent (same id, several call/result pairs) is loaded once.
/// Call/result pairs replayed by context compaction are dropped.
pub fn expand_subagents(events: Vec<Event>, project_dir: &Path) -> Vec<Event> {
    let agent_for_tool = agent_ids_by_tool_use(&events);

    let mut loaded_agents: HashSet<String> = HashSet::new();
    let mut processed_tool_ids: HashSet<String> = HashSet::new();
    let mut expanded = Vec::with_capacity(events.len());

    for mut event in events {
        if event.is_task_call() {
            if let Some(id) = event.tool_call_id() {
                if processed_tool_ids.contains(id) {
                    tracing::debug!("Dropping replayed Task call {}", id);
                    continue;
                }
            }
        }

        let agent = event.tool_use_id().and_then(|tool_id| {
            agent_for_tool
                .get(tool_id)
                .map(|agent_id| (tool_id.to_string(), agent_id.clone()))
        });

        if let Some((tool_id, agent_id)) = agent {
            if processed_tool_ids.contains(&tool_id) {
                tracing::debug!("Dropping replayed result for {}", tool_id);
                continue;
            }

            let agent_path = agent_file_path(project_dir, &agent_id);
            if agent_path.exists() && !loaded_agents.contains(&agent_id) {
                match parse_agent_file(&agent_path, SUBAGENT_LEVEL) {
                    Ok(agent_events) => expanded.extend(agent_events),
                    Err(e) => tracing::warn!("Failed to load agent {}: {}", agent_id, e),
                }
                loaded_agents.insert(agent_id);
            }

            event.level = SUBAGENT_LEVEL;
            processed_tool_ids.insert(tool_id);
        }

        expanded.push(event);
    }

    expanded
}

/// Map each sub-agent tool result's `tool_use_id` to its agent id; the first
/// occurrence wins.
fn agent_ids_by_tool_use(events: &[Event]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for event in events.iter().filter(|e| e.is_tool_result()) {
        if let (Some(tool_id), Some(agent_id)) = (event.tool_use_id(), event.agent_id()) {
            map.entry(tool_id.to_string())
                .or_insert_with(|| agent_id.to_string());
        }
    }
    map
}
