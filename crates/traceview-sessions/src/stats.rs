//! Single-pass aggregation over an expanded timeline.

use std::collections::{BTreeMap, HashSet};

use crate::duration::event_duration;
use crate::timestamp::{parse_timestamp, seconds_between};
use crate::types::{Event, SessionStats, SubAgentSummary, TokenUsage};

/// Aggregate token, time and tool usage for an expanded timeline.
///
/// Input tokens come from the last usage-bearing event, since input usage is
/// reported cumulatively; output tokens are summed per turn.
pub fn aggregate(events: &[Event]) -> SessionStats {
    let mut stats = SessionStats::default();
    let mut last_usage: Option<TokenUsage> = None;
    let mut seen_agents: HashSet<String> = HashSet::new();
    let mut state = SubAgentState::Idle;

    for (idx, event) in events.iter().enumerate() {
        let previous = idx.checked_sub(1).map(|i| &events[i]);
        if let Some(secs) = event_duration(event, previous, events) {
            if secs >= 0.0 {
                stats.active_time_secs += secs;
            }
        }

        if let Some(usage) = event.usage() {
            stats.output_tokens += usage.output_tokens;
            last_usage = Some(usage);
        }

        if event.level == 0 {
            if event.is_tool_call() {
                *stats
                    .tool_counts
                    .entry(event.tool_name().to_string())
                    .or_insert(0) += 1;
            }
            if event.is_task_call() {
                if let SubAgentState::Accumulating(stale) = &state {
                    tracing::debug!(
                        "Discarding unfinished sub-agent accumulator ({})",
                        stale.subagent_type
                    );
                }
                state = SubAgentState::Accumulating(SubAgentAccumulator::new(
                    event.tool_call_id().unwrap_or_default(),
                    event.subagent_type().unwrap_or_default(),
                ));
            }
            continue;
        }

        let SubAgentState::Accumulating(acc) = &mut state else {
            continue;
        };

        let closing_agent = event
            .agent_id()
            .filter(|_| event.tool_use_id() == Some(acc.tool_call_id.as_str()));

        if let Some(agent_id) = closing_agent {
            let summary = acc.finish(agent_id.to_string(), event.subagent_usage());
            if seen_agents.insert(summary.agent_id.clone()) {
                stats.subagents.push(summary);
            }
            state = SubAgentState::Idle;
        } else {
            acc.observe(event);
        }
    }

    if let Some(usage) = last_usage {
        stats.input_tokens = usage.total_input();
    }
    stats.total_tokens = stats.input_tokens + stats.output_tokens;

    stats
}

/// Whether a sub-agent run is being collected.
enum SubAgentState {
    Idle,
    Accumulating(SubAgentAccumulator),
}

struct SubAgentAccumulator {
    /// Id of the opening `Task` call; only its result closes the run.
    tool_call_id: String,
    subagent_type: String,
    tool_counts: BTreeMap<String, usize>,
    last_usage: Option<TokenUsage>,
    first_timestamp: Option<String>,
    last_timestamp: Option<String>,
}

impl SubAgentAccumulator {
    fn new(tool_call_id: &str, subagent_type: &str) -> Self {
        Self {
            tool_call_id: tool_call_id.to_string(),
            subagent_type: subagent_type.to_string(),
            tool_counts: BTreeMap::new(),
            last_usage: None,
            first_timestamp: None,
            last_timestamp: None,
        }
    }

    fn observe(&mut self, event: &Event) {
        if event.is_tool_call() {
            *self
                .tool_counts
                .entry(event.tool_name().to_string())
                .or_insert(0) += 1;
        }
        if let Some(usage) = event.usage() {
            self.last_usage = Some(usage);
        }
        if parse_timestamp(&event.timestamp).is_some() {
            if self.first_timestamp.is_none() {
                self.first_timestamp = Some(event.timestamp.clone());
            }
            self.last_timestamp = Some(event.timestamp.clone());
        }
    }

    /// Close the run. `reported` is the result's own end-of-run usage, which
    /// takes precedence over per-event usage.
    fn finish(&mut self, agent_id: String, reported: Option<TokenUsage>) -> SubAgentSummary {
        let usage = reported.or(self.last_usage).unwrap_or_default();
        let input_tokens = usage.total_input();
        let output_tokens = usage.output_tokens;

        let active_time_secs = match (&self.first_timestamp, &self.last_timestamp) {
            (Some(first), Some(last)) => seconds_between(first, last).unwrap_or(0.0),
            _ => 0.0,
        };

        SubAgentSummary {
            agent_id,
            subagent_type: std::mem::take(&mut self.subagent_type),
            tool_counts: std::mem::take(&mut self.tool_counts),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            active_time_secs,
        }
    }
}
