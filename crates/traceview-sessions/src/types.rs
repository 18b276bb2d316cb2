use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One parsed line of a session or agent log.
///
/// Everything beyond identity and nesting is read on demand from `raw`;
/// see the accessors in `event.rs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub kind: String,
    /// Empty when the record carried no timestamp.
    pub timestamp: String,
    pub parent_id: Option<String>,
    pub is_sidechain: bool,
    /// 0 on the main timeline, 1 for inlined sub-agent events and the
    /// tool result that closes them.
    pub level: u32,
    pub raw: Map<String, Value>,
}

/// A top-level session log discovered under a project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub project_name: String,
    /// Most recent activity: the last timestamp in the file, local wall clock.
    pub created_at: NaiveDateTime,
    pub file_path: PathBuf,
}

/// Token counts reported on a single message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

impl TokenUsage {
    /// Input side of the context window, cached or not.
    pub fn total_input(&self) -> u64 {
        self.input_tokens + self.cache_creation_input_tokens + self.cache_read_input_tokens
    }
}

/// Aggregates for one expanded session timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub active_time_secs: f64,
    /// Main-timeline tool calls only.
    pub tool_counts: BTreeMap<String, usize>,
    pub subagents: Vec<SubAgentSummary>,
}

/// Summary of one sub-agent run, keyed by its agent id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubAgentSummary {
    pub agent_id: String,
    pub subagent_type: String,
    pub tool_counts: BTreeMap<String, usize>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub active_time_secs: f64,
}

/// An event together with what a detail view needs around it.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub event: Event,
    pub previous: Option<Event>,
    pub duration_secs: Option<f64>,
    /// For tool results: the name of the matching tool call.
    pub tool_name: Option<String>,
}

/// Quick per-session figures for list views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOverview {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub active_time_secs: f64,
}

impl From<&SessionStats> for SessionOverview {
    fn from(stats: &SessionStats) -> Self {
        Self {
            input_tokens: stats.input_tokens,
            output_tokens: stats.output_tokens,
            total_tokens: stats.total_tokens,
            active_time_secs: stats.active_time_secs,
        }
    }
}

/// A listed session with its quick stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListing {
    #[serde(flatten)]
    pub session: Session,
    pub overview: SessionOverview,
}

/// Sessions sharing a project directory, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSessions {
    pub project_name: String,
    pub last_active: NaiveDateTime,
    pub sessions: Vec<SessionListing>,
}
