//! # traceview-sessions
//!
//! Trace reconstruction for agent session logs.
//!
//! Session logs are append-only JSONL files grouped in one directory per
//! project. This crate turns them into a causally ordered timeline with
//! sub-agent traces inlined, reconciles tool call/result durations, and
//! aggregates token, time and tool usage.
//!
//! ## Pipeline
//!
//! - [`SessionStore::list`] - discover sessions by most recent activity
//! - [`parse_session_file`] - one [`Event`] per decodable line
//! - [`expand_subagents`] - splice `agent-<id>.jsonl` traces into the timeline
//! - [`event_duration`] - elapsed time per event
//! - [`aggregate`] - [`SessionStats`] for a timeline
//!
//! Every call re-reads the files from disk; nothing is cached.

pub mod duration;
pub mod error;
pub mod event;
pub mod expand;
pub mod parser;
pub mod stats;
pub mod store;
pub mod timestamp;
pub mod types;

pub use duration::{calculate_duration, event_duration, find_tool_call};
pub use error::{Result, TraceError};
pub use event::{tool_name_for_result, EventLabel, TASK_TOOL};
pub use expand::{agent_file_path, expand_subagents, SUBAGENT_LEVEL};
pub use parser::{is_warmup_agent, last_timestamp, parse_agent_file, parse_session_file};
pub use stats::aggregate;
pub use store::{event_detail, group_by_project, load_timeline, SessionStore};
pub use types::{
    Event, EventDetail, ProjectSessions, Session, SessionListing, SessionOverview, SessionStats,
    SubAgentSummary, TokenUsage,
};
