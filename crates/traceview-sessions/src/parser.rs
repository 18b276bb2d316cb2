use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, TraceError};
use crate::timestamp::parse_local;
use crate::types::Event;

/// Record type written by the runtime for its own file-history bookkeeping.
pub const SNAPSHOT_RECORD: &str = "file-history-snapshot";

/// Literal prompt of a warmup sub-agent run.
pub const WARMUP_PROMPT: &str = "Warmup";

/// How a record without a `uuid` is given an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackId {
    /// Raw line index in the file, blank and malformed lines included.
    LineIndex,
    /// Number of events already produced.
    Position,
}

/// Parse a session log into events, one per decodable line, in file order.
pub fn parse_session_file(path: &Path) -> Result<Vec<Event>> {
    parse_events(path, 0, FallbackId::LineIndex)
}

/// Parse a sub-agent log, tagging every event with `level`.
///
/// Warmup runs produce no events.
pub fn parse_agent_file(path: &Path, level: u32) -> Result<Vec<Event>> {
    if is_warmup_agent(path)? {
        tracing::debug!("Skipping warmup agent file {:?}", path);
        return Ok(Vec::new());
    }
    parse_events(path, level, FallbackId::Position)
}

/// Whether the first `user` record of an agent log is the bare `Warmup` prompt.
pub fn is_warmup_agent(path: &Path) -> Result<bool> {
    #[derive(Deserialize)]
    struct Probe {
        #[serde(rename = "type")]
        kind: Option<String>,
        message: Option<Value>,
    }

    for line in read_lines(path)? {
        let (_, bytes) = line?;
        let Ok(probe) = serde_json::from_slice::<Probe>(&bytes) else {
            continue;
        };
        if probe.kind.as_deref() != Some("user") {
            continue;
        }
        let content = probe
            .message
            .as_ref()
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str);
        return Ok(content.is_some_and(|text| text.trim() == WARMUP_PROMPT));
    }

    Ok(false)
}

/// Scan a session log for its most recent activity: the last timestamp in
/// file order, as local wall-clock time.
pub fn last_timestamp(path: &Path) -> Result<Option<chrono::NaiveDateTime>> {
    #[derive(Deserialize)]
    struct Probe {
        #[serde(default)]
        timestamp: Option<String>,
    }

    let mut latest = None;
    for line in read_lines(path)? {
        let (_, bytes) = line?;
        let Ok(probe) = serde_json::from_slice::<Probe>(&bytes) else {
            continue;
        };
        if let Some(ts) = probe.timestamp.as_deref().and_then(parse_local) {
            latest = Some(ts);
        }
    }

    Ok(latest)
}

fn parse_events(path: &Path, level: u32, fallback: FallbackId) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for line in read_lines(path)? {
        let (idx, bytes) = line?;

        let raw: Map<String, Value> = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Error parsing line {} of {:?}: {}", idx, path, e);
                continue;
            }
        };

        if raw.get("type").and_then(Value::as_str) == Some(SNAPSHOT_RECORD) {
            continue;
        }

        let fallback_id = match fallback {
            FallbackId::LineIndex => idx,
            FallbackId::Position => events.len(),
        };
        events.push(Event::from_record(raw, fallback_id, level));
    }

    Ok(events)
}

/// Non-blank lines of a file with their raw line index.
///
/// Lines are yielded as bytes so invalid UTF-8 fails per line at decode time
/// rather than aborting the read.
fn read_lines(path: &Path) -> Result<impl Iterator<Item = Result<(usize, Vec<u8>)>> + '_> {
    let file = File::open(path).map_err(|e| TraceError::io(path, e))?;
    let reader = BufReader::new(file);

    Ok(reader
        .split(b'\n')
        .enumerate()
        .filter_map(move |(idx, line)| match line {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => None,
            Ok(bytes) => Some(Ok((idx, bytes))),
            Err(e) => Some(Err(TraceError::io(path, e))),
        }))
}
