//! Typed views over an event's raw record.
//!
//! Log records are schema-less and evolve upstream, so every accessor probes
//! the expected shape and returns an empty value on any mismatch.

use serde_json::{Map, Value};

use crate::types::{Event, TokenUsage};

/// Tool name that launches a sub-agent.
pub const TASK_TOOL: &str = "Task";

const DISPLAY_LIMIT: usize = 200;

/// Short classification used by list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLabel {
    Thinking,
    ToolCall { short_id: Option<String> },
    SubAgent { short_id: Option<String> },
    ToolResult { short_id: Option<String> },
    Assistant,
    Other(String),
}

impl std::fmt::Display for EventLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, short_id) = match self {
            EventLabel::Thinking => ("thinking", None),
            EventLabel::ToolCall { short_id } => ("tool call", short_id.as_deref()),
            EventLabel::SubAgent { short_id } => ("subagent", short_id.as_deref()),
            EventLabel::ToolResult { short_id } => ("tool result", short_id.as_deref()),
            EventLabel::Assistant => ("assistant", None),
            EventLabel::Other(kind) => (kind.as_str(), None),
        };
        match short_id {
            Some(id) => write!(f, "{} {}", name, id),
            None => f.write_str(name),
        }
    }
}

impl Event {
    /// Build an event from a decoded record, using `fallback_id` when the
    /// record has no `uuid`.
    pub fn from_record(raw: Map<String, Value>, fallback_id: usize, level: u32) -> Self {
        let str_field = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            id: str_field("uuid").unwrap_or_else(|| fallback_id.to_string()),
            kind: str_field("type").unwrap_or_else(|| "unknown".to_string()),
            timestamp: str_field("timestamp").unwrap_or_default(),
            parent_id: str_field("parentUuid"),
            is_sidechain: raw
                .get("isSidechain")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            level,
            raw,
        }
    }

    pub fn is_user(&self) -> bool {
        self.kind == "user"
    }

    fn message(&self) -> Option<&Map<String, Value>> {
        self.raw.get("message").and_then(Value::as_object)
    }

    /// The message content when it is a plain string.
    pub fn content_text(&self) -> Option<&str> {
        self.message()?.get("content")?.as_str()
    }

    /// Object items of the message content array.
    pub fn content_items(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.message()
            .and_then(|m| m.get("content"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }

    fn first_item(&self, item_type: &str) -> Option<&Map<String, Value>> {
        self.content_items()
            .find(|item| item.get("type").and_then(Value::as_str) == Some(item_type))
    }

    pub fn is_tool_call(&self) -> bool {
        self.first_item("tool_use").is_some()
    }

    pub fn is_tool_result(&self) -> bool {
        self.first_item("tool_result").is_some()
    }

    pub fn is_thinking(&self) -> bool {
        self.first_item("thinking").is_some()
    }

    /// `tool_use_id` of the first tool result item.
    pub fn tool_use_id(&self) -> Option<&str> {
        self.first_item("tool_result")?
            .get("tool_use_id")?
            .as_str()
    }

    /// `id` of the first tool use item.
    pub fn tool_call_id(&self) -> Option<&str> {
        self.first_item("tool_use")?.get("id")?.as_str()
    }

    /// Name of the first tool use item: empty when this is not a tool call,
    /// `unknown` when the item has no name.
    pub fn tool_name(&self) -> &str {
        match self.first_item("tool_use") {
            Some(item) => item.get("name").and_then(Value::as_str).unwrap_or("unknown"),
            None => "",
        }
    }

    pub fn is_task_call(&self) -> bool {
        self.is_tool_call() && self.tool_name() == TASK_TOOL
    }

    /// Declared `subagent_type` of a `Task` call.
    pub fn subagent_type(&self) -> Option<&str> {
        if !self.is_task_call() {
            return None;
        }
        self.first_item("tool_use")?
            .get("input")?
            .get("subagent_type")?
            .as_str()
    }

    /// `toolUseResult.agentId`, present on results that closed a sub-agent.
    pub fn agent_id(&self) -> Option<&str> {
        self.tool_use_result()?.get("agentId")?.as_str()
    }

    pub fn is_subagent_result(&self) -> bool {
        self.is_tool_result()
            && self
                .tool_use_result()
                .and_then(|result| result.get("agentId"))
                .is_some_and(Value::is_string)
    }

    fn tool_use_result(&self) -> Option<&Map<String, Value>> {
        self.raw.get("toolUseResult").and_then(Value::as_object)
    }

    /// `message.usage`, if it decodes as token counts.
    pub fn usage(&self) -> Option<TokenUsage> {
        usage_from(self.message()?.get("usage")?)
    }

    /// End-of-run totals reported on a sub-agent's tool result.
    pub fn subagent_usage(&self) -> Option<TokenUsage> {
        usage_from(self.tool_use_result()?.get("usage")?)
    }

    pub fn thinking_text(&self) -> &str {
        self.first_item("thinking")
            .and_then(|item| item.get("thinking"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Whether this event is eligible for a duration at all.
    ///
    /// Plain user prompts never get one; tool results do even though their
    /// record type is `user`.
    pub fn has_duration(&self) -> bool {
        !self.is_user() || self.is_tool_result()
    }

    /// One-line human-readable summary.
    pub fn display_text(&self) -> String {
        if self.kind == "summary" {
            return self
                .raw
                .get("summary")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
        }

        if let Some(message) = self.message() {
            match message.get("content") {
                Some(Value::String(text)) => return truncate(text, DISPLAY_LIMIT),
                Some(Value::Array(items)) => {
                    for item in items.iter().filter_map(Value::as_object) {
                        let text_of = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or("");
                        match item.get("type").and_then(Value::as_str) {
                            Some("text") => return truncate(text_of("text"), DISPLAY_LIMIT),
                            Some("tool_use") => {
                                return item
                                    .get("name")
                                    .and_then(Value::as_str)
                                    .unwrap_or("unknown")
                                    .to_string()
                            }
                            Some("tool_result") => return "tool_result".to_string(),
                            Some("thinking") => {
                                return text_of("thinking")
                                    .split('\n')
                                    .take(2)
                                    .collect::<Vec<_>>()
                                    .join("\n")
                            }
                            _ => {}
                        }
                    }
                    return "Multiple content items".to_string();
                }
                _ => {}
            }
        }

        if self.kind == "system" {
            let content = self.raw.get("content").and_then(Value::as_str).unwrap_or("");
            return truncate(content, DISPLAY_LIMIT);
        }

        format!("{} event", self.kind)
    }

    pub fn label(&self) -> EventLabel {
        if self.is_thinking() {
            EventLabel::Thinking
        } else if self.is_tool_call() {
            let short_id = self.tool_call_id().and_then(short_id);
            match self.subagent_type() {
                Some(kind) if !kind.is_empty() => EventLabel::SubAgent { short_id },
                _ => EventLabel::ToolCall { short_id },
            }
        } else if self.is_tool_result() {
            EventLabel::ToolResult {
                short_id: self.tool_use_id().and_then(short_id),
            }
        } else if self.kind == "assistant" {
            EventLabel::Assistant
        } else {
            EventLabel::Other(self.kind.clone())
        }
    }
}

/// Name of the tool call answered by `tool_use_id`, searching every content
/// item of every event.
pub fn tool_name_for_result<'a>(events: &'a [Event], tool_use_id: &str) -> &'a str {
    events
        .iter()
        .flat_map(Event::content_items)
        .find(|item| {
            item.get("type").and_then(Value::as_str) == Some("tool_use")
                && item.get("id").and_then(Value::as_str) == Some(tool_use_id)
        })
        .map(|item| item.get("name").and_then(Value::as_str).unwrap_or("unknown"))
        .unwrap_or("unknown")
}

/// Each counter is read on its own; a missing, null or mistyped counter is 0.
fn usage_from(value: &Value) -> Option<TokenUsage> {
    let usage = value.as_object()?;
    let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);

    Some(TokenUsage {
        input_tokens: count("input_tokens"),
        output_tokens: count("output_tokens"),
        cache_creation_input_tokens: count("cache_creation_input_tokens"),
        cache_read_input_tokens: count("cache_read_input_tokens"),
    })
}

fn short_id(id: &str) -> Option<String> {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() < 4 {
        return None;
    }
    Some(chars[chars.len() - 4..].iter().collect())
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
