use serde_json::Value;

use crate::timestamp::seconds_between;
use crate::types::Event;

/// Elapsed seconds attributed to `event`, or `None` when unavailable.
///
/// - sub-agent result: since the previous event, i.e. across the inlined block
/// - other tool result: since its matching tool call anywhere in `all_events`
/// - plain user prompt: never
/// - anything else: since the previous event
pub fn event_duration(event: &Event, previous: Option<&Event>, all_events: &[Event]) -> Option<f64> {
    if !event.has_duration() {
        return None;
    }
    calculate_duration(event, previous, all_events)
}

/// Duration by the pairing rules alone, without the user-prompt exclusion.
pub fn calculate_duration(event: &Event, previous: Option<&Event>, all_events: &[Event]) -> Option<f64> {
    if event.is_tool_result() && !event.is_subagent_result() {
        let tool_use_id = event.tool_use_id()?;
        let call = find_tool_call(all_events, tool_use_id)?;
        return seconds_between(&call.timestamp, &event.timestamp);
    }

    seconds_between(&previous?.timestamp, &event.timestamp)
}

/// First event carrying a `tool_use` item with the given id.
pub fn find_tool_call<'a>(events: &'a [Event], tool_use_id: &str) -> Option<&'a Event> {
    events.iter().find(|e| {
        e.content_items().any(|item| {
            item.get("type").and_then(Value::as_str) == Some("tool_use")
                && item.get("id").and_then(Value::as_str) == Some(tool_use_id)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Event {
        match value {
            Value::Object(raw) => Event::from_record(raw, 0, 0),
            _ => unreachable!(),
        }
    }

    fn call(ts: &str, id: &str) -> Event {
        event(json!({"type": "assistant", "timestamp": ts,
            "message": {"content": [{"type": "tool_use", "id": id, "name": "Read"}]}}))
    }

    fn result(ts: &str, id: &str) -> Event {
        event(json!({"type": "user", "timestamp": ts,
            "message": {"content": [{"type": "tool_result", "tool_use_id": id}]}}))
    }

    #[test]
    fn test_tool_result_matches_call_not_previous() {
        let events = vec![
            call("2025-01-01T00:00:02Z", "abc"),
            event(json!({"type": "assistant", "timestamp": "2025-01-01T00:00:04Z"})),
            result("2025-01-01T00:00:05Z", "abc"),
        ];
        let d = event_duration(&events[2], Some(&events[1]), &events);
        assert_eq!(d, Some(3.0));
    }

    #[test]
    fn test_unmatched_result_is_unavailable() {
        let events = vec![
            call("2025-01-01T00:00:02Z", "abc"),
            result("2025-01-01T00:00:05Z", "zzz"),
        ];
        assert_eq!(event_duration(&events[1], Some(&events[0]), &events), None);
    }

    #[test]
    fn test_subagent_result_uses_previous_event() {
        let events = vec![
            call("2025-01-01T00:00:00Z", "t1"),
            event(json!({"type": "assistant", "timestamp": "2025-01-01T00:00:30Z"})),
            event(json!({"type": "user", "timestamp": "2025-01-01T00:00:32Z",
                "message": {"content": [{"type": "tool_result", "tool_use_id": "t1"}]},
                "toolUseResult": {"agentId": "a1"}})),
        ];
        assert_eq!(event_duration(&events[2], Some(&events[1]), &events), Some(2.0));
    }

    #[test]
    fn test_plain_user_never_has_duration() {
        let events = vec![
            event(json!({"type": "assistant", "timestamp": "2025-01-01T00:00:00Z"})),
            event(json!({"type": "user", "timestamp": "2025-01-01T00:00:09Z",
                "message": {"content": "next"}})),
        ];
        assert_eq!(event_duration(&events[1], Some(&events[0]), &events), None);
        assert_eq!(calculate_duration(&events[1], Some(&events[0]), &events), Some(9.0));
    }

    #[test]
    fn test_first_event_and_bad_timestamps() {
        let events = vec![
            event(json!({"type": "assistant", "timestamp": "2025-01-01T00:00:00Z"})),
            event(json!({"type": "assistant", "timestamp": "garbage"})),
        ];
        assert_eq!(event_duration(&events[0], None, &events), None);
        assert_eq!(event_duration(&events[1], Some(&events[0]), &events), None);
    }
}
