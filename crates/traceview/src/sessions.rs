use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;

use traceview_sessions::{
    event_duration, tool_name_for_result, Event, EventDetail, EventLabel, ProjectSessions,
    SessionStats, SessionStore,
};

#[derive(Subcommand, Debug)]
pub enum SessionsAction {
    /// List projects and their sessions, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a session's expanded timeline
    Show {
        /// Session ID (launches interactive picker if omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one event in detail
    Event {
        /// Session ID
        id: String,

        /// Event ID (uuid, or line index for records without one)
        event_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show token, time and tool statistics for a session
    Stats {
        /// Session ID (launches interactive picker if omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_sessions_command(store: &SessionStore, action: SessionsAction) -> Result<()> {
    match action {
        SessionsAction::List { json } => {
            let projects = store.projects();

            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!(
                    "{} {}",
                    "No sessions found in".dimmed(),
                    store.projects_dir().display().to_string().dimmed()
                );
            } else {
                print_projects(&projects);
            }
        }
        SessionsAction::Show { id, json } => {
            let id = resolve_session_id(store, id)?;
            let session = store.find(&id)?;
            let events = store.timeline(&id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                println!(
                    "{}  {}  {}",
                    "Session:".dimmed(),
                    session.session_id.bold(),
                    session.project_name.dimmed()
                );
                println!();
                if events.is_empty() {
                    println!("{}", "No trace events found.".dimmed());
                } else {
                    print_timeline(&events);
                }
            }
        }
        SessionsAction::Event { id, event_id, json } => {
            let detail = store.event(&id, &event_id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print_event_detail(&detail);
            }
        }
        SessionsAction::Stats { id, json } => {
            let id = resolve_session_id(store, id)?;
            let stats = store.statistics(&id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&id, &stats);
            }
        }
    }

    Ok(())
}

fn resolve_session_id(store: &SessionStore, id: Option<String>) -> Result<String> {
    if let Some(id) = id {
        return Ok(id);
    }

    // Interactive picker
    let sessions = store.list();
    if sessions.is_empty() {
        anyhow::bail!("No sessions found.");
    }

    let items: Vec<String> = sessions
        .iter()
        .map(|s| {
            format!(
                "{} | {} | {}",
                s.created_at.format("%Y-%m-%d %H:%M"),
                s.session_id,
                s.project_name
            )
        })
        .collect();

    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a session")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(sessions[selection].session_id.clone())
}

fn print_projects(projects: &[ProjectSessions]) {
    println!("{}", "=== Projects & Sessions ===".bright_blue().bold());

    for project in projects {
        println!();
        println!(
            "{}  {}",
            project.project_name.bold(),
            project
                .last_active
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed()
        );
        println!(
            "  {:<38} {:<17} {:>10} {:>9}",
            "SESSION".dimmed(),
            "LAST ACTIVE".dimmed(),
            "TOKENS".dimmed(),
            "ACTIVE".dimmed(),
        );
        for listing in &project.sessions {
            println!(
                "  {:<38} {:<17} {:>10} {:>9}",
                listing.session.session_id,
                listing.session.created_at.format("%Y-%m-%d %H:%M").to_string(),
                listing.overview.total_tokens,
                format_duration(listing.overview.active_time_secs),
            );
        }
    }
}

fn print_timeline(events: &[Event]) {
    for (idx, event) in events.iter().enumerate() {
        let previous = idx.checked_sub(1).map(|i| &events[i]);
        let duration = event_duration(event, previous, events)
            .map(|d| format!("{:.2}s", d))
            .unwrap_or_default();

        let label = event.label();
        let text = match &label {
            EventLabel::SubAgent { .. } => event.subagent_type().unwrap_or_default().to_string(),
            EventLabel::ToolResult { .. } => event
                .tool_use_id()
                .map(|id| tool_name_for_result(events, id).to_string())
                .unwrap_or_else(|| event.display_text()),
            _ => event.display_text(),
        };

        let indent = "  ".repeat(event.level as usize);
        println!(
            "{}{} {} {}",
            indent,
            colored_label(&label),
            duration.dimmed(),
            single_line(&text, 100)
        );
    }
}

fn colored_label(label: &EventLabel) -> String {
    let text = format!("[{}]", label);
    match label {
        EventLabel::Thinking => text.blue().to_string(),
        EventLabel::ToolCall { .. } => text.yellow().to_string(),
        EventLabel::SubAgent { .. } => text.cyan().to_string(),
        EventLabel::ToolResult { .. } => text.green().to_string(),
        EventLabel::Assistant => text.purple().to_string(),
        EventLabel::Other(_) => text.dimmed().to_string(),
    }
}

fn print_event_detail(detail: &EventDetail) {
    let event = &detail.event;

    println!("{}", "=== Event Detail ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), event.id);
    println!("{}  {}", "Type:".dimmed(), event.kind);
    println!("{}  {}", "Label:".dimmed(), event.label());
    if !event.timestamp.is_empty() {
        println!("{}  {}", "Timestamp:".dimmed(), event.timestamp);
    }
    if event.level > 0 {
        println!("{}  {}", "Level:".dimmed(), event.level);
    }
    if event.is_sidechain {
        println!("{}  {}", "Sidechain:".dimmed(), "yes".cyan());
    }

    if detail.duration_secs.is_some() || event.usage().is_some() {
        println!();
        println!("{}", "--- Metrics ---".dimmed());
        if let Some(duration) = detail.duration_secs {
            println!("  {} {:.2}s", "Duration:".dimmed(), duration);
        }
        if let Some(usage) = event.usage() {
            println!("  {} {}", "input_tokens:".dimmed(), usage.input_tokens);
            println!("  {} {}", "output_tokens:".dimmed(), usage.output_tokens);
            println!(
                "  {} {}",
                "cache_creation_input_tokens:".dimmed(),
                usage.cache_creation_input_tokens
            );
            println!(
                "  {} {}",
                "cache_read_input_tokens:".dimmed(),
                usage.cache_read_input_tokens
            );
        }
    }

    let mut items = event.content_items().peekable();
    if items.peek().is_some() || event.content_text().is_some() {
        println!();
        println!("{}", "--- Content ---".dimmed());
    }
    if let Some(text) = event.content_text() {
        println!("{}", text);
    }
    for item in items {
        let field = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or("");
        match field("type") {
            "text" => println!("{}", field("text")),
            "thinking" => println!("{}", field("thinking").italic()),
            "image" => println!("{}", "[image]".dimmed()),
            "tool_use" => {
                println!("  {} {}", "ID:".dimmed(), field("id"));
                println!("  {} {}", "Name:".dimmed(), field("name"));
                let input = item.get("input").cloned().unwrap_or(Value::Null);
                println!(
                    "  {} {}",
                    "Input:".dimmed(),
                    serde_json::to_string_pretty(&input).unwrap_or_default()
                );
            }
            "tool_result" => {
                let tool_id = item.get("tool_use_id").and_then(Value::as_str);
                println!("  {} {}", "Tool ID:".dimmed(), tool_id.unwrap_or("N/A"));
                println!(
                    "  {} {}",
                    "Tool Name:".dimmed(),
                    detail.tool_name.as_deref().unwrap_or("unknown")
                );
                match item.get("content") {
                    Some(Value::String(text)) => println!("{}", text),
                    Some(Value::Array(parts)) => {
                        for part in parts {
                            match part.get("type").and_then(Value::as_str) {
                                Some("text") => println!(
                                    "{}",
                                    part.get("text").and_then(Value::as_str).unwrap_or("")
                                ),
                                Some("image") => println!("{}", "[image]".dimmed()),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    println!();
    println!("{}", "--- Event Data ---".dimmed());
    println!(
        "{}",
        serde_json::to_string_pretty(&event.raw).unwrap_or_default()
    );
}

fn print_stats(session_id: &str, stats: &SessionStats) {
    println!("{}", "=== Session Statistics ===".bright_blue().bold());
    println!("{}  {}", "Session:".dimmed(), session_id);
    println!("{}  {}", "Input Tokens:".dimmed(), stats.input_tokens);
    println!("{}  {}", "Output Tokens:".dimmed(), stats.output_tokens);
    println!("{}  {}", "Total Tokens:".dimmed(), stats.total_tokens);
    println!(
        "{}  {}",
        "Active Time:".dimmed(),
        format_duration(stats.active_time_secs)
    );

    if !stats.tool_counts.is_empty() {
        println!();
        println!("{}", "Tools:".dimmed());
        for (name, count) in sorted_counts(&stats.tool_counts) {
            println!("  {:<24} {}", name, count);
        }
    }

    if !stats.subagents.is_empty() {
        println!();
        println!(
            "{}",
            format!("--- Sub-agents ({}) ---", stats.subagents.len()).dimmed()
        );
        for agent in &stats.subagents {
            println!();
            println!(
                "  {} {}",
                agent.subagent_type.cyan().bold(),
                agent.agent_id.dimmed()
            );
            println!(
                "    {} {} in / {} out / {} total",
                "Tokens:".dimmed(),
                agent.input_tokens,
                agent.output_tokens,
                agent.total_tokens
            );
            println!(
                "    {} {}",
                "Active:".dimmed(),
                format_duration(agent.active_time_secs)
            );
            for (name, count) in sorted_counts(&agent.tool_counts) {
                println!("    {:<22} {}", name, count);
            }
        }
    }
}

/// Tool counts, most used first.
fn sorted_counts(counts: &std::collections::BTreeMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));
    sorted
}

fn single_line(text: &str, limit: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > limit {
        format!("{}...", flat.chars().take(limit).collect::<String>())
    } else {
        flat
    }
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.0}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = (secs % 60.0) as u64;
        format!("{}m {}s", mins, remaining_secs)
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let mins = ((secs % 3600.0) / 60.0) as u64;
        format!("{}h {}m", hours, mins)
    }
}
