use std::path::{Path, PathBuf};

use crate::duration::event_duration;
use crate::error::{Result, TraceError};
use crate::event::tool_name_for_result;
use crate::expand::expand_subagents;
use crate::parser::{last_timestamp, parse_session_file};
use crate::stats::aggregate;
use crate::types::{
    Event, EventDetail, ProjectSessions, Session, SessionListing, SessionOverview, SessionStats,
};

/// Extension of session and agent log files.
pub const LOG_EXTENSION: &str = "jsonl";

/// File-name prefix of sub-agent traces, which are never listed on their own.
pub const AGENT_FILE_PREFIX: &str = "agent-";

/// Read-only access to a directory of per-project session logs.
///
/// Nothing is cached: every call re-reads the files it needs.
pub struct SessionStore {
    projects_dir: PathBuf,
}

impl SessionStore {
    /// Create a SessionStore over `~/.claude/projects`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(TraceError::HomeDirNotFound)?;
        Ok(Self::with_dir(home.join(".claude").join("projects")))
    }

    /// Create a SessionStore with a custom directory (useful for testing).
    pub fn with_dir(projects_dir: PathBuf) -> Self {
        Self { projects_dir }
    }

    /// Return the projects directory path.
    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Discover sessions, most recently active first.
    ///
    /// Unreadable projects and files are logged and skipped.
    pub fn list(&self) -> Vec<Session> {
        let mut sessions = Vec::new();

        let projects = match std::fs::read_dir(&self.projects_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot read projects dir {:?}: {}", self.projects_dir, e);
                return sessions;
            }
        };

        for project in projects.flatten() {
            let project_dir = project.path();
            let Some(dir_name) = project_dir.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !project_dir.is_dir() || dir_name.starts_with('.') {
                continue;
            }
            let project_name = project_name_from_dir(dir_name);

            let files = match std::fs::read_dir(&project_dir) {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!("Failed to read project dir {:?}: {}", project_dir, e);
                    continue;
                }
            };

            for file in files.flatten() {
                let path = file.path();
                if let Some(session) = locate_session(&path, &project_name) {
                    sessions.push(session);
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    /// Find a listed session by id.
    pub fn find(&self, session_id: &str) -> Result<Session> {
        self.list()
            .into_iter()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| TraceError::SessionNotFound(session_id.to_string()))
    }

    /// The session's expanded timeline.
    pub fn timeline(&self, session_id: &str) -> Result<Vec<Event>> {
        let session = self.find(session_id)?;
        load_timeline(&session)
    }

    /// One event of a session's expanded timeline, with its context.
    pub fn event(&self, session_id: &str, event_id: &str) -> Result<EventDetail> {
        let events = self.timeline(session_id)?;
        event_detail(&events, event_id).ok_or_else(|| TraceError::EventNotFound {
            session_id: session_id.to_string(),
            event_id: event_id.to_string(),
        })
    }

    /// Aggregate statistics for one session.
    pub fn statistics(&self, session_id: &str) -> Result<SessionStats> {
        let events = self.timeline(session_id)?;
        Ok(aggregate(&events))
    }

    /// Sessions grouped by project with quick stats, most recent project first.
    pub fn projects(&self) -> Vec<ProjectSessions> {
        let listings = self.list().into_iter().map(|session| {
            let overview = match load_timeline(&session) {
                Ok(events) => SessionOverview::from(&aggregate(&events)),
                Err(e) => {
                    tracing::warn!("Failed to load session {}: {}", session.session_id, e);
                    SessionOverview::default()
                }
            };
            SessionListing { session, overview }
        });

        group_by_project(listings)
    }
}

/// Parse and expand a session's log.
pub fn load_timeline(session: &Session) -> Result<Vec<Event>> {
    let events = parse_session_file(&session.file_path)?;
    let project_dir = session.file_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(expand_subagents(events, project_dir))
}

/// Look up an event by id and reconcile its duration against the timeline.
pub fn event_detail(events: &[Event], event_id: &str) -> Option<EventDetail> {
    let idx = events.iter().position(|e| e.id == event_id)?;
    let event = &events[idx];
    let previous = idx.checked_sub(1).map(|i| &events[i]);

    Some(EventDetail {
        event: event.clone(),
        previous: previous.cloned(),
        duration_secs: event_duration(event, previous, events),
        tool_name: event
            .tool_use_id()
            .map(|id| tool_name_for_result(events, id).to_string()),
    })
}

/// Group listings by project, keeping their order within each project;
/// projects are ordered by their most recent session.
pub fn group_by_project(listings: impl IntoIterator<Item = SessionListing>) -> Vec<ProjectSessions> {
    let mut projects: Vec<ProjectSessions> = Vec::new();

    for listing in listings {
        let created_at = listing.session.created_at;
        match projects
            .iter_mut()
            .find(|p| p.project_name == listing.session.project_name)
        {
            Some(project) => {
                project.last_active = project.last_active.max(created_at);
                project.sessions.push(listing);
            }
            None => projects.push(ProjectSessions {
                project_name: listing.session.project_name.clone(),
                last_active: created_at,
                sessions: vec![listing],
            }),
        }
    }

    projects.sort_by(|a, b| b.last_active.cmp(&a.last_active));
    projects
}

/// Project directories encode the project path with `-` for separators.
pub fn project_name_from_dir(dir_name: &str) -> String {
    dir_name.replace('-', "/")
}

fn locate_session(path: &Path, project_name: &str) -> Option<Session> {
    if path.extension().and_then(|s| s.to_str()) != Some(LOG_EXTENSION) {
        return None;
    }
    let session_id = path.file_stem().and_then(|s| s.to_str())?;
    if session_id.starts_with(AGENT_FILE_PREFIX) {
        return None;
    }

    match last_timestamp(path) {
        Ok(Some(created_at)) => Some(Session {
            session_id: session_id.to_string(),
            project_name: project_name.to_string(),
            created_at,
            file_path: path.to_path_buf(),
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Error parsing {:?}: {}", path, e);
            None
        }
    }
}
