//! Completed focus sessions and the ordered log that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed focus interval.
///
/// Timestamps are stored as epoch milliseconds so that logs written by older
/// builds (which used a millisecond clock for both `id` and `timestamp`) keep
/// loading. Unknown fields are ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub duration: u32,
}

/// Insertion-ordered session history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLog {
    sessions: Vec<Session>,
}

impl SessionLog {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Appends a session completed at `at` and returns it.
    ///
    /// Ids follow the completion time in milliseconds but never repeat, even
    /// when two sessions land in the same millisecond or the clock steps back.
    pub fn append(&mut self, at: DateTime<Utc>, duration_minutes: u32) -> &Session {
        let candidate = u64::try_from(at.timestamp_millis()).unwrap_or(0);
        let id = match self.sessions.iter().map(|s| s.id).max() {
            Some(last) if candidate <= last => last + 1,
            _ => candidate,
        };

        self.sessions.push(Session {
            id,
            timestamp: at,
            duration: duration_minutes,
        });
        &self.sessions[self.sessions.len() - 1]
    }

    pub fn total_minutes(&self) -> u64 {
        self.sessions.iter().map(|s| u64::from(s.duration)).sum()
    }
}
