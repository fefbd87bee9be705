//! Countdown state machine.
//!
//! The engine owns no clock. Something outside calls [`TimerEngine::tick`]
//! once per elapsed second while the timer is running, and the engine reports
//! a [`Completion`] when a countdown finishes on its own.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl TimerStatus {
    pub fn headline(self) -> &'static str {
        match self {
            Self::Running => "DEEP FOCUS",
            Self::Idle | Self::Paused => "READY TO FLOW",
        }
    }
}

/// A countdown that reached zero while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub minutes: u32,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    status: TimerStatus,
    selected_minutes: u32,
    remaining_secs: u32,
}

impl TimerEngine {
    /// A zero duration is bumped to one minute.
    pub fn new(selected_minutes: u32) -> Self {
        let selected_minutes = selected_minutes.max(1);
        Self {
            status: TimerStatus::Idle,
            selected_minutes,
            remaining_secs: selected_minutes * 60,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn selected_minutes(&self) -> u32 {
        self.selected_minutes
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.selected_minutes * 60
    }

    pub fn start(&mut self) -> bool {
        if self.status != TimerStatus::Idle {
            return false;
        }
        self.status = TimerStatus::Running;
        debug!(minutes = self.selected_minutes, "timer started");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.status = match self.status {
            TimerStatus::Running => TimerStatus::Paused,
            TimerStatus::Paused => TimerStatus::Running,
            TimerStatus::Idle => return false,
        };
        debug!(status = ?self.status, remaining = self.remaining_secs, "timer toggled");
        true
    }

    /// Abandons the countdown. Never counts as a completed session.
    pub fn stop(&mut self) -> bool {
        if self.status == TimerStatus::Idle {
            return false;
        }
        self.reset();
        debug!("timer stopped");
        true
    }

    /// Zeroes the remaining time; the completion itself happens on the next
    /// tick while running. A paused timer completes on the first tick after
    /// it resumes.
    pub fn skip(&mut self) -> bool {
        if self.status == TimerStatus::Idle {
            return false;
        }
        self.remaining_secs = 0;
        debug!("timer skipped to zero");
        true
    }

    /// Ignored unless idle. Resets the remaining time to the new duration.
    pub fn select_duration(&mut self, minutes: u32) -> bool {
        if self.status != TimerStatus::Idle || minutes == 0 {
            return false;
        }
        self.selected_minutes = minutes;
        self.remaining_secs = minutes * 60;
        true
    }

    pub fn tick(&mut self) -> Option<Completion> {
        if self.status != TimerStatus::Running {
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        let minutes = self.selected_minutes;
        self.reset();
        debug!(minutes, "timer completed");
        Some(Completion { minutes })
    }

    /// Elapsed minutes of the countdown in progress, zero when idle.
    pub fn live_progress_minutes(&self) -> f64 {
        if self.status == TimerStatus::Idle {
            return 0.0;
        }
        f64::from(self.total_secs() - self.remaining_secs) / 60.0
    }

    pub fn progress_ratio(&self) -> f64 {
        let total = f64::from(self.total_secs());
        (1.0 - f64::from(self.remaining_secs) / total).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.remaining_secs = self.total_secs();
    }
}

/// `MM:SS`, with minutes allowed past 99.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
