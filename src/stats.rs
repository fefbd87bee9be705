//! Weekly focus heatmap: buckets completed sessions by weekday and part of day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};

use crate::session::Session;

pub const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Morning,
    Afternoon,
    Evening,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Morning, Slot::Afternoon, Slot::Evening];

    /// Local hour to part of day. The small hours after midnight count as
    /// evening of the same calendar day.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            4..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Evening => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Afternoon => "AFTERNOON",
            Self::Evening => "EVENING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Empty,
    Low,
    Mid,
    High,
}

impl Intensity {
    pub fn of(minutes: f64) -> Self {
        if minutes >= 50.0 {
            Self::High
        } else if minutes >= 25.0 {
            Self::Mid
        } else if minutes > 0.0 {
            Self::Low
        } else {
            Self::Empty
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    start: NaiveDate,
    grid: [[f64; 3]; 7],
    total: f64,
}

impl WeekSummary {
    /// Last day shown, i.e. the Sunday.
    pub fn last_day(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn cell(&self, day: usize, slot: Slot) -> f64 {
        self.grid[day][slot.index()]
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn range_label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%b %-d"),
            self.last_day().format("%b %-d")
        )
    }

    fn add(&mut self, day: usize, slot: Slot, minutes: f64) {
        self.grid[day][slot.index()] += minutes;
        self.total += minutes;
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Builds the grid for the week containing the local date `week_of`, in
/// `now`'s time zone. `live_minutes` belongs to a session still counting down
/// and is only shown when `now` falls in the same week.
pub fn week_summary<Tz: TimeZone>(
    sessions: &[Session],
    week_of: NaiveDate,
    now: &DateTime<Tz>,
    live_minutes: f64,
) -> WeekSummary {
    let tz = now.timezone();
    let start = week_start(week_of);
    let end = start + Duration::days(7);
    let in_week = |date: NaiveDate| date >= start && date < end;

    let mut summary = WeekSummary {
        start,
        grid: [[0.0; 3]; 7],
        total: 0.0,
    };

    for session in sessions {
        let local = session.timestamp.with_timezone(&tz);
        if !in_week(local.date_naive()) {
            continue;
        }
        let (day, slot) = bucket(&local);
        summary.add(day, slot, f64::from(session.duration));
    }

    if live_minutes > 0.0 && in_week(now.date_naive()) {
        let (day, slot) = bucket(now);
        summary.add(day, slot, live_minutes);
    }

    summary
}

fn bucket<Tz: TimeZone>(at: &DateTime<Tz>) -> (usize, Slot) {
    (
        at.weekday().num_days_from_monday() as usize,
        Slot::from_hour(at.hour()),
    )
}

/// `0m`, `45m`, `1h 30m`. Fractions of a minute are dropped.
pub fn format_duration(minutes: f64) -> String {
    if minutes <= 0.0 {
        return "0m".into();
    }
    let h = (minutes / 60.0).floor() as u64;
    let m = (minutes % 60.0).floor() as u64;
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

/// Which week the stats view shows, relative to the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekCursor {
    offset_weeks: i64,
}

impl WeekCursor {
    pub fn previous(&mut self) {
        self.offset_weeks -= 1;
    }

    pub fn next(&mut self) {
        self.offset_weeks += 1;
    }

    pub fn reset(&mut self) {
        self.offset_weeks = 0;
    }

    pub fn is_current(&self) -> bool {
        self.offset_weeks == 0
    }

    /// Shifts by calendar days so a DST change never moves the result
    /// across a Monday.
    pub fn reference(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(7 * self.offset_weeks)
    }
}
