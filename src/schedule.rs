//! Time sources: the wall clock used to stamp sessions, and the periodic tick
//! that drives the countdown.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A cancellable fixed-rate tick.
///
/// Arming starts a fresh period; cancelling drops any pending tick, so a
/// pause never leaks a stray decrement into the resumed countdown.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// No-op when already armed.
    pub fn arm(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.period);
        }
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Number of ticks that fell due at or before `now`.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };

        let mut fired = 0;
        while due <= now {
            fired += 1;
            due += self.period;
        }
        self.next_due = Some(due);
        fired
    }

    /// Time left until the next tick, if armed.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_scheduler_never_fires() {
        let mut ticks = TickScheduler::default();
        let t0 = Instant::now();
        assert_eq!(ticks.poll(t0 + Duration::from_secs(10)), 0);
        assert_eq!(ticks.until_next(t0), None);
    }

    #[test]
    fn fires_once_per_period() {
        let mut ticks = TickScheduler::default();
        let t0 = Instant::now();
        ticks.arm(t0);

        assert_eq!(ticks.poll(t0 + Duration::from_millis(999)), 0);
        assert_eq!(ticks.poll(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(ticks.poll(t0 + Duration::from_millis(1500)), 0);
        assert_eq!(ticks.poll(t0 + Duration::from_millis(4200)), 3);
    }

    #[test]
    fn cancel_drops_pending_tick_and_rearm_restarts_period() {
        let mut ticks = TickScheduler::default();
        let t0 = Instant::now();
        ticks.arm(t0);
        ticks.cancel();

        assert!(!ticks.is_armed());
        assert_eq!(ticks.poll(t0 + Duration::from_secs(5)), 0);

        let t1 = t0 + Duration::from_millis(5300);
        ticks.arm(t1);
        assert_eq!(ticks.poll(t1 + Duration::from_millis(900)), 0);
        assert_eq!(ticks.poll(t1 + Duration::from_millis(1000)), 1);
    }

    #[test]
    fn arming_twice_keeps_the_original_deadline() {
        let mut ticks = TickScheduler::default();
        let t0 = Instant::now();
        ticks.arm(t0);
        ticks.arm(t0 + Duration::from_millis(800));

        assert_eq!(ticks.poll(t0 + Duration::from_millis(1000)), 1);
    }
}
