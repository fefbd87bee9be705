//! Application state and the single controller that mutates it.

use std::time::Instant;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::alert::{Alert, Ambient, Volume};
use crate::config::Config;
use crate::schedule::{Clock, TickScheduler};
use crate::session::SessionLog;
use crate::stats::{self, DAYS, Slot, WeekCursor, WeekSummary, format_duration};
use crate::storage::HistoryStore;
use crate::timer::{Completion, TimerEngine, TimerStatus};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum View {
    Controls,
    Stats,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Action {
    Start,
    TogglePause,
    Stop,
    Skip,
    SelectDuration(usize),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    ShowControls,
    ShowStats,
    ToggleView,
    PreviousWeek,
    NextWeek,
    ThisWeek,
    MoveCell { days: i8, slots: i8 },
    ClearCell,
    Quit,
}

const VOLUME_STEP: i16 = 10;

pub struct App {
    engine: TimerEngine,
    history: SessionLog,
    store: HistoryStore,
    alert: Box<dyn Alert>,
    ambient: Box<dyn Ambient>,
    clock: Box<dyn Clock>,
    ticks: TickScheduler,
    choices: Vec<u32>,
    volume: Volume,
    view: View,
    week: WeekCursor,
    selected_cell: Option<(usize, Slot)>,
}

impl App {
    pub fn new(
        config: &Config,
        store: HistoryStore,
        alert: Box<dyn Alert>,
        ambient: Box<dyn Ambient>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let history = SessionLog::new(store.load());
        info!(sessions = history.len(), "session history ready");

        Self {
            engine: TimerEngine::new(config.default_minutes),
            history,
            store,
            alert,
            ambient,
            clock,
            ticks: TickScheduler::default(),
            choices: config.choices(),
            volume: Volume::new(config.volume, config.muted),
            view: View::Controls,
            week: WeekCursor::default(),
            selected_cell: None,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn history(&self) -> &SessionLog {
        &self.history
    }

    pub fn choices(&self) -> &[u32] {
        &self.choices
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected_cell(&self) -> Option<(usize, Slot)> {
        self.selected_cell
    }

    pub fn is_current_week(&self) -> bool {
        self.week.is_current()
    }

    pub fn ticks(&self) -> &TickScheduler {
        &self.ticks
    }

    /// Applies one user action. Returns `true` when the app should exit.
    pub fn apply(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Start => {
                self.alert.request_permission();
                self.engine.start();
            }
            Action::TogglePause => {
                self.engine.toggle_pause();
            }
            Action::Stop => {
                self.engine.stop();
            }
            Action::Skip => {
                // Completion waits for a tick, so a paused skip records only
                // one period after resuming.
                self.engine.skip();
            }
            Action::SelectDuration(index) => {
                let minutes = self.choices.get(index).copied();
                let applied = minutes.is_some_and(|m| self.engine.select_duration(m));
                if !applied {
                    debug!(index, status = ?self.engine.status(), "duration change ignored");
                }
            }
            Action::VolumeUp => self.volume.adjust(VOLUME_STEP),
            Action::VolumeDown => self.volume.adjust(-VOLUME_STEP),
            Action::ToggleMute => self.volume.toggle_mute(),
            Action::ShowControls => self.view = View::Controls,
            Action::ShowStats => self.view = View::Stats,
            Action::ToggleView => {
                self.view = match self.view {
                    View::Controls => View::Stats,
                    View::Stats => View::Controls,
                };
            }
            Action::PreviousWeek => self.week.previous(),
            Action::NextWeek => self.week.next(),
            Action::ThisWeek => self.week.reset(),
            Action::MoveCell { days, slots } => self.move_cell(days, slots),
            Action::ClearCell => self.selected_cell = None,
            Action::Quit => {
                info!("quit requested");
                return true;
            }
        }

        self.sync(now);
        false
    }

    /// Runs every tick that fell due by `now`.
    pub fn update(&mut self, now: Instant) {
        for _ in 0..self.ticks.poll(now) {
            if let Some(completion) = self.engine.tick() {
                self.complete(completion);
            }
        }
        self.sync(now);
    }

    /// Wall-clock time from the injected clock, in the local zone.
    pub fn now_local(&self) -> DateTime<Local> {
        self.clock.now().with_timezone(&Local)
    }

    pub fn week_summary(&self) -> WeekSummary {
        let now = self.now_local();
        stats::week_summary(
            self.history.sessions(),
            self.week.reference(now.date_naive()),
            &now,
            self.engine.live_progress_minutes(),
        )
    }

    /// Title and value for the stats headline: the selected cell, or the
    /// weekly total when nothing is selected.
    pub fn stats_headline(&self, summary: &WeekSummary) -> (String, String) {
        match self.selected_cell {
            Some((day, slot)) => (
                format!("{} • {}", DAYS[day].to_uppercase(), slot.label()),
                format_duration(summary.cell(day, slot)),
            ),
            None => ("TOTAL FOCUS".into(), format_duration(summary.total())),
        }
    }

    /// Session count, all-time total and the current local time.
    pub fn stats_footer(&self) -> String {
        format!(
            "{} sessions  •  {} all time  •  {}",
            self.history.len(),
            format_duration(self.history.total_minutes() as f64),
            self.now_local().format("%a %b %-d, %H:%M")
        )
    }

    /// Maps a key press to an action for the current view.
    pub fn action_for(&self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Action::Quit);
        }

        let shared = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Tab => Some(Action::ToggleView),
            KeyCode::Char('c') => Some(Action::ShowControls),
            KeyCode::Char('s') => Some(Action::ShowStats),
            _ => None,
        };
        if shared.is_some() {
            return shared;
        }

        match self.view {
            View::Controls => match key.code {
                KeyCode::Esc => Some(Action::Quit),
                KeyCode::Enter => Some(Action::Start),
                KeyCode::Char(' ') if self.engine.status() == TimerStatus::Idle => {
                    Some(Action::Start)
                }
                KeyCode::Char(' ') | KeyCode::Char('p') => Some(Action::TogglePause),
                KeyCode::Char('x') => Some(Action::Stop),
                KeyCode::Char('n') => Some(Action::Skip),
                KeyCode::Char(d @ '1'..='9') => {
                    Some(Action::SelectDuration(d as usize - '1' as usize))
                }
                KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::VolumeUp),
                KeyCode::Char('-') => Some(Action::VolumeDown),
                KeyCode::Char('m') => Some(Action::ToggleMute),
                _ => None,
            },
            View::Stats => match key.code {
                KeyCode::Esc if self.selected_cell.is_some() => Some(Action::ClearCell),
                KeyCode::Esc => Some(Action::Quit),
                KeyCode::Left | KeyCode::Char('[') => Some(Action::PreviousWeek),
                KeyCode::Right | KeyCode::Char(']') => Some(Action::NextWeek),
                KeyCode::Char('t') => Some(Action::ThisWeek),
                KeyCode::Char('h') => Some(Action::MoveCell { days: -1, slots: 0 }),
                KeyCode::Char('l') => Some(Action::MoveCell { days: 1, slots: 0 }),
                KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveCell { days: 0, slots: -1 }),
                KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveCell { days: 0, slots: 1 }),
                _ => None,
            },
        }
    }

    fn complete(&mut self, completion: Completion) {
        let at = self.clock.now();
        let session = self.history.append(at, completion.minutes);
        info!(id = session.id, minutes = session.duration, "session recorded");

        self.store.save(self.history.sessions());
        self.alert.notify_completion(completion.minutes);
    }

    fn move_cell(&mut self, days: i8, slots: i8) {
        self.selected_cell = Some(match self.selected_cell {
            None => (0, Slot::Morning),
            Some((day, slot)) => {
                let day = (day as i8 + days).clamp(0, 6) as usize;
                let slot = (slot.index() as i8 + slots).clamp(0, 2) as usize;
                (day, Slot::ALL[slot])
            }
        });
    }

    /// Keeps the tick and the ambient loop in step with the timer status.
    fn sync(&mut self, now: Instant) {
        if self.engine.is_running() {
            self.ticks.arm(now);
        } else {
            self.ticks.cancel();
        }
        self.ambient
            .update(self.engine.is_running(), self.volume.effective());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{HISTORY_KEY, KeyValueStore, MemoryStore};
    use chrono::{DateTime, TimeZone, Utc};
    use crossterm::event::KeyEventKind;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingAlert {
        completions: Rc<RefCell<Vec<u32>>>,
        permission_requests: Rc<RefCell<u32>>,
    }

    impl Alert for RecordingAlert {
        fn request_permission(&self) {
            *self.permission_requests.borrow_mut() += 1;
        }

        fn notify_completion(&self, minutes: u32) {
            self.completions.borrow_mut().push(minutes);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAmbient {
        calls: Rc<RefCell<Vec<(bool, u8)>>>,
    }

    impl Ambient for RecordingAmbient {
        fn update(&mut self, playing: bool, level: u8) {
            self.calls.borrow_mut().push((playing, level));
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct Harness {
        app: App,
        store: MemoryStore,
        alert: RecordingAlert,
        ambient: RecordingAmbient,
        t0: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_store(MemoryStore::new())
        }

        fn with_store(store: MemoryStore) -> Self {
            let alert = RecordingAlert::default();
            let ambient = RecordingAmbient::default();
            let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap());
            let app = App::new(
                &Config::default().normalized(),
                HistoryStore::new(Box::new(store.clone())),
                Box::new(alert.clone()),
                Box::new(ambient.clone()),
                Box::new(clock),
            );
            Self {
                app,
                store,
                alert,
                ambient,
                t0: Instant::now(),
            }
        }

        fn at(&self, secs: u64) -> Instant {
            self.t0 + Duration::from_secs(secs)
        }

        fn act(&mut self, action: Action, secs: u64) -> bool {
            let now = self.at(secs);
            self.app.apply(action, now)
        }

        fn advance_to(&mut self, secs: u64) {
            let now = self.at(secs);
            self.app.update(now);
        }

        fn stored_sessions(&self) -> usize {
            self.store
                .get(HISTORY_KEY)
                .unwrap()
                .map(|raw| serde_json::from_str::<Vec<serde_json::Value>>(&raw).unwrap().len())
                .unwrap_or(0)
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn natural_completion_records_saves_and_alerts() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        assert_eq!(*h.alert.permission_requests.borrow(), 1);

        h.advance_to(1499);
        assert!(h.app.history().is_empty());

        h.advance_to(1500);
        assert_eq!(h.app.history().len(), 1);
        assert_eq!(h.app.history().sessions()[0].duration, 25);
        assert_eq!(h.app.engine().status(), TimerStatus::Idle);
        assert_eq!(h.app.engine().remaining_secs(), 1500);
        assert_eq!(*h.alert.completions.borrow(), vec![25]);
        assert_eq!(h.stored_sessions(), 1);
        assert!(!h.app.ticks().is_armed());
    }

    #[test]
    fn stop_never_records() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.advance_to(600);
        h.act(Action::TogglePause, 600);
        h.act(Action::Stop, 601);
        h.advance_to(5000);

        assert!(h.app.history().is_empty());
        assert!(h.alert.completions.borrow().is_empty());
        assert_eq!(h.stored_sessions(), 0);
    }

    #[test]
    fn skip_completes_on_the_next_tick() {
        let mut h = Harness::new();
        h.act(Action::SelectDuration(1), 0);
        h.act(Action::Start, 0);
        h.advance_to(10);
        h.act(Action::Skip, 10);
        assert!(h.app.history().is_empty());

        h.advance_to(11);
        assert_eq!(h.app.history().sessions()[0].duration, 50);
        assert_eq!(*h.alert.completions.borrow(), vec![50]);
        assert_eq!(h.stored_sessions(), 1);
    }

    #[test]
    fn paused_skip_completes_one_tick_after_resuming() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.advance_to(5);
        h.act(Action::TogglePause, 5);
        h.act(Action::Skip, 6);
        h.advance_to(100);
        assert!(h.app.history().is_empty());

        h.act(Action::TogglePause, 100);
        assert!(h.app.history().is_empty());
        h.advance_to(101);
        assert_eq!(h.app.history().sessions()[0].duration, 25);
        assert_eq!(h.app.engine().status(), TimerStatus::Idle);
    }

    #[test]
    fn local_now_comes_from_the_injected_clock() {
        let h = Harness::new();
        let fixed = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
        assert_eq!(h.app.now_local(), fixed);
        assert_eq!(
            h.app.stats_footer(),
            format!(
                "0 sessions  •  0m all time  •  {}",
                fixed.with_timezone(&Local).format("%a %b %-d, %H:%M")
            )
        );
    }

    #[test]
    fn pause_cancels_the_pending_tick() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.advance_to(5);
        h.act(Action::TogglePause, 5);
        h.advance_to(500);
        assert_eq!(h.app.engine().remaining_secs(), 1495);

        h.act(Action::TogglePause, 500);
        h.advance_to(500);
        assert_eq!(h.app.engine().remaining_secs(), 1495);
        h.advance_to(501);
        assert_eq!(h.app.engine().remaining_secs(), 1494);
    }

    #[test]
    fn duration_selection_is_ignored_while_running() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.act(Action::SelectDuration(3), 1);
        assert_eq!(h.app.engine().selected_minutes(), 25);

        h.act(Action::Stop, 2);
        h.act(Action::SelectDuration(3), 3);
        assert_eq!(h.app.engine().selected_minutes(), 100);
        assert_eq!(h.app.engine().remaining_secs(), 6000);

        h.act(Action::SelectDuration(7), 4);
        assert_eq!(h.app.engine().selected_minutes(), 100);
    }

    #[test]
    fn history_is_loaded_and_appended() {
        let store = MemoryStore::new();
        store
            .set(HISTORY_KEY, r#"[{"id":1,"timestamp":1718010000000,"duration":75}]"#)
            .unwrap();
        let mut h = Harness::with_store(store);
        assert_eq!(h.app.history().len(), 1);

        h.act(Action::Start, 0);
        h.advance_to(1500);
        assert_eq!(h.app.history().len(), 2);
        assert_eq!(h.stored_sessions(), 2);
    }

    #[test]
    fn ambient_follows_running_state_and_volume() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.act(Action::ToggleMute, 1);
        h.act(Action::VolumeUp, 2);
        h.act(Action::TogglePause, 3);

        let calls = h.ambient.calls.borrow();
        assert_eq!(*calls, vec![(true, 50), (true, 0), (true, 60), (false, 60)]);
    }

    #[test]
    fn stats_include_live_progress_for_the_current_week_only() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.advance_to(600);

        let current = h.app.week_summary();
        assert!((current.total() - 10.0).abs() < 1e-9);

        h.act(Action::PreviousWeek, 600);
        assert_eq!(h.app.week_summary().total(), 0.0);
        h.act(Action::ThisWeek, 600);
        assert!(h.app.is_current_week());
    }

    #[test]
    fn headline_shows_total_or_selected_cell() {
        let mut h = Harness::new();
        h.act(Action::Start, 0);
        h.advance_to(1500);
        let summary = h.app.week_summary();

        let (title, value) = h.app.stats_headline(&summary);
        assert_eq!(title, "TOTAL FOCUS");
        assert_eq!(value, "25m");

        h.act(Action::MoveCell { days: 1, slots: 0 }, 1500);
        assert_eq!(h.app.selected_cell(), Some((0, Slot::Morning)));
        h.act(Action::MoveCell { days: -1, slots: 5 }, 1500);
        assert_eq!(h.app.selected_cell(), Some((0, Slot::Evening)));

        let (title, _) = h.app.stats_headline(&summary);
        assert_eq!(title, "MON • EVENING");

        h.act(Action::ClearCell, 1500);
        assert_eq!(h.app.selected_cell(), None);
    }

    #[test]
    fn keys_map_per_view() {
        let mut h = Harness::new();
        assert_eq!(h.app.action_for(press(KeyCode::Char(' '))), Some(Action::Start));
        assert_eq!(
            h.app.action_for(press(KeyCode::Char('2'))),
            Some(Action::SelectDuration(1))
        );
        assert_eq!(h.app.action_for(press(KeyCode::Esc)), Some(Action::Quit));

        h.act(Action::Start, 0);
        assert_eq!(
            h.app.action_for(press(KeyCode::Char(' '))),
            Some(Action::TogglePause)
        );

        h.act(Action::ToggleView, 0);
        assert_eq!(h.app.view(), View::Stats);
        assert_eq!(h.app.action_for(press(KeyCode::Left)), Some(Action::PreviousWeek));
        h.act(Action::MoveCell { days: 0, slots: 0 }, 0);
        assert_eq!(h.app.action_for(press(KeyCode::Esc)), Some(Action::ClearCell));

        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..press(KeyCode::Char('c'))
        };
        assert_eq!(h.app.action_for(ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn quit_is_reported_to_the_caller() {
        let mut h = Harness::new();
        assert!(!h.act(Action::Start, 0));
        assert!(h.act(Action::Quit, 1));
    }
}
