//! Desktop side effects: completion notification, completion chime, and the
//! ambient loop that plays while a countdown is running.

use std::{
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use notify_rust::Notification;
use tracing::{debug, info, warn};

const APP_NAME: &str = "focusbar";

const CHIME_CANDIDATES: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

/// Outbound completion signal. Implementations must not block the caller.
pub trait Alert {
    /// Called when a countdown starts, before the first completion could fire.
    fn request_permission(&self) {}

    fn notify_completion(&self, minutes: u32);
}

// ============================================================================
// Desktop alert
// ============================================================================

#[derive(Debug, Clone)]
pub struct DesktopAlert {
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
    pub chime: Option<PathBuf>,
}

impl DesktopAlert {
    pub fn new(sound_enabled: bool, notifications_enabled: bool, chime: Option<PathBuf>) -> Self {
        Self {
            sound_enabled,
            notifications_enabled,
            chime,
        }
    }
}

impl Alert for DesktopAlert {
    fn notify_completion(&self, minutes: u32) {
        info!(minutes, "focus session complete");

        if self.sound_enabled {
            play_chime(self.chime.clone());
        }

        if self.notifications_enabled {
            // The chime already covers sound, so the notification stays silent.
            let sound_handled = self.sound_enabled;
            std::thread::spawn(move || {
                let mut notification = Notification::new();
                notification
                    .summary("Focus complete! 🎉")
                    .body(&completion_message(minutes))
                    .appname(APP_NAME)
                    .icon("alarm-clock");
                if !sound_handled {
                    notification.sound_name("complete");
                }
                if let Err(e) = notification.show() {
                    warn!("desktop notification unavailable: {e}");
                }
            });
        }
    }
}

pub fn completion_message(minutes: u32) -> String {
    format!("Great job! You focused for {minutes} minutes. Take a break!")
}

fn play_chime(custom: Option<PathBuf>) {
    std::thread::spawn(move || {
        let choice = match custom {
            Some(path) if path.exists() => Some(("paplay", path)),
            _ => CHIME_CANDIDATES
                .iter()
                .find(|(_, file)| Path::new(file).exists())
                .map(|(cmd, file)| (*cmd, PathBuf::from(file))),
        };

        let Some((cmd, file)) = choice else {
            debug!("no chime sound available");
            return;
        };
        if let Err(e) = Command::new(cmd)
            .arg(&file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            debug!("chime playback failed: {e}");
        }
    });
}

// ============================================================================
// Volume & ambient loop
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    level: u8,
    muted: bool,
}

impl Volume {
    pub fn new(level: u8, muted: bool) -> Self {
        Self {
            level: level.min(100),
            muted,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// What actually reaches the speaker: 0 while muted.
    pub fn effective(&self) -> u8 {
        if self.muted { 0 } else { self.level }
    }

    /// Moving the slider always unmutes.
    pub fn adjust(&mut self, delta: i16) {
        let level = (i16::from(self.level) + delta).clamp(0, 100);
        self.level = level as u8;
        self.muted = false;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(50, false)
    }
}

/// Background sound gated by timer status and volume.
pub trait Ambient {
    fn update(&mut self, playing: bool, level: u8);
}

/// Loops an audio file through `paplay`, respawning it each time it ends.
pub struct AmbientPlayer {
    source: Option<PathBuf>,
    child: Option<Child>,
    level: u8,
    unavailable: bool,
}

impl AmbientPlayer {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self {
            source,
            child: None,
            level: 0,
            unavailable: false,
        }
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn spawn(&mut self, source: &Path, level: u8) {
        let scaled = u32::from(level) * 65536 / 100;
        match Command::new("paplay")
            .arg(format!("--volume={scaled}"))
            .arg(source)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                self.child = Some(child);
                self.level = level;
            }
            Err(e) => {
                debug!("ambient playback unavailable: {e}");
                self.unavailable = true;
            }
        }
    }
}

impl Ambient for AmbientPlayer {
    fn update(&mut self, playing: bool, level: u8) {
        let Some(source) = self.source.clone() else {
            return;
        };
        if !playing || level == 0 || self.unavailable {
            self.stop();
            return;
        }
        if self.level != level {
            self.stop();
        }
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(None) => return,
                _ => self.child = None,
            }
        }
        self.spawn(&source, level);
    }
}

impl Drop for AmbientPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
