//! Notification sink: audio cues fired on phase entry.
//!
//! Signals are fire-and-forget. The controller calls [`emit`], which logs and
//! swallows any sink failure so a missing audio device never reaches the
//! timer.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Single short tone when a session starts.
    SessionStart,
    /// Double ascending tone on every phase advance, skip included.
    PhaseAdvance,
}

/// One sine tone, scheduled `offset_ms` after the cue fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub offset_ms: u32,
}

const START_TONES: [Tone; 1] = [Tone {
    frequency_hz: 440,
    duration_ms: 200,
    offset_ms: 0,
}];

const ADVANCE_TONES: [Tone; 2] = [
    Tone {
        frequency_hz: 660,
        duration_ms: 100,
        offset_ms: 0,
    },
    Tone {
        frequency_hz: 880,
        duration_ms: 100,
        offset_ms: 150,
    },
];

impl Cue {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            Cue::SessionStart => &START_TONES,
            Cue::PhaseAdvance => &ADVANCE_TONES,
        }
    }
}

pub trait NotificationSink: Send {
    fn signal(&self, cue: Cue) -> Result<(), NotifyError>;
}

/// Fire `cue` on `sink`, logging instead of propagating failures.
pub fn emit(sink: &dyn NotificationSink, cue: Cue) {
    if let Err(e) = sink.signal(cue) {
        tracing::warn!(target: "celspeak::notify", "cue {cue:?} dropped: {e}");
    }
}

/// Logs cues and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn signal(&self, cue: Cue) -> Result<(), NotifyError> {
        let freqs: Vec<u32> = cue.tones().iter().map(|t| t.frequency_hz).collect();
        tracing::info!(target: "celspeak::notify", "cue {cue:?} ({freqs:?} Hz)");
        Ok(())
    }
}

/// Used when notifications are disabled in config.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn signal(&self, _cue: Cue) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Records every cue; optionally fails each one. Test double.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    cues: Arc<Mutex<Vec<Cue>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every signal fails after being recorded.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl NotificationSink for RecordingSink {
    fn signal(&self, cue: Cue) -> Result<(), NotifyError> {
        self.cues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(cue);
        if self.fail {
            return Err(NotifyError::Unavailable("no audio device".into()));
        }
        Ok(())
    }
}
