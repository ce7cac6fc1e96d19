use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::Ticket;
use crate::timer::{Generation, PhaseKind};

/// Every state change in the system produces an Event.
/// The host renders from them; the controller derives side effects from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        task_id: u32,
        remaining_secs: u32,
        generation: Generation,
        at: DateTime<Utc>,
    },
    TimerTicked {
        phase: PhaseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// PREPARATION -> SPEAKING, by expiry or skip.
    PhaseAdvanced {
        from: PhaseKind,
        to: PhaseKind,
        remaining_secs: u32,
        generation: Generation,
        skipped: bool,
        at: DateTime<Utc>,
    },
    SessionFinished {
        task_id: u32,
        practice_count: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: PhaseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase: PhaseKind,
        remaining_secs: u32,
        generation: Generation,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        from: PhaseKind,
        at: DateTime<Utc>,
    },
    TaskSelected {
        task_id: u32,
        at: DateTime<Utc>,
    },
    ReturnedHome {
        task_id: u32,
        at: DateTime<Utc>,
    },
    SampleSelected {
        index: usize,
        at: DateTime<Utc>,
    },
    CustomModeToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    CustomTextChanged {
        chars: usize,
        at: DateTime<Utc>,
    },
    CounterReset {
        at: DateTime<Utc>,
    },
    FullscreenToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    HelperToggled {
        open: bool,
        at: DateTime<Utc>,
    },
    ImageAttached {
        mime_type: String,
        at: DateTime<Utc>,
    },
    ImageCleared {
        at: DateTime<Utc>,
    },
    ModelAnswerRequested {
        ticket: Ticket,
        task_id: u32,
        at: DateTime<Utc>,
    },
    ModelAnswerReady {
        ticket: Ticket,
        at: DateTime<Utc>,
    },
    ModelAnswerFailed {
        ticket: Ticket,
        message: String,
        at: DateTime<Utc>,
    },
    ModelAnswerDismissed {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Wire name of the variant, as written in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SessionStarted",
            Event::TimerTicked { .. } => "TimerTicked",
            Event::PhaseAdvanced { .. } => "PhaseAdvanced",
            Event::SessionFinished { .. } => "SessionFinished",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionResumed { .. } => "SessionResumed",
            Event::SessionCancelled { .. } => "SessionCancelled",
            Event::TaskSelected { .. } => "TaskSelected",
            Event::ReturnedHome { .. } => "ReturnedHome",
            Event::SampleSelected { .. } => "SampleSelected",
            Event::CustomModeToggled { .. } => "CustomModeToggled",
            Event::CustomTextChanged { .. } => "CustomTextChanged",
            Event::CounterReset { .. } => "CounterReset",
            Event::FullscreenToggled { .. } => "FullscreenToggled",
            Event::HelperToggled { .. } => "HelperToggled",
            Event::ImageAttached { .. } => "ImageAttached",
            Event::ImageCleared { .. } => "ImageCleared",
            Event::ModelAnswerRequested { .. } => "ModelAnswerRequested",
            Event::ModelAnswerReady { .. } => "ModelAnswerReady",
            Event::ModelAnswerFailed { .. } => "ModelAnswerFailed",
            Event::ModelAnswerDismissed { .. } => "ModelAnswerDismissed",
        }
    }
}
