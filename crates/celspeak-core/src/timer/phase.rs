use serde::{Deserialize, Serialize};

/// Remaining time and pause flag of a running phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining_secs: u32,
    pub paused: bool,
}

impl Countdown {
    pub fn fresh(secs: u32) -> Self {
        Self {
            remaining_secs: secs,
            paused: false,
        }
    }
}

/// Coarse state of a practice session.
///
/// Only the running phases carry a countdown, so a pause flag or a remaining
/// time cannot exist outside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Preparation(Countdown),
    Speaking(Countdown),
    Finished,
}

/// Data-free view of [`Phase`], used in events and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Idle,
    Preparation,
    Speaking,
    Finished,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Preparation(_) => PhaseKind::Preparation,
            Phase::Speaking(_) => PhaseKind::Speaking,
            Phase::Finished => PhaseKind::Finished,
        }
    }

    pub fn countdown(&self) -> Option<Countdown> {
        match self {
            Phase::Preparation(c) | Phase::Speaking(c) => Some(*c),
            Phase::Idle | Phase::Finished => None,
        }
    }

    /// Remaining seconds; zero outside the running phases.
    pub fn time_left(&self) -> u32 {
        self.countdown().map(|c| c.remaining_secs).unwrap_or(0)
    }

    pub fn is_paused(&self) -> bool {
        self.countdown().map(|c| c.paused).unwrap_or(false)
    }

    pub fn is_running(&self) -> bool {
        self.kind().is_running()
    }
}

impl PhaseKind {
    /// PREPARATION or SPEAKING.
    pub fn is_running(self) -> bool {
        matches!(self, PhaseKind::Preparation | PhaseKind::Speaking)
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Idle => "IDLE",
            PhaseKind::Preparation => "PREPARATION",
            PhaseKind::Speaking => "SPEAKING",
            PhaseKind::Finished => "FINISHED",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
