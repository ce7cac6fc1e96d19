//! Session state machine.
//!
//! The session is a pure reducer: every command takes the current state plus
//! the active [`Task`] and returns `Some(Event)` when something changed or
//! `None` for a no-op. It owns no timers and performs no I/O; the command
//! surface turns the returned events into clock subscriptions, cues and
//! store writes.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Preparation -> Speaking -> Finished
//!   ^         |             |           |
//!   +---------+-------------+-----------+   (cancel / task switch / home)
//! ```
//!
//! Every transition that enters or leaves a running countdown bumps the
//! generation token. A tick carrying an older generation is discarded.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{Countdown, Phase, PhaseKind};
use crate::catalog::Task;
use crate::events::Event;

/// Tag distinguishing successive clock subscriptions.
pub type Generation = u64;

/// Which prompt text is active for the current task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSelection {
    pub custom_mode: bool,
    pub custom_text: String,
    pub sample_index: usize,
}

impl PromptSelection {
    /// The custom text when custom mode is on, otherwise the selected sample.
    pub fn text<'a>(&'a self, task: &'a Task) -> &'a str {
        if self.custom_mode {
            &self.custom_text
        } else {
            task.sample(self.sample_index).unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    phase: Phase,
    task_id: u32,
    practice_count: u64,
    prompt: PromptSelection,
    generation: Generation,
}

impl Session {
    pub fn new(task_id: u32, practice_count: u64, custom_text: String) -> Self {
        Self {
            phase: Phase::Idle,
            task_id,
            practice_count,
            prompt: PromptSelection {
                custom_text,
                ..PromptSelection::default()
            },
            generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn time_left(&self) -> u32 {
        self.phase.time_left()
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    pub fn task_id(&self) -> u32 {
        self.task_id
    }

    pub fn practice_count(&self) -> u64 {
        self.practice_count
    }

    pub fn prompt(&self) -> &PromptSelection {
        &self.prompt
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Configured duration of the current phase; zero when not running.
    pub fn total_secs(&self, task: &Task) -> u32 {
        match self.phase {
            Phase::Preparation(_) => task.prep_time,
            Phase::Speaking(_) => task.speak_time,
            Phase::Idle | Phase::Finished => 0,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self, task: &Task) -> f64 {
        let total = self.total_secs(task);
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.time_left() as f64 / total as f64)
    }

    // ── Timer transitions ────────────────────────────────────────────

    /// Enter PREPARATION from IDLE or FINISHED (retry).
    ///
    /// The image guard lives in the command surface; this only checks phase.
    pub fn start(&mut self, task: &Task) -> Option<Event> {
        match self.phase {
            Phase::Idle | Phase::Finished => {
                self.phase = Phase::Preparation(Countdown::fresh(task.prep_time));
                self.bump();
                Some(Event::SessionStarted {
                    task_id: self.task_id,
                    remaining_secs: task.prep_time,
                    generation: self.generation,
                    at: Utc::now(),
                })
            }
            Phase::Preparation(_) | Phase::Speaking(_) => None,
        }
    }

    /// One elapsed second.
    ///
    /// The tick that would take the countdown from 1 to 0 is the phase
    /// transition itself.
    pub fn tick(&mut self, generation: Generation, task: &Task) -> Option<Event> {
        if generation != self.generation {
            tracing::debug!(
                target: "celspeak::session",
                "discarding stale tick (generation {generation}, current {})",
                self.generation
            );
            return None;
        }
        match self.phase {
            Phase::Idle | Phase::Finished => None,
            Phase::Preparation(c) | Phase::Speaking(c) if c.paused => None,
            Phase::Preparation(c) if c.remaining_secs > 1 => {
                self.phase = Phase::Preparation(Countdown::fresh(c.remaining_secs - 1));
                Some(self.ticked())
            }
            Phase::Speaking(c) if c.remaining_secs > 1 => {
                self.phase = Phase::Speaking(Countdown::fresh(c.remaining_secs - 1));
                Some(self.ticked())
            }
            Phase::Preparation(_) => Some(self.enter_speaking(task, false)),
            Phase::Speaking(_) => Some(self.finish()),
        }
    }

    /// Jump from PREPARATION straight to SPEAKING. No-op elsewhere.
    pub fn skip(&mut self, task: &Task) -> Option<Event> {
        match self.phase {
            Phase::Preparation(_) => Some(self.enter_speaking(task, true)),
            Phase::Idle | Phase::Speaking(_) | Phase::Finished => None,
        }
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        let flip = |c: Countdown| Countdown {
            remaining_secs: c.remaining_secs,
            paused: !c.paused,
        };
        self.phase = match self.phase {
            Phase::Preparation(c) => Phase::Preparation(flip(c)),
            Phase::Speaking(c) => Phase::Speaking(flip(c)),
            Phase::Idle | Phase::Finished => return None,
        };
        let kind = self.phase.kind();
        let toggled = self.phase.countdown()?;
        self.bump();
        let at = Utc::now();
        Some(if toggled.paused {
            Event::SessionPaused {
                phase: kind,
                remaining_secs: toggled.remaining_secs,
                at,
            }
        } else {
            Event::SessionResumed {
                phase: kind,
                remaining_secs: toggled.remaining_secs,
                generation: self.generation,
                at,
            }
        })
    }

    /// Back to IDLE. Idempotent: cancelling an idle session is a no-op.
    pub fn cancel(&mut self) -> Option<Event> {
        let from = self.phase.kind();
        if from == PhaseKind::Idle {
            return None;
        }
        self.phase = Phase::Idle;
        self.bump();
        Some(Event::SessionCancelled { from, at: Utc::now() })
    }

    // ── Task and prompt selection ────────────────────────────────────

    /// Switch the active task. Only from IDLE/FINISHED and only to a
    /// different task.
    pub fn select_task(&mut self, task_id: u32) -> Option<Event> {
        if task_id == self.task_id || self.phase.is_running() {
            return None;
        }
        self.phase = Phase::Idle;
        self.task_id = task_id;
        self.prompt.sample_index = 0;
        self.bump();
        Some(Event::TaskSelected {
            task_id,
            at: Utc::now(),
        })
    }

    /// Unconditional reset to the home task with default prompt selection.
    /// Confirmation is the command surface's concern.
    pub fn go_home(&mut self, home_task_id: u32) -> Event {
        self.phase = Phase::Idle;
        self.task_id = home_task_id;
        self.prompt.sample_index = 0;
        self.prompt.custom_mode = false;
        self.bump();
        Event::ReturnedHome {
            task_id: home_task_id,
            at: Utc::now(),
        }
    }

    pub fn select_sample(&mut self, index: usize) -> Option<Event> {
        if self.prompt.sample_index == index {
            return None;
        }
        self.prompt.sample_index = index;
        Some(Event::SampleSelected {
            index,
            at: Utc::now(),
        })
    }

    pub fn toggle_custom_mode(&mut self) -> Event {
        self.prompt.custom_mode = !self.prompt.custom_mode;
        Event::CustomModeToggled {
            enabled: self.prompt.custom_mode,
            at: Utc::now(),
        }
    }

    pub fn set_custom_text(&mut self, text: String) -> Option<Event> {
        if self.prompt.custom_text == text {
            return None;
        }
        self.prompt.custom_text = text;
        Some(Event::CustomTextChanged {
            chars: self.prompt.custom_text.chars().count(),
            at: Utc::now(),
        })
    }

    pub fn reset_counter(&mut self) -> Event {
        self.practice_count = 0;
        Event::CounterReset { at: Utc::now() }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn ticked(&self) -> Event {
        Event::TimerTicked {
            phase: self.phase.kind(),
            remaining_secs: self.phase.time_left(),
            at: Utc::now(),
        }
    }

    fn enter_speaking(&mut self, task: &Task, skipped: bool) -> Event {
        self.phase = Phase::Speaking(Countdown::fresh(task.speak_time));
        self.bump();
        Event::PhaseAdvanced {
            from: PhaseKind::Preparation,
            to: PhaseKind::Speaking,
            remaining_secs: task.speak_time,
            generation: self.generation,
            skipped,
            at: Utc::now(),
        }
    }

    fn finish(&mut self) -> Event {
        self.phase = Phase::Finished;
        self.practice_count += 1;
        self.bump();
        Event::SessionFinished {
            task_id: self.task_id,
            practice_count: self.practice_count,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TaskCatalog;

    fn task(prep: u32, speak: u32) -> Task {
        let mut task = TaskCatalog::builtin().first().clone();
        task.prep_time = prep;
        task.speak_time = speak;
        task
    }

    #[test]
    fn start_seeds_preparation() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, String::new());
        let event = s.start(&t).unwrap();
        assert_eq!(s.kind(), PhaseKind::Preparation);
        assert_eq!(s.time_left(), 30);
        assert!(!s.is_paused());
        match event {
            Event::SessionStarted { generation, .. } => assert_eq!(generation, s.generation()),
            other => panic!("Expected SessionStarted, got {other:?}"),
        }
    }

    #[test]
    fn start_is_ignored_while_running() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, String::new());
        s.start(&t);
        let current = s.generation();
        s.tick(current, &t);
        assert!(s.start(&t).is_none());
        assert_eq!(s.time_left(), 29);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, String::new());
        s.start(&t);
        let stale = s.generation();
        s.cancel();
        s.start(&t);
        assert!(s.tick(stale, &t).is_none());
        assert_eq!(s.time_left(), 30);
    }

    #[test]
    fn finishing_increments_count_once() {
        let t = task(1, 1);
        let mut s = Session::new(t.id, 7, String::new());
        s.start(&t);
        s.tick(s.generation(), &t);
        assert_eq!(s.kind(), PhaseKind::Speaking);
        assert_eq!(s.practice_count(), 7);
        let event = s.tick(s.generation(), &t).unwrap();
        assert_eq!(s.kind(), PhaseKind::Finished);
        assert_eq!(s.time_left(), 0);
        assert_eq!(s.practice_count(), 8);
        assert!(matches!(event, Event::SessionFinished { practice_count: 8, .. }));
        // Further ticks do nothing.
        assert!(s.tick(s.generation(), &t).is_none());
        assert_eq!(s.practice_count(), 8);
    }

    #[test]
    fn retry_from_finished_restarts_preparation() {
        let t = task(1, 1);
        let mut s = Session::new(t.id, 0, String::new());
        s.start(&t);
        s.skip(&t);
        s.tick(s.generation(), &t);
        assert_eq!(s.kind(), PhaseKind::Finished);
        assert!(s.start(&t).is_some());
        assert_eq!(s.kind(), PhaseKind::Preparation);
        assert_eq!(s.time_left(), 1);
    }

    #[test]
    fn skip_outside_preparation_is_noop() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, String::new());
        assert!(s.skip(&t).is_none());
        s.start(&t);
        s.skip(&t);
        assert!(s.skip(&t).is_none());
        assert_eq!(s.time_left(), 90);
    }

    #[test]
    fn pause_is_only_toggled_while_running() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, String::new());
        assert!(s.toggle_pause().is_none());
        s.start(&t);
        assert!(matches!(s.toggle_pause(), Some(Event::SessionPaused { .. })));
        assert!(s.is_paused());
        assert!(matches!(s.toggle_pause(), Some(Event::SessionResumed { .. })));
        assert!(!s.is_paused());
    }

    #[test]
    fn select_task_locked_while_running() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, String::new());
        s.select_sample(2);
        assert!(s.select_task(t.id).is_none());
        s.start(&t);
        assert!(s.select_task(4).is_none());
        s.cancel();
        assert!(s.select_task(4).is_some());
        assert_eq!(s.task_id(), 4);
        assert_eq!(s.prompt().sample_index, 0);
    }

    #[test]
    fn select_task_from_finished_returns_to_idle() {
        let t = task(1, 1);
        let mut s = Session::new(t.id, 0, String::new());
        s.select_sample(2);
        s.start(&t);
        s.tick(s.generation(), &t);
        s.tick(s.generation(), &t);
        assert_eq!(s.kind(), PhaseKind::Finished);

        let before = s.generation();
        assert!(matches!(s.select_task(4), Some(Event::TaskSelected { .. })));
        assert_eq!(s.kind(), PhaseKind::Idle);
        assert_eq!(s.time_left(), 0);
        assert_eq!(s.task_id(), 4);
        assert_eq!(s.prompt().sample_index, 0);
        assert!(s.generation() > before);
    }

    #[test]
    fn go_home_resets_prompt_but_keeps_custom_text() {
        let t = task(30, 90);
        let mut s = Session::new(5, 3, "saved".into());
        s.toggle_custom_mode();
        s.start(&t);
        s.go_home(1);
        assert_eq!(s.kind(), PhaseKind::Idle);
        assert_eq!(s.task_id(), 1);
        assert!(!s.prompt().custom_mode);
        assert_eq!(s.prompt().custom_text, "saved");
        assert_eq!(s.practice_count(), 3);
    }

    #[test]
    fn prompt_text_prefers_custom_mode() {
        let t = task(30, 90);
        let mut s = Session::new(t.id, 0, "my own question".into());
        s.select_sample(1);
        assert_eq!(s.prompt().text(&t), t.samples[1]);
        s.toggle_custom_mode();
        assert_eq!(s.prompt().text(&t), "my own question");
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let t = task(10, 20);
        let mut s = Session::new(t.id, 0, String::new());
        assert_eq!(s.progress(&t), 0.0);
        s.start(&t);
        for _ in 0..5 {
            s.tick(s.generation(), &t);
        }
        assert!((s.progress(&t) - 0.5).abs() < f64::EPSILON);
    }
}
