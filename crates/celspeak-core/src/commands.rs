//! Command surface.
//!
//! [`PracticeController`] owns the session together with the host
//! capabilities. Each user intent is validated against the current phase,
//! forwarded to the session reducer, and the resulting events are turned
//! into side effects: clock subscriptions, cues and store writes.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::attachment::ImageAttachment;
use crate::catalog::{Helper, Task, TaskCatalog};
use crate::error::GenerationError;
use crate::events::Event;
use crate::generation::{
    build_prompt, AnswerDispatcher, AnswerState, GenerationRequest, ModelAnswer, Ticket,
};
use crate::notify::{emit, Cue, NotificationSink};
use crate::storage::DurableStore;
use crate::timer::{ClockSource, Generation, PhaseKind, Session};

/// Asked before discarding a running session on go-home.
pub const GO_HOME_CONFIRMATION: &str =
    "Your current session is active. Do you want to stop and return to Home?";

/// Countdown values at or below this are highlighted.
pub const LAST_SECONDS: u32 = 5;

/// Every user intent the practice surface accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    PauseToggle,
    /// Start from IDLE, pause or resume while running. Resolved against the
    /// phase at the moment the command is applied.
    ToggleStartOrPause,
    /// Reset: back to IDLE from any phase.
    Cancel,
    Skip,
    /// Start again from FINISHED.
    Retry,
    /// Leave FINISHED for IDLE.
    NextPractice,
    SelectTask(u32),
    SelectSample(usize),
    NextSample,
    /// `NextSample` in IDLE, ignored otherwise.
    NextSampleIfIdle,
    RandomSample,
    ToggleCustomMode,
    SetCustomText(String),
    GoHome { confirmed: bool },
    ResetCounter,
    ToggleFullscreen,
    ToggleHelper,
    AttachImage(ImageAttachment),
    ClearImage,
    RequestModelAnswer,
    DismissModelAnswer,
}

/// Why a command was refused. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please upload a picture to continue for this task.")]
    ImageRequired,

    #[error("Preparation can only be skipped while preparing.")]
    NotPreparing,

    #[error("The prompt cannot be changed while a session is running.")]
    PromptLocked,

    #[error("Unknown task {0}.")]
    UnknownTask(u32),

    #[error("Sample {index} is out of range (task has {count}).")]
    SampleOutOfRange { index: usize, count: usize },

    #[error("Enter a prompt before requesting a model answer.")]
    EmptyPrompt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(Vec<Event>),
    /// Legal but nothing to do.
    Ignored,
    Rejected(Rejection),
    /// Re-issue the command with confirmation to proceed.
    NeedsConfirmation(String),
}

impl Outcome {
    fn from_event(event: Option<Event>) -> Self {
        match event {
            Some(e) => Outcome::Applied(vec![e]),
            None => Outcome::Ignored,
        }
    }

    pub fn events(&self) -> &[Event] {
        match self {
            Outcome::Applied(events) => events,
            _ => &[],
        }
    }
}

/// Host side effects injected into the controller.
pub struct Capabilities {
    pub sink: Box<dyn NotificationSink>,
    pub store: Box<dyn DurableStore>,
    pub clock: Box<dyn ClockSource>,
    pub answers: Box<dyn AnswerDispatcher>,
}

pub struct PracticeController {
    catalog: TaskCatalog,
    session: Session,
    caps: Capabilities,
    image: Option<ImageAttachment>,
    helper_open: bool,
    fullscreen: bool,
    answer: ModelAnswer,
}

impl PracticeController {
    /// Build the controller on the catalog's first task, reading the
    /// persisted counter and custom text once.
    pub fn new(catalog: TaskCatalog, caps: Capabilities) -> Self {
        let practice_count = caps.store.load_practice_count().unwrap_or_else(|e| {
            tracing::warn!(target: "celspeak::store", "could not read practice count: {e}");
            None
        });
        let custom_text = caps.store.load_custom_text().unwrap_or_else(|e| {
            tracing::warn!(target: "celspeak::store", "could not read custom text: {e}");
            None
        });
        let session = Session::new(
            catalog.first().id,
            practice_count.unwrap_or(0),
            custom_text.unwrap_or_default(),
        );
        Self {
            catalog,
            session,
            caps,
            image: None,
            helper_open: false,
            fullscreen: false,
            answer: ModelAnswer::new(),
        }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn task(&self) -> &Task {
        self.catalog.resolve(self.session.task_id())
    }

    pub fn answer(&self) -> &AnswerState {
        self.answer.state()
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn prompt_text(&self) -> &str {
        self.session.prompt().text(self.task())
    }

    pub fn dispatch(&mut self, command: Command) -> Outcome {
        tracing::debug!(target: "celspeak::commands", "dispatch {command:?}");
        let outcome = self.reduce(command);
        match &outcome {
            Outcome::Applied(events) => self.apply_effects(events),
            Outcome::Rejected(reason) => {
                tracing::info!(target: "celspeak::commands", "rejected: {reason}");
            }
            Outcome::Ignored | Outcome::NeedsConfirmation(_) => {}
        }
        outcome
    }

    /// Drop any live clock subscription without touching the session.
    pub fn stop_clock(&mut self) {
        self.caps.clock.unsubscribe();
    }

    /// One clock tick for `generation`.
    pub fn on_tick(&mut self, generation: Generation) -> Outcome {
        let task = self.catalog.resolve(self.session.task_id()).clone();
        let outcome = Outcome::from_event(self.session.tick(generation, &task));
        self.apply_effects(outcome.events());
        outcome
    }

    /// Result of the model-answer request identified by `ticket`.
    pub fn on_answer(
        &mut self,
        ticket: Ticket,
        result: Result<String, GenerationError>,
    ) -> Outcome {
        if !self.answer.complete(ticket, result) {
            tracing::debug!(target: "celspeak::generation", "discarding answer for ticket {ticket}");
            return Outcome::Ignored;
        }
        let at = Utc::now();
        let event = match self.answer.state() {
            AnswerState::Failed(message) => Event::ModelAnswerFailed {
                ticket,
                message: message.clone(),
                at,
            },
            _ => Event::ModelAnswerReady { ticket, at },
        };
        Outcome::Applied(vec![event])
    }

    fn reduce(&mut self, command: Command) -> Outcome {
        let task = self.task().clone();
        let kind = self.session.kind();
        match command {
            Command::Start | Command::Retry => {
                if kind.is_running() {
                    return Outcome::Ignored;
                }
                if task.requires_image && self.image.is_none() {
                    return Outcome::Rejected(Rejection::ImageRequired);
                }
                Outcome::from_event(self.session.start(&task))
            }
            Command::PauseToggle => Outcome::from_event(self.session.toggle_pause()),
            Command::ToggleStartOrPause => match kind {
                PhaseKind::Idle => self.reduce(Command::Start),
                PhaseKind::Preparation | PhaseKind::Speaking => self.reduce(Command::PauseToggle),
                PhaseKind::Finished => Outcome::Ignored,
            },
            Command::Cancel | Command::NextPractice => Outcome::from_event(self.session.cancel()),
            Command::Skip => {
                if kind != PhaseKind::Preparation {
                    return Outcome::Rejected(Rejection::NotPreparing);
                }
                Outcome::from_event(self.session.skip(&task))
            }
            Command::SelectTask(id) => {
                if self.catalog.get(id).is_none() {
                    return Outcome::Rejected(Rejection::UnknownTask(id));
                }
                Outcome::from_event(self.session.select_task(id))
            }
            Command::SelectSample(index) => {
                if kind != PhaseKind::Idle {
                    return Outcome::Rejected(Rejection::PromptLocked);
                }
                let count = task.sample_count();
                if index >= count {
                    return Outcome::Rejected(Rejection::SampleOutOfRange { index, count });
                }
                Outcome::from_event(self.session.select_sample(index))
            }
            Command::NextSample => {
                if kind != PhaseKind::Idle {
                    return Outcome::Rejected(Rejection::PromptLocked);
                }
                let next = (self.session.prompt().sample_index + 1) % task.sample_count().max(1);
                Outcome::from_event(self.session.select_sample(next))
            }
            Command::NextSampleIfIdle => match kind {
                PhaseKind::Idle => self.reduce(Command::NextSample),
                _ => Outcome::Ignored,
            },
            Command::RandomSample => {
                if kind != PhaseKind::Idle {
                    return Outcome::Rejected(Rejection::PromptLocked);
                }
                let count = task.sample_count();
                if count < 2 {
                    return Outcome::Ignored;
                }
                // Never land on the current sample.
                let current = self.session.prompt().sample_index;
                let mut pick = rand::thread_rng().gen_range(0..count - 1);
                if pick >= current {
                    pick += 1;
                }
                Outcome::from_event(self.session.select_sample(pick))
            }
            Command::ToggleCustomMode => {
                if kind != PhaseKind::Idle {
                    return Outcome::Rejected(Rejection::PromptLocked);
                }
                Outcome::Applied(vec![self.session.toggle_custom_mode()])
            }
            Command::SetCustomText(text) => {
                if kind != PhaseKind::Idle {
                    return Outcome::Rejected(Rejection::PromptLocked);
                }
                Outcome::from_event(self.session.set_custom_text(text))
            }
            Command::GoHome { confirmed } => {
                if kind.is_running() && !confirmed {
                    return Outcome::NeedsConfirmation(GO_HOME_CONFIRMATION.to_string());
                }
                let home = self.catalog.first().id;
                Outcome::Applied(vec![self.session.go_home(home)])
            }
            Command::ResetCounter => Outcome::Applied(vec![self.session.reset_counter()]),
            Command::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                Outcome::Applied(vec![Event::FullscreenToggled {
                    enabled: self.fullscreen,
                    at: Utc::now(),
                }])
            }
            Command::ToggleHelper => {
                if task.helper.is_none() {
                    return Outcome::Ignored;
                }
                self.helper_open = !self.helper_open;
                Outcome::Applied(vec![Event::HelperToggled {
                    open: self.helper_open,
                    at: Utc::now(),
                }])
            }
            Command::AttachImage(image) => {
                let mime_type = image.mime_type.clone();
                self.image = Some(image);
                Outcome::Applied(vec![Event::ImageAttached {
                    mime_type,
                    at: Utc::now(),
                }])
            }
            Command::ClearImage => match self.image.take() {
                Some(_) => Outcome::Applied(vec![Event::ImageCleared { at: Utc::now() }]),
                None => Outcome::Ignored,
            },
            Command::RequestModelAnswer => self.request_model_answer(&task),
            Command::DismissModelAnswer => {
                if self.answer.clear() {
                    Outcome::Applied(vec![Event::ModelAnswerDismissed { at: Utc::now() }])
                } else {
                    Outcome::Ignored
                }
            }
        }
    }

    fn request_model_answer(&mut self, task: &Task) -> Outcome {
        let prompt_text = self.session.prompt().text(task).trim().to_string();
        if prompt_text.is_empty() {
            return Outcome::Rejected(Rejection::EmptyPrompt);
        }
        let Some(ticket) = self.answer.begin() else {
            tracing::debug!(target: "celspeak::generation", "model answer already pending");
            return Outcome::Ignored;
        };
        let image = if task.requires_image {
            self.image.clone()
        } else {
            None
        };
        let request = GenerationRequest {
            prompt: build_prompt(task, &prompt_text),
            image,
        };
        tracing::info!(target: "celspeak::generation", "requesting model answer (ticket {ticket})");
        self.caps.answers.dispatch(ticket, request);
        Outcome::Applied(vec![Event::ModelAnswerRequested {
            ticket,
            task_id: task.id,
            at: Utc::now(),
        }])
    }

    fn apply_effects(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SessionStarted { generation, .. } => {
                    tracing::info!(target: "celspeak::session", "session started on task {}", self.session.task_id());
                    self.caps.clock.subscribe(*generation);
                    emit(self.caps.sink.as_ref(), Cue::SessionStart);
                    self.answer.clear();
                }
                Event::TimerTicked {
                    phase,
                    remaining_secs,
                    ..
                } => {
                    tracing::debug!(target: "celspeak::session", "{phase} {remaining_secs}s left");
                }
                Event::PhaseAdvanced {
                    to,
                    generation,
                    skipped,
                    ..
                } => {
                    tracing::info!(target: "celspeak::session", "entered {to} (skipped: {skipped})");
                    self.caps.clock.subscribe(*generation);
                    emit(self.caps.sink.as_ref(), Cue::PhaseAdvance);
                }
                Event::SessionFinished { practice_count, .. } => {
                    tracing::info!(target: "celspeak::session", "session finished, practice count {practice_count}");
                    self.caps.clock.unsubscribe();
                    emit(self.caps.sink.as_ref(), Cue::PhaseAdvance);
                    self.persist_count();
                }
                Event::SessionPaused { .. } => self.caps.clock.unsubscribe(),
                Event::SessionResumed { generation, .. } => self.caps.clock.subscribe(*generation),
                Event::SessionCancelled { from, .. } => {
                    tracing::info!(target: "celspeak::session", "session reset from {from}");
                    self.caps.clock.unsubscribe();
                    self.answer.clear();
                }
                Event::TaskSelected { .. } | Event::ReturnedHome { .. } => {
                    self.caps.clock.unsubscribe();
                    self.answer.clear();
                    self.helper_open = false;
                }
                Event::CounterReset { .. } => self.persist_count(),
                Event::CustomTextChanged { .. } => self.persist_custom_text(),
                Event::SampleSelected { .. }
                | Event::CustomModeToggled { .. }
                | Event::FullscreenToggled { .. }
                | Event::HelperToggled { .. }
                | Event::ImageAttached { .. }
                | Event::ImageCleared { .. }
                | Event::ModelAnswerRequested { .. }
                | Event::ModelAnswerReady { .. }
                | Event::ModelAnswerFailed { .. }
                | Event::ModelAnswerDismissed { .. } => {}
            }
        }
    }

    fn persist_count(&self) {
        if let Err(e) = self
            .caps
            .store
            .save_practice_count(self.session.practice_count())
        {
            tracing::warn!(target: "celspeak::store", "failed to save practice count: {e}");
        }
    }

    fn persist_custom_text(&self) {
        if let Err(e) = self
            .caps
            .store
            .save_custom_text(&self.session.prompt().custom_text)
        {
            tracing::warn!(target: "celspeak::store", "failed to save custom text: {e}");
        }
    }

    /// Everything a host needs to render the practice screen.
    pub fn snapshot(&self) -> Snapshot {
        let task = self.task();
        let remaining_secs = self.session.time_left();
        let phase = self.session.kind();
        Snapshot {
            phase,
            remaining_secs,
            display: format_mm_ss(remaining_secs),
            total_secs: self.session.total_secs(task),
            paused: self.session.is_paused(),
            progress: self.session.progress(task),
            last_seconds: phase.is_running()
                && remaining_secs > 0
                && remaining_secs <= LAST_SECONDS,
            task_id: task.id,
            task_title: task.title.clone(),
            prompt: self.prompt_text().to_string(),
            custom_mode: self.session.prompt().custom_mode,
            sample_index: self.session.prompt().sample_index,
            sample_count: task.sample_count(),
            requires_image: task.requires_image,
            image_attached: self.image.is_some(),
            practice_count: self.session.practice_count(),
            helper: self.helper_open.then(|| task.helper.clone()).flatten(),
            fullscreen: self.fullscreen,
            answer: self.answer.state().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: PhaseKind,
    pub remaining_secs: u32,
    /// `MM:SS`
    pub display: String,
    pub total_secs: u32,
    pub paused: bool,
    pub progress: f64,
    pub last_seconds: bool,
    pub task_id: u32,
    pub task_title: String,
    pub prompt: String,
    pub custom_mode: bool,
    pub sample_index: usize,
    pub sample_count: usize,
    pub requires_image: bool,
    pub image_attached: bool,
    pub practice_count: u64,
    /// Present only while the helper panel is open.
    pub helper: Option<Helper>,
    pub fullscreen: bool,
    pub answer: AnswerState,
}

pub fn format_mm_ss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::RecordingDispatcher;
    use crate::notify::RecordingSink;
    use crate::storage::MemoryStore;
    use crate::timer::ManualClock;

    struct Harness {
        controller: PracticeController,
        sink: RecordingSink,
        store: MemoryStore,
        clock: ManualClock,
        answers: RecordingDispatcher,
    }

    fn harness_with(store: MemoryStore, sink: RecordingSink) -> Harness {
        let clock = ManualClock::new();
        let answers = RecordingDispatcher::new();
        let controller = PracticeController::new(
            TaskCatalog::builtin(),
            Capabilities {
                sink: Box::new(sink.clone()),
                store: Box::new(store.clone()),
                clock: Box::new(clock.clone()),
                answers: Box::new(answers.clone()),
            },
        );
        Harness {
            controller,
            sink,
            store,
            clock,
            answers,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryStore::new(), RecordingSink::new())
    }

    #[test]
    fn start_subscribes_clock_and_cues() {
        let mut h = harness();
        let outcome = h.controller.dispatch(Command::Start);
        assert!(matches!(outcome, Outcome::Applied(_)));
        assert_eq!(h.controller.session().kind(), PhaseKind::Preparation);
        assert_eq!(h.clock.active(), Some(h.controller.session().generation()));
        assert_eq!(h.sink.cues(), vec![Cue::SessionStart]);
    }

    #[test]
    fn image_task_requires_attachment() {
        let mut h = harness();
        h.controller.dispatch(Command::SelectTask(3));
        assert_eq!(
            h.controller.dispatch(Command::Start),
            Outcome::Rejected(Rejection::ImageRequired)
        );
        assert_eq!(h.controller.session().kind(), PhaseKind::Idle);
        assert!(h.sink.cues().is_empty());

        let image = ImageAttachment::from_data_url("data:image/png;base64,AAEC").unwrap();
        h.controller.dispatch(Command::AttachImage(image));
        assert!(matches!(
            h.controller.dispatch(Command::Start),
            Outcome::Applied(_)
        ));
    }

    #[test]
    fn skip_is_rejected_outside_preparation() {
        let mut h = harness();
        assert_eq!(
            h.controller.dispatch(Command::Skip),
            Outcome::Rejected(Rejection::NotPreparing)
        );
        h.controller.dispatch(Command::Start);
        h.controller.dispatch(Command::Skip);
        assert_eq!(h.controller.session().kind(), PhaseKind::Speaking);
        assert_eq!(h.sink.cues(), vec![Cue::SessionStart, Cue::PhaseAdvance]);
        assert_eq!(
            h.controller.dispatch(Command::Skip),
            Outcome::Rejected(Rejection::NotPreparing)
        );
    }

    #[test]
    fn pause_unsubscribes_and_resume_resubscribes() {
        let mut h = harness();
        h.controller.dispatch(Command::Start);
        h.controller.dispatch(Command::PauseToggle);
        assert_eq!(h.clock.active(), None);
        h.controller.dispatch(Command::PauseToggle);
        assert_eq!(h.clock.active(), Some(h.controller.session().generation()));
    }

    #[test]
    fn stale_tick_is_ignored() {
        let mut h = harness();
        h.controller.dispatch(Command::Start);
        let stale = h.controller.session().generation();
        h.controller.dispatch(Command::Cancel);
        h.controller.dispatch(Command::Start);
        assert_eq!(h.controller.on_tick(stale), Outcome::Ignored);
        assert_eq!(
            h.controller.session().time_left(),
            h.controller.task().prep_time
        );
    }

    #[test]
    fn finishing_persists_the_counter() {
        let mut h = harness();
        h.controller.dispatch(Command::Start);
        h.controller.dispatch(Command::Skip);
        let speak = h.controller.task().speak_time;
        for _ in 0..speak {
            let current = h.controller.session().generation();
            h.controller.on_tick(current);
        }
        assert_eq!(h.controller.session().kind(), PhaseKind::Finished);
        assert_eq!(h.store.load_practice_count().unwrap(), Some(1));
        assert_eq!(h.clock.active(), None);
        assert_eq!(
            h.sink.cues(),
            vec![Cue::SessionStart, Cue::PhaseAdvance, Cue::PhaseAdvance]
        );
    }

    #[test]
    fn prompt_pickers_lock_while_running() {
        let mut h = harness();
        h.controller.dispatch(Command::Start);
        for command in [
            Command::SelectSample(1),
            Command::NextSample,
            Command::RandomSample,
            Command::ToggleCustomMode,
            Command::SetCustomText("new".into()),
        ] {
            assert_eq!(
                h.controller.dispatch(command),
                Outcome::Rejected(Rejection::PromptLocked)
            );
        }
    }

    #[test]
    fn toggle_right_after_start_pauses() {
        let mut h = harness();
        assert!(matches!(
            h.controller.dispatch(Command::ToggleStartOrPause),
            Outcome::Applied(_)
        ));
        assert_eq!(h.controller.session().kind(), PhaseKind::Preparation);
        assert!(matches!(
            h.controller.dispatch(Command::ToggleStartOrPause),
            Outcome::Applied(_)
        ));
        assert_eq!(h.controller.session().kind(), PhaseKind::Preparation);
        assert!(h.controller.session().is_paused());
        assert_eq!(h.clock.active(), None);

        h.controller.dispatch(Command::ToggleStartOrPause);
        assert!(!h.controller.session().is_paused());
        assert_eq!(h.clock.active(), Some(h.controller.session().generation()));
    }

    #[test]
    fn toggle_respects_image_guard_and_finished() {
        let mut h = harness();
        h.controller.dispatch(Command::SelectTask(3));
        assert_eq!(
            h.controller.dispatch(Command::ToggleStartOrPause),
            Outcome::Rejected(Rejection::ImageRequired)
        );

        h.controller.dispatch(Command::SelectTask(1));
        h.controller.dispatch(Command::ToggleStartOrPause);
        h.controller.dispatch(Command::Skip);
        for _ in 0..h.controller.task().speak_time {
            let current = h.controller.session().generation();
            h.controller.on_tick(current);
        }
        assert_eq!(h.controller.session().kind(), PhaseKind::Finished);
        assert_eq!(h.controller.dispatch(Command::ToggleStartOrPause), Outcome::Ignored);
        assert_eq!(h.controller.session().kind(), PhaseKind::Finished);
    }

    #[test]
    fn next_sample_key_only_acts_when_idle() {
        let mut h = harness();
        h.controller.dispatch(Command::NextSampleIfIdle);
        assert_eq!(h.controller.session().prompt().sample_index, 1);

        h.controller.dispatch(Command::Start);
        assert_eq!(h.controller.dispatch(Command::NextSampleIfIdle), Outcome::Ignored);
        assert_eq!(h.controller.session().prompt().sample_index, 1);
    }

    #[test]
    fn sample_selection_bounds() {
        let mut h = harness();
        let count = h.controller.task().sample_count();
        assert_eq!(
            h.controller.dispatch(Command::SelectSample(count)),
            Outcome::Rejected(Rejection::SampleOutOfRange { index: count, count })
        );
        h.controller.dispatch(Command::SelectSample(count - 1));
        h.controller.dispatch(Command::NextSample);
        assert_eq!(h.controller.session().prompt().sample_index, 0);
        h.controller.dispatch(Command::RandomSample);
        assert_ne!(h.controller.session().prompt().sample_index, 0);
    }

    #[test]
    fn task_switch_ignored_while_running_and_unknown_refused() {
        let mut h = harness();
        assert_eq!(
            h.controller.dispatch(Command::SelectTask(99)),
            Outcome::Rejected(Rejection::UnknownTask(99))
        );
        h.controller.dispatch(Command::Start);
        assert_eq!(h.controller.dispatch(Command::SelectTask(2)), Outcome::Ignored);
        assert_eq!(h.controller.task().id, 1);
    }

    #[test]
    fn go_home_needs_confirmation_while_running() {
        let mut h = harness();
        h.controller.dispatch(Command::SelectTask(2));
        h.controller.dispatch(Command::ToggleCustomMode);
        h.controller.dispatch(Command::Start);
        assert!(matches!(
            h.controller.dispatch(Command::GoHome { confirmed: false }),
            Outcome::NeedsConfirmation(_)
        ));
        assert_eq!(h.controller.session().kind(), PhaseKind::Preparation);

        h.controller.dispatch(Command::GoHome { confirmed: true });
        let snap = h.controller.snapshot();
        assert_eq!(snap.phase, PhaseKind::Idle);
        assert_eq!(snap.task_id, 1);
        assert!(!snap.custom_mode);
        assert_eq!(h.clock.active(), None);
    }

    #[test]
    fn notification_failure_does_not_affect_state() {
        let mut h = harness_with(MemoryStore::new(), RecordingSink::failing());
        h.controller.dispatch(Command::Start);
        h.controller.dispatch(Command::Skip);
        assert_eq!(h.controller.session().kind(), PhaseKind::Speaking);
        assert_eq!(h.sink.cues().len(), 2);
    }

    #[test]
    fn store_round_trip_and_write_failures() {
        let store = MemoryStore::new();
        store.set_raw("practice_count", "12");
        store.set_raw("custom_text", "Describe your hometown.");
        let mut h = harness_with(store, RecordingSink::new());
        assert_eq!(h.controller.session().practice_count(), 12);
        assert_eq!(
            h.controller.session().prompt().custom_text,
            "Describe your hometown."
        );

        h.controller
            .dispatch(Command::SetCustomText("A new question".into()));
        assert_eq!(h.store.raw("custom_text").as_deref(), Some("A new question"));

        h.store.fail_writes(true);
        h.controller.dispatch(Command::ResetCounter);
        assert_eq!(h.controller.session().practice_count(), 0);
        assert_eq!(h.store.raw("practice_count").as_deref(), Some("12"));
    }

    #[test]
    fn model_answer_is_single_flight() {
        let mut h = harness();
        let first = h.controller.dispatch(Command::RequestModelAnswer);
        assert!(matches!(first, Outcome::Applied(_)));
        assert_eq!(
            h.controller.dispatch(Command::RequestModelAnswer),
            Outcome::Ignored
        );
        let requests = h.answers.requests();
        assert_eq!(requests.len(), 1);
        let (ticket, request) = &requests[0];
        assert!(request.prompt.contains(h.controller.prompt_text()));
        assert!(request.image.is_none());

        assert_eq!(h.controller.on_answer(ticket + 1, Ok("late".into())), Outcome::Ignored);
        let done = h.controller.on_answer(*ticket, Ok("Model transcript".into()));
        assert!(matches!(done.events(), [Event::ModelAnswerReady { .. }]));
        assert_eq!(
            h.controller.answer(),
            &AnswerState::Succeeded("Model transcript".into())
        );
    }

    #[test]
    fn starting_clears_a_finished_answer() {
        let mut h = harness();
        h.controller.dispatch(Command::RequestModelAnswer);
        let (ticket, _) = h.answers.requests()[0].clone();
        h.controller.on_answer(ticket, Err(GenerationError::EmptyResponse));
        assert!(matches!(h.controller.answer(), AnswerState::Failed(_)));
        h.controller.dispatch(Command::Start);
        assert_eq!(h.controller.answer(), &AnswerState::Idle);
    }

    #[test]
    fn empty_custom_prompt_cannot_request_answer() {
        let mut h = harness();
        h.controller.dispatch(Command::ToggleCustomMode);
        assert_eq!(
            h.controller.dispatch(Command::RequestModelAnswer),
            Outcome::Rejected(Rejection::EmptyPrompt)
        );
        assert!(h.answers.requests().is_empty());
    }

    #[test]
    fn helper_closes_on_task_switch() {
        let mut h = harness();
        h.controller.dispatch(Command::ToggleHelper);
        assert!(h.controller.snapshot().helper.is_some());
        h.controller.dispatch(Command::SelectTask(2));
        assert!(h.controller.snapshot().helper.is_none());
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(90), "01:30");
        assert_eq!(format_mm_ss(605), "10:05");
    }
}
