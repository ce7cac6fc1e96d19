use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::GenerationRequest;
use crate::error::GenerationError;

/// Identifies one model-answer request.
pub type Ticket = u64;

pub const FAILED_ANSWER_MESSAGE: &str =
    "Failed to generate model answer. Please check your network or API configuration.";
pub const EMPTY_ANSWER_MESSAGE: &str = "No response generated.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "lowercase")]
pub enum AnswerState {
    #[default]
    Idle,
    Pending,
    Succeeded(String),
    Failed(String),
}

impl AnswerState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AnswerState::Pending)
    }
}

/// Single-flight record of the model answer.
///
/// `begin` hands out a ticket only when nothing is pending; `complete`
/// accepts only the outstanding ticket.
#[derive(Debug, Default)]
pub struct ModelAnswer {
    state: AnswerState,
    outstanding: Option<Ticket>,
    last_ticket: Ticket,
}

impl ModelAnswer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AnswerState {
        &self.state
    }

    /// Start a request. `None` while another one is in flight.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.outstanding.is_some() {
            return None;
        }
        self.last_ticket += 1;
        self.outstanding = Some(self.last_ticket);
        self.state = AnswerState::Pending;
        Some(self.last_ticket)
    }

    /// Record the result for `ticket`. Returns false for a ticket that is not
    /// outstanding.
    pub fn complete(&mut self, ticket: Ticket, result: Result<String, GenerationError>) -> bool {
        if self.outstanding != Some(ticket) {
            return false;
        }
        self.outstanding = None;
        self.state = match result {
            Ok(text) if text.trim().is_empty() => AnswerState::Failed(EMPTY_ANSWER_MESSAGE.into()),
            Ok(text) => AnswerState::Succeeded(text),
            Err(GenerationError::EmptyResponse) => {
                AnswerState::Failed(EMPTY_ANSWER_MESSAGE.into())
            }
            Err(e) => {
                tracing::error!(target: "celspeak::generation", "model answer failed: {e}");
                AnswerState::Failed(FAILED_ANSWER_MESSAGE.into())
            }
        };
        true
    }

    /// Drop a finished answer. A pending request cannot be cancelled and
    /// stays pending. Returns whether anything was cleared.
    pub fn clear(&mut self) -> bool {
        match self.state {
            AnswerState::Succeeded(_) | AnswerState::Failed(_) => {
                self.state = AnswerState::Idle;
                true
            }
            AnswerState::Idle | AnswerState::Pending => false,
        }
    }
}

/// Runs a generation request off the controller and reports back with the
/// ticket.
pub trait AnswerDispatcher: Send {
    fn dispatch(&mut self, ticket: Ticket, request: GenerationRequest);
}

/// Keeps dispatched requests for inspection. Test double.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    requests: Arc<Mutex<Vec<(Ticket, GenerationRequest)>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<(Ticket, GenerationRequest)> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AnswerDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, ticket: Ticket, request: GenerationRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((ticket, request));
    }
}
