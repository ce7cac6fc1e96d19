//! Async host loop.
//!
//! Commands, clock ticks and model-answer completions all arrive through one
//! unbounded queue and are applied to the controller one at a time, so no
//! two transitions ever interleave.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::catalog::TaskCatalog;
use crate::commands::{Capabilities, Command, Outcome, PracticeController};
use crate::error::{GenerationError, Result};
use crate::generation::{
    AnswerDispatcher, GeminiClient, GenerationRequest, GenerationService, Ticket,
};
use crate::notify::NotificationSink;
use crate::storage::{Config, Database, DurableStore};
use crate::timer::{Generation, TickCallback, TokioClock};

#[derive(Debug)]
pub enum Message {
    Command(Command),
    Tick(Generation),
    AnswerReady {
        ticket: Ticket,
        result: Result<String, GenerationError>,
    },
    Shutdown,
}

/// Cloneable sender side of the runtime queue.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: UnboundedSender<Message>,
}

impl RuntimeHandle {
    /// Queue a command. Returns false once the runtime has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(Message::Command(command)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

/// Runs each generation request on its own task and posts the result back.
struct SpawnedAnswers {
    service: Arc<dyn GenerationService>,
    tx: UnboundedSender<Message>,
    handle: Handle,
}

impl AnswerDispatcher for SpawnedAnswers {
    fn dispatch(&mut self, ticket: Ticket, request: GenerationRequest) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = service.generate(&request).await;
            if tx.send(Message::AnswerReady { ticket, result }).is_err() {
                tracing::debug!(target: "celspeak::generation", "runtime gone, dropping answer {ticket}");
            }
        });
    }
}

pub struct Runtime {
    controller: PracticeController,
    rx: UnboundedReceiver<Message>,
}

impl Runtime {
    /// Wire a controller to a tokio clock and spawned generation requests.
    ///
    /// # Errors
    /// Returns an error when called outside a tokio runtime.
    /// Wire a runtime from user config: the configured catalog, the SQLite
    /// store and the Gemini client.
    pub fn from_config(
        config: &Config,
        sink: Box<dyn NotificationSink>,
    ) -> Result<(Self, RuntimeHandle)> {
        let catalog = TaskCatalog::for_config(config)?;
        let store = Database::open()?;
        let service = Arc::new(GeminiClient::from_config(&config.generation)?);
        Ok(Self::new(
            catalog,
            sink,
            Box::new(store),
            service,
            config.timer.tick_interval(),
        )?)
    }

    pub fn new(
        catalog: TaskCatalog,
        sink: Box<dyn NotificationSink>,
        store: Box<dyn DurableStore>,
        service: Arc<dyn GenerationService>,
        tick_period: Duration,
    ) -> Result<(Self, RuntimeHandle), TryCurrentError> {
        let (tx, rx) = unbounded_channel();

        let tick_tx = tx.clone();
        let on_tick: TickCallback = Arc::new(move |generation| {
            let _ = tick_tx.send(Message::Tick(generation));
        });
        let clock = TokioClock::new(tick_period, on_tick)?;
        let answers = SpawnedAnswers {
            service,
            tx: tx.clone(),
            handle: Handle::try_current()?,
        };

        let controller = PracticeController::new(
            catalog,
            Capabilities {
                sink,
                store,
                clock: Box::new(clock),
                answers: Box::new(answers),
            },
        );
        Ok((Self { controller, rx }, RuntimeHandle { tx }))
    }

    pub fn controller(&self) -> &PracticeController {
        &self.controller
    }

    /// Apply a command before the loop starts, e.g. an initial task choice.
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        self.controller.dispatch(command)
    }

    /// Drain the queue until shutdown, calling `on_update` after every
    /// message. Returns the controller for inspection.
    pub async fn run<F>(mut self, mut on_update: F) -> PracticeController
    where
        F: FnMut(&PracticeController, &Outcome),
    {
        while let Some(message) = self.rx.recv().await {
            let outcome = match message {
                Message::Command(command) => self.controller.dispatch(command),
                Message::Tick(generation) => self.controller.on_tick(generation),
                Message::AnswerReady { ticket, result } => {
                    self.controller.on_answer(ticket, result)
                }
                Message::Shutdown => break,
            };
            on_update(&self.controller, &outcome);
        }
        tracing::debug!(target: "celspeak::runtime", "runtime stopped");
        self.controller.stop_clock();
        self.controller
    }
}
