//! # celspeak Core Library
//!
//! Core logic for celspeak, a timer for CELPIP-style speaking practice.
//! A task presents a prompt, then runs two countdowns: preparation, then
//! speaking. Finished sessions are counted, and a model answer can be
//! requested from an external generation service.
//!
//! ## Architecture
//!
//! - **Session**: a pure state machine over the four phases, driven by
//!   commands and generation-tagged clock ticks
//! - **Command Surface**: validates intents and turns session events into
//!   side effects through injected capabilities
//! - **Runtime**: a tokio loop feeding commands, ticks and answers through
//!   one queue
//! - **Storage**: SQLite key-value slots and TOML configuration
//!
//! ## Key Components
//!
//! - [`Session`]: phase state machine
//! - [`PracticeController`]: command surface
//! - [`Runtime`]: async host loop
//! - [`Database`]: durable practice counter and custom prompt
//! - [`Config`]: application configuration

pub mod attachment;
pub mod catalog;
pub mod commands;
pub mod error;
pub mod events;
pub mod generation;
pub mod keys;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use attachment::ImageAttachment;
pub use catalog::{Helper, Task, TaskCatalog};
pub use commands::{Capabilities, Command, Outcome, PracticeController, Rejection, Snapshot};
pub use error::{
    AttachmentError, ConfigError, CoreError, GenerationError, NotifyError, StoreError,
    ValidationError,
};
pub use events::Event;
pub use generation::{AnswerState, GeminiClient, GenerationRequest, GenerationService};
pub use keys::{Focus, Key, KeyBindings};
pub use notify::{Cue, NotificationSink};
pub use runtime::{Runtime, RuntimeHandle};
pub use storage::{Config, Database, DurableStore, MemoryStore};
pub use timer::{ClockSource, Phase, PhaseKind, Session};
