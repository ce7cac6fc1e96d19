//! Keyboard shortcuts.
//!
//! Global bindings are suppressed while focus is inside a text input, so
//! typing a custom prompt never starts the timer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::commands::Command;
use crate::error::ConfigError;
use crate::storage::ShortcutsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Char(char),
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "space" || s == " " {
            return Ok(Key::Space);
        }
        let mut chars = lower.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => Ok(Key::Char(c)),
            _ => Err(format!("unknown key '{s}'")),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Space => write!(f, "space"),
            Key::Char(c) => write!(f, "{c}"),
        }
    }
}

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Global,
    TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Start from IDLE, pause/resume while running.
    ToggleStartPause,
    Reset,
    NextSample,
}

impl FromStr for KeyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "toggle" => Ok(KeyAction::ToggleStartPause),
            "reset" => Ok(KeyAction::Reset),
            "next_sample" => Ok(KeyAction::NextSample),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Key, KeyAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let map = [
            (Key::Space, KeyAction::ToggleStartPause),
            (Key::Char('r'), KeyAction::Reset),
            (Key::Char('n'), KeyAction::NextSample),
        ]
        .into_iter()
        .collect();
        Self { map }
    }
}

impl KeyBindings {
    pub fn from_config(config: &ShortcutsConfig) -> Result<Self, ConfigError> {
        let mut map = HashMap::with_capacity(config.bindings.len());
        for (key, action) in &config.bindings {
            let invalid = |message: String| ConfigError::InvalidValue {
                key: format!("shortcuts.bindings.{key}"),
                message,
            };
            let parsed_key: Key = key.parse().map_err(invalid)?;
            let parsed_action: KeyAction = action.parse().map_err(invalid)?;
            map.insert(parsed_key, parsed_action);
        }
        Ok(Self { map })
    }

    pub fn action(&self, key: Key) -> Option<KeyAction> {
        self.map.get(&key).copied()
    }

    /// Resolve a key press into a command. Phase-dependent keys map to
    /// intents the controller resolves against the live phase.
    pub fn command_for(&self, key: Key, focus: Focus) -> Option<Command> {
        if focus == Focus::TextInput {
            return None;
        }
        Some(match self.action(key)? {
            KeyAction::ToggleStartPause => Command::ToggleStartOrPause,
            KeyAction::Reset => Command::Cancel,
            KeyAction::NextSample => Command::NextSampleIfIdle,
        })
    }
}
