//! Interactive practice in the terminal.
//!
//! Each input line is one key press (`space` or a single letter, mapped
//! through the configured shortcuts) or a `:`-prefixed text command. Text
//! commands count as typing in a text field, so shortcuts never fire from
//! them.

use std::io::Write;
use std::path::{Path, PathBuf};

use celspeak_core::commands::{Command, Outcome, PracticeController, Snapshot};
use celspeak_core::error::NotifyError;
use celspeak_core::notify::{Cue, LogSink, NotificationSink, SilentSink};
use celspeak_core::{
    AnswerState, Config, Event, Focus, ImageAttachment, Key, KeyBindings, Runtime,
};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args)]
pub struct PracticeArgs {
    /// Task to open first
    #[arg(long)]
    task: Option<u32>,
    /// Image to attach before starting
    #[arg(long)]
    image: Option<PathBuf>,
    /// Print every update as a JSON snapshot
    #[arg(long)]
    json: bool,
}

const HELP: &str = "\
keys:   space = start / pause   r = reset   n = next sample
        (rebind in [shortcuts] of config.toml)
text:   :start :pause :reset :skip :retry :next
        :task N  :sample N  :next-sample  :random
        :mode  :custom TEXT  :home  :home!
        :image PATH  :noimage  :answer  :dismiss
        :helper  :fullscreen  :count-reset  :help  :quit";

/// Terminal bell, one per tone, on stderr.
struct BellSink;

impl NotificationSink for BellSink {
    fn signal(&self, cue: Cue) -> Result<(), NotifyError> {
        let bells = "\x07".repeat(cue.tones().len());
        let mut err = std::io::stderr().lock();
        err.write_all(bells.as_bytes())
            .and_then(|()| err.flush())
            .map_err(|e| NotifyError::Unavailable(e.to_string()))
    }
}

#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Help,
    Quit,
    Invalid(String),
    Nothing,
}

fn parse_line(line: &str, keys: &KeyBindings) -> Input {
    let Some(text) = line.trim_end_matches(['\r', '\n']).strip_prefix(':') else {
        let key = if line.trim_end_matches(['\r', '\n']) == " " {
            Ok(Key::Space)
        } else {
            line.trim().parse::<Key>()
        };
        return match key {
            Ok(key) => keys
                .command_for(key, Focus::Global)
                .map_or(Input::Nothing, Input::Command),
            Err(_) if line.trim().is_empty() => Input::Nothing,
            Err(e) => Input::Invalid(e),
        };
    };
    parse_text_command(text)
}

fn parse_text_command(text: &str) -> Input {
    let (name, rest) = match text.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (text.trim(), ""),
    };
    let number = |what: &str| -> Result<usize, String> {
        rest.parse::<usize>()
            .map_err(|_| format!("{what} needs a number, got '{rest}'"))
    };
    let command = match name {
        "start" => Command::Start,
        "pause" => Command::PauseToggle,
        "reset" => Command::Cancel,
        "skip" => Command::Skip,
        "retry" => Command::Retry,
        "next" => Command::NextPractice,
        "task" => match number(":task") {
            Ok(id) => match u32::try_from(id) {
                Ok(id) => Command::SelectTask(id),
                Err(_) => return Input::Invalid(format!("no such task {id}")),
            },
            Err(e) => return Input::Invalid(e),
        },
        "sample" => match number(":sample") {
            Ok(index) => Command::SelectSample(index),
            Err(e) => return Input::Invalid(e),
        },
        "next-sample" => Command::NextSample,
        "random" => Command::RandomSample,
        "mode" => Command::ToggleCustomMode,
        "custom" => Command::SetCustomText(rest.to_string()),
        "home" => Command::GoHome { confirmed: false },
        "home!" => Command::GoHome { confirmed: true },
        "image" => match ImageAttachment::from_path(Path::new(rest)) {
            Ok(image) => Command::AttachImage(image),
            Err(e) => return Input::Invalid(e.to_string()),
        },
        "noimage" => Command::ClearImage,
        "answer" => Command::RequestModelAnswer,
        "dismiss" => Command::DismissModelAnswer,
        "helper" => Command::ToggleHelper,
        "fullscreen" => Command::ToggleFullscreen,
        "count-reset" => Command::ResetCounter,
        "help" => return Input::Help,
        "quit" | "q" => return Input::Quit,
        other => return Input::Invalid(format!("unknown command ':{other}' (try :help)")),
    };
    Input::Command(command)
}

fn status_line(snap: &Snapshot) -> String {
    let mut line = format!(
        "[{}] {}  task {}: {}  practices: {}",
        snap.phase.label(),
        snap.display,
        snap.task_id,
        snap.task_title,
        snap.practice_count
    );
    if snap.paused {
        line.push_str("  (paused)");
    }
    if snap.last_seconds {
        line.push_str("  !");
    }
    line
}

fn print_prompt(snap: &Snapshot) {
    let source = if snap.custom_mode {
        "custom".to_string()
    } else {
        format!("sample {}/{}", snap.sample_index + 1, snap.sample_count)
    };
    println!("  prompt ({source}): {}", snap.prompt);
    if snap.requires_image {
        let state = if snap.image_attached { "attached" } else { "missing" };
        println!("  image: {state}");
    }
}

fn render(controller: &PracticeController, outcome: &Outcome, json: bool) {
    let snap = controller.snapshot();
    if json {
        match serde_json::to_string(&snap) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("could not encode snapshot: {e}"),
        }
        if let Outcome::Rejected(reason) = outcome {
            eprintln!("{reason}");
        }
        return;
    }

    match outcome {
        Outcome::Rejected(reason) => println!("! {reason}"),
        Outcome::NeedsConfirmation(question) => {
            println!("? {question} (type :home! to confirm)");
        }
        Outcome::Ignored => {}
        Outcome::Applied(events) => {
            println!("{}", status_line(&snap));
            for event in events {
                match event {
                    Event::TaskSelected { .. }
                    | Event::ReturnedHome { .. }
                    | Event::SampleSelected { .. }
                    | Event::CustomModeToggled { .. } => print_prompt(&snap),
                    Event::HelperToggled { open: true, .. } => {
                        if let Some(helper) = &snap.helper {
                            println!("  {}:", helper.title);
                            for point in &helper.points {
                                println!("    - {point}");
                            }
                        }
                    }
                    Event::ModelAnswerRequested { .. } => println!("  generating model answer..."),
                    Event::ModelAnswerReady { .. } | Event::ModelAnswerFailed { .. } => {
                        match &snap.answer {
                            AnswerState::Succeeded(text) => println!("\n{}\n", text.trim()),
                            AnswerState::Failed(message) => println!("  {message}"),
                            AnswerState::Idle | AnswerState::Pending => {}
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

pub fn run(args: PracticeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let keys = KeyBindings::from_config(&config.shortcuts)?;
    let json = args.json;
    // JSON mode keeps the terminal quiet and logs cues.
    let sink: Box<dyn NotificationSink> =
        match (config.notifications.enabled && config.notifications.volume > 0, json) {
            (false, _) => Box::new(SilentSink),
            (true, true) => Box::new(LogSink),
            (true, false) => Box::new(BellSink),
        };
    let image = args.image.as_deref().map(ImageAttachment::from_path).transpose()?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async move {
        let (mut runtime, handle) = Runtime::from_config(&config, sink)?;

        if let Some(id) = args.task {
            if let Outcome::Rejected(reason) = runtime.dispatch(Command::SelectTask(id)) {
                return Err(reason.to_string().into());
            }
        }
        if let Some(image) = image {
            runtime.dispatch(Command::AttachImage(image));
        }

        let snap = runtime.controller().snapshot();
        if json {
            println!("{}", serde_json::to_string(&snap)?);
        } else {
            println!("{}", status_line(&snap));
            print_prompt(&snap);
            println!("(:help for commands)");
        }

        let reader_handle = handle.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("stdin closed: {e}");
                        break;
                    }
                };
                match parse_line(&line, &keys) {
                    Input::Command(command) => {
                        if !reader_handle.send(command) {
                            return;
                        }
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Quit => break,
                    Input::Invalid(message) => println!("! {message}"),
                    Input::Nothing => {}
                }
            }
            reader_handle.shutdown();
        });

        runtime
            .run(|controller, outcome| render(controller, outcome, json))
            .await;
        Ok::<(), Box<dyn std::error::Error>>(())
    });
    rt.shutdown_background();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use celspeak_core::PhaseKind;

    fn parse(line: &str) -> Input {
        parse_line(line, &KeyBindings::default())
    }

    #[test]
    fn keys_map_through_bindings() {
        assert_eq!(parse(" "), Input::Command(Command::ToggleStartOrPause));
        assert_eq!(parse("space"), Input::Command(Command::ToggleStartOrPause));
        assert_eq!(parse("r"), Input::Command(Command::Cancel));
        assert_eq!(parse("n"), Input::Command(Command::NextSampleIfIdle));
        assert_eq!(parse("x"), Input::Nothing);
        assert_eq!(parse(""), Input::Nothing);
    }

    #[test]
    fn text_commands_bypass_shortcuts() {
        assert_eq!(
            parse(":custom r n space"),
            Input::Command(Command::SetCustomText("r n space".into()))
        );
        assert_eq!(parse(":task 3"), Input::Command(Command::SelectTask(3)));
        assert_eq!(parse(":sample 2"), Input::Command(Command::SelectSample(2)));
        assert_eq!(parse(":home!"), Input::Command(Command::GoHome { confirmed: true }));
        assert_eq!(parse(":quit"), Input::Quit);
        assert!(matches!(parse(":task x"), Input::Invalid(_)));
        assert!(matches!(parse(":bogus"), Input::Invalid(_)));
    }

    #[test]
    fn status_line_marks_pause_and_final_seconds() {
        let snap = Snapshot {
            phase: PhaseKind::Speaking,
            remaining_secs: 4,
            display: "00:04".into(),
            total_secs: 90,
            paused: true,
            progress: 0.95,
            last_seconds: true,
            task_id: 1,
            task_title: "Giving Advice".into(),
            prompt: String::new(),
            custom_mode: false,
            sample_index: 0,
            sample_count: 3,
            requires_image: false,
            image_attached: false,
            practice_count: 2,
            helper: None,
            fullscreen: false,
            answer: AnswerState::Idle,
        };
        let line = status_line(&snap);
        assert!(line.starts_with("[SPEAKING] 00:04"));
        assert!(line.contains("(paused)"));
        assert!(line.ends_with('!'));
    }
}
