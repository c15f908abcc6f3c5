use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Executable that provides the `compose` subcommand.
    pub tool: String,
    /// Compose definition file, resolved once at startup.
    pub compose_file: PathBuf,
    /// Working directory for every invocation (the compose file's parent).
    pub project_dir: PathBuf,
}

/// Whether the compose stack is believed to be up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToggleState {
    #[default]
    Stopped,
    Running,
}

impl ToggleState {
    /// Button label reflecting this state.
    pub fn label(self) -> &'static str {
        match self {
            ToggleState::Stopped => "START",
            ToggleState::Running => "STOP",
        }
    }

    /// Directive a button press issues from this state.
    pub fn directive(self) -> Directive {
        match self {
            ToggleState::Stopped => Directive::Up,
            ToggleState::Running => Directive::Down,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            ToggleState::Stopped => ToggleState::Running,
            ToggleState::Running => ToggleState::Stopped,
        }
    }
}

/// Sub-command passed to `<tool> compose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    Up,
    Down,
}

impl Directive {
    pub fn args(self) -> &'static [&'static str] {
        match self {
            Directive::Up => &["up", "-d"],
            Directive::Down => &["down"],
        }
    }

    pub fn to_display(self) -> String {
        self.args().join(" ")
    }
}

/// Outcome of one command invocation. Only zero/non-zero is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, as one block of text.
    pub fn combined_output(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    Output,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: OffsetDateTime,
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            at: now_local(),
            kind,
            text: text.into(),
        }
    }
}

/// Local wall-clock time, falling back to UTC when the offset cannot be determined
/// (e.g. multi-threaded process on some unix platforms).
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Events emitted by the orchestrator and consumed by UI layers.
#[derive(Debug, Clone)]
pub enum ToggleEvent {
    /// A directive was handed to the command runner.
    CommandStarted { directive: Directive },
    /// A command finished and the controller applied its result.
    CommandFinished {
        state: ToggleState,
        result: CommandResult,
    },
    /// The stop path needs a yes/no answer before anything runs.
    ConfirmRequested { prompt: &'static str },
    /// An entry was appended to the activity log.
    LogAppended(LogEntry),
    Info(InfoEvent),
}

/// Structured info events emitted by the orchestrator and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Busy { directive: Directive },
    Declined,
    /// An answer arrived but no confirmation was pending.
    NothingToConfirm,
    WaitingForCommand { directive: Directive },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Busy { directive } => {
                format!("Still running `compose {}`…", directive.to_display())
            }
            InfoEvent::Declined => "Stop cancelled".to_string(),
            InfoEvent::NothingToConfirm => "No confirmation pending; answer ignored".to_string(),
            InfoEvent::WaitingForCommand { directive } => format!(
                "Waiting for `compose {}` to finish before quitting…",
                directive.to_display()
            ),
        }
    }
}
