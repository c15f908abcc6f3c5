//! START/STOP state machine.
//!
//! `ToggleController` decides which directive a button press issues, gates the stop
//! path behind a confirmation, flips its state only when a command succeeds and keeps
//! an append-only log of everything the commands printed.
//!
//! Front-ends that block on the command (text mode) call [`ToggleController::activate`].
//! Asynchronous front-ends drive the same machine through [`ToggleController::press`],
//! [`ToggleController::respond`] and [`ToggleController::complete`], which also refuse
//! to start a second directive while one is pending.

use crate::compose::CommandRunner;
use crate::model::{CommandResult, Directive, LogEntry, LogKind, ToggleState};

pub const CONFIRM_PROMPT: &str = "Stop the containers?";
pub const WARNING_MARKER: &str = "⚠️ docker compose problem";

/// Append-only sequence of log entries.
#[derive(Debug, Default, Clone)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, kind: LogKind, text: impl Into<String>) {
        self.entries.push(LogEntry::new(kind, text));
    }
}

/// What a button press asks the caller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Hand this directive to the command runner, then call `complete`.
    Run(Directive),
    /// Ask the user this question, then call `respond`.
    Confirm(&'static str),
    /// A directive is already in flight; nothing was started.
    Busy(Directive),
}

/// Result of applying one command to the controller.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub directive: Directive,
    pub state: ToggleState,
    pub toggled: bool,
    /// Entries this command added to the log, in order.
    pub appended: Vec<LogEntry>,
}

#[derive(Debug, Default)]
pub struct ToggleController {
    state: ToggleState,
    log: ActivityLog,
    awaiting_confirmation: bool,
    pending: Option<Directive>,
}

impl ToggleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn label(&self) -> &'static str {
        self.state.label()
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn pending(&self) -> Option<Directive> {
        self.pending
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    /// Button pressed.
    pub fn press(&mut self) -> Step {
        if let Some(d) = self.pending {
            return Step::Busy(d);
        }
        if self.awaiting_confirmation {
            return Step::Confirm(CONFIRM_PROMPT);
        }
        match self.state {
            ToggleState::Stopped => {
                self.pending = Some(Directive::Up);
                Step::Run(Directive::Up)
            }
            ToggleState::Running => {
                self.awaiting_confirmation = true;
                Step::Confirm(CONFIRM_PROMPT)
            }
        }
    }

    /// Answer to the stop confirmation. Returns the directive to run when affirmed.
    /// Declining (or dismissing) leaves everything as it was.
    pub fn respond(&mut self, affirmed: bool) -> Option<Directive> {
        if !self.awaiting_confirmation {
            return None;
        }
        self.awaiting_confirmation = false;
        if !affirmed {
            return None;
        }
        self.pending = Some(Directive::Down);
        Some(Directive::Down)
    }

    /// Apply the result of the pending directive.
    pub fn complete(&mut self, result: &CommandResult) -> Outcome {
        let directive = self.pending.take().unwrap_or(self.state.directive());
        let before = self.log.len();

        self.log.push(LogKind::Output, result.combined_output());
        let toggled = if result.success() {
            self.state = self.state.flipped();
            true
        } else {
            self.log.push(LogKind::Warning, WARNING_MARKER);
            false
        };

        Outcome {
            directive,
            state: self.state,
            toggled,
            appended: self.log.entries()[before..].to_vec(),
        }
    }

    /// Full press cycle with a blocking runner. `confirm` is only consulted on the
    /// stop path. Returns `None` when nothing was run.
    pub fn activate<R, F>(&mut self, runner: &R, confirm: F) -> Option<Outcome>
    where
        R: CommandRunner + ?Sized,
        F: FnOnce(&str) -> bool,
    {
        let directive = match self.press() {
            Step::Run(d) => d,
            Step::Confirm(prompt) => self.respond(confirm(prompt))?,
            Step::Busy(_) => return None,
        };
        let result = runner.run(directive);
        Some(self.complete(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedRunner {
        results: RefCell<VecDeque<CommandResult>>,
        calls: RefCell<Vec<Directive>>,
    }

    impl ScriptedRunner {
        fn with(results: impl IntoIterator<Item = CommandResult>) -> Self {
            Self {
                results: RefCell::new(results.into_iter().collect()),
                calls: RefCell::default(),
            }
        }

        fn calls(&self) -> Vec<Directive> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, directive: Directive) -> CommandResult {
            self.calls.borrow_mut().push(directive);
            self.results
                .borrow_mut()
                .pop_front()
                .expect("runner called more often than scripted")
        }
    }

    fn ok(stdout: &str) -> CommandResult {
        CommandResult {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn fail(stderr: &str) -> CommandResult {
        CommandResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn running(runner: &ScriptedRunner) -> ToggleController {
        let mut c = ToggleController::new();
        c.activate(runner, |_| panic!("no confirmation on start"))
            .unwrap();
        assert_eq!(c.state(), ToggleState::Running);
        c
    }

    #[test]
    fn start_succeeds_without_confirmation() {
        let runner = ScriptedRunner::with([ok("Container web Started\n")]);
        let mut c = ToggleController::new();
        assert_eq!(c.label(), "START");

        let out = c
            .activate(&runner, |_| panic!("start must not ask"))
            .unwrap();

        assert_eq!(runner.calls(), vec![Directive::Up]);
        assert!(out.toggled);
        assert_eq!(c.state(), ToggleState::Running);
        assert_eq!(c.label(), "STOP");
        assert_eq!(c.log().len(), 1);
        assert_eq!(c.log().entries()[0].text, "Container web Started\n");
        assert_eq!(c.log().entries()[0].kind, LogKind::Output);
    }

    #[test]
    fn failed_stop_keeps_running_and_warns() {
        let runner = ScriptedRunner::with([ok(""), fail("port busy")]);
        let mut c = running(&runner);
        let mut asked = None;

        let out = c
            .activate(&runner, |p| {
                asked = Some(p.to_string());
                true
            })
            .unwrap();

        assert_eq!(asked.as_deref(), Some(CONFIRM_PROMPT));
        assert_eq!(runner.calls(), vec![Directive::Up, Directive::Down]);
        assert!(!out.toggled);
        assert_eq!(c.state(), ToggleState::Running);
        assert_eq!(c.label(), "STOP");
        let texts: Vec<&str> = out.appended.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["port busy", WARNING_MARKER]);
        assert_eq!(out.appended[1].kind, LogKind::Warning);
    }

    #[test]
    fn declined_stop_is_a_no_op() {
        let runner = ScriptedRunner::with([ok("up")]);
        let mut c = running(&runner);
        let log_before = c.log().entries().to_vec();

        assert!(c.activate(&runner, |_| false).is_none());

        assert_eq!(runner.calls(), vec![Directive::Up]);
        assert_eq!(c.state(), ToggleState::Running);
        assert_eq!(c.log().entries(), log_before.as_slice());
        assert!(!c.awaiting_confirmation());
    }

    #[test]
    fn affirmed_stop_succeeds() {
        let runner = ScriptedRunner::with([ok("up"), ok("down")]);
        let mut c = running(&runner);
        let out = c.activate(&runner, |_| true).unwrap();
        assert_eq!(out.directive, Directive::Down);
        assert_eq!(c.state(), ToggleState::Stopped);
        assert_eq!(c.label(), "START");
    }

    #[test]
    fn repeated_failures_retry_same_directive() {
        let runner = ScriptedRunner::with((0..5).map(|_| fail("no such file")));
        let mut c = ToggleController::new();
        for _ in 0..5 {
            let out = c.activate(&runner, |_| panic!("stopped never asks")).unwrap();
            assert!(!out.toggled);
            assert_eq!(c.state(), ToggleState::Stopped);
        }
        assert_eq!(runner.calls(), vec![Directive::Up; 5]);
        assert_eq!(c.log().len(), 10);
    }

    #[test]
    fn success_flips_exactly_once_per_activation() {
        let runner = ScriptedRunner::with([ok("a"), ok("b"), ok("c")]);
        let mut c = ToggleController::new();
        let mut expected = ToggleState::Stopped;
        for _ in 0..3 {
            let before = c.state();
            c.activate(&runner, |_| true).unwrap();
            expected = expected.flipped();
            assert_eq!(c.state(), before.flipped());
            assert_eq!(c.state(), expected);
        }
    }

    #[test]
    fn log_only_grows_and_never_rewrites() {
        let runner = ScriptedRunner::with([fail("x"), ok("y"), ok("z")]);
        let mut c = ToggleController::new();
        let mut snapshot: Vec<LogEntry> = Vec::new();
        // up fails, up succeeds, stop declined, stop affirmed
        let answers = [true, true, false, true];
        for affirm in answers {
            c.activate(&runner, |_| affirm);
            let now = c.log().entries();
            assert!(now.len() >= snapshot.len());
            assert_eq!(&now[..snapshot.len()], snapshot.as_slice());
            snapshot = now.to_vec();
        }
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn empty_output_still_logged() {
        let runner = ScriptedRunner::with([ok("")]);
        let mut c = ToggleController::new();
        c.activate(&runner, |_| true).unwrap();
        assert_eq!(c.log().len(), 1);
        assert_eq!(c.log().entries()[0].text, "");
    }

    #[test]
    fn press_while_pending_is_busy() {
        let mut c = ToggleController::new();
        assert_eq!(c.press(), Step::Run(Directive::Up));
        assert_eq!(c.press(), Step::Busy(Directive::Up));
        assert_eq!(c.pending(), Some(Directive::Up));

        c.complete(&ok(""));
        assert_eq!(c.pending(), None);
        assert_eq!(c.press(), Step::Confirm(CONFIRM_PROMPT));
        // Pressing again while the dialog is open re-asks instead of running.
        assert_eq!(c.press(), Step::Confirm(CONFIRM_PROMPT));
        assert_eq!(c.respond(true), Some(Directive::Down));
        assert_eq!(c.press(), Step::Busy(Directive::Down));
    }

    #[test]
    fn respond_without_question_does_nothing() {
        let mut c = ToggleController::new();
        assert_eq!(c.respond(true), None);
        assert_eq!(c.pending(), None);
        assert_eq!(c.state(), ToggleState::Stopped);
    }
}
