//! Toggle lifecycle controller.
//!
//! Owns the `ToggleController`, runs directives on a blocking worker and emits events
//! for presentation layers. At most one directive is in flight at any time.

use crate::compose::CommandRunner;
use crate::model::{CommandResult, Directive, InfoEvent, ToggleEvent};
use crate::toggle::{Step, ToggleController};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    /// The START/STOP button was pressed.
    Press,
    /// Answer to a pending `ConfirmRequested`.
    Confirm(bool),
    Quit,
}

/// Hand a directive to the runner on the blocking pool.
fn start_command<R>(
    runner: &Arc<R>,
    directive: Directive,
    event_tx: &UnboundedSender<ToggleEvent>,
) -> JoinHandle<CommandResult>
where
    R: CommandRunner + Send + Sync + 'static,
{
    let _ = event_tx.send(ToggleEvent::CommandStarted { directive });
    let runner = Arc::clone(runner);
    tokio::task::spawn_blocking(move || runner.run(directive))
}

/// Drive the toggle from UI commands and report everything back as events.
pub(crate) async fn run_controller<R>(
    runner: Arc<R>,
    event_tx: UnboundedSender<ToggleEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()>
where
    R: CommandRunner + Send + Sync + 'static,
{
    let mut controller = ToggleController::new();
    let mut in_flight: Option<JoinHandle<CommandResult>> = None;
    let mut quit_pending = false;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::Press) => match controller.press() {
                        Step::Run(directive) => {
                            in_flight = Some(start_command(&runner, directive, &event_tx));
                        }
                        Step::Confirm(prompt) => {
                            let _ = event_tx.send(ToggleEvent::ConfirmRequested { prompt });
                        }
                        Step::Busy(directive) => {
                            let _ = event_tx.send(ToggleEvent::Info(InfoEvent::Busy { directive }));
                        }
                    },
                    Some(UiCommand::Confirm(affirmed)) => {
                        if !controller.awaiting_confirmation() {
                            let _ = event_tx.send(ToggleEvent::Info(InfoEvent::NothingToConfirm));
                            continue;
                        }
                        match controller.respond(affirmed) {
                            Some(directive) => {
                                in_flight = Some(start_command(&runner, directive, &event_tx));
                            }
                            None => {
                                let _ = event_tx.send(ToggleEvent::Info(InfoEvent::Declined));
                            }
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Never abandon a running compose command; wait for its result first.
                        quit_pending = true;
                        match controller.pending() {
                            Some(directive) => {
                                let _ = event_tx.send(ToggleEvent::Info(
                                    InfoEvent::WaitingForCommand { directive },
                                ));
                            }
                            None => break Ok(()),
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it is dropped
            // when another branch is chosen and the result is never observed.
            maybe_done = async {
                if let Some(h) = in_flight.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    in_flight = None;
                    let result = join_res.unwrap_or_else(|e| CommandResult {
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: format!("command task failed: {e}\n"),
                    });
                    let outcome = controller.complete(&result);
                    for entry in outcome.appended {
                        let _ = event_tx.send(ToggleEvent::LogAppended(entry));
                    }
                    let _ = event_tx.send(ToggleEvent::CommandFinished {
                        state: outcome.state,
                        result,
                    });
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
        }
    };

    res
}
