use crate::compose::{self, ComposeRunner};
use crate::model::{InfoEvent, LogEntry, LogKind, ToggleConfig};
use crate::toggle::ToggleController;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "compose-toggle",
    version,
    about = "Start and stop a docker compose stack with a single button"
)]
pub struct Cli {
    /// Compose file to drive; overrides the default docker-compose.yml next to this executable
    #[arg(long)]
    pub compose_file: Option<PathBuf>,

    /// Executable providing the `compose` subcommand
    #[arg(long, default_value = "docker")]
    pub tool: String,

    /// Line-oriented prompt instead of the TUI
    #[arg(long)]
    pub text: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;

    if !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg).await;
        }
    }

    // Also the fallback when built without TUI support.
    run_text(cfg).await
}

/// Build a `ToggleConfig` from CLI arguments. The compose path is resolved here, once.
pub fn build_config(args: &Cli) -> Result<ToggleConfig> {
    let compose_file = match args.compose_file.as_ref() {
        Some(p) if p.is_absolute() => p.clone(),
        Some(p) => std::env::current_dir()
            .context("read current directory")?
            .join(p),
        None => compose::default_compose_file()?,
    };
    Ok(ToggleConfig {
        tool: args.tool.clone(),
        project_dir: compose::project_dir_of(&compose_file),
        compose_file,
    })
}

async fn run_text(cfg: ToggleConfig) -> Result<()> {
    // Text mode keeps the blocking model: the prompt waits for each command.
    tokio::task::spawn_blocking(move || text_loop(&cfg))
        .await
        .context("text mode task failed")?
}

fn read_line() -> Result<Option<String>> {
    let mut buf = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut buf)
        .context("read from stdin")?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

/// Ask a yes/no question on stdin. Anything but an explicit yes (including EOF) declines.
fn ask_yes_no(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    let answer = read_line().ok().flatten().unwrap_or_default();
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_entry(out: &mut impl Write, entry: &LogEntry) -> io::Result<()> {
    let text = entry.text.trim_end_matches('\n');
    if entry.kind == LogKind::Output && text.is_empty() {
        return Ok(());
    }
    writeln!(out, "{text}")
}

fn text_loop(cfg: &ToggleConfig) -> Result<()> {
    let runner = ComposeRunner::new(cfg);
    let mut controller = ToggleController::new();
    let mut stdout = io::stdout();

    eprintln!("Compose file: {}", cfg.compose_file.display());

    loop {
        write!(
            stdout,
            "[{}] Enter to press, s to save the log, q to quit > ",
            controller.label()
        )?;
        stdout.flush()?;

        let Some(line) = read_line()? else {
            break;
        };
        match line.as_str() {
            "" => {}
            "q" | "quit" => break,
            "s" | "save" if controller.log().is_empty() => {
                eprintln!("Log is empty; nothing to save yet.");
                continue;
            }
            "s" | "save" => {
                match crate::storage::save_log_json(controller.log().entries()) {
                    Ok(path) => eprintln!("Saved: {}", path.display()),
                    Err(e) => eprintln!("Save failed: {e:#}"),
                }
                continue;
            }
            other => {
                eprintln!("Unknown input: {other}");
                continue;
            }
        }

        match controller.activate(&runner, ask_yes_no) {
            Some(outcome) => {
                for entry in &outcome.appended {
                    print_entry(&mut stdout, entry)?;
                }
                let verdict = if outcome.toggled { "succeeded" } else { "failed" };
                eprintln!("compose {} {verdict}", outcome.directive.to_display());
            }
            None => eprintln!("{}", InfoEvent::Declined.to_message()),
        }
    }

    Ok(())
}
