//! Compose file resolution and the command runner.
//!
//! The runner never fails from the caller's point of view: anything that goes wrong
//! while launching the tool is folded into a non-zero `CommandResult` with the error
//! text on stderr, exactly like a failing compose command.

use crate::model::{CommandResult, Directive, ToggleConfig};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Fixed compose definition filename looked up next to the executable.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// Exit code reported when the tool could not be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Resolve the compose file from the directory containing the running executable.
pub fn default_compose_file() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("locate running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable path has no parent: {}", exe.display()))?;
    Ok(dir.join(COMPOSE_FILE_NAME))
}

/// Directory a compose invocation runs in. A bare filename runs in the current directory.
pub fn project_dir_of(compose_file: &Path) -> PathBuf {
    match compose_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Executes one directive and reports its result synchronously.
pub trait CommandRunner {
    fn run(&self, directive: Directive) -> CommandResult;
}

/// Runs `<tool> compose -f <file> <directive>` in the compose file's directory.
#[derive(Debug, Clone)]
pub struct ComposeRunner {
    tool: String,
    compose_file: PathBuf,
    project_dir: PathBuf,
}

impl ComposeRunner {
    pub fn new(cfg: &ToggleConfig) -> Self {
        Self {
            tool: cfg.tool.clone(),
            compose_file: cfg.compose_file.clone(),
            project_dir: cfg.project_dir.clone(),
        }
    }

    /// Arguments passed to the tool, program name excluded.
    pub fn command_args(&self, directive: Directive) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "compose".into(),
            "-f".into(),
            self.compose_file.clone().into_os_string(),
        ];
        args.extend(directive.args().iter().map(OsString::from));
        args
    }
}

impl CommandRunner for ComposeRunner {
    fn run(&self, directive: Directive) -> CommandResult {
        let output = Command::new(&self.tool)
            .args(self.command_args(directive))
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(out) => CommandResult {
                // None means the process was killed by a signal.
                exit_code: out.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            },
            Err(e) => CommandResult {
                exit_code: SPAWN_FAILURE_EXIT_CODE,
                stdout: String::new(),
                stderr: format!("failed to run `{}`: {e}\n", self.tool),
            },
        }
    }
}
