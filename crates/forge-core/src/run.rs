//! External command invocation.
//!
//! Build tools are driven through a single composed command line run
//! via `/bin/sh -c`, with the [`EnvOverlay`] applied to the child.
//! Output is captured in full so adapters can scan it for error
//! markers or settings the tool prints (the configure output of some
//! packages is the only place certain values appear).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;
use std::rc::Rc;

use tracing::debug;

use crate::env::EnvOverlay;
use crate::error::BuildError;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Combined stdout and stderr of the child.
    pub stdout: String,
    /// Exit code; `-1` when the child was killed by a signal.
    pub code: i32,
}

impl CommandOutput {
    /// Successful (zero) exit.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// A canned success with the given output, for scripted runners.
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            code: 0,
        }
    }
}

/// Seam between the adapter and the external build tools.
pub trait CommandRunner: std::fmt::Debug {
    /// Run a shell command in `cwd` with the overlay applied.
    ///
    /// A non-zero exit is not an error at this level; callers decide
    /// whether to trust the exit code, scan the output, or both.
    ///
    /// # Errors
    ///
    /// Returns an error only when the command could not be spawned.
    fn run(&self, cmd: &str, cwd: &Path, env: &EnvOverlay) -> Result<CommandOutput, BuildError>;
}

/// Real runner: `/bin/sh -c <cmd>` with captured output.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str, cwd: &Path, env: &EnvOverlay) -> Result<CommandOutput, BuildError> {
        debug!(cmd, cwd = %cwd.display(), "running external command");
        let mut child = Command::new("/bin/sh");
        child.arg("-c").arg(cmd).current_dir(cwd);
        env.apply(&mut child);

        let output = child.output().map_err(|e| {
            BuildError::ExternalTool(format!("failed to spawn `{cmd}`: {e}"))
        })?;

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !stdout.is_empty() && !stdout.ends_with('\n') {
                stdout.push('\n');
            }
            stdout.push_str(&stderr);
        }

        Ok(CommandOutput {
            stdout,
            code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Scripted runner for tests and dry runs: logs every command and
/// replays canned outputs, defaulting to an empty success once the
/// queue is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: RefCell<VecDeque<CommandOutput>>,
    commands: Rc<RefCell<Vec<String>>>,
}

impl ScriptedRunner {
    /// Runner with no canned outputs; every command succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned output for the next command.
    pub fn push_output(&self, out: CommandOutput) {
        self.outputs.borrow_mut().push_back(out);
    }

    /// Shared handle onto the command log; clone it before handing the
    /// runner to a [`crate::BuildContext`].
    pub fn command_log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.commands)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &str, _cwd: &Path, _env: &EnvOverlay) -> Result<CommandOutput, BuildError> {
        self.commands.borrow_mut().push(cmd.to_string());
        Ok(self
            .outputs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| CommandOutput::ok("")))
    }
}

/// Last `n` lines of a command's output, for failure diagnostics.
pub fn output_tail(output: &str, n: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
