use std::fs::File;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::models::command::ToolCommand;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Executable '{program}' was not found on PATH")]
    NotFound { program: String },

    #[error("Could not start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open '{path}' for stdout redirection: {source}")]
    Redirect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while communicating with '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of one finished external invocation.
///
/// `stdout` is empty when the command redirected its standard output to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn exited(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// The last `lines` lines of stderr, for error reports.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        all[all.len().saturating_sub(lines)..].join("\n")
    }
}

/// Launches external programs on behalf of the workflows.
///
/// Every invocation in the crate passes through this trait, so a workflow can
/// be driven by real processes, by a dry run, or by a scripted fake in tests.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutcome, RunError>;

    /// Whether commands are only being reported. Workflows skip output
    /// checks when this is set, since nothing was produced.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs commands as child processes, blocking until each one exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutcome, RunError> {
        debug!(command = %command, "Launching external program");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(if command.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        match &command.stdout_path {
            Some(path) => {
                let file = File::create(path).map_err(|source| RunError::Redirect {
                    path: path.to_string_lossy().into_owned(),
                    source,
                })?;
                cmd.stdout(Stdio::from(file));
            }
            None => {
                cmd.stdout(Stdio::piped());
            }
        }
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                RunError::NotFound {
                    program: command.program.clone(),
                }
            } else {
                RunError::Spawn {
                    program: command.program.clone(),
                    source: e,
                }
            }
        })?;

        if let (Some(text), Some(mut stdin)) = (&command.stdin, child.stdin.take()) {
            // A program may exit without draining its input.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(RunError::Io {
                        program: command.program.clone(),
                        source: e,
                    });
                }
            }
        }

        let output = child.wait_with_output().map_err(|source| RunError::Io {
            program: command.program.clone(),
            source,
        })?;

        let outcome = CommandOutcome {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program = %command.program, status = ?outcome.status, "External program finished");
        Ok(outcome)
    }
}

/// Reports each command instead of executing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutcome, RunError> {
        match &command.working_dir {
            Some(dir) => info!("[dry-run] (cd {}) {}", dir.display(), command),
            None => info!("[dry-run] {}", command),
        }
        Ok(CommandOutcome::succeeded(String::new()))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    type Behaviour = Box<dyn Fn(&ToolCommand) -> Result<CommandOutcome, RunError> + Send + Sync>;

    /// Records every command and answers with a scripted outcome.
    pub(crate) struct ScriptedRunner {
        calls: Mutex<Vec<ToolCommand>>,
        behaviour: Behaviour,
    }

    impl ScriptedRunner {
        pub(crate) fn new(
            behaviour: impl Fn(&ToolCommand) -> Result<CommandOutcome, RunError>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                behaviour: Box::new(behaviour),
            }
        }

        /// Succeeds every call, creating the redirected stdout file if any.
        pub(crate) fn succeeding() -> Self {
            Self::new(|cmd| {
                if let Some(path) = &cmd.stdout_path {
                    std::fs::write(path, "").map_err(|source| RunError::Redirect {
                        path: path.to_string_lossy().into_owned(),
                        source,
                    })?;
                }
                Ok(CommandOutcome::succeeded(""))
            })
        }

        pub(crate) fn calls(&self) -> Vec<ToolCommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: &ToolCommand) -> Result<CommandOutcome, RunError> {
            self.calls.lock().unwrap().push(command.clone());
            (self.behaviour)(command)
        }
    }
}
