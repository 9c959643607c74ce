pub mod aggregate;
pub mod array;
pub mod convert;
pub mod disorder;
pub mod pipeline;
pub mod structure;

use crate::core::io::fasta::has_extension;
use crate::core::models::command::ToolCommand;
use crate::engine::error::EngineError;
use crate::engine::runner::{CommandOutcome, CommandRunner};
use std::path::{Path, PathBuf};
use tracing::warn;

const STDERR_TAIL_LINES: usize = 20;

/// Regular files in `dir` whose extension is in `extensions`, sorted by name.
pub(crate) fn list_files<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, EngineError> {
    if !dir.is_dir() {
        return Err(EngineError::MissingInput {
            path: dir.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(EngineError::io(dir))? {
        let path = entry.map_err(EngineError::io(dir))?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Runs `command` and turns a non-zero exit into [`EngineError::ToolFailed`].
pub(crate) fn execute(
    runner: &dyn CommandRunner,
    command: &ToolCommand,
) -> Result<CommandOutcome, EngineError> {
    let outcome = runner.run(command)?;
    if outcome.success() {
        return Ok(outcome);
    }
    let stderr_tail = outcome.stderr_tail(STDERR_TAIL_LINES);
    if !stderr_tail.is_empty() {
        warn!(program = %command.program, "stderr:\n{}", stderr_tail);
    }
    Err(EngineError::ToolFailed {
        command: command.to_string(),
        status: outcome.status,
        stderr_tail,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
