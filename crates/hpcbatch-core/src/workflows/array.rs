use super::execute;
use crate::engine::config::ArrayTaskConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::CommandRunner;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayTaskReport {
    pub index: u32,
    pub tool: &'static str,
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

/// Runs the structure predictor for one array index.
///
/// Both paths are derived from the index alone, so every task of an array
/// reads and writes its own files.
#[instrument(skip_all, name = "array_task", fields(index = config.index))]
pub fn run(
    config: &ArrayTaskConfig,
    runner: &dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Result<ArrayTaskReport, EngineError> {
    if let Some(range) = &config.range {
        if !range.contains(config.index) {
            return Err(EngineError::IndexOutOfRange {
                index: config.index,
                range: range.to_string(),
            });
        }
    }

    let input = config.input_path();
    let output_dir = config.output_dir();
    if !input.is_file() {
        return Err(EngineError::MissingInput { path: input });
    }
    if !runner.is_dry_run() {
        std::fs::create_dir_all(&output_dir).map_err(EngineError::io(&output_dir))?;
    }

    reporter.phase(format!("{} (task {})", config.tool.name(), config.index));
    info!(
        "Array task {}: {} -> {}",
        config.index,
        input.display(),
        output_dir.display()
    );
    execute(runner, &config.command())?;
    reporter.report(Progress::PhaseFinish);

    info!("Array task {} complete.", config.index);
    Ok(ArrayTaskReport {
        index: config.index,
        tool: config.tool.name(),
        input,
        output_dir,
    })
}
