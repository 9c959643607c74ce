use super::execute;
use crate::core::models::pipeline::StageSpec;
use crate::engine::config::PipelineConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::CommandRunner;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

#[derive(Debug)]
pub struct StageOutcome {
    /// 1-based position in the pipeline.
    pub index: usize,
    pub name: String,
    pub output: PathBuf,
    pub result: Result<(), EngineError>,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub stages: Vec<StageOutcome>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.stages.iter().all(|s| s.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &StageOutcome> {
        self.stages.iter().filter(|s| s.result.is_err())
    }

    /// Output of the last stage that ran.
    pub fn final_output(&self) -> Option<&Path> {
        self.stages.last().map(|s| s.output.as_path())
    }
}

/// Runs the stages in order, feeding each stage the previous stage's output.
///
/// A stage fails when its program exits non-zero or when its declared output
/// file is missing afterwards. The first failure aborts the run with
/// [`EngineError::StageFailed`] and later stages are never launched. With
/// `best_effort` set every stage runs and failures are only recorded.
#[instrument(skip_all, name = "pipeline")]
pub fn run(
    config: &PipelineConfig,
    runner: &dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Result<PipelineReport, EngineError> {
    if !config.input.is_file() {
        return Err(EngineError::MissingInput {
            path: config.input.clone(),
        });
    }
    // Stages run inside the working directory, so relative paths must be fixed first.
    let input = std::path::absolute(&config.input).map_err(EngineError::io(&config.input))?;
    let workdir = std::path::absolute(&config.workdir).map_err(EngineError::io(&config.workdir))?;
    if !runner.is_dry_run() {
        std::fs::create_dir_all(&workdir).map_err(EngineError::io(&workdir))?;
    }

    let stages = config.spec.stages();
    info!(
        "Running {} stage(s) in '{}'{}.",
        stages.len(),
        workdir.display(),
        if config.best_effort {
            " (best effort)"
        } else {
            ""
        }
    );
    reporter.phase("Pipeline");
    reporter.report(Progress::TaskStart {
        total: stages.len() as u64,
    });

    let mut report = PipelineReport::default();
    let mut current_input = input;
    for (offset, stage) in stages.iter().enumerate() {
        let index = offset + 1;
        let output = workdir.join(&stage.output);
        reporter.report(Progress::StatusUpdate {
            text: format!("[{index}/{}] {}", stages.len(), stage.name),
        });
        info!("Stage {}/{} '{}' starting.", index, stages.len(), stage.name);

        let result = run_stage(config, runner, stage, &current_input, &output, &workdir);
        reporter.report(Progress::TaskIncrement { amount: 1 });

        if let Err(e) = result {
            if !config.best_effort {
                error!("Stage {} '{}' failed; aborting pipeline.", index, stage.name);
                return Err(EngineError::StageFailed {
                    index,
                    stage: stage.name.clone(),
                    source: Box::new(e),
                });
            }
            warn!("Stage {} '{}' failed: {}. Continuing.", index, stage.name, e);
            report.stages.push(StageOutcome {
                index,
                name: stage.name.clone(),
                output: output.clone(),
                result: Err(e),
            });
        } else {
            report.stages.push(StageOutcome {
                index,
                name: stage.name.clone(),
                output: output.clone(),
                result: Ok(()),
            });
        }
        current_input = output;
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(
        "Pipeline finished with {} failed stage(s).",
        report.failed().count()
    );
    Ok(report)
}

fn run_stage(
    config: &PipelineConfig,
    runner: &dyn CommandRunner,
    stage: &StageSpec,
    input: &Path,
    output: &Path,
    workdir: &Path,
) -> Result<(), EngineError> {
    let mut command = stage.render(input, output, workdir);
    if let Some(container) = &config.container {
        command = container.wrap(command);
    }
    execute(runner, &command)?;
    if !runner.is_dry_run() && !output.exists() {
        return Err(EngineError::MissingOutput {
            stage: stage.name.clone(),
            path: output.to_path_buf(),
        });
    }
    Ok(())
}
