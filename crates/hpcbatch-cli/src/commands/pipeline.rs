use super::reporter;
use crate::cli::PipelineArgs;
use crate::config::{self, GlobalOptions};
use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use hpcbatch::workflows;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run(
    args: PipelineArgs,
    options: &GlobalOptions,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let pipeline_config = config::build_pipeline_config(&args, &file_config)?;
    let runner = options.runner();
    let reporter = reporter(&ui_sender);

    let names: Vec<&str> = pipeline_config
        .spec
        .stages()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    info!("Pipeline stages: {}", names.join(" -> "));

    let report = tokio::task::block_in_place(|| {
        workflows::pipeline::run(&pipeline_config, runner.as_ref(), &reporter)
    })?;

    let failed: Vec<_> = report.failed().collect();
    for stage in &failed {
        if let Err(e) = &stage.result {
            error!("Stage {} '{}' failed: {}", stage.index, stage.name, e);
            eprintln!("  ✗ stage {} '{}': {}", stage.index, stage.name, e);
        }
    }
    if let Some(output) = report.final_output() {
        println!("Pipeline finished; final output: '{}'.", output.display());
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::Failed(format!(
            "{} of {} pipeline stage(s) failed",
            failed.len(),
            report.stages.len()
        )))
    }
}
