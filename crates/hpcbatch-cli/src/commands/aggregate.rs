use super::reporter;
use crate::cli::AggregateArgs;
use crate::config::{self, GlobalOptions};
use crate::error::Result;
use crate::ui::UiEvent;
use hpcbatch::workflows;
use tokio::sync::mpsc;

pub async fn run(
    args: AggregateArgs,
    options: &GlobalOptions,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let aggregate_config = config::build_aggregate_config(&args, &file_config)?;
    let reporter = reporter(&ui_sender);

    let report = tokio::task::block_in_place(|| {
        workflows::aggregate::run(&aggregate_config, &reporter)
    })?;

    for path in &report.skipped {
        eprintln!("  skipped {}", path.display());
    }
    println!(
        "Summary of {} file(s) saved to '{}'.",
        report.rows.len(),
        aggregate_config.output_file.display()
    );
    Ok(())
}
