use super::reporter;
use crate::cli::ArrayArgs;
use crate::config::{self, GlobalOptions};
use crate::error::Result;
use crate::ui::UiEvent;
use hpcbatch::workflows;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run(
    args: ArrayArgs,
    options: &GlobalOptions,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let task_config = config::build_array_config(&args, &file_config)?;
    let runner = options.runner();
    let reporter = reporter(&ui_sender);

    info!(
        "Array task {}: {} on '{}'.",
        task_config.index,
        task_config.tool.name(),
        task_config.input_path().display()
    );
    let report = tokio::task::block_in_place(|| {
        workflows::array::run(&task_config, runner.as_ref(), &reporter)
    })?;

    println!(
        "Array task {} ({}) finished: '{}' -> '{}'.",
        report.index,
        report.tool,
        report.input.display(),
        report.output_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{options_with, ui_channel};
    use crate::error::CliError;
    use hpcbatch::engine::error::EngineError;
    use std::fs;

    fn workspace() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("fasta")).unwrap();
        fs::write(dir.path().join("fasta/seq_42.fa"), ">s\nMKT\n").unwrap();
        let config = dir.path().join("hpcbatch.toml");
        fs::write(&config, "[array]\nrange = \"0-99\"\n").unwrap();
        (dir, config)
    }

    fn args(dir: &tempfile::TempDir, index: u32) -> ArrayArgs {
        ArrayArgs {
            index: Some(index),
            input_dir: Some(dir.path().join("fasta")),
            output_dir: Some(dir.path().join("results")),
            ..ArrayArgs::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dry_run_resolves_index_paths() {
        let (dir, config) = workspace();
        let (sender, _receiver) = ui_channel();

        run(args(&dir, 42), &options_with(config, true), sender)
            .await
            .unwrap();

        assert!(!dir.path().join("results/42").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn index_outside_declared_range_is_rejected() {
        let (dir, config) = workspace();
        let (sender, _receiver) = ui_channel();

        let err = run(args(&dir, 100), &options_with(config, true), sender)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CliError::Core(EngineError::IndexOutOfRange { index: 100, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_input_for_index_is_reported() {
        let (dir, config) = workspace();
        let (sender, _receiver) = ui_channel();

        let err = run(args(&dir, 7), &options_with(config, true), sender)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Core(EngineError::MissingInput { .. })));
    }
}
