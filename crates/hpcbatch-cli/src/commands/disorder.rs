use super::reporter;
use crate::cli::DisorderArgs;
use crate::config::{self, GlobalOptions};
use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use hpcbatch::workflows;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run(
    args: DisorderArgs,
    options: &GlobalOptions,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let sweep_config = config::build_disorder_config(&args, &file_config)?;
    let runner = options.runner();
    let reporter = reporter(&ui_sender);

    info!(
        "Running IUPred3 ({}) over '{}'.",
        sweep_config.iupred.analysis_type.as_str(),
        sweep_config.input_dir.display()
    );
    let report = tokio::task::block_in_place(|| {
        workflows::disorder::run(&sweep_config, runner.as_ref(), &reporter)
    })?;

    let total = report.files.len();
    let failed: Vec<_> = report.failed().collect();
    for outcome in &failed {
        if let Err(e) = &outcome.result {
            error!("'{}' failed: {}", outcome.input.display(), e);
            eprintln!("  ✗ {}: {}", outcome.input.display(), e);
        }
    }
    println!(
        "Disorder prediction finished: {} of {} file(s) written to '{}'.",
        total - failed.len(),
        total,
        sweep_config.output_dir.display()
    );

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::Failed(format!(
            "{} of {} disorder prediction(s) failed",
            failed.len(),
            total
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::commands::testing::{options_with, ui_channel};
    use std::fs;
    use std::path::Path;

    /// Stands in for iupred3.py: echoes the smoothing flag and the analysis type.
    const FAKE_IUPRED: &str = "echo \"smoothing=$2 type=$4\"\n";

    fn workspace(failing: bool) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("fasta")).unwrap();
        fs::write(root.join("fasta/seq1.fasta"), ">short\nMKTAYIAKQR\n").unwrap();
        fs::write(
            root.join("fasta/seq2.fasta"),
            ">long\nMKTAYIAKQRQISFVKSHFSRQ\n",
        )
        .unwrap();
        let script = if failing { "exit 3\n" } else { FAKE_IUPRED };
        fs::write(root.join("iupred3.sh"), script).unwrap();
        let config = root.join("hpcbatch.toml");
        fs::write(
            &config,
            format!(
                "[disorder]\npython = \"sh\"\niupred-script = \"{}\"\n",
                root.join("iupred3.sh").display()
            ),
        )
        .unwrap();
        (dir, config)
    }

    fn args(root: &Path) -> DisorderArgs {
        DisorderArgs {
            input_dir: Some(root.join("fasta")),
            output_dir: Some(root.join("iupred_results")),
            ..DisorderArgs::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn short_sequences_run_without_smoothing() {
        let (dir, config) = workspace(false);
        let (sender, _receiver) = ui_channel();

        run(args(dir.path()), &options_with(config, false), sender)
            .await
            .unwrap();

        let out = dir.path().join("iupred_results");
        assert_eq!(
            fs::read_to_string(out.join("seq1.csv")).unwrap(),
            "smoothing=no type=long\n"
        );
        assert_eq!(
            fs::read_to_string(out.join("seq2.csv")).unwrap(),
            "smoothing=medium type=long\n"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tool_failures_fail_the_command() {
        let (dir, config) = workspace(true);
        let (sender, _receiver) = ui_channel();

        let err = run(args(dir.path()), &options_with(config, false), sender)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Failed(msg) if msg.starts_with("2 of 2")));
        assert!(!dir.path().join("iupred_results/seq1.csv").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dry_run_writes_nothing() {
        let (dir, config) = workspace(false);
        let (sender, _receiver) = ui_channel();

        run(args(dir.path()), &options_with(config, true), sender)
            .await
            .unwrap();

        assert!(!dir.path().join("iupred_results").exists());
    }
}
