use super::reporter;
use crate::cli::ConvertArgs;
use crate::config::{self, GlobalOptions};
use crate::error::Result;
use crate::ui::UiEvent;
use hpcbatch::workflows;
use tokio::sync::mpsc;
use tracing::warn;

pub async fn run(
    args: ConvertArgs,
    options: &GlobalOptions,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let convert_config = config::build_convert_config(&args, &file_config)?;
    let reporter = reporter(&ui_sender);

    let report = tokio::task::block_in_place(|| {
        workflows::convert::run(&convert_config, &reporter)
    })?;

    for skipped in &report.skipped {
        warn!("Skipped '{}': no sequences.", skipped.display());
    }
    println!(
        "Created {} JSON file(s) in '{}'.",
        report.documents.len(),
        convert_config.output_dir.display()
    );
    println!(
        "Total jobs ({}) written to '{}'.",
        report.documents.len(),
        report.total_jobs_file.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{options_with, ui_channel};
    use std::fs;

    #[tokio::test(flavor = "multi_thread")]
    async fn split_directory_into_per_sequence_documents() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("fasta");
        fs::create_dir(&fasta).unwrap();
        fs::write(fasta.join("a.fasta"), ">one\nMKT\n>two\nGSA\n").unwrap();
        let config = dir.path().join("hpcbatch.toml");
        fs::write(&config, "[convert]\nsplit = true\n").unwrap();
        let (sender, _receiver) = ui_channel();

        let args = ConvertArgs {
            input: Some(fasta),
            output: Some(dir.path().join("json")),
            ..ConvertArgs::default()
        };
        run(args, &options_with(config, false), sender).await.unwrap();

        assert!(dir.path().join("json/a_001_one.json").is_file());
        assert!(dir.path().join("json/a_002_two.json").is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("total_jobs.txt")).unwrap(),
            "2"
        );
    }
}
