use super::reporter;
use crate::cli::AnalyzeArgs;
use crate::config::{self, GlobalOptions};
use crate::error::Result;
use crate::ui::UiEvent;
use hpcbatch::workflows;
use hpcbatch::workflows::structure::ColumnSummary;
use tokio::sync::mpsc;

pub async fn run(
    args: AnalyzeArgs,
    options: &GlobalOptions,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let analysis_config = config::build_analysis_config(&args, &file_config)?;
    let runner = options.runner();
    let reporter = reporter(&ui_sender);

    let report = tokio::task::block_in_place(|| {
        workflows::structure::run(&analysis_config, runner.as_ref(), &reporter)
    })?;

    println!(
        "Results for {} structure(s) saved to '{}'.",
        report.rows.len(),
        analysis_config.output_file.display()
    );
    if !report.columns.is_empty() {
        println!("{}", format_summary(&report.columns));
    }
    Ok(())
}

fn format_summary(columns: &[ColumnSummary]) -> String {
    let mut out = format!(
        "{:<8} {:>6} {:>10} {:>10} {:>10}  {}",
        "column", "count", "mean", "min", "max", "description"
    );
    for c in columns {
        out.push_str(&format!(
            "\n{:<8} {:>6} {:>10.2} {:>10.2} {:>10.2}  {}",
            c.name, c.count, c.mean, c.min, c.max, c.description
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{options_with, ui_channel};
    use std::fs;

    #[test]
    fn summary_table_has_one_row_per_column() {
        let columns = vec![ColumnSummary {
            name: "pLDDT".to_string(),
            description: "mean B-factor",
            count: 2,
            mean: 85.0,
            min: 80.0,
            max: 90.0,
        }];
        let text = format_summary(&columns);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("pLDDT"));
        assert!(lines[1].contains("85.00"));
        assert!(lines[1].ends_with("mean B-factor"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dry_run_still_reports_plddt() {
        let dir = tempfile::tempdir().unwrap();
        let pdb_dir = dir.path().join("pdb");
        fs::create_dir(&pdb_dir).unwrap();
        fs::write(
            pdb_dir.join("p1.pdb"),
            "ATOM      1  CA  MET A   1      11.104  13.207   2.100  1.00 75.00           C\nEND\n",
        )
        .unwrap();
        let config = dir.path().join("hpcbatch.toml");
        fs::write(&config, "").unwrap();
        let output = dir.path().join("analysis.csv");
        let (sender, _receiver) = ui_channel();

        let args = AnalyzeArgs {
            pdb_dir: Some(pdb_dir),
            output: Some(output.clone()),
            stride: None,
        };
        run(args, &options_with(config, true), sender).await.unwrap();

        let csv = fs::read_to_string(output).unwrap();
        assert_eq!(csv.lines().nth(1), Some("p1,75,,,,,,,,"));
    }
}
