use super::{file_stem, list_files};
use crate::core::io::iupred::{DisorderSummary, IupredFile, summarize};
use crate::core::io::traits::RecordFile;
use crate::engine::config::AggregateConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct DisorderRow {
    pub filename: String,
    pub summary: DisorderSummary,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AggregateReport {
    pub rows: Vec<DisorderRow>,
    pub skipped: Vec<PathBuf>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    filename: &'a str,
    median_disorder: f64,
    fraction_disordered: f64,
}

/// Summarises every IUPred3 result table in a directory into one CSV.
///
/// Tables are parsed in parallel on the global rayon pool. Tables that cannot
/// be read or hold no scores are skipped with a warning.
#[instrument(skip_all, name = "aggregate")]
pub fn run(
    config: &AggregateConfig,
    reporter: &ProgressReporter,
) -> Result<AggregateReport, EngineError> {
    let output = std::path::absolute(&config.output_file).ok();
    let inputs: Vec<PathBuf> = list_files(&config.input_dir, &[&config.result_extension])?
        .into_iter()
        .filter(|p| std::path::absolute(p).ok() != output)
        .collect();
    info!(
        "Aggregating {} result table(s) from '{}'.",
        inputs.len(),
        config.input_dir.display()
    );

    reporter.phase("Disorder aggregation");
    reporter.report(Progress::TaskStart {
        total: inputs.len() as u64,
    });
    let summaries: Vec<(PathBuf, Option<DisorderSummary>)> = inputs
        .into_par_iter()
        .map(|path| {
            let summary = summarize_table(&path);
            reporter.report(Progress::TaskIncrement { amount: 1 });
            (path, summary)
        })
        .collect();
    reporter.report(Progress::TaskFinish);

    let mut report = AggregateReport::default();
    for (path, summary) in summaries {
        match summary {
            Some(summary) => report.rows.push(DisorderRow {
                filename: file_stem(&path),
                summary,
            }),
            None => report.skipped.push(path),
        }
    }
    report.rows.sort_by(|a, b| a.filename.cmp(&b.filename));

    write_summary(&config.output_file, &report.rows)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        "Summary of {} file(s) saved to '{}' ({} skipped).",
        report.rows.len(),
        config.output_file.display(),
        report.skipped.len()
    );
    Ok(report)
}

fn summarize_table(path: &Path) -> Option<DisorderSummary> {
    match IupredFile::read_from_path(path) {
        Ok(scores) => {
            let summary = summarize(&scores);
            if summary.is_none() {
                warn!("'{}' contains no scores; skipping.", path.display());
            }
            summary
        }
        Err(e) => {
            warn!("Error processing '{}': {}", path.display(), e);
            None
        }
    }
}

fn write_summary(path: &Path, rows: &[DisorderRow]) -> Result<(), EngineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(EngineError::io(parent))?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(["filename", "median_disorder", "fraction_disordered"])?;
    }
    for row in rows {
        writer.serialize(CsvRow {
            filename: &row.filename,
            median_disorder: row.summary.median_disorder,
            fraction_disordered: row.summary.fraction_disordered,
        })?;
    }
    writer.flush().map_err(EngineError::io(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::AggregateConfigBuilder;
    use std::fs;

    const TABLE_A: &str = "# IUPred3\n1\tM\t0.9\n2\tK\t0.6\n3\tT\t0.2\n";
    const TABLE_B: &str = "1\tM\t0.1\n2\tK\t0.2\n3\tT\t0.3\n4\tA\t0.8\n";

    #[test]
    fn summarises_each_table_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("iupred_results");
        fs::create_dir(&results).unwrap();
        fs::write(results.join("b.csv"), TABLE_B).unwrap();
        fs::write(results.join("a.csv"), TABLE_A).unwrap();
        fs::write(results.join("empty.csv"), "# nothing\n").unwrap();
        fs::write(results.join("broken.csv"), "1\tM\tnot-a-number\n").unwrap();
        let output = dir.path().join("summary.csv");
        let config = AggregateConfigBuilder::new()
            .input_dir(results)
            .output_file(output.clone())
            .build()
            .unwrap();

        let report = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.rows[0].filename, "a");
        assert!((report.rows[0].summary.median_disorder - 0.6).abs() < 1e-12);
        assert!((report.rows[0].summary.fraction_disordered - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.rows[1].summary.median_disorder - 0.25).abs() < 1e-12);
        assert!((report.rows[1].summary.fraction_disordered - 0.25).abs() < 1e-12);

        let written = fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "filename,median_disorder,fraction_disordered");
        assert_eq!(lines[2], "b,0.25,0.25");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn output_inside_input_directory_is_not_read_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), TABLE_A).unwrap();
        let output = dir.path().join("summary.csv");
        fs::write(&output, "filename,median_disorder,fraction_disordered\n").unwrap();
        let config = AggregateConfigBuilder::new()
            .input_dir(dir.path().to_path_buf())
            .output_file(output)
            .build()
            .unwrap();

        let report = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(report.rows.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn empty_directory_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("summary.csv");
        let config = AggregateConfigBuilder::new()
            .input_dir(dir.path().to_path_buf())
            .output_file(output.clone())
            .build()
            .unwrap();
        run(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "filename,median_disorder,fraction_disordered\n"
        );
    }
}
