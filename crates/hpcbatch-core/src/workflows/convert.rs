use super::{file_stem, list_files};
use crate::core::io::af3::Af3Input;
use crate::core::io::fasta::{FastaError, FastaFile, FastaRecord, has_extension};
use crate::core::io::traits::RecordFile;
use crate::engine::config::ConvertConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Written next to the output directory; the array script reads it to size its range.
pub const TOTAL_JOBS_FILE: &str = "total_jobs.txt";
const MAX_HEADER_CHARS: usize = 50;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub documents: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub total_jobs_file: PathBuf,
}

/// Converts FASTA input into AlphaFold3 JSON documents.
///
/// Files without records, or with sequence data before the first header, are
/// skipped with a warning; the job count covers the documents actually written.
#[instrument(skip_all, name = "convert")]
pub fn run(config: &ConvertConfig, reporter: &ProgressReporter) -> Result<ConvertReport, EngineError> {
    let inputs = collect_inputs(config)?;
    std::fs::create_dir_all(&config.output_dir).map_err(EngineError::io(&config.output_dir))?;

    reporter.phase("FASTA conversion");
    reporter.report(Progress::TaskStart {
        total: inputs.len() as u64,
    });

    let mut report = ConvertReport::default();
    for input in inputs {
        let records = match FastaFile::read_from_path(&input) {
            Ok(records) => records,
            Err(source @ FastaError::Io(_)) => {
                return Err(EngineError::Fasta {
                    path: input.clone(),
                    source,
                });
            }
            Err(e) => {
                warn!("Skipping '{}': {}", input.display(), e);
                report.skipped.push(input);
                reporter.report(Progress::TaskIncrement { amount: 1 });
                continue;
            }
        };
        if records.is_empty() {
            warn!("No sequences found in '{}'; skipping.", input.display());
            report.skipped.push(input);
            reporter.report(Progress::TaskIncrement { amount: 1 });
            continue;
        }

        for (name, input_doc) in documents_for(&input, &records, config) {
            let path = config.output_dir.join(format!("{name}.json"));
            input_doc
                .write_to_path(&path)
                .map_err(|source| EngineError::Json {
                    path: path.clone(),
                    source,
                })?;
            debug!(
                "Created '{}' with chains [{}].",
                path.display(),
                input_doc.chain_ids().join(", ")
            );
            report.documents.push(path);
        }
        reporter.report(Progress::TaskIncrement { amount: 1 });
    }
    reporter.report(Progress::TaskFinish);

    report.total_jobs_file = config.output_dir.join("..").join(TOTAL_JOBS_FILE);
    std::fs::write(&report.total_jobs_file, report.documents.len().to_string())
        .map_err(EngineError::io(&report.total_jobs_file))?;
    reporter.report(Progress::PhaseFinish);

    info!(
        "Created {} JSON file(s) in '{}'; job count written to '{}'.",
        report.documents.len(),
        config.output_dir.display(),
        report.total_jobs_file.display()
    );
    Ok(report)
}

fn collect_inputs(config: &ConvertConfig) -> Result<Vec<PathBuf>, EngineError> {
    let input = &config.input;
    if input.is_dir() {
        return list_files(input, &config.fasta_extensions);
    }
    if !input.is_file() {
        return Err(EngineError::MissingInput {
            path: input.clone(),
        });
    }
    if !has_extension(input, &config.fasta_extensions) {
        return Err(EngineError::MalformedInput {
            path: input.clone(),
            message: format!(
                "not a recognised FASTA extension (expected one of: {})",
                config.fasta_extensions.join(", ")
            ),
        });
    }
    Ok(vec![input.clone()])
}

fn documents_for(
    input: &Path,
    records: &[FastaRecord],
    config: &ConvertConfig,
) -> Vec<(String, Af3Input)> {
    let stem = file_stem(input);
    if !config.split {
        return vec![(
            stem.clone(),
            Af3Input::from_records(&stem, records, &config.model_seeds),
        )];
    }
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let name = split_job_name(&stem, i, &record.header);
            let doc = Af3Input::from_records(&name, std::slice::from_ref(record), &config.model_seeds);
            (name, doc)
        })
        .collect()
}

/// `<stem>_<NNN>_<header>` with a 1-based counter and a filesystem-safe header.
pub fn split_job_name(stem: &str, index: usize, header: &str) -> String {
    let header: String = header
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_HEADER_CHARS)
        .collect();
    format!("{}_{:03}_{}", stem, index + 1, header)
}
