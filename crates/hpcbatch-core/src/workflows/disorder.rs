use super::{execute, file_stem, list_files};
use crate::core::io::fasta::{FastaError, first_sequence_length_from_path};
use crate::core::tools::iupred::SmoothingMode;
use crate::engine::config::DisorderSweepConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::{CommandRunner, RunError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// What happened to one input file of a sweep.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<SmoothingMode, EngineError>,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub files: Vec<FileOutcome>,
}

impl SweepReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.files.iter().all(|f| f.result.is_ok())
    }
}

/// Runs IUPred3 once per FASTA file in the input directory.
///
/// Each file is an independent unit of work: a malformed file or a failed
/// invocation is recorded in the report and the sweep moves on. Output left
/// behind by a failed invocation is removed; nothing is removed for inputs
/// that never reached the tool. Inputs whose output names coincide (`a.fa`
/// and `a.fasta`) all fail without running.
#[instrument(skip_all, name = "disorder_sweep")]
pub fn run(
    config: &DisorderSweepConfig,
    runner: &dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Result<SweepReport, EngineError> {
    let inputs = list_files(&config.input_dir, &config.fasta_extensions)?;
    info!(
        "Found {} FASTA file(s) in '{}'.",
        inputs.len(),
        config.input_dir.display()
    );
    if inputs.is_empty() {
        warn!(
            "No files with extensions [{}] found; nothing to do.",
            config.fasta_extensions.join(", ")
        );
    }

    if !runner.is_dry_run() {
        std::fs::create_dir_all(&config.output_dir)
            .map_err(EngineError::io(&config.output_dir))?;
    }

    reporter.phase("Disorder prediction");
    reporter.report(Progress::TaskStart {
        total: inputs.len() as u64,
    });

    let planned: Vec<(PathBuf, PathBuf)> = inputs
        .into_iter()
        .map(|input| {
            let output = config
                .output_dir
                .join(format!("{}.{}", file_stem(&input), config.output_extension));
            (input, output)
        })
        .collect();
    let mut targets: HashMap<&Path, usize> = HashMap::new();
    for (_, output) in &planned {
        *targets.entry(output.as_path()).or_default() += 1;
    }
    let colliding: HashSet<PathBuf> = targets
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(output, _)| output.to_path_buf())
        .collect();

    let mut report = SweepReport::default();
    for (input, output) in planned {
        reporter.report(Progress::StatusUpdate {
            text: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        });

        let result = if colliding.contains(&output) {
            Err(EngineError::OutputCollision {
                input: input.clone(),
                output: output.clone(),
            })
        } else {
            predict_one(config, runner, &input, &output)
        };
        match &result {
            Ok(smoothing) => info!(
                "{} -> {} (smoothing: {})",
                input.display(),
                output.display(),
                smoothing
            ),
            Err(e) => warn!("Failed to process '{}': {}", input.display(), e),
        }
        report.files.push(FileOutcome {
            input,
            output,
            result,
        });
        reporter.report(Progress::TaskIncrement { amount: 1 });
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(
        "Disorder sweep finished: {} succeeded, {} failed.",
        report.succeeded().count(),
        report.failed().count()
    );
    Ok(report)
}

fn predict_one(
    config: &DisorderSweepConfig,
    runner: &dyn CommandRunner,
    input: &Path,
    output: &Path,
) -> Result<SmoothingMode, EngineError> {
    let length = first_sequence_length_from_path(input).map_err(|source| match source {
        FastaError::NoSequence => EngineError::MalformedInput {
            path: input.to_path_buf(),
            message: "no sequence line found".to_string(),
        },
        source => EngineError::Fasta {
            path: input.to_path_buf(),
            source,
        },
    })?;
    let smoothing = SmoothingMode::for_sequence_length(length, config.smoothing);
    if smoothing != config.smoothing {
        info!(
            "'{}' has a first sequence of {} residues; using smoothing '{}'.",
            input.display(),
            length,
            smoothing
        );
    }

    if let Err(e) = execute(runner, &config.command(input, smoothing, output)) {
        if !runner.is_dry_run() && output_was_opened(&e) {
            discard_partial_output(output);
        }
        return Err(e);
    }
    Ok(smoothing)
}

/// Whether the failed invocation got as far as truncating its stdout file.
fn output_was_opened(error: &EngineError) -> bool {
    !matches!(error, EngineError::Launch(RunError::Redirect { .. }))
}

fn discard_partial_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => info!("Removed partial output '{}'.", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove '{}': {}", output.display(), e),
    }
}
