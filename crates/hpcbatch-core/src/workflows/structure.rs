use super::{execute, file_stem, list_files};
use crate::core::io::pdb::{PdbBFactors, mean_b_factor};
use crate::core::io::stride::{
    STRIDE_CODE_NAMES, STRIDE_CODES, SecondaryStructureCounts, StrideOutput,
};
use crate::core::io::traits::RecordFile;
use crate::engine::config::StructureAnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::CommandRunner;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const PDB_EXTENSIONS: [&str; 1] = ["pdb"];

/// Per-structure results; `None` marks a value that could not be determined.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureRow {
    pub protein_id: String,
    pub plddt: Option<f64>,
    pub secondary_structure: Option<SecondaryStructureCounts>,
}

/// Descriptive statistics of one output column over the rows where it is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    /// What the column measures, e.g. `alpha helix` for `H`.
    pub description: &'static str,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StructureReport {
    pub rows: Vec<StructureRow>,
    pub columns: Vec<ColumnSummary>,
}

/// Mean pLDDT and STRIDE secondary-structure counts for every PDB in a directory.
///
/// B-factor scans run in parallel; STRIDE runs one file at a time. A STRIDE
/// failure leaves that structure's counts empty. A program that cannot be
/// launched at all aborts the analysis.
#[instrument(skip_all, name = "structure_analysis")]
pub fn run(
    config: &StructureAnalysisConfig,
    runner: &dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Result<StructureReport, EngineError> {
    let pdbs = list_files(&config.pdb_dir, &PDB_EXTENSIONS)?;
    info!(
        "Found {} PDB file(s) to process in '{}'.",
        pdbs.len(),
        config.pdb_dir.display()
    );

    reporter.phase("pLDDT");
    let plddts: Vec<Option<f64>> = pdbs.par_iter().map(|p| mean_plddt(p)).collect();
    reporter.report(Progress::PhaseFinish);

    reporter.phase("STRIDE");
    reporter.report(Progress::TaskStart {
        total: pdbs.len() as u64,
    });
    let mut rows = Vec::with_capacity(pdbs.len());
    for (pdb, plddt) in pdbs.iter().zip(plddts) {
        let secondary_structure = secondary_structure(config, runner, pdb)?;
        rows.push(StructureRow {
            protein_id: file_stem(pdb),
            plddt,
            secondary_structure,
        });
        reporter.report(Progress::TaskIncrement { amount: 1 });
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    write_rows(&config.output_file, &rows)?;
    let columns = summarize_columns(&rows);
    info!(
        "Results for {} structure(s) saved to '{}'.",
        rows.len(),
        config.output_file.display()
    );
    Ok(StructureReport { rows, columns })
}

fn mean_plddt(pdb: &Path) -> Option<f64> {
    match PdbBFactors::read_from_path(pdb) {
        Ok(b_factors) => {
            let mean = mean_b_factor(&b_factors);
            if mean.is_none() {
                warn!("No B-factors found in '{}'.", pdb.display());
            }
            mean
        }
        Err(e) => {
            warn!("Error processing '{}': {}", pdb.display(), e);
            None
        }
    }
}

fn secondary_structure(
    config: &StructureAnalysisConfig,
    runner: &dyn CommandRunner,
    pdb: &Path,
) -> Result<Option<SecondaryStructureCounts>, EngineError> {
    match execute(runner, &config.stride_command(pdb)) {
        Ok(_) if runner.is_dry_run() => Ok(None),
        Ok(outcome) => {
            let counts = StrideOutput::parse_str(&outcome.stdout);
            match counts.dominant() {
                Some((code, name)) => debug!(
                    "'{}': {} residue(s) assigned, mostly {} ({}).",
                    pdb.display(),
                    counts.total(),
                    name,
                    code
                ),
                None => warn!("STRIDE assigned no residues in '{}'.", pdb.display()),
            }
            Ok(Some(counts))
        }
        Err(EngineError::Launch(e)) => Err(EngineError::Launch(e)),
        Err(e) => {
            warn!("STRIDE error for '{}': {}", pdb.display(), e);
            Ok(None)
        }
    }
}

fn header() -> Vec<String> {
    ["protein_id", "pLDDT"]
        .into_iter()
        .map(str::to_string)
        .chain(STRIDE_CODES.iter().map(|c| c.to_string()))
        .collect()
}

fn write_rows(path: &Path, rows: &[StructureRow]) -> Result<(), EngineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(EngineError::io(parent))?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header())?;
    for row in rows {
        let mut record = vec![
            row.protein_id.clone(),
            row.plddt.map(|v| v.to_string()).unwrap_or_default(),
        ];
        for code in STRIDE_CODES {
            record.push(
                row.secondary_structure
                    .and_then(|counts| counts.get(code))
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }
    writer.flush().map_err(EngineError::io(PathBuf::from(path)))?;
    Ok(())
}

/// Count, mean, min and max of `pLDDT` and each STRIDE column.
pub fn summarize_columns(rows: &[StructureRow]) -> Vec<ColumnSummary> {
    let mut columns = Vec::with_capacity(1 + STRIDE_CODES.len());
    let plddt: Vec<f64> = rows.iter().filter_map(|r| r.plddt).collect();
    columns.extend(describe("pLDDT", "mean B-factor", &plddt));
    for code in STRIDE_CODES {
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.secondary_structure.and_then(|c| c.get(code)))
            .map(|n| n as f64)
            .collect();
        let description = STRIDE_CODE_NAMES.get(&code).copied().unwrap_or_default();
        columns.extend(describe(&code.to_string(), description, &values));
    }
    columns
}

fn describe(name: &str, description: &'static str, values: &[f64]) -> Option<ColumnSummary> {
    if values.is_empty() {
        return None;
    }
    Some(ColumnSummary {
        name: name.to_string(),
        description,
        count: values.len(),
        mean: values.iter().sum::<f64>() / values.len() as f64,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}
