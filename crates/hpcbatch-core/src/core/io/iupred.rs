use crate::core::io::traits::RecordFile;
use std::io::{self, BufRead};
use thiserror::Error;

/// Residues scoring at or above this value count as disordered.
pub const DISORDER_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisorderScore {
    pub position: usize,
    pub residue: char,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisorderSummary {
    pub median_disorder: f64,
    pub fraction_disordered: f64,
}

#[derive(Debug, Error)]
pub enum IupredError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: u64, message: String },
}

/// Reader for IUPred3 result tables: tab separated, `#` comments,
/// columns position / residue / score. Additional columns (ANCHOR2) are ignored.
pub struct IupredFile;

impl RecordFile for IupredFile {
    type Records = Vec<DisorderScore>;
    type Error = IupredError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Records, Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut scores = Vec::new();
        for record_res in csv_reader.records() {
            let record = record_res?;
            let line = record.position().map_or(0, |p| p.line());
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            if record.len() < 3 {
                return Err(IupredError::Parse {
                    line,
                    message: format!("expected at least 3 columns, found {}", record.len()),
                });
            }

            let position = record[0].parse::<usize>().map_err(|_| IupredError::Parse {
                line,
                message: format!("invalid position '{}'", &record[0]),
            })?;
            let residue = record[1].chars().next().ok_or_else(|| IupredError::Parse {
                line,
                message: "empty residue column".to_string(),
            })?;
            let score = record[2].parse::<f64>().map_err(|_| IupredError::Parse {
                line,
                message: format!("invalid score '{}'", &record[2]),
            })?;

            scores.push(DisorderScore {
                position,
                residue,
                score,
            });
        }
        Ok(scores)
    }
}

/// Median score and fraction of residues at or above [`DISORDER_THRESHOLD`].
///
/// Returns `None` for an empty table.
pub fn summarize(scores: &[DisorderScore]) -> Option<DisorderSummary> {
    if scores.is_empty() {
        return None;
    }

    let mut values: Vec<f64> = scores.iter().map(|s| s.score).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    let median_disorder = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };

    let disordered = values.iter().filter(|&&v| v >= DISORDER_THRESHOLD).count();
    Some(DisorderSummary {
        median_disorder,
        fraction_disordered: disordered as f64 / values.len() as f64,
    })
}
