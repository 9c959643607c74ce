use crate::core::io::traits::RecordFile;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: invalid B-factor '{value}' in columns 61-66")]
    InvalidBFactor { line: usize, value: String },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

/// Collects the B-factor column of every ATOM/HETATM record across all models.
///
/// Structure predictors store per-residue confidence (pLDDT) in this column.
/// Records too short to carry the column are skipped.
pub struct PdbBFactors;

impl RecordFile for PdbBFactors {
    type Records = Vec<f64>;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Records, Self::Error> {
        let mut b_factors = Vec::new();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let record_type = slice_and_trim(&line, 0, 6);
            if record_type != "ATOM" && record_type != "HETATM" {
                continue;
            }

            let value = slice_and_trim(&line, 60, 66);
            if value.is_empty() {
                continue;
            }
            let b_factor = value.parse::<f64>().map_err(|_| PdbError::InvalidBFactor {
                line: line_num + 1,
                value: value.to_string(),
            })?;
            b_factors.push(b_factor);
        }
        Ok(b_factors)
    }
}

/// Mean of all B-factors, `None` when the structure has no atoms.
pub fn mean_b_factor(b_factors: &[f64]) -> Option<f64> {
    if b_factors.is_empty() {
        None
    } else {
        Some(b_factors.iter().sum::<f64>() / b_factors.len() as f64)
    }
}
