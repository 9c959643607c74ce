use crate::core::io::traits::RecordFile;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Residue letters kept by [`clean_sequence`].
const STANDARD_AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

pub const DEFAULT_FASTA_EXTENSIONS: [&str; 4] = ["fasta", "fa", "fas", "faa"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: sequence data appears before the first '>' header")]
    SequenceBeforeHeader { line: usize },
    #[error("No sequence line found")]
    NoSequence,
}

pub struct FastaFile;

impl RecordFile for FastaFile {
    type Records = Vec<FastaRecord>;
    type Error = FastaError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Records, Self::Error> {
        let mut records = Vec::new();
        let mut current: Option<FastaRecord> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('>') {
                if let Some(done) = current.take() {
                    records.push(done);
                }
                current = Some(FastaRecord {
                    header: header.trim().to_string(),
                    sequence: String::new(),
                });
            } else {
                match current.as_mut() {
                    Some(record) => record.sequence.push_str(line),
                    None => {
                        return Err(FastaError::SequenceBeforeHeader { line: line_num + 1 });
                    }
                }
            }
        }

        if let Some(done) = current {
            records.push(done);
        }
        Ok(records)
    }
}

/// Returns the length of the first sequence line, skipping header and blank lines.
///
/// Only the first line is measured, so a wrapped record reports its first
/// line's width. This is the quantity the smoothing rule is defined on.
pub fn first_sequence_length(reader: &mut impl BufRead) -> Result<usize, FastaError> {
    for line_res in reader.lines() {
        let line = line_res?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('>') {
            continue;
        }
        return Ok(line.trim_start().chars().count());
    }
    Err(FastaError::NoSequence)
}

pub fn first_sequence_length_from_path(path: &Path) -> Result<usize, FastaError> {
    let mut reader = BufReader::new(File::open(path)?);
    first_sequence_length(&mut reader)
}

/// Uppercases the sequence and drops everything but the twenty standard residues.
pub fn clean_sequence(sequence: &str) -> String {
    sequence
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| STANDARD_AMINO_ACIDS.contains(*c))
        .collect()
}

/// Case-insensitive extension check against a list given without leading dots.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|candidate| candidate.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn parse(content: &str) -> Result<Vec<FastaRecord>, FastaError> {
        FastaFile::read_from(&mut Cursor::new(content))
    }

    #[test]
    fn reads_multiline_and_multiple_records() {
        let records = parse(">seq1 first\nMKT\nAYI\n\n>seq2\nGGG\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, "seq1 first");
        assert_eq!(records[0].sequence, "MKTAYI");
        assert_eq!(records[1].header, "seq2");
        assert_eq!(records[1].len(), 3);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n").unwrap().is_empty());
    }

    #[test]
    fn sequence_before_header_is_rejected() {
        let err = parse("MKT\n>seq\nAAA\n").unwrap_err();
        assert!(matches!(err, FastaError::SequenceBeforeHeader { line: 1 }));
    }

    #[test]
    fn first_sequence_length_measures_first_line_only() {
        let mut reader = Cursor::new(">a\nMKTAYIAKQR\nQISFVK\n>b\nAA\n");
        assert_eq!(first_sequence_length(&mut reader).unwrap(), 10);
    }

    #[test]
    fn first_sequence_length_ignores_carriage_returns_and_blank_lines() {
        let mut reader = Cursor::new(">a\r\n\r\nMKTAY\r\n");
        assert_eq!(first_sequence_length(&mut reader).unwrap(), 5);
    }

    #[test]
    fn first_sequence_length_fails_without_sequence() {
        let mut reader = Cursor::new(">only a header\n");
        assert!(matches!(
            first_sequence_length(&mut reader),
            Err(FastaError::NoSequence)
        ));
    }

    #[test]
    fn clean_sequence_keeps_standard_residues() {
        assert_eq!(clean_sequence("mkt-x*ay i\n"), "MKTAYI");
        assert_eq!(clean_sequence("BJOUZ"), "");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let exts = DEFAULT_FASTA_EXTENSIONS;
        assert!(has_extension(&PathBuf::from("a/seq1.FASTA"), &exts));
        assert!(has_extension(&PathBuf::from("seq.fa"), &[".fa"]));
        assert!(!has_extension(&PathBuf::from("seq.txt"), &exts));
        assert!(!has_extension(&PathBuf::from("fasta"), &exts));
    }
}
