use crate::core::io::traits::RecordFile;
use phf::phf_map;
use std::io::{self, BufRead};

/// Secondary-structure codes reported by STRIDE, in output column order.
pub const STRIDE_CODES: [char; 8] = ['H', 'G', 'I', 'E', 'B', 'T', 'C', 'S'];

pub static STRIDE_CODE_NAMES: phf::Map<char, &'static str> = phf_map! {
    'H' => "alpha helix",
    'G' => "3-10 helix",
    'I' => "pi helix",
    'E' => "extended strand",
    'B' => "isolated bridge",
    'T' => "turn",
    'C' => "coil",
    'S' => "bend",
};

/// Zero-based column of the one-letter code on an `ASG` line.
const ASG_CODE_COLUMN: usize = 24;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondaryStructureCounts {
    counts: [usize; STRIDE_CODES.len()],
}

impl SecondaryStructureCounts {
    pub fn get(&self, code: char) -> Option<usize> {
        STRIDE_CODES
            .iter()
            .position(|&c| c == code)
            .map(|i| self.counts[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        STRIDE_CODES.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// The most frequent assignment and its name; ties go to the earlier column.
    pub fn dominant(&self) -> Option<(char, &'static str)> {
        let mut best: Option<(char, usize)> = None;
        for (code, count) in self.iter() {
            if count > 0 && best.is_none_or(|(_, top)| count > top) {
                best = Some((code, count));
            }
        }
        let (code, _) = best?;
        STRIDE_CODE_NAMES.get(&code).map(|name| (code, *name))
    }

    fn record(&mut self, code: char) {
        if let Some(i) = STRIDE_CODES.iter().position(|&c| c == code) {
            self.counts[i] += 1;
        }
    }
}

/// Counts residue assignments in STRIDE text output.
///
/// Only `ASG` lines are considered; codes outside [`STRIDE_CODES`] are ignored.
pub struct StrideOutput;

impl StrideOutput {
    pub fn parse_str(output: &str) -> SecondaryStructureCounts {
        let mut counts = SecondaryStructureCounts::default();
        for line in output.lines() {
            count_line(line, &mut counts);
        }
        counts
    }
}

impl RecordFile for StrideOutput {
    type Records = SecondaryStructureCounts;
    type Error = io::Error;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Records, Self::Error> {
        let mut counts = SecondaryStructureCounts::default();
        for line_res in reader.lines() {
            count_line(&line_res?, &mut counts);
        }
        Ok(counts)
    }
}

fn count_line(line: &str, counts: &mut SecondaryStructureCounts) {
    if !line.starts_with("ASG") {
        return;
    }
    if let Some(code) = line.chars().nth(ASG_CODE_COLUMN) {
        counts.record(code);
    }
}
