use super::UnknownVariant;
use crate::core::models::command::ToolCommand;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Sequences shorter than this many residues are scored without smoothing.
pub const SHORT_SEQUENCE_THRESHOLD: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMode {
    No,
    #[default]
    Medium,
    Strong,
}

impl SmoothingMode {
    /// Smoothing to use for a sequence of `length` residues.
    ///
    /// Short sequences always get [`SmoothingMode::No`]; everything else gets
    /// the configured mode.
    pub fn for_sequence_length(length: usize, configured: SmoothingMode) -> SmoothingMode {
        if length < SHORT_SEQUENCE_THRESHOLD {
            SmoothingMode::No
        } else {
            configured
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingMode::No => "no",
            SmoothingMode::Medium => "medium",
            SmoothingMode::Strong => "strong",
        }
    }
}

impl fmt::Display for SmoothingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no" | "none" => Ok(SmoothingMode::No),
            "medium" => Ok(SmoothingMode::Medium),
            "strong" => Ok(SmoothingMode::Strong),
            _ => Err(UnknownVariant {
                kind: "smoothing mode",
                value: s.to_string(),
                expected: "no, medium, strong",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisType {
    #[default]
    Long,
    Short,
    Glob,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Long => "long",
            AnalysisType::Short => "short",
            AnalysisType::Glob => "glob",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(AnalysisType::Long),
            "short" => Ok(AnalysisType::Short),
            "glob" => Ok(AnalysisType::Glob),
            _ => Err(UnknownVariant {
                kind: "IUPred analysis type",
                value: s.to_string(),
                expected: "long, short, glob",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IupredParams {
    pub python: String,
    pub script: PathBuf,
    pub analysis_type: AnalysisType,
}

impl IupredParams {
    /// `<python> <iupred3.py> -s <smoothing> <fasta> <type> > <output>`
    pub fn command(&self, fasta: &Path, smoothing: SmoothingMode, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.python)
            .path_arg(&self.script)
            .flag("-s", smoothing)
            .path_arg(fasta)
            .arg(self.analysis_type.as_str())
            .stdout_to(output)
    }
}
