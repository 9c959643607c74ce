use std::path::PathBuf;
use thiserror::Error;

use super::runner::RunError;
use crate::core::io::fasta::FastaError;
use crate::core::models::pipeline::PipelineSpecError;
use crate::core::models::template::TemplateError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input not found: {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("Malformed input '{}': {message}", .path.display())]
    MalformedInput { path: PathBuf, message: String },

    #[error("Could not read FASTA '{}': {source}", .path.display())]
    Fasta {
        path: PathBuf,
        #[source]
        source: FastaError,
    },

    #[error("Failed to launch external program: {0}")]
    Launch(#[from] RunError),

    #[error("`{command}` {}", describe_status(.status))]
    ToolFailed {
        command: String,
        status: Option<i32>,
        stderr_tail: String,
    },

    #[error("Stage {index} '{stage}' failed: {source}")]
    StageFailed {
        index: usize,
        stage: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Stage '{stage}' did not produce its output '{}'", .path.display())]
    MissingOutput { stage: String, path: PathBuf },

    #[error("'{}' would write '{}', which another input also writes", .input.display(), .output.display())]
    OutputCollision { input: PathBuf, output: PathBuf },

    #[error("Array index {index} is outside the declared range '{range}'")]
    IndexOutOfRange { index: u32, range: String },

    #[error("Invalid path template: {0}")]
    Template(#[from] TemplateError),

    #[error("Invalid pipeline definition: {0}")]
    PipelineSpec(#[from] PipelineSpecError),

    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error for '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> EngineError {
        let path = path.into();
        move |source| EngineError::Io { path, source }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
