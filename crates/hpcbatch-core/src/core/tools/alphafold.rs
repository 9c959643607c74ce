use crate::core::models::command::ToolCommand;
use std::path::{Path, PathBuf};

pub const DEFAULT_AF3_SCRIPT: &str = "run_alphafold.py";

/// AlphaFold3 flags use absl's `--name=value` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaFoldParams {
    pub python: String,
    pub script: PathBuf,
    pub model_dir: PathBuf,
    pub db_dir: Option<PathBuf>,
    pub run_data_pipeline: bool,
}

impl AlphaFoldParams {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            python: "python3".to_string(),
            script: PathBuf::from(DEFAULT_AF3_SCRIPT),
            model_dir: model_dir.into(),
            db_dir: None,
            run_data_pipeline: true,
        }
    }

    pub fn command(&self, json_path: &Path, output_dir: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.python)
            .path_arg(&self.script)
            .flag_eq("--json_path", json_path.display())
            .flag_eq("--model_dir", self.model_dir.display())
            .flag_eq("--output_dir", output_dir.display());
        if let Some(db_dir) = &self.db_dir {
            cmd = cmd.flag_eq("--db_dir", db_dir.display());
        }
        if !self.run_data_pipeline {
            cmd = cmd.arg("--norun_data_pipeline");
        }
        cmd
    }
}
