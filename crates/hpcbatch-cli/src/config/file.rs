use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk configuration; every key is optional and merged under the command line.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub job: Option<FileJobConfig>,
    pub container: Option<FileContainerConfig>,
    pub disorder: Option<FileDisorderConfig>,
    pub array: Option<FileArrayConfig>,
    pub pipeline: Option<FilePipelineConfig>,
    pub convert: Option<FileConvertConfig>,
    pub aggregate: Option<FileAggregateConfig>,
    pub analysis: Option<FileAnalysisConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileJobConfig {
    pub job_name: Option<String>,
    pub partition: Option<String>,
    pub nodes: Option<u32>,
    pub ntasks: Option<u32>,
    pub cpus_per_task: Option<u32>,
    pub memory: Option<String>,
    pub time: Option<String>,
    pub gpus: Option<u32>,
    pub array: Option<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub modules: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileContainerConfig {
    pub image: Option<PathBuf>,
    pub runtime: Option<String>,
    pub binds: Option<Vec<String>>,
    pub gpu: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDisorderConfig {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub iupred_script: Option<PathBuf>,
    pub python: Option<String>,
    pub smoothing: Option<String>,
    pub analysis_type: Option<String>,
    pub output_extension: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub container: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileArrayConfig {
    pub tool: Option<String>,
    pub input_dir: Option<PathBuf>,
    pub input_prefix: Option<String>,
    pub input_extension: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub range: Option<String>,
    pub container: Option<bool>,
    pub esmfold: Option<FileEsmFoldConfig>,
    pub alphafold: Option<FileAlphaFoldConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEsmFoldConfig {
    pub executable: Option<String>,
    pub max_tokens_per_batch: Option<u32>,
    pub num_recycles: Option<u32>,
    pub chunk_size: Option<u32>,
    pub cpu_only: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAlphaFoldConfig {
    pub python: Option<String>,
    pub script: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
    pub db_dir: Option<PathBuf>,
    pub run_data_pipeline: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePipelineConfig {
    pub input: Option<PathBuf>,
    pub workdir: Option<PathBuf>,
    pub definition: Option<PathBuf>,
    pub mdp_dir: Option<PathBuf>,
    pub gmx: Option<String>,
    pub force_field: Option<String>,
    pub water_model: Option<String>,
    pub best_effort: Option<bool>,
    pub container: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConvertConfig {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub split: Option<bool>,
    pub model_seeds: Option<Vec<u32>>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAggregateConfig {
    pub input_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAnalysisConfig {
    pub pdb_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub stride: Option<String>,
    pub container: Option<bool>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CliError::FileParsing { source, .. } => CliError::FileParsing {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::FileParsing {
            path: PathBuf::from("<inline>"),
            source: e.into(),
        })
    }
}

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path;
    };
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path,
    }
}
