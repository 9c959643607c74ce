use hpcbatch::core::io::fasta::DEFAULT_FASTA_EXTENSIONS;
use hpcbatch::core::tools::stride::DEFAULT_STRIDE_EXECUTABLE;
use hpcbatch::engine::config::{DEFAULT_OUTPUT_EXTENSION, DEFAULT_PYTHON};
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Built-in values used when neither the command line, `--set` nor the config file provides one.
pub struct DefaultsConfig {
    pub disorder_input_dir: PathBuf,
    pub disorder_output_dir: PathBuf,
    pub python: String,
    pub output_extension: String,
    pub fasta_extensions: Vec<String>,
    pub array_input_dir: PathBuf,
    pub array_input_prefix: String,
    pub array_input_extension: String,
    pub array_output_dir: PathBuf,
    pub pipeline_workdir: PathBuf,
    pub model_seeds: Vec<u32>,
    pub analysis_output_file: PathBuf,
    pub stride_executable: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            disorder_input_dir: PathBuf::from("fasta"),
            disorder_output_dir: PathBuf::from("iupred_results"),
            python: DEFAULT_PYTHON.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            fasta_extensions: DEFAULT_FASTA_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            array_input_dir: PathBuf::from("fasta"),
            array_input_prefix: "seq_".to_string(),
            array_input_extension: "fa".to_string(),
            array_output_dir: PathBuf::from("results"),
            pipeline_workdir: PathBuf::from("."),
            model_seeds: vec![1],
            analysis_output_file: PathBuf::from("structure_analysis_results.csv"),
            stride_executable: DEFAULT_STRIDE_EXECUTABLE.to_string(),
        }
    }
}

/// `<config dir>/hpcbatch/config.toml` for the current user, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hpcbatch")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
