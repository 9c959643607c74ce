use crate::core::io::fasta::DEFAULT_FASTA_EXTENSIONS;
use crate::core::models::command::ToolCommand;
use crate::core::models::container::ContainerSpec;
use crate::core::models::job::ArrayRange;
use crate::core::models::pipeline::PipelineSpec;
use crate::core::models::template::PathTemplate;
use crate::core::tools::alphafold::AlphaFoldParams;
use crate::core::tools::esmfold::EsmFoldParams;
use crate::core::tools::iupred::{AnalysisType, IupredParams, SmoothingMode};
use crate::core::tools::stride::StrideParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OUTPUT_EXTENSION: &str = "csv";
pub const DEFAULT_PYTHON: &str = "python3";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn default_extensions() -> Vec<String> {
    DEFAULT_FASTA_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn wrap_in(container: Option<&ContainerSpec>, command: ToolCommand) -> ToolCommand {
    match container {
        Some(spec) => spec.wrap(command),
        None => command,
    }
}

// ---------------------------------------------------------------------------
// Disorder sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DisorderSweepConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub fasta_extensions: Vec<String>,
    pub output_extension: String,
    pub smoothing: SmoothingMode,
    pub iupred: IupredParams,
    pub container: Option<ContainerSpec>,
}

impl DisorderSweepConfig {
    pub fn command(&self, fasta: &Path, smoothing: SmoothingMode, output: &Path) -> ToolCommand {
        wrap_in(
            self.container.as_ref(),
            self.iupred.command(fasta, smoothing, output),
        )
    }
}

#[derive(Default)]
pub struct DisorderSweepConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    fasta_extensions: Option<Vec<String>>,
    output_extension: Option<String>,
    smoothing: Option<SmoothingMode>,
    python: Option<String>,
    iupred_script: Option<PathBuf>,
    analysis_type: Option<AnalysisType>,
    container: Option<ContainerSpec>,
}

impl DisorderSweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_dir(mut self, path: PathBuf) -> Self {
        self.input_dir = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn fasta_extensions(mut self, extensions: Vec<String>) -> Self {
        self.fasta_extensions = Some(extensions);
        self
    }
    pub fn output_extension(mut self, extension: String) -> Self {
        self.output_extension = Some(extension);
        self
    }
    pub fn smoothing(mut self, mode: SmoothingMode) -> Self {
        self.smoothing = Some(mode);
        self
    }
    pub fn python(mut self, python: String) -> Self {
        self.python = Some(python);
        self
    }
    pub fn iupred_script(mut self, path: PathBuf) -> Self {
        self.iupred_script = Some(path);
        self
    }
    pub fn analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_type = Some(analysis_type);
        self
    }
    pub fn container(mut self, container: Option<ContainerSpec>) -> Self {
        self.container = container;
        self
    }

    pub fn build(self) -> Result<DisorderSweepConfig, ConfigError> {
        let output_extension = self
            .output_extension
            .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string())
            .trim_start_matches('.')
            .to_string();
        if output_extension.is_empty() || output_extension.contains(['/', '\\']) {
            return Err(ConfigError::InvalidParameter {
                name: "output_extension",
                reason: format!("'{output_extension}' is not a file extension"),
            });
        }
        let fasta_extensions = self.fasta_extensions.unwrap_or_else(default_extensions);
        if fasta_extensions.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "fasta_extensions",
                reason: "at least one extension is required".to_string(),
            });
        }

        Ok(DisorderSweepConfig {
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            fasta_extensions,
            output_extension,
            smoothing: self.smoothing.unwrap_or_default(),
            iupred: IupredParams {
                python: self.python.unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
                script: self
                    .iupred_script
                    .ok_or(ConfigError::MissingParameter("iupred_script"))?,
                analysis_type: self.analysis_type.unwrap_or_default(),
            },
            container: self.container,
        })
    }
}

// ---------------------------------------------------------------------------
// Array task
// ---------------------------------------------------------------------------

/// The structure predictor one array task runs.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureTool {
    EsmFold(EsmFoldParams),
    AlphaFold(AlphaFoldParams),
}

impl StructureTool {
    pub fn name(&self) -> &'static str {
        match self {
            StructureTool::EsmFold(_) => "esmfold",
            StructureTool::AlphaFold(_) => "alphafold3",
        }
    }

    pub fn command(&self, input: &Path, output_dir: &Path) -> ToolCommand {
        match self {
            StructureTool::EsmFold(params) => params.command(input, output_dir),
            StructureTool::AlphaFold(params) => params.command(input, output_dir),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayTaskConfig {
    pub index: u32,
    pub tool: StructureTool,
    pub input: PathTemplate,
    pub output: PathTemplate,
    pub range: Option<ArrayRange>,
    pub container: Option<ContainerSpec>,
}

impl ArrayTaskConfig {
    pub fn input_path(&self) -> PathBuf {
        self.input.resolve(self.index)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output.resolve(self.index)
    }

    pub fn command(&self) -> ToolCommand {
        wrap_in(
            self.container.as_ref(),
            self.tool.command(&self.input_path(), &self.output_dir()),
        )
    }
}

#[derive(Default)]
pub struct ArrayTaskConfigBuilder {
    index: Option<u32>,
    tool: Option<StructureTool>,
    input: Option<PathTemplate>,
    output: Option<PathTemplate>,
    range: Option<ArrayRange>,
    container: Option<ContainerSpec>,
}

impl ArrayTaskConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }
    pub fn tool(mut self, tool: StructureTool) -> Self {
        self.tool = Some(tool);
        self
    }
    pub fn input(mut self, template: PathTemplate) -> Self {
        self.input = Some(template);
        self
    }
    pub fn output(mut self, template: PathTemplate) -> Self {
        self.output = Some(template);
        self
    }
    pub fn range(mut self, range: Option<ArrayRange>) -> Self {
        self.range = range;
        self
    }
    pub fn container(mut self, container: Option<ContainerSpec>) -> Self {
        self.container = container;
        self
    }

    pub fn build(self) -> Result<ArrayTaskConfig, ConfigError> {
        Ok(ArrayTaskConfig {
            index: self.index.ok_or(ConfigError::MissingParameter("index"))?,
            tool: self.tool.ok_or(ConfigError::MissingParameter("tool"))?,
            input: self.input.ok_or(ConfigError::MissingParameter("input"))?,
            output: self.output.ok_or(ConfigError::MissingParameter("output"))?,
            range: self.range,
            container: self.container,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub spec: PipelineSpec,
    pub input: PathBuf,
    pub workdir: PathBuf,
    /// Keep going after a failed stage. Failures are still reported.
    pub best_effort: bool,
    pub container: Option<ContainerSpec>,
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    spec: Option<PipelineSpec>,
    input: Option<PathBuf>,
    workdir: Option<PathBuf>,
    best_effort: bool,
    container: Option<ContainerSpec>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec(mut self, spec: PipelineSpec) -> Self {
        self.spec = Some(spec);
        self
    }
    pub fn input(mut self, path: PathBuf) -> Self {
        self.input = Some(path);
        self
    }
    pub fn workdir(mut self, path: PathBuf) -> Self {
        self.workdir = Some(path);
        self
    }
    pub fn best_effort(mut self, enabled: bool) -> Self {
        self.best_effort = enabled;
        self
    }
    pub fn container(mut self, container: Option<ContainerSpec>) -> Self {
        self.container = container;
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        Ok(PipelineConfig {
            spec: self.spec.ok_or(ConfigError::MissingParameter("spec"))?,
            input: self.input.ok_or(ConfigError::MissingParameter("input"))?,
            workdir: self
                .workdir
                .ok_or(ConfigError::MissingParameter("workdir"))?,
            best_effort: self.best_effort,
            container: self.container,
        })
    }
}

// ---------------------------------------------------------------------------
// FASTA conversion, aggregation, structure analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// One document per record instead of one per file.
    pub split: bool,
    pub model_seeds: Vec<u32>,
    pub fasta_extensions: Vec<String>,
}

#[derive(Default)]
pub struct ConvertConfigBuilder {
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    split: bool,
    model_seeds: Option<Vec<u32>>,
    fasta_extensions: Option<Vec<String>>,
}

impl ConvertConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, path: PathBuf) -> Self {
        self.input = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }
    pub fn model_seeds(mut self, seeds: Vec<u32>) -> Self {
        self.model_seeds = Some(seeds);
        self
    }
    pub fn fasta_extensions(mut self, extensions: Vec<String>) -> Self {
        self.fasta_extensions = Some(extensions);
        self
    }

    pub fn build(self) -> Result<ConvertConfig, ConfigError> {
        let model_seeds = self.model_seeds.unwrap_or_else(|| vec![1]);
        if model_seeds.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "model_seeds",
                reason: "at least one seed is required".to_string(),
            });
        }
        Ok(ConvertConfig {
            input: self.input.ok_or(ConfigError::MissingParameter("input"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            split: self.split,
            model_seeds,
            fasta_extensions: self.fasta_extensions.unwrap_or_else(default_extensions),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateConfig {
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    pub result_extension: String,
}

#[derive(Default)]
pub struct AggregateConfigBuilder {
    input_dir: Option<PathBuf>,
    output_file: Option<PathBuf>,
    result_extension: Option<String>,
}

impl AggregateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_dir(mut self, path: PathBuf) -> Self {
        self.input_dir = Some(path);
        self
    }
    pub fn output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }
    pub fn result_extension(mut self, extension: String) -> Self {
        self.result_extension = Some(extension);
        self
    }

    pub fn build(self) -> Result<AggregateConfig, ConfigError> {
        Ok(AggregateConfig {
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            output_file: self
                .output_file
                .ok_or(ConfigError::MissingParameter("output_file"))?,
            result_extension: self
                .result_extension
                .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureAnalysisConfig {
    pub pdb_dir: PathBuf,
    pub output_file: PathBuf,
    pub stride: StrideParams,
    pub container: Option<ContainerSpec>,
}

impl StructureAnalysisConfig {
    pub fn stride_command(&self, pdb: &Path) -> ToolCommand {
        wrap_in(self.container.as_ref(), self.stride.command(pdb))
    }
}

#[derive(Default)]
pub struct StructureAnalysisConfigBuilder {
    pdb_dir: Option<PathBuf>,
    output_file: Option<PathBuf>,
    stride_executable: Option<String>,
    container: Option<ContainerSpec>,
}

impl StructureAnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pdb_dir(mut self, path: PathBuf) -> Self {
        self.pdb_dir = Some(path);
        self
    }
    pub fn output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }
    pub fn stride_executable(mut self, executable: String) -> Self {
        self.stride_executable = Some(executable);
        self
    }
    pub fn container(mut self, container: Option<ContainerSpec>) -> Self {
        self.container = container;
        self
    }

    pub fn build(self) -> Result<StructureAnalysisConfig, ConfigError> {
        let mut stride = StrideParams::default();
        if let Some(executable) = self.stride_executable {
            stride.executable = executable;
        }
        Ok(StructureAnalysisConfig {
            pdb_dir: self
                .pdb_dir
                .ok_or(ConfigError::MissingParameter("pdb_dir"))?,
            output_file: self
                .output_file
                .ok_or(ConfigError::MissingParameter("output_file"))?,
            stride,
            container: self.container,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disorder_builder_applies_defaults() {
        let config = DisorderSweepConfigBuilder::new()
            .input_dir("fasta".into())
            .output_dir("iupred_results".into())
            .iupred_script("iupred3.py".into())
            .build()
            .unwrap();
        assert_eq!(config.output_extension, "csv");
        assert_eq!(config.smoothing, SmoothingMode::Medium);
        assert_eq!(config.iupred.python, "python3");
        assert_eq!(config.iupred.analysis_type, AnalysisType::Long);
        assert_eq!(config.fasta_extensions, ["fasta", "fa", "fas", "faa"]);
    }

    #[test]
    fn disorder_builder_reports_missing_script() {
        let err = DisorderSweepConfigBuilder::new()
            .input_dir("a".into())
            .output_dir("b".into())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("iupred_script"));
    }

    #[test]
    fn disorder_builder_normalises_output_extension() {
        let config = DisorderSweepConfigBuilder::new()
            .input_dir("a".into())
            .output_dir("b".into())
            .iupred_script("s.py".into())
            .output_extension(".tsv".into())
            .build()
            .unwrap();
        assert_eq!(config.output_extension, "tsv");

        let err = DisorderSweepConfigBuilder::new()
            .input_dir("a".into())
            .output_dir("b".into())
            .iupred_script("s.py".into())
            .output_extension(".".into())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "output_extension",
                ..
            }
        ));
    }

    #[test]
    fn array_config_resolves_paths_from_index() {
        let config = ArrayTaskConfigBuilder::new()
            .index(42)
            .tool(StructureTool::EsmFold(EsmFoldParams::default()))
            .input(PathTemplate::file("/work/fasta", "seq_", "fa").unwrap())
            .output(PathTemplate::directory("/work/results"))
            .build()
            .unwrap();
        assert_eq!(config.input_path(), PathBuf::from("/work/fasta/seq_42.fa"));
        assert_eq!(config.output_dir(), PathBuf::from("/work/results/42"));
        assert_eq!(
            config.command().argv()[..5],
            [
                "esm-fold",
                "--fasta",
                "/work/fasta/seq_42.fa",
                "--output",
                "/work/results/42"
            ]
        );
    }

    #[test]
    fn container_wraps_tool_command() {
        let config = ArrayTaskConfigBuilder::new()
            .index(1)
            .tool(StructureTool::AlphaFold(AlphaFoldParams::new("/models")))
            .input(PathTemplate::file("json", "seq_", "json").unwrap())
            .output(PathTemplate::directory("out"))
            .container(Some(ContainerSpec::new("/images/af3.sif")))
            .build()
            .unwrap();
        let cmd = config.command();
        assert_eq!(cmd.program, "apptainer");
        assert_eq!(cmd.args[..3], ["exec", "/images/af3.sif", "python3"]);
    }

    #[test]
    fn pipeline_builder_requires_workdir() {
        let spec = crate::core::tools::gromacs::GromacsParams::new("mdp")
            .md_pipeline()
            .unwrap();
        let err = PipelineConfigBuilder::new()
            .spec(spec)
            .input("protein.pdb".into())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("workdir"));
    }

    #[test]
    fn convert_builder_defaults_to_single_seed() {
        let config = ConvertConfigBuilder::new()
            .input("in.fasta".into())
            .output_dir("json".into())
            .build()
            .unwrap();
        assert_eq!(config.model_seeds, vec![1]);
        assert!(!config.split);
    }

    #[test]
    fn structure_builder_overrides_stride_executable() {
        let config = StructureAnalysisConfigBuilder::new()
            .pdb_dir("pdb".into())
            .output_file("out.csv".into())
            .stride_executable("/opt/stride/stride".into())
            .build()
            .unwrap();
        assert_eq!(
            config.stride_command(Path::new("a.pdb")).argv(),
            ["/opt/stride/stride", "a.pdb"]
        );
    }
}
