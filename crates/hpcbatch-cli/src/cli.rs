use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "hpcbatch - compose and run structure prediction, disorder prediction and molecular dynamics jobs on SLURM clusters.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel parsing work.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to the configuration file in TOML format.
    #[arg(short, long, global = true, env = "HPCBATCH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log every external command instead of running it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S disorder.smoothing=strong
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run IUPred3 on every FASTA file in a directory, choosing smoothing by sequence length.
    Disorder(DisorderArgs),
    /// Run the structure predictor for one array task.
    Array(ArrayArgs),
    /// Run a chained multi-stage pipeline (GROMACS by default), stopping at the first failure.
    Pipeline(PipelineArgs),
    /// Convert FASTA files to AlphaFold3 JSON input.
    Convert(ConvertArgs),
    /// Summarise a directory of IUPred3 results into one CSV.
    Aggregate(AggregateArgs),
    /// Compute mean pLDDT and STRIDE secondary structure for a directory of PDB files.
    Analyze(AnalyzeArgs),
    /// Render a SLURM batch script that runs one of the other commands.
    Script(ScriptArgs),
}

#[derive(Args, Debug, Default)]
pub struct DisorderArgs {
    /// Directory containing the FASTA files.
    #[arg(short, long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving one result file per input.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to iupred3.py.
    #[arg(long, value_name = "PATH")]
    pub iupred_script: Option<PathBuf>,

    /// Python interpreter used to run IUPred3.
    #[arg(long, value_name = "PROGRAM")]
    pub python: Option<String>,

    /// Smoothing for sequences of 19 residues or more (no, medium, strong).
    #[arg(short, long, value_name = "MODE")]
    pub smoothing: Option<String>,

    /// IUPred3 analysis type (long, short, glob).
    #[arg(short = 't', long, value_name = "TYPE")]
    pub analysis_type: Option<String>,

    /// Extension of the result files.
    #[arg(long, value_name = "EXT")]
    pub output_extension: Option<String>,

    /// FASTA extensions to process.
    #[arg(long, value_name = "EXT", num_args = 1..)]
    pub extensions: Option<Vec<String>>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Esmfold,
    Alphafold3,
}

#[derive(Args, Debug, Default)]
pub struct ArrayArgs {
    /// Array index; read from SLURM_ARRAY_TASK_ID when omitted.
    #[arg(long, env = "SLURM_ARRAY_TASK_ID", value_name = "INDEX")]
    pub index: Option<u32>,

    /// Structure predictor to run.
    #[arg(long, value_enum)]
    pub tool: Option<ToolChoice>,

    /// Directory holding the per-index inputs.
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// File name prefix of the per-index inputs (e.g. `seq_`).
    #[arg(long, value_name = "PREFIX")]
    pub input_prefix: Option<String>,

    /// File extension of the per-index inputs (e.g. `fa`, `json`).
    #[arg(long, value_name = "EXT")]
    pub input_extension: Option<String>,

    /// Directory receiving one sub-directory per index.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Declared array range; indices outside it are rejected (e.g. `0-99`).
    #[arg(long, value_name = "RANGE")]
    pub range: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Structure file fed to the first stage.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Working directory for all stages.
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// TOML file with `[[stage]]` tables; the built-in GROMACS protocol is used otherwise.
    #[arg(short, long, value_name = "PATH")]
    pub definition: Option<PathBuf>,

    /// Directory with ions.mdp, minim.mdp, nvt.mdp, npt.mdp and md.mdp.
    #[arg(long, value_name = "DIR")]
    pub mdp_dir: Option<PathBuf>,

    /// Continue after a failed stage. Failures are still reported.
    #[arg(long)]
    pub best_effort: bool,
}

#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
    /// FASTA file or directory of FASTA files.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output directory for JSON files.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// One JSON per sequence instead of one multi-chain JSON per file.
    #[arg(long)]
    pub split: bool,

    /// Model seeds written into every document.
    #[arg(long, value_name = "SEED", num_args = 1..)]
    pub model_seeds: Option<Vec<u32>>,

    /// FASTA extensions to process.
    #[arg(long, value_name = "EXT", num_args = 1..)]
    pub extensions: Option<Vec<String>>,
}

#[derive(Args, Debug, Default)]
pub struct AggregateArgs {
    /// Directory containing IUPred3 result files.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Path of the summary CSV.
    #[arg(value_name = "OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Directory containing PDB files.
    #[arg(value_name = "PDB_DIR")]
    pub pdb_dir: Option<PathBuf>,

    /// Path of the results CSV.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// STRIDE executable.
    #[arg(long, value_name = "PROGRAM")]
    pub stride: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptWorkflow {
    Disorder,
    Array,
    Pipeline,
    Convert,
    Aggregate,
    Analyze,
}

impl ScriptWorkflow {
    pub fn subcommand(&self) -> &'static str {
        match self {
            ScriptWorkflow::Disorder => "disorder",
            ScriptWorkflow::Array => "array",
            ScriptWorkflow::Pipeline => "pipeline",
            ScriptWorkflow::Convert => "convert",
            ScriptWorkflow::Aggregate => "aggregate",
            ScriptWorkflow::Analyze => "analyze",
        }
    }
}

#[derive(Args, Debug)]
pub struct ScriptArgs {
    /// Command the script runs.
    #[arg(value_enum)]
    pub workflow: ScriptWorkflow,

    /// Write the script here instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Take `#SBATCH` directives from an existing script; `[job]` settings override them.
    #[arg(long, value_name = "PATH")]
    pub from_header: Option<PathBuf>,
}
