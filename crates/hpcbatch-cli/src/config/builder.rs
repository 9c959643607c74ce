use super::defaults::{DefaultsConfig, default_config_path};
use super::file::{FileConfig, FileJobConfig, expand_home};
use super::models::GlobalOptions;
use crate::cli::{
    AggregateArgs, AnalyzeArgs, ArrayArgs, ConvertArgs, DisorderArgs, PipelineArgs, ToolChoice,
};
use crate::error::{CliError, Result};
use hpcbatch::core::models::container::{BindMount, ContainerSpec};
use hpcbatch::core::models::job::{ArrayRange, JobSpec};
use hpcbatch::core::models::pipeline::PipelineSpec;
use hpcbatch::core::models::template::PathTemplate;
use hpcbatch::core::tools::alphafold::AlphaFoldParams;
use hpcbatch::core::tools::esmfold::EsmFoldParams;
use hpcbatch::core::tools::gromacs::GromacsParams;
use hpcbatch::engine::config as core_config;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// The config file in effect: `--config`/`HPCBATCH_CONFIG`, else the per-user file if present.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(expand_home(path.to_path_buf())),
        None => default_config_path().filter(|p| p.is_file()),
    }
}

/// Loads the config file (if any) and applies `--set` overrides on top of it.
pub fn load_file_config(options: &GlobalOptions) -> Result<FileConfig> {
    let file_config = match resolve_config_path(options.config.as_deref()) {
        Some(path) => {
            info!("Using configuration file '{}'.", path.display());
            FileConfig::from_file(&path)?
        }
        None => {
            debug!("No configuration file found; using built-in defaults.");
            FileConfig::default()
        }
    };
    apply_set_values(file_config, &options.set_values)
}

fn config_error(e: core_config::ConfigError) -> CliError {
    CliError::Config(e.to_string())
}

fn parse_named<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", name, e)))
}

fn path_or(cli: Option<&PathBuf>, file: Option<&PathBuf>, default: &Path) -> PathBuf {
    expand_home(
        cli.or(file)
            .cloned()
            .unwrap_or_else(|| default.to_path_buf()),
    )
}

fn required_path(cli: Option<&PathBuf>, file: Option<&PathBuf>, key: &str) -> Result<PathBuf> {
    cli.or(file).cloned().map(expand_home).ok_or_else(|| {
        CliError::Config(format!(
            "A value for '{}' is required either in the config file or via CLI argument.",
            key
        ))
    })
}

/// The `[container]` image, unless the workflow's section opts out with `container = false`.
fn build_container(file: &FileConfig, enabled: Option<bool>) -> Result<Option<ContainerSpec>> {
    if enabled == Some(false) {
        return Ok(None);
    }
    let Some(section) = file.container.as_ref() else {
        return Ok(None);
    };
    let Some(image) = section.image.clone() else {
        if enabled == Some(true) {
            return Err(CliError::Config(
                "`container = true` requires `[container] image`".to_string(),
            ));
        }
        return Ok(None);
    };

    let mut spec = ContainerSpec::new(expand_home(image));
    if let Some(runtime) = &section.runtime {
        spec.runtime = runtime.clone();
    }
    spec.gpu = section.gpu.unwrap_or(false);
    spec.binds = section
        .binds
        .iter()
        .flatten()
        .map(|b| parse_named::<BindMount>("container.binds", b))
        .collect::<Result<_>>()?;
    Ok(Some(spec))
}

pub fn build_disorder_config(
    args: &DisorderArgs,
    file: &FileConfig,
) -> Result<core_config::DisorderSweepConfig> {
    let defaults = DefaultsConfig::default();
    let section = file.disorder.clone().unwrap_or_default();

    let mut builder = core_config::DisorderSweepConfigBuilder::new()
        .input_dir(path_or(
            args.input_dir.as_ref(),
            section.input_dir.as_ref(),
            &defaults.disorder_input_dir,
        ))
        .output_dir(path_or(
            args.output_dir.as_ref(),
            section.output_dir.as_ref(),
            &defaults.disorder_output_dir,
        ))
        .iupred_script(required_path(
            args.iupred_script.as_ref(),
            section.iupred_script.as_ref(),
            "disorder.iupred-script",
        )?)
        .python(
            args.python
                .clone()
                .or(section.python)
                .unwrap_or(defaults.python),
        )
        .output_extension(
            args.output_extension
                .clone()
                .or(section.output_extension)
                .unwrap_or(defaults.output_extension),
        )
        .fasta_extensions(
            args.extensions
                .clone()
                .or(section.extensions)
                .unwrap_or(defaults.fasta_extensions),
        )
        .container(build_container(file, section.container)?);

    if let Some(smoothing) = args.smoothing.as_ref().or(section.smoothing.as_ref()) {
        builder = builder.smoothing(parse_named("disorder.smoothing", smoothing)?);
    }
    if let Some(kind) = args.analysis_type.as_ref().or(section.analysis_type.as_ref()) {
        builder = builder.analysis_type(parse_named("disorder.analysis-type", kind)?);
    }

    builder.build().map_err(config_error)
}

fn parse_tool(value: &str) -> Result<ToolChoice> {
    match value {
        "esmfold" => Ok(ToolChoice::Esmfold),
        "alphafold3" | "alphafold" => Ok(ToolChoice::Alphafold3),
        other => Err(CliError::Config(format!(
            "Unknown array.tool '{}'. Expected 'esmfold' or 'alphafold3'.",
            other
        ))),
    }
}

pub fn build_array_config(
    args: &ArrayArgs,
    file: &FileConfig,
) -> Result<core_config::ArrayTaskConfig> {
    let defaults = DefaultsConfig::default();
    let section = file.array.clone().unwrap_or_default();

    let index = args.index.ok_or_else(|| {
        CliError::Argument(
            "No array index: pass --index or run inside a SLURM array job (SLURM_ARRAY_TASK_ID)."
                .to_string(),
        )
    })?;

    let choice = match (args.tool, section.tool.as_deref()) {
        (Some(tool), _) => tool,
        (None, Some(name)) => parse_tool(name)?,
        (None, None) => ToolChoice::Esmfold,
    };

    let (tool, default_extension) = match choice {
        ToolChoice::Esmfold => {
            let esm = section.esmfold.clone().unwrap_or_default();
            let mut params = EsmFoldParams::default();
            if let Some(executable) = esm.executable {
                params.executable = executable;
            }
            if let Some(n) = esm.max_tokens_per_batch {
                params.max_tokens_per_batch = n;
            }
            params.num_recycles = esm.num_recycles;
            params.chunk_size = esm.chunk_size;
            params.cpu_only = esm.cpu_only.unwrap_or(false);
            (
                core_config::StructureTool::EsmFold(params),
                defaults.array_input_extension.clone(),
            )
        }
        ToolChoice::Alphafold3 => {
            let af = section.alphafold.clone().unwrap_or_default();
            let model_dir = required_path(None, af.model_dir.as_ref(), "array.alphafold.model-dir")?;
            let mut params = AlphaFoldParams::new(model_dir);
            if let Some(python) = af.python {
                params.python = python;
            }
            if let Some(script) = af.script {
                params.script = expand_home(script);
            }
            params.db_dir = af.db_dir.map(expand_home);
            params.run_data_pipeline = af.run_data_pipeline.unwrap_or(true);
            (
                core_config::StructureTool::AlphaFold(params),
                "json".to_string(),
            )
        }
    };

    let input = PathTemplate::file(
        path_or(
            args.input_dir.as_ref(),
            section.input_dir.as_ref(),
            &defaults.array_input_dir,
        ),
        args.input_prefix
            .as_deref()
            .or(section.input_prefix.as_deref())
            .unwrap_or(defaults.array_input_prefix.as_str()),
        args.input_extension
            .as_deref()
            .or(section.input_extension.as_deref())
            .unwrap_or(default_extension.as_str()),
    )
    .map_err(|e| CliError::Config(e.to_string()))?;
    let output = PathTemplate::directory(path_or(
        args.output_dir.as_ref(),
        section.output_dir.as_ref(),
        &defaults.array_output_dir,
    ));

    let range = match args
        .range
        .as_deref()
        .or(section.range.as_deref())
        .or(file.job.as_ref().and_then(|j| j.array.as_deref()))
    {
        Some(text) => Some(parse_named::<ArrayRange>("array.range", text)?),
        None => None,
    };

    core_config::ArrayTaskConfigBuilder::new()
        .index(index)
        .tool(tool)
        .input(input)
        .output(output)
        .range(range)
        .container(build_container(file, section.container)?)
        .build()
        .map_err(config_error)
}

pub fn build_pipeline_config(
    args: &PipelineArgs,
    file: &FileConfig,
) -> Result<core_config::PipelineConfig> {
    let defaults = DefaultsConfig::default();
    let section = file.pipeline.clone().unwrap_or_default();

    let spec = match args.definition.as_ref().or(section.definition.as_ref()) {
        Some(definition) => {
            let definition = expand_home(definition.clone());
            info!("Loading pipeline definition from '{}'.", definition.display());
            PipelineSpec::load(&definition).map_err(|e| CliError::FileParsing {
                path: definition.clone(),
                source: e.into(),
            })?
        }
        None => {
            let mdp_dir = required_path(
                args.mdp_dir.as_ref(),
                section.mdp_dir.as_ref(),
                "pipeline.mdp-dir (or pipeline.definition)",
            )?;
            // grompp runs inside the working directory.
            let mut params = GromacsParams::new(std::path::absolute(&mdp_dir)?);
            if let Some(gmx) = section.gmx {
                params.gmx = gmx;
            }
            if let Some(force_field) = section.force_field {
                params.force_field = force_field;
            }
            if let Some(water_model) = section.water_model {
                params.water_model = water_model;
            }
            params
                .md_pipeline()
                .map_err(|e| CliError::Config(e.to_string()))?
        }
    };

    core_config::PipelineConfigBuilder::new()
        .spec(spec)
        .input(required_path(
            args.input.as_ref(),
            section.input.as_ref(),
            "pipeline.input",
        )?)
        .workdir(path_or(
            args.workdir.as_ref(),
            section.workdir.as_ref(),
            &defaults.pipeline_workdir,
        ))
        .best_effort(args.best_effort || section.best_effort.unwrap_or(false))
        .container(build_container(file, section.container)?)
        .build()
        .map_err(config_error)
}

pub fn build_convert_config(
    args: &ConvertArgs,
    file: &FileConfig,
) -> Result<core_config::ConvertConfig> {
    let defaults = DefaultsConfig::default();
    let section = file.convert.clone().unwrap_or_default();

    core_config::ConvertConfigBuilder::new()
        .input(required_path(
            args.input.as_ref(),
            section.input.as_ref(),
            "convert.input",
        )?)
        .output_dir(required_path(
            args.output.as_ref(),
            section.output_dir.as_ref(),
            "convert.output-dir",
        )?)
        .split(args.split || section.split.unwrap_or(false))
        .model_seeds(
            args.model_seeds
                .clone()
                .or(section.model_seeds)
                .unwrap_or(defaults.model_seeds),
        )
        .fasta_extensions(
            args.extensions
                .clone()
                .or(section.extensions)
                .unwrap_or(defaults.fasta_extensions),
        )
        .build()
        .map_err(config_error)
}

pub fn build_aggregate_config(
    args: &AggregateArgs,
    file: &FileConfig,
) -> Result<core_config::AggregateConfig> {
    let section = file.aggregate.clone().unwrap_or_default();
    core_config::AggregateConfigBuilder::new()
        .input_dir(required_path(
            args.input_dir.as_ref(),
            section.input_dir.as_ref(),
            "aggregate.input-dir",
        )?)
        .output_file(required_path(
            args.output_file.as_ref(),
            section.output_file.as_ref(),
            "aggregate.output-file",
        )?)
        .build()
        .map_err(config_error)
}

pub fn build_analysis_config(
    args: &AnalyzeArgs,
    file: &FileConfig,
) -> Result<core_config::StructureAnalysisConfig> {
    let defaults = DefaultsConfig::default();
    let section = file.analysis.clone().unwrap_or_default();
    core_config::StructureAnalysisConfigBuilder::new()
        .pdb_dir(required_path(
            args.pdb_dir.as_ref(),
            section.pdb_dir.as_ref(),
            "analysis.pdb-dir",
        )?)
        .output_file(path_or(
            args.output.as_ref(),
            section.output_file.as_ref(),
            &defaults.analysis_output_file,
        ))
        .stride_executable(
            args.stride
                .clone()
                .or(section.stride)
                .unwrap_or(defaults.stride_executable),
        )
        .container(build_container(file, section.container)?)
        .build()
        .map_err(config_error)
}

/// Overlays the `[job]` table onto `base` (typically a header parsed from an existing script).
pub fn build_job_spec(file: &FileConfig, mut base: JobSpec) -> Result<JobSpec> {
    let Some(job) = file.job.as_ref() else {
        return Ok(base);
    };
    let FileJobConfig {
        job_name,
        partition,
        nodes,
        ntasks,
        cpus_per_task,
        memory,
        time,
        gpus,
        array,
        output,
        error,
        modules: _,
    } = job;

    if job_name.is_some() {
        base.job_name = job_name.clone();
    }
    if partition.is_some() {
        base.partition = partition.clone();
    }
    base.nodes = nodes.or(base.nodes);
    base.ntasks = ntasks.or(base.ntasks);
    base.cpus_per_task = cpus_per_task.or(base.cpus_per_task);
    base.gpus = gpus.or(base.gpus);
    if let Some(memory) = memory {
        base.memory = Some(parse_named("job.memory", memory)?);
    }
    if let Some(time) = time {
        base.walltime = Some(parse_named("job.time", time)?);
    }
    if let Some(array) = array {
        base.array = Some(parse_named("job.array", array)?);
    }
    if output.is_some() {
        base.output_log = output.clone();
    }
    if error.is_some() {
        base.error_log = error.clone();
    }
    Ok(base)
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let text = Some(value.to_string());
        let path = Some(PathBuf::from(value));

        match key {
            "job.job-name" => config.job.get_or_insert_with(Default::default).job_name = text,
            "job.partition" => config.job.get_or_insert_with(Default::default).partition = text,
            "job.time" => config.job.get_or_insert_with(Default::default).time = text,
            "job.memory" => config.job.get_or_insert_with(Default::default).memory = text,
            "job.array" => config.job.get_or_insert_with(Default::default).array = text,
            "job.cpus-per-task" => {
                config.job.get_or_insert_with(Default::default).cpus_per_task =
                    Some(parse_named(key, value)?)
            }
            "job.gpus" => {
                config.job.get_or_insert_with(Default::default).gpus = Some(parse_named(key, value)?)
            }
            "container.image" => {
                config.container.get_or_insert_with(Default::default).image = path
            }
            "container.runtime" => {
                config.container.get_or_insert_with(Default::default).runtime = text
            }
            "container.gpu" => {
                config.container.get_or_insert_with(Default::default).gpu =
                    Some(parse_named(key, value)?)
            }
            "disorder.input-dir" => {
                config.disorder.get_or_insert_with(Default::default).input_dir = path
            }
            "disorder.output-dir" => {
                config.disorder.get_or_insert_with(Default::default).output_dir = path
            }
            "disorder.iupred-script" => {
                config.disorder.get_or_insert_with(Default::default).iupred_script = path
            }
            "disorder.python" => config.disorder.get_or_insert_with(Default::default).python = text,
            "disorder.smoothing" => {
                config.disorder.get_or_insert_with(Default::default).smoothing = text
            }
            "disorder.analysis-type" => {
                config.disorder.get_or_insert_with(Default::default).analysis_type = text
            }
            "disorder.output-extension" => {
                config.disorder.get_or_insert_with(Default::default).output_extension = text
            }
            "array.tool" => config.array.get_or_insert_with(Default::default).tool = text,
            "array.input-dir" => config.array.get_or_insert_with(Default::default).input_dir = path,
            "array.output-dir" => {
                config.array.get_or_insert_with(Default::default).output_dir = path
            }
            "array.range" => config.array.get_or_insert_with(Default::default).range = text,
            "array.esmfold.max-tokens-per-batch" => {
                config
                    .array
                    .get_or_insert_with(Default::default)
                    .esmfold
                    .get_or_insert_with(Default::default)
                    .max_tokens_per_batch = Some(parse_named(key, value)?)
            }
            "array.esmfold.num-recycles" => {
                config
                    .array
                    .get_or_insert_with(Default::default)
                    .esmfold
                    .get_or_insert_with(Default::default)
                    .num_recycles = Some(parse_named(key, value)?)
            }
            "array.esmfold.cpu-only" => {
                config
                    .array
                    .get_or_insert_with(Default::default)
                    .esmfold
                    .get_or_insert_with(Default::default)
                    .cpu_only = Some(parse_named(key, value)?)
            }
            "array.alphafold.model-dir" => {
                config
                    .array
                    .get_or_insert_with(Default::default)
                    .alphafold
                    .get_or_insert_with(Default::default)
                    .model_dir = path
            }
            "array.alphafold.db-dir" => {
                config
                    .array
                    .get_or_insert_with(Default::default)
                    .alphafold
                    .get_or_insert_with(Default::default)
                    .db_dir = path
            }
            "pipeline.mdp-dir" => config.pipeline.get_or_insert_with(Default::default).mdp_dir = path,
            "pipeline.gmx" => config.pipeline.get_or_insert_with(Default::default).gmx = text,
            "pipeline.force-field" => {
                config.pipeline.get_or_insert_with(Default::default).force_field = text
            }
            "pipeline.water-model" => {
                config.pipeline.get_or_insert_with(Default::default).water_model = text
            }
            "pipeline.best-effort" => {
                config.pipeline.get_or_insert_with(Default::default).best_effort =
                    Some(parse_named(key, value)?)
            }
            "convert.split" => {
                config.convert.get_or_insert_with(Default::default).split =
                    Some(parse_named(key, value)?)
            }
            "analysis.stride" => config.analysis.get_or_insert_with(Default::default).stride = text,
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpcbatch::core::models::job::Walltime;
    use hpcbatch::core::tools::iupred::{AnalysisType, SmoothingMode};
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::TempDir;

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempfile::tempdir().unwrap());

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = TEST_DIR.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn options(config: Option<PathBuf>, set_values: &[&str]) -> GlobalOptions {
        GlobalOptions {
            config,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
            dry_run: false,
        }
    }

    fn disorder_args() -> DisorderArgs {
        DisorderArgs {
            iupred_script: Some(PathBuf::from("/opt/iupred3/iupred3.py")),
            ..DisorderArgs::default()
        }
    }

    #[test]
    fn disorder_defaults_apply_without_file() {
        let config = build_disorder_config(&disorder_args(), &FileConfig::default()).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("fasta"));
        assert_eq!(config.output_dir, PathBuf::from("iupred_results"));
        assert_eq!(config.output_extension, "csv");
        assert_eq!(config.smoothing, SmoothingMode::Medium);
        assert_eq!(config.iupred.analysis_type, AnalysisType::Long);
        assert_eq!(config.iupred.python, "python3");
        assert!(config.container.is_none());
    }

    #[test]
    fn cli_overrides_set_which_overrides_file() {
        let path = write_config(
            "precedence.toml",
            r#"
            [disorder]
            iupred-script = "/file/iupred3.py"
            smoothing = "no"
            analysis-type = "short"
            output-dir = "from_file"
            "#,
        );
        let file = load_file_config(&options(
            Some(path),
            &["disorder.smoothing=strong", "disorder.output-dir=from_set"],
        ))
        .unwrap();

        let mut args = DisorderArgs::default();
        args.output_dir = Some(PathBuf::from("from_cli"));
        let config = build_disorder_config(&args, &file).unwrap();

        assert_eq!(config.iupred.script, PathBuf::from("/file/iupred3.py"));
        assert_eq!(config.iupred.analysis_type, AnalysisType::Short);
        assert_eq!(config.smoothing, SmoothingMode::Strong);
        assert_eq!(config.output_dir, PathBuf::from("from_cli"));
    }

    #[test]
    fn missing_iupred_script_is_a_config_error() {
        let err = build_disorder_config(&DisorderArgs::default(), &FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("iupred-script")));
    }

    #[test]
    fn invalid_smoothing_is_reported() {
        let mut args = disorder_args();
        args.smoothing = Some("extreme".to_string());
        let err = build_disorder_config(&args, &FileConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("extreme")));
    }

    #[test]
    fn set_rejects_bad_format_and_unknown_keys() {
        let err = apply_set_values(FileConfig::default(), &["disorder.smoothing".into()])
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("Invalid --set format")));

        let err = apply_set_values(FileConfig::default(), &["disorder.colour=red".into()])
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("Unsupported")));

        let err = apply_set_values(FileConfig::default(), &["job.gpus=many".into()]).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("job.gpus")));
    }

    #[test]
    fn array_index_42_resolves_default_templates() {
        let args = ArrayArgs {
            index: Some(42),
            input_dir: Some(PathBuf::from("/work/fasta")),
            output_dir: Some(PathBuf::from("/work/results")),
            ..ArrayArgs::default()
        };
        let config = build_array_config(&args, &FileConfig::default()).unwrap();
        assert_eq!(config.input_path(), PathBuf::from("/work/fasta/seq_42.fa"));
        assert_eq!(config.output_dir(), PathBuf::from("/work/results/42"));
        assert_eq!(config.tool.name(), "esmfold");
    }

    #[test]
    fn array_without_index_is_an_argument_error() {
        let err = build_array_config(&ArrayArgs::default(), &FileConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn array_alphafold_needs_model_dir_and_defaults_to_json_inputs() {
        let args = ArrayArgs {
            index: Some(3),
            tool: Some(ToolChoice::Alphafold3),
            ..ArrayArgs::default()
        };
        let err = build_array_config(&args, &FileConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("model-dir")));

        let file = apply_set_values(
            FileConfig::default(),
            &["array.alphafold.model-dir=/models".into()],
        )
        .unwrap();
        let config = build_array_config(&args, &file).unwrap();
        assert_eq!(config.input_path(), PathBuf::from("fasta/seq_3.json"));
        assert_eq!(config.tool.name(), "alphafold3");
    }

    #[test]
    fn array_range_falls_back_to_job_array() {
        let file = FileConfig::from_toml_str("[job]\narray = \"0-9\"\n").unwrap();
        let args = ArrayArgs {
            index: Some(4),
            ..ArrayArgs::default()
        };
        let config = build_array_config(&args, &file).unwrap();
        assert_eq!(config.range, Some(ArrayRange::span(0, 9)));
    }

    #[test]
    fn container_section_wraps_unless_workflow_opts_out() {
        let file = FileConfig::from_toml_str(
            r#"
            [container]
            image = "/images/iupred.sif"
            binds = ["/data:/data:ro"]

            [analysis]
            pdb-dir = "pdb"
            container = false
            "#,
        )
        .unwrap();

        let disorder = build_disorder_config(&disorder_args(), &file).unwrap();
        let container = disorder.container.unwrap();
        assert_eq!(container.image, PathBuf::from("/images/iupred.sif"));
        assert_eq!(container.binds.len(), 1);
        assert!(container.binds[0].read_only);

        let analysis = build_analysis_config(&AnalyzeArgs::default(), &file).unwrap();
        assert!(analysis.container.is_none());
        assert_eq!(
            analysis.output_file,
            PathBuf::from("structure_analysis_results.csv")
        );
    }

    #[test]
    fn pipeline_requires_definition_or_mdp_dir() {
        let args = PipelineArgs {
            input: Some(PathBuf::from("protein.pdb")),
            ..PipelineArgs::default()
        };
        let err = build_pipeline_config(&args, &FileConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("mdp-dir")));

        let args = PipelineArgs {
            mdp_dir: Some(PathBuf::from("/mdp")),
            ..args
        };
        let config = build_pipeline_config(&args, &FileConfig::default()).unwrap();
        assert!(!config.spec.is_empty());
        assert!(!config.best_effort);
        assert_eq!(config.workdir, PathBuf::from("."));
    }

    #[test]
    fn relative_mdp_dir_is_resolved_before_stages_change_directory() {
        let args = PipelineArgs {
            input: Some(PathBuf::from("protein.pdb")),
            workdir: Some(PathBuf::from("md")),
            mdp_dir: Some(PathBuf::from("mdp")),
            ..PipelineArgs::default()
        };
        let config = build_pipeline_config(&args, &FileConfig::default()).unwrap();

        let ions = &config.spec.stages()[3];
        let f = ions.args.iter().position(|a| a == "-f").unwrap();
        let mdp = PathBuf::from(&ions.args[f + 1]);
        assert!(mdp.is_absolute());
        assert_eq!(mdp, std::path::absolute("mdp/ions.mdp").unwrap());
    }

    #[test]
    fn pipeline_definition_file_is_loaded() {
        let definition = write_config(
            "stages.toml",
            r#"
            [[stage]]
            name = "copy"
            program = "cp"
            args = ["{input}", "{output}"]
            output = "copy.pdb"
            "#,
        );
        let args = PipelineArgs {
            input: Some(PathBuf::from("in.pdb")),
            definition: Some(definition),
            best_effort: true,
            ..PipelineArgs::default()
        };
        let config = build_pipeline_config(&args, &FileConfig::default()).unwrap();
        assert_eq!(config.spec.len(), 1);
        assert!(config.best_effort);
    }

    #[test]
    fn convert_requires_input_and_output() {
        let err = build_convert_config(&ConvertArgs::default(), &FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));

        let args = ConvertArgs {
            input: Some(PathBuf::from("in.fasta")),
            output: Some(PathBuf::from("json")),
            ..ConvertArgs::default()
        };
        let config = build_convert_config(&args, &FileConfig::default()).unwrap();
        assert_eq!(config.model_seeds, vec![1]);
        assert!(!config.split);
    }

    #[test]
    fn job_table_overrides_parsed_header() {
        let file = FileConfig::from_toml_str(
            "[job]\njob-name = \"md\"\ntime = \"1-00:00:00\"\ngpus = 2\n",
        )
        .unwrap();
        let base = JobSpec {
            job_name: Some("old".to_string()),
            partition: Some("gpu".to_string()),
            gpus: Some(1),
            ..JobSpec::default()
        };
        let job = build_job_spec(&file, base).unwrap();
        assert_eq!(job.job_name.as_deref(), Some("md"));
        assert_eq!(job.partition.as_deref(), Some("gpu"));
        assert_eq!(job.gpus, Some(2));
        assert_eq!(job.walltime, Some(Walltime::from_seconds(24 * 3600)));
    }
}
