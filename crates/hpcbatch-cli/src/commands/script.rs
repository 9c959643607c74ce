use crate::cli::{ScriptArgs, ScriptWorkflow};
use crate::config::{self, FileConfig, GlobalOptions};
use crate::error::{CliError, Result};
use hpcbatch::core::models::command::shell_quote;
use hpcbatch::core::models::job::JobSpec;
use hpcbatch::core::models::script::BatchScript;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

const PROGRAM: &str = "hpcbatch";

pub async fn run(args: ScriptArgs, options: &GlobalOptions) -> Result<()> {
    let file_config = config::load_file_config(options)?;
    let base = match &args.from_header {
        Some(path) => read_header(path)?,
        None => JobSpec::default(),
    };
    let script = build_script(args.workflow, &file_config, base, options)?;

    match &args.output {
        Some(path) => {
            script.write_to_path(path)?;
            info!("Batch script written to '{}'.", path.display());
            println!("Batch script written to '{}'.", path.display());
        }
        None => print!("{}", script.render()),
    }
    Ok(())
}

fn read_header(path: &Path) -> Result<JobSpec> {
    let mut reader = BufReader::new(File::open(path)?);
    JobSpec::parse_directives(&mut reader).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn build_script(
    workflow: ScriptWorkflow,
    file_config: &FileConfig,
    base: JobSpec,
    options: &GlobalOptions,
) -> Result<BatchScript> {
    let mut job = config::build_job_spec(file_config, base)?;
    if job.job_name.is_none() {
        job.job_name = Some(format!("{}-{}", PROGRAM, workflow.subcommand()));
    }
    if workflow == ScriptWorkflow::Array && job.array.is_none() {
        return Err(CliError::Config(
            "An array script needs `[job] array` or an `#SBATCH --array` header.".to_string(),
        ));
    }

    let mut invocation = vec![PROGRAM.to_string()];
    if let Some(path) = config::resolve_config_path(options.config.as_deref()) {
        let path = std::path::absolute(&path)?;
        invocation.push("--config".to_string());
        invocation.push(shell_quote(&path.to_string_lossy()));
    }
    for kv in &options.set_values {
        invocation.push("--set".to_string());
        invocation.push(shell_quote(kv));
    }
    invocation.push(workflow.subcommand().to_string());

    let mut script = BatchScript::new(job);
    if let Some(cpus) = script.job.cpus_per_task {
        script = script.export("OMP_NUM_THREADS", cpus.to_string());
    }
    let modules = file_config
        .job
        .as_ref()
        .and_then(|j| j.modules.clone())
        .unwrap_or_default();
    for module in modules {
        script = script.command(format!("module load {}", shell_quote(&module)));
    }
    if let Some(range) = &script.job.array {
        let tasks = range.task_count();
        info!("Array range '{}' launches {} task(s).", range, tasks);
        script = script.command(format!("# {tasks} array task(s), one input per index"));
    }
    Ok(script.command(invocation.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    fn options(config: &Path) -> GlobalOptions {
        GlobalOptions {
            config: Some(config.to_path_buf()),
            set_values: vec!["disorder.smoothing=strong".to_string()],
            dry_run: false,
        }
    }

    #[test]
    fn disorder_script_runs_hpcbatch_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("run.toml");
        fs::write(
            &config_path,
            "[job]\npartition = \"cpu\"\ncpus-per-task = 4\nmodules = [\"python/3.11\"]\n",
        )
        .unwrap();
        let file_config = FileConfig::from_file(&config_path).unwrap();

        let script = build_script(
            ScriptWorkflow::Disorder,
            &file_config,
            JobSpec::default(),
            &options(&config_path),
        )
        .unwrap();
        let text = script.render();

        assert!(text.starts_with("#!/bin/bash\n#SBATCH --job-name=hpcbatch-disorder\n"));
        assert!(text.contains("#SBATCH --partition=cpu\n"));
        assert!(text.contains("export OMP_NUM_THREADS=4\n"));
        assert!(text.contains("module load python/3.11\n"));
        let last = text.lines().last().unwrap();
        assert!(last.starts_with("hpcbatch --config "));
        assert!(last.ends_with(" --set disorder.smoothing=strong disorder"));
    }

    #[test]
    fn array_script_requires_a_range() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("run.toml");
        fs::write(&config_path, "").unwrap();
        let err = build_script(
            ScriptWorkflow::Array,
            &FileConfig::default(),
            JobSpec::default(),
            &options(&config_path),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn header_from_existing_script_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("run.toml");
        fs::write(&config_path, "[job]\ntime = \"04:00:00\"\n").unwrap();
        let header = dir.path().join("old.sh");
        fs::write(
            &header,
            "#!/bin/bash\n#SBATCH -J esm\n#SBATCH --array=0-9\n#SBATCH --time=01:00:00\nmodule load cuda\n",
        )
        .unwrap();

        let base = read_header(&header).unwrap();
        let file_config = FileConfig::from_file(&config_path).unwrap();
        let script =
            build_script(ScriptWorkflow::Array, &file_config, base, &options(&config_path))
                .unwrap();

        let rendered = script.render();
        let job = JobSpec::parse_directives(&mut Cursor::new(rendered.as_str())).unwrap();
        assert_eq!(job.job_name.as_deref(), Some("esm"));
        assert_eq!(job.walltime.unwrap().to_string(), "04:00:00");
        assert_eq!(job.array.unwrap().to_string(), "0-9");
        assert!(rendered.contains("\n# 10 array task(s), one input per index\n"));
        assert!(rendered.trim_end().ends_with(" array"));
    }
}
