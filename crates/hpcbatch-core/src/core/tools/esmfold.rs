use crate::core::models::command::ToolCommand;
use std::path::Path;

pub const DEFAULT_ESMFOLD_EXECUTABLE: &str = "esm-fold";
pub const DEFAULT_MAX_TOKENS_PER_BATCH: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsmFoldParams {
    pub executable: String,
    pub max_tokens_per_batch: u32,
    pub num_recycles: Option<u32>,
    pub chunk_size: Option<u32>,
    pub cpu_only: bool,
}

impl Default for EsmFoldParams {
    fn default() -> Self {
        Self {
            executable: DEFAULT_ESMFOLD_EXECUTABLE.to_string(),
            max_tokens_per_batch: DEFAULT_MAX_TOKENS_PER_BATCH,
            num_recycles: None,
            chunk_size: None,
            cpu_only: false,
        }
    }
}

impl EsmFoldParams {
    pub fn command(&self, fasta: &Path, output_dir: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.executable)
            .arg("--fasta")
            .path_arg(fasta)
            .arg("--output")
            .path_arg(output_dir)
            .flag("--max-tokens-per-batch", self.max_tokens_per_batch);
        if let Some(n) = self.num_recycles {
            cmd = cmd.flag("--num-recycles", n);
        }
        if let Some(n) = self.chunk_size {
            cmd = cmd.flag("--chunk-size", n);
        }
        if self.cpu_only {
            cmd = cmd.arg("--cpu-only");
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_has_required_flags_only() {
        let cmd = EsmFoldParams::default().command(Path::new("seq_3.fa"), Path::new("out/3"));
        assert_eq!(
            cmd.argv(),
            [
                "esm-fold",
                "--fasta",
                "seq_3.fa",
                "--output",
                "out/3",
                "--max-tokens-per-batch",
                "1024"
            ]
        );
    }

    #[test]
    fn optional_flags_are_appended() {
        let params = EsmFoldParams {
            num_recycles: Some(4),
            chunk_size: Some(128),
            cpu_only: true,
            ..Default::default()
        };
        let cmd = params.command(Path::new("a.fa"), Path::new("o"));
        assert_eq!(
            &cmd.args[6..],
            ["--num-recycles", "4", "--chunk-size", "128", "--cpu-only"]
        );
    }
}
