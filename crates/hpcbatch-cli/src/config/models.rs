use hpcbatch::engine::runner::{CommandRunner, DryRunRunner, ProcessRunner};
use std::path::PathBuf;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub set_values: Vec<String>,
    pub dry_run: bool,
}

impl GlobalOptions {
    pub fn runner(&self) -> Box<dyn CommandRunner> {
        if self.dry_run {
            Box::new(DryRunRunner)
        } else {
            Box::new(ProcessRunner)
        }
    }
}
