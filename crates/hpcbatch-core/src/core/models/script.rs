use super::command::shell_quote;
use super::job::JobSpec;
use std::fs;
use std::io;
use std::path::Path;

const SHEBANG: &str = "#!/bin/bash";

/// A SLURM batch script: resource directives followed by strict-mode shell commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchScript {
    pub job: JobSpec,
    pub exports: Vec<(String, String)>,
    pub commands: Vec<String>,
}

impl BatchScript {
    pub fn new(job: JobSpec) -> Self {
        Self {
            job,
            ..Self::default()
        }
    }

    pub fn export(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.exports.push((key.into(), value.into()));
        self
    }

    /// Appends a command line, taken verbatim so it may reference shell variables.
    pub fn command(mut self, line: impl Into<String>) -> Self {
        self.commands.push(line.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(SHEBANG);
        out.push('\n');
        out.push_str(&self.job.render_directives());
        out.push_str("\nset -euo pipefail\n");
        if !self.exports.is_empty() {
            out.push('\n');
            for (key, value) in &self.exports {
                out.push_str(&format!("export {}={}\n", key, shell_quote(value)));
            }
        }
        if !self.commands.is_empty() {
            out.push('\n');
            for line in &self.commands {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    /// Writes the script and marks it executable.
    pub fn write_to_path(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}
