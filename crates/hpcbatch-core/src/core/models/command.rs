use std::fmt;
use std::path::{Path, PathBuf};

/// One fully composed external program invocation.
///
/// Arguments are kept as a vector and handed to the OS unmodified; the
/// [`fmt::Display`] form is a shell-quoted rendering for logs and scripts only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub stdin: Option<String>,
    pub stdout_path: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            stdin: None,
            stdout_path: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Appends `flag value` as two arguments.
    pub fn flag(self, flag: &str, value: impl fmt::Display) -> Self {
        self.arg(flag).arg(value.to_string())
    }

    /// Appends `flag=value` as a single argument.
    pub fn flag_eq(self, flag: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("{flag}={value}"))
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    /// Program followed by arguments, as passed to the OS.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.argv().into_iter().map(shell_quote).collect();
        write!(f, "{}", parts.join(" "))?;
        if let Some(path) = &self.stdout_path {
            write!(f, " > {}", shell_quote(&path.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Single-quotes a word for POSIX shells when it contains anything beyond a safe set.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
