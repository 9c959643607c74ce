use crate::core::models::command::ToolCommand;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CONTAINER_RUNTIME: &str = "apptainer";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BindMountError {
    #[error("Invalid bind mount '{0}'. Expected 'SRC[:DEST[:ro|rw]]'.")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: PathBuf,
    pub read_only: bool,
}

impl FromStr for BindMount {
    type Err = BindMountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let invalid = || BindMountError::Invalid(s.to_string());
        let (source, target, options) = match parts.as_slice() {
            [src] => (*src, *src, None),
            [src, dst] => (*src, *dst, None),
            [src, dst, opts] => (*src, *dst, Some(*opts)),
            _ => return Err(invalid()),
        };
        if source.is_empty() || target.is_empty() {
            return Err(invalid());
        }
        let read_only = match options {
            None | Some("rw") => false,
            Some("ro") => true,
            Some(_) => return Err(invalid()),
        };
        Ok(Self {
            source: PathBuf::from(source),
            target: PathBuf::from(target),
            read_only,
        })
    }
}

impl fmt::Display for BindMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.display(), self.target.display())?;
        if self.read_only {
            write!(f, ":ro")?;
        }
        Ok(())
    }
}

/// Runs a tool inside a container image (Apptainer/Singularity `exec` syntax).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub runtime: String,
    pub image: PathBuf,
    pub binds: Vec<BindMount>,
    pub gpu: bool,
}

impl ContainerSpec {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            runtime: DEFAULT_CONTAINER_RUNTIME.to_string(),
            image: image.into(),
            binds: Vec::new(),
            gpu: false,
        }
    }

    /// Rewrites `command` as `<runtime> exec [--nv] [--bind ..] <image> <program> <args..>`.
    ///
    /// Working directory, stdin and stdout redirection stay on the outer
    /// process, which the runtime forwards into the container.
    pub fn wrap(&self, command: ToolCommand) -> ToolCommand {
        let mut args = vec!["exec".to_string()];
        if self.gpu {
            args.push("--nv".to_string());
        }
        for bind in &self.binds {
            args.push("--bind".to_string());
            args.push(bind.to_string());
        }
        args.push(self.image.to_string_lossy().into_owned());
        args.push(command.program);
        args.extend(command.args);

        ToolCommand {
            program: self.runtime.clone(),
            args,
            ..command
        }
    }
}
