use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TemplateError {
    #[error("Template {field} '{value}' must not contain path separators or '..'")]
    UnsafeComponent { field: &'static str, value: String },
    #[error("Template extension must not be empty")]
    EmptyExtension,
}

/// A path parameterised by an array index.
///
/// Resolves to `base_dir/{prefix}{index}` with an optional `.{extension}`.
/// The index is the only variable part and is always rendered in decimal, so
/// two distinct indices can never resolve to the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    base_dir: PathBuf,
    prefix: String,
    extension: Option<String>,
}

impl PathTemplate {
    /// A file template, e.g. `fasta/` + `seq_` + `fa` → `fasta/seq_42.fa`.
    pub fn file(
        base_dir: impl Into<PathBuf>,
        prefix: &str,
        extension: &str,
    ) -> Result<Self, TemplateError> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(TemplateError::EmptyExtension);
        }
        check_component("prefix", prefix)?;
        check_component("extension", extension)?;
        Ok(Self {
            base_dir: base_dir.into(),
            prefix: prefix.to_string(),
            extension: Some(extension.to_string()),
        })
    }

    /// A directory template: `results/` → `results/42`.
    pub fn directory(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: String::new(),
            extension: None,
        }
    }

    pub fn resolve(&self, index: u32) -> PathBuf {
        let name = match &self.extension {
            Some(ext) => format!("{}{}.{}", self.prefix, index, ext),
            None => format!("{}{}", self.prefix, index),
        };
        self.base_dir.join(name)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.extension {
            Some(ext) => format!("{}{{index}}.{}", self.prefix, ext),
            None => format!("{}{{index}}", self.prefix),
        };
        write!(f, "{}", self.base_dir.join(name).display())
    }
}

fn check_component(field: &'static str, value: &str) -> Result<(), TemplateError> {
    if value.contains(['/', '\\']) || value.contains("..") || value.contains('\0') {
        return Err(TemplateError::UnsafeComponent {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
