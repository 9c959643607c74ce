use crate::core::models::command::ToolCommand;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const PLACEHOLDERS: [&str; 3] = ["input", "output", "workdir"];

#[derive(Debug, Error)]
pub enum PipelineSpecError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Pipeline has no stages")]
    Empty,
    #[error("Stage {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
    #[error("Stage '{stage}' uses unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder { stage: String, placeholder: String },
    #[error("Stage '{stage}' has an unterminated '{{' in argument '{arg}'")]
    UnterminatedPlaceholder { stage: String, arg: String },
    #[error("Duplicate stage name '{0}'")]
    DuplicateStage(String),
}

/// One step of a chained run. `args` may reference `{input}`, `{output}` and
/// `{workdir}`; `output` names the file this stage produces, relative to the
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub output: String,
    #[serde(default)]
    pub stdin: Option<String>,
}

impl StageSpec {
    pub fn render(&self, input: &Path, output: &Path, workdir: &Path) -> ToolCommand {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let workdir_str = workdir.to_string_lossy();
        let args = self.args.iter().map(|arg| {
            arg.replace("{input}", &input)
                .replace("{output}", &output)
                .replace("{workdir}", &workdir_str)
        });

        let mut command = ToolCommand::new(&self.program)
            .args(args)
            .current_dir(workdir);
        if let Some(text) = &self.stdin {
            command = command.stdin(text.clone());
        }
        command
    }

    fn validate(&self, index: usize) -> Result<(), PipelineSpecError> {
        if self.name.trim().is_empty() {
            return Err(PipelineSpecError::EmptyField {
                index,
                field: "name",
            });
        }
        if self.program.trim().is_empty() {
            return Err(PipelineSpecError::EmptyField {
                index,
                field: "program",
            });
        }
        if self.output.trim().is_empty() {
            return Err(PipelineSpecError::EmptyField {
                index,
                field: "output",
            });
        }
        for arg in &self.args {
            let mut rest = arg.as_str();
            while let Some(open) = rest.find('{') {
                let after = &rest[open + 1..];
                let Some(close) = after.find('}') else {
                    return Err(PipelineSpecError::UnterminatedPlaceholder {
                        stage: self.name.clone(),
                        arg: arg.clone(),
                    });
                };
                let placeholder = &after[..close];
                if !PLACEHOLDERS.contains(&placeholder) {
                    return Err(PipelineSpecError::UnknownPlaceholder {
                        stage: self.name.clone(),
                        placeholder: placeholder.to_string(),
                    });
                }
                rest = &after[close + 1..];
            }
        }
        Ok(())
    }
}

/// An ordered list of stages where each stage reads the previous stage's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    stages: Vec<StageSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineFile {
    #[serde(rename = "stage")]
    stages: Vec<StageSpec>,
}

impl PipelineSpec {
    pub fn new(stages: Vec<StageSpec>) -> Result<Self, PipelineSpecError> {
        if stages.is_empty() {
            return Err(PipelineSpecError::Empty);
        }
        let mut names = std::collections::HashSet::new();
        for (index, stage) in stages.iter().enumerate() {
            stage.validate(index)?;
            if !names.insert(stage.name.as_str()) {
                return Err(PipelineSpecError::DuplicateStage(stage.name.clone()));
            }
        }
        Ok(Self { stages })
    }

    pub fn load(path: &Path) -> Result<Self, PipelineSpecError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineSpecError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            PipelineSpecError::Toml { source, .. } => PipelineSpecError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PipelineSpecError> {
        let file: PipelineFile = toml::from_str(content).map_err(|e| PipelineSpecError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;
        Self::new(file.stages)
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const DEFINITION: &str = r#"
[[stage]]
name = "editconf"
program = "gmx"
args = ["editconf", "-f", "{input}", "-o", "{output}", "-c", "-d", "1.0"]
output = "boxed.gro"

[[stage]]
name = "genion"
program = "gmx"
args = ["genion", "-s", "{input}", "-o", "{output}", "-p", "{workdir}/topol.top"]
output = "ionized.gro"
stdin = "SOL\n"
"#;

    #[test]
    fn loads_stages_from_toml() {
        let spec = PipelineSpec::from_toml_str(DEFINITION).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.stages()[1].stdin.as_deref(), Some("SOL\n"));
    }

    #[test]
    fn render_substitutes_placeholders() {
        let spec = PipelineSpec::from_toml_str(DEFINITION).unwrap();
        let workdir = PathBuf::from("/scratch/md");
        let cmd = spec.stages()[1].render(
            &workdir.join("boxed.gro"),
            &workdir.join("ionized.gro"),
            &workdir,
        );
        assert_eq!(
            cmd.args,
            vec![
                "genion",
                "-s",
                "/scratch/md/boxed.gro",
                "-o",
                "/scratch/md/ionized.gro",
                "-p",
                "/scratch/md/topol.top"
            ]
        );
        assert_eq!(cmd.working_dir, Some(workdir));
        assert_eq!(cmd.stdin.as_deref(), Some("SOL\n"));
    }

    #[test]
    fn unknown_placeholder_is_rejected() {
        let toml = r#"
[[stage]]
name = "bad"
program = "gmx"
args = ["-f", "{inptu}"]
output = "x.gro"
"#;
        let err = PipelineSpec::from_toml_str(toml).unwrap_err();
        assert!(
            matches!(err, PipelineSpecError::UnknownPlaceholder { ref placeholder, .. } if placeholder == "inptu")
        );
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        let stage = StageSpec {
            name: "s".into(),
            program: "gmx".into(),
            args: vec!["{input".into()],
            output: "o".into(),
            stdin: None,
        };
        assert!(matches!(
            PipelineSpec::new(vec![stage]),
            Err(PipelineSpecError::UnterminatedPlaceholder { .. })
        ));
    }

    #[test]
    fn empty_and_duplicate_pipelines_are_rejected() {
        assert!(matches!(
            PipelineSpec::new(Vec::new()),
            Err(PipelineSpecError::Empty)
        ));
        let stage = StageSpec {
            name: "same".into(),
            program: "true".into(),
            args: Vec::new(),
            output: "o".into(),
            stdin: None,
        };
        assert!(matches!(
            PipelineSpec::new(vec![stage.clone(), stage]),
            Err(PipelineSpecError::DuplicateStage(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = PipelineSpec::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PipelineSpecError::Io { .. }));
    }
}
