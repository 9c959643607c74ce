use crate::core::models::command::ToolCommand;
use std::path::Path;

pub const DEFAULT_STRIDE_EXECUTABLE: &str = "stride";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrideParams {
    pub executable: String,
}

impl Default for StrideParams {
    fn default() -> Self {
        Self {
            executable: DEFAULT_STRIDE_EXECUTABLE.to_string(),
        }
    }
}

impl StrideParams {
    pub fn command(&self, pdb: &Path) -> ToolCommand {
        ToolCommand::new(&self.executable).path_arg(pdb)
    }
}
