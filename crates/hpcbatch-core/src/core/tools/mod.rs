//! Command-line builders for the external programs.
//!
//! Each builder knows one tool's fixed flag set and returns a [`ToolCommand`];
//! none of them launch anything. Values are passed through unmodified.
//!
//! [`ToolCommand`]: crate::core::models::command::ToolCommand

use thiserror::Error;

pub mod alphafold;
pub mod esmfold;
pub mod gromacs;
pub mod iupred;
pub mod stride;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown {kind} '{value}'. Expected one of: {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}
