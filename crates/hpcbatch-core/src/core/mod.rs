//! # Core Module
//!
//! Fundamental building blocks shared by every workflow.
//!
//! - **Data Models** ([`models`]) - Job specifications, path templates, tool
//!   commands, container wrapping and pipeline definitions
//! - **File I/O** ([`io`]) - Readers for FASTA, IUPred3 result tables, PDB
//!   B-factors and STRIDE output, plus the AlphaFold3 JSON input document
//! - **Tool Builders** ([`tools`]) - Command lines for each external program

pub mod io;
pub mod models;
pub mod tools;
