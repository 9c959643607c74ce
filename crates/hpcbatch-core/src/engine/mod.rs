//! # Engine Module
//!
//! Execution-side types shared by all workflows.
//!
//! - [`config`] - Validated per-workflow configurations and their builders
//! - [`error`] - The [`error::EngineError`] taxonomy
//! - [`progress`] - Phase/task progress events for front ends
//! - [`runner`] - The [`runner::CommandRunner`] seam that launches external programs

pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
