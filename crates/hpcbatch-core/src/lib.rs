//! # hpcbatch Core Library
//!
//! A library for composing and running the batch jobs of a structural-biology
//! group on an HPC scheduler: protein structure prediction (ESMFold, AlphaFold3),
//! intrinsic disorder prediction (IUPred3) and molecular dynamics (GROMACS).
//!
//! The external tools are treated as opaque collaborators. This crate owns the
//! logic around them: resource headers, deterministic path construction for
//! array tasks, the sequence-length rule for disorder smoothing, ordered stage
//! execution with explicit failure propagation, and the small amount of file
//! parsing needed to prepare inputs and summarise outputs.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless data models (`JobSpec`, `PathTemplate`,
//!   `ToolCommand`, `PipelineSpec`), file readers and per-tool command builders.
//!
//! - **[`engine`]: The Execution Layer.** Configuration types, the error taxonomy,
//!   progress reporting and the [`engine::runner::CommandRunner`] seam through which
//!   every external process is launched.
//!
//! - **[`workflows`]: The Public API.** Complete operations such as a disorder
//!   sweep over a directory, a single array task or a chained MD pipeline.

pub mod core;
pub mod engine;
pub mod workflows;
